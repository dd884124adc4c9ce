pub mod base;
pub mod parser;
pub mod resolver;
pub mod types;

pub use parser::{
    parse_schema, parse_schema_str, CollectionDefinition, FieldDefinition, FieldKind,
    SchemaDefinition, SourceDefinition,
};
pub use resolver::{
    define_collection, resolve_collection, resolve_collections, CollectionRegistry,
    GeneratedFields, ResolvedCollection, CONTENT_COLLECTION, INFO_COLLECTION,
};
pub use types::{Collection, CollectionSource, CollectionType, FieldDescriptor, FieldType};
