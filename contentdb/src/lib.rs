pub mod error;
pub mod index;
pub mod schema;
pub mod sql;
pub mod transform;

pub use error::{ContentDbError, Result};
pub use index::ContentIndex;
pub use schema::{
    parse_schema, parse_schema_str, Collection, CollectionRegistry, FieldDescriptor, FieldType,
    ResolvedCollection, SchemaDefinition,
};
pub use sql::{generate_insert, generate_table_definition};
pub use transform::{ContentTransformer, Pipeline, TransformOptions, TransformedContent, TransformerRegistry};
