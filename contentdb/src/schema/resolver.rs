use super::base::{meta_fields, page_fields};
use super::parser::SchemaDefinition;
use super::types::{Collection, CollectionSource, CollectionType, FieldDescriptor, FieldType};
use crate::error::{ContentDbError, Result};
use crate::sql::generate_table_definition;
use heck::ToPascalCase;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Collection synthesized for loose content when the user does not declare one.
pub const CONTENT_COLLECTION: &str = "content";
/// Internal collection that records the schema version of a store.
pub const INFO_COLLECTION: &str = "_info";

/// Which pipeline-populated fields a collection carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedFields {
    pub raw: bool,
    pub body: bool,
    pub path: bool,
}

/// A collection after base-field merging, classification and table compilation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCollection {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CollectionType,
    pub pascal_name: String,
    pub source: Option<CollectionSource>,
    pub fields: IndexMap<String, FieldDescriptor>,
    pub table: String,
    pub generated_fields: GeneratedFields,
    pub json_fields: Vec<String>,
}

impl ResolvedCollection {
    pub fn is_json_field(&self, name: &str) -> bool {
        self.json_fields.iter().any(|f| f == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }
}

/// Merge a collection's own fields with the base field set of its kind.
///
/// Page collections start from the page fields; a user field with the same
/// name takes that field's place. Metadata fields are appended for every kind,
/// but only where the user has not declared a field of the same name.
pub fn define_collection(collection: &Collection) -> Collection {
    let kind = collection.effective_kind();
    let mut fields = IndexMap::new();

    if kind == CollectionType::Page {
        for field in page_fields() {
            fields.insert(field.name.clone(), field);
        }
    }

    for (name, field) in &collection.fields {
        fields.insert(name.clone(), field.clone());
    }

    for field in meta_fields() {
        if !fields.contains_key(&field.name) {
            fields.insert(field.name.clone(), field);
        }
    }

    Collection {
        kind: Some(kind),
        source: collection.source.clone(),
        fields,
    }
}

/// Resolve a single collection: merge base fields, classify, compile the table.
pub fn resolve_collection(name: &str, collection: &Collection) -> Result<ResolvedCollection> {
    if name.is_empty() {
        return Err(ContentDbError::Schema("Collection name cannot be empty".into()));
    }

    let merged = define_collection(collection);
    let table = generate_table_definition(name, &merged.fields)?;

    let generated_fields = GeneratedFields {
        raw: merged.fields.contains_key("raw"),
        body: merged.fields.contains_key("body"),
        path: merged.fields.contains_key("path"),
    };

    let json_fields = merged
        .fields
        .iter()
        .filter(|(_, field)| field.field_type.is_compound())
        .map(|(key, _)| key.clone())
        .collect();

    Ok(ResolvedCollection {
        name: name.to_string(),
        kind: merged.effective_kind(),
        pascal_name: name.to_pascal_case(),
        source: merged.source,
        fields: merged.fields,
        table,
        generated_fields,
        json_fields,
    })
}

/// Resolve every user collection, adding the `content` and `_info` collections.
///
/// `content` is synthesized only if the user did not declare it. `_info` is
/// always appended and cannot be declared by the user.
pub fn resolve_collections(collections: Vec<(String, Collection)>) -> Result<Vec<ResolvedCollection>> {
    let mut seen = IndexMap::new();
    for (name, collection) in collections {
        if name == INFO_COLLECTION {
            return Err(ContentDbError::Schema(format!(
                "Collection name '{INFO_COLLECTION}' is reserved"
            )));
        }
        if seen.insert(name.clone(), collection).is_some() {
            return Err(ContentDbError::Schema(format!(
                "Collection '{name}' is declared more than once"
            )));
        }
    }

    if !seen.contains_key(CONTENT_COLLECTION) {
        seen.insert(
            CONTENT_COLLECTION.to_string(),
            Collection::page().with_source(CollectionSource::fs("content")),
        );
    }

    seen.insert(INFO_COLLECTION.to_string(), info_collection());

    seen.iter()
        .map(|(name, collection)| resolve_collection(name, collection))
        .collect()
}

fn info_collection() -> Collection {
    Collection::data().field(FieldDescriptor::required("version", FieldType::string()))
}

/// The resolved collections of one content-processing session.
///
/// Built once at startup; read-only afterwards and cheap to share.
#[derive(Debug, Clone, Default)]
pub struct CollectionRegistry {
    collections: IndexMap<String, Arc<ResolvedCollection>>,
}

impl CollectionRegistry {
    pub fn from_collections(collections: Vec<(String, Collection)>) -> Result<Self> {
        let collections = resolve_collections(collections)?
            .into_iter()
            .map(|c| (c.name.clone(), Arc::new(c)))
            .collect();
        Ok(CollectionRegistry { collections })
    }

    pub fn from_schema(schema: &SchemaDefinition) -> Result<Self> {
        Self::from_collections(schema.typed_collections()?)
    }

    pub fn get(&self, name: &str) -> Option<Arc<ResolvedCollection>> {
        self.collections.get(name).cloned()
    }

    pub fn require(&self, name: &str) -> Result<Arc<ResolvedCollection>> {
        self.get(name).ok_or_else(|| {
            ContentDbError::Schema(format!("Collection '{name}' not found in schema"))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResolvedCollection>> {
        self.collections.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// A fingerprint of every table definition, used as the store version.
    ///
    /// Deterministic for a given build. The std hasher may change between Rust
    /// releases, so an index written by another toolchain can read as stale and
    /// get its tables re-initialized.
    pub fn checksum(&self) -> String {
        let mut hasher = DefaultHasher::new();
        for collection in self.collections.values() {
            collection.name.hash(&mut hasher);
            collection.table.hash(&mut hasher);
        }
        format!("{:016x}", hasher.finish())
    }
}
