use super::types::{Collection, CollectionSource, CollectionType, FieldDescriptor, FieldType};
use crate::error::{ContentDbError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level schema definition parsed from a schema YAML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDefinition {
    /// Reusable object shapes, referenced from fields by name
    #[serde(default)]
    pub types: IndexMap<String, IndexMap<String, FieldDefinition>>,
    #[serde(default)]
    pub collections: IndexMap<String, CollectionDefinition>,
}

/// Definition of a single collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionDefinition {
    #[serde(rename = "type", default)]
    pub kind: Option<CollectionType>,
    #[serde(default)]
    pub source: Option<SourceDefinition>,
    #[serde(default)]
    pub fields: IndexMap<String, FieldDefinition>,
}

/// A source is either a bare base path or a full driver description
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceDefinition {
    Path(String),
    Full(CollectionSource),
}

impl SourceDefinition {
    pub fn refine(&self) -> CollectionSource {
        match self {
            SourceDefinition::Path(base) => CollectionSource::fs(base),
            SourceDefinition::Full(source) => source.clone(),
        }
    }
}

/// Definition of a single field in a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "enum", default)]
    pub enum_values: Option<Vec<String>>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub max_length: Option<u32>,
    /// Element type for arrays and records
    #[serde(default)]
    pub items: Option<Box<FieldDefinition>>,
    /// Shape for inline objects
    #[serde(default)]
    pub fields: Option<IndexMap<String, FieldDefinition>>,
    /// Members of an intersection
    #[serde(default)]
    pub all_of: Option<Vec<FieldDefinition>>,
}

/// Field type keyword as written in YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Enum,
    Date,
    Boolean,
    Number,
    Object,
    Array,
    Record,
    Intersection,
    #[serde(untagged)]
    Custom(std::string::String),
}

/// Parse a schema YAML file into a SchemaDefinition
pub fn parse_schema(path: &Path) -> Result<SchemaDefinition> {
    let content = std::fs::read_to_string(path)?;
    parse_schema_str(&content)
}

/// Parse a schema YAML string into a SchemaDefinition
pub fn parse_schema_str(content: &str) -> Result<SchemaDefinition> {
    let schema: SchemaDefinition = serde_yaml::from_str(content)?;
    Ok(schema)
}

impl SchemaDefinition {
    /// Convert every declared collection into its typed form, in declaration order.
    pub fn typed_collections(&self) -> Result<Vec<(String, Collection)>> {
        self.collections
            .iter()
            .map(|(name, def)| Ok((name.clone(), self.to_collection(def)?)))
            .collect()
    }

    fn to_collection(&self, def: &CollectionDefinition) -> Result<Collection> {
        let mut fields = IndexMap::new();
        for (name, field) in &def.fields {
            fields.insert(name.clone(), self.to_descriptor(name, field, 0)?);
        }
        Ok(Collection {
            kind: def.kind,
            source: def.source.as_ref().map(SourceDefinition::refine),
            fields,
        })
    }

    fn to_descriptor(&self, name: &str, field: &FieldDefinition, depth: usize) -> Result<FieldDescriptor> {
        let base = self.base_type(field, depth)?;
        let field_type = match (&field.default, field.required) {
            (Some(default), _) => base.with_default(default.clone()),
            (None, false) => base.optional(),
            (None, true) => base,
        };
        Ok(FieldDescriptor::new(name, field_type, field.required))
    }

    fn base_type(&self, field: &FieldDefinition, depth: usize) -> Result<FieldType> {
        // Reusable types may reference each other; a cycle would never terminate.
        if depth > 32 {
            return Err(ContentDbError::Schema(
                "Type references nest too deeply (cycle in `types`?)".into(),
            ));
        }

        let ty = match &field.field_type {
            FieldKind::String => FieldType::String {
                max_length: field.max_length,
            },
            FieldKind::Enum => FieldType::Enum(field.enum_values.clone().unwrap_or_default()),
            FieldKind::Date => FieldType::Date,
            FieldKind::Boolean => FieldType::Boolean,
            FieldKind::Number => FieldType::Number,
            FieldKind::Object => {
                let shape = match &field.fields {
                    Some(fields) => self.shape(fields, depth + 1)?,
                    None => IndexMap::new(),
                };
                FieldType::Object(shape)
            }
            FieldKind::Array => FieldType::Array(Box::new(self.item_type(field, depth)?)),
            FieldKind::Record => FieldType::Record(Box::new(self.item_type(field, depth)?)),
            FieldKind::Intersection => {
                let members = field
                    .all_of
                    .iter()
                    .flatten()
                    .map(|member| self.base_type(member, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                FieldType::Intersection(members)
            }
            FieldKind::Custom(type_name) => match self.types.get(type_name) {
                Some(fields) => FieldType::Object(self.shape(fields, depth + 1)?),
                None => FieldType::Custom(type_name.clone()),
            },
        };
        Ok(ty)
    }

    fn item_type(&self, field: &FieldDefinition, depth: usize) -> Result<FieldType> {
        match &field.items {
            Some(items) => self.base_type(items, depth + 1),
            None => Ok(FieldType::Object(IndexMap::new())),
        }
    }

    fn shape(
        &self,
        fields: &IndexMap<String, FieldDefinition>,
        depth: usize,
    ) -> Result<IndexMap<String, FieldType>> {
        let mut shape = IndexMap::new();
        for (name, field) in fields {
            shape.insert(name.clone(), self.to_descriptor(name, field, depth)?.field_type);
        }
        Ok(shape)
    }
}
