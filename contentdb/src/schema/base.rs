// Field sets every collection inherits.

use super::types::{FieldDescriptor, FieldType};
use indexmap::IndexMap;
use serde_json::json;

/// File extensions the metadata `extension` field accepts.
pub const CONTENT_EXTENSIONS: [&str; 6] = ["md", "yaml", "yml", "json", "csv", "xml"];

/// Fields every page-kind collection starts from.
pub fn page_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::optional("path", FieldType::string()),
        FieldDescriptor::optional("title", FieldType::string()),
        FieldDescriptor::optional("description", FieldType::string()),
        FieldDescriptor::new(
            "seo",
            FieldType::Intersection(vec![
                FieldType::Object(seo_shape()),
                FieldType::Record(Box::new(FieldType::string())),
            ])
            .with_default(json!({})),
            false,
        ),
        FieldDescriptor::optional("body", FieldType::Object(IndexMap::new())),
        FieldDescriptor::new("navigation", FieldType::Boolean.with_default(json!(true)), false),
    ]
}

/// Fields every collection ends with, page or data.
pub fn meta_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::required("id", FieldType::string()),
        FieldDescriptor::optional("stem", FieldType::string()),
        FieldDescriptor::optional(
            "extension",
            FieldType::Enum(CONTENT_EXTENSIONS.iter().map(|e| e.to_string()).collect()),
        ),
        FieldDescriptor::optional("meta", FieldType::Record(Box::new(FieldType::Object(IndexMap::new())))),
    ]
}

fn seo_shape() -> IndexMap<String, FieldType> {
    let mut shape = IndexMap::new();
    shape.insert("title".to_string(), FieldType::string().optional());
    shape.insert("description".to_string(), FieldType::string().optional());
    shape
}
