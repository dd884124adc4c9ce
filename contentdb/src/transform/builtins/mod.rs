//! Transformers that ship with the pipeline.

pub mod csv;
pub mod json;
pub mod markdown;
pub mod path_meta;
pub mod yaml;

use super::content::TransformedContent;
use super::transformer::ContentTransformer;
use once_cell::sync::Lazy;
use serde_json::Value;

static BUILTINS: Lazy<Vec<ContentTransformer>> = Lazy::new(|| {
    vec![
        ContentTransformer::parser("csv", &[r"\.csv$"], csv::CsvParser)
            .map(|t| t.with_transform(csv::CsvTyping)),
        ContentTransformer::parser("markdown", &[r"\.md$", r"\.markdown$"], markdown::MarkdownParser),
        ContentTransformer::parser("json", &[r"\.json$"], json::JsonParser),
        ContentTransformer::parser("yaml", &[r"\.ya?ml$"], yaml::YamlParser),
        ContentTransformer::transformer("path-meta", &[".*"], path_meta::PathMeta),
    ]
    .into_iter()
    .collect::<crate::Result<Vec<_>>>()
    .expect("built-in extension patterns compile")
});

/// The built-in transformers in priority order.
pub fn all() -> Vec<ContentTransformer> {
    BUILTINS.clone()
}

/// Fold a parsed data value into a new document: a mapping is merged field by
/// field, anything else non-null becomes the `body`.
pub(crate) fn document_from_value(id: &str, value: Value) -> TransformedContent {
    let mut doc = TransformedContent::new(id);
    match value {
        Value::Object(map) => doc.merge(map),
        Value::Null => {}
        other => {
            doc.insert("body", other);
        }
    }
    doc
}
