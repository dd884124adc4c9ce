use super::document_from_value;
use crate::error::{ContentDbError, Result};
use crate::transform::{Parse, StepOptions, TransformedContent};
use async_trait::async_trait;
use serde_json::Value;

/// Parses `.yml` and `.yaml` files.
pub struct YamlParser;

#[async_trait]
impl Parse for YamlParser {
    async fn parse(&self, id: &str, content: &str, _options: &StepOptions) -> Result<TransformedContent> {
        if content.trim().is_empty() {
            return Ok(TransformedContent::new(id));
        }
        let value: Value =
            serde_yaml::from_str(content).map_err(|e| ContentDbError::transform(id, e))?;
        Ok(document_from_value(id, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mapping_fields_are_merged() {
        let yaml = "title: Guide\ndraft: false\nauthors:\n  - ada\n  - grace\n";
        let doc = YamlParser.parse("guide.yml", yaml, &StepOptions::new()).await.unwrap();
        assert_eq!(doc.get_str("title"), Some("Guide"));
        assert_eq!(doc.get("draft"), Some(&json!(false)));
        assert_eq!(doc.get("authors"), Some(&json!(["ada", "grace"])));
    }

    #[tokio::test]
    async fn test_sequence_becomes_body() {
        let doc = YamlParser
            .parse("list.yaml", "- one\n- two\n", &StepOptions::new())
            .await
            .unwrap();
        assert_eq!(doc.body(), Some(&json!(["one", "two"])));
    }

    #[tokio::test]
    async fn test_empty_file_yields_bare_document() {
        let doc = YamlParser.parse("empty.yml", "\n", &StepOptions::new()).await.unwrap();
        assert_eq!(doc, TransformedContent::new("empty.yml"));
    }

    #[tokio::test]
    async fn test_malformed_yaml_is_a_transform_error() {
        let err = YamlParser
            .parse("bad.yml", "key: [unclosed", &StepOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentDbError::Transform { .. }));
    }
}
