use super::document_from_value;
use crate::error::{ContentDbError, Result};
use crate::transform::{Parse, StepOptions, TransformedContent};
use async_trait::async_trait;
use serde_json::Value;

/// Parses `.json` files.
pub struct JsonParser;

#[async_trait]
impl Parse for JsonParser {
    async fn parse(&self, id: &str, content: &str, _options: &StepOptions) -> Result<TransformedContent> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| ContentDbError::transform(id, e))?;
        Ok(document_from_value(id, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_object_fields_are_merged() {
        let doc = JsonParser
            .parse("authors/ada.json", r#"{"name": "Ada", "tags": ["math"]}"#, &StepOptions::new())
            .await
            .unwrap();
        assert_eq!(doc.get_str("name"), Some("Ada"));
        assert_eq!(doc.get("tags"), Some(&json!(["math"])));
    }

    #[tokio::test]
    async fn test_array_becomes_body() {
        let doc = JsonParser
            .parse("list.json", "[1, 2, 3]", &StepOptions::new())
            .await
            .unwrap();
        assert_eq!(doc.body(), Some(&json!([1, 2, 3])));
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_transform_error() {
        let err = JsonParser
            .parse("broken.json", "{ nope", &StepOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentDbError::Transform { ref id, .. } if id == "broken.json"));
    }
}
