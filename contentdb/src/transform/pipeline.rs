use super::content::{extname, TransformedContent};
use super::options::{StepSetting, TransformOptions};
use super::registry::TransformerRegistry;
use crate::error::Result;
use std::sync::Arc;

/// Runs content files through one parser and the matching transform steps.
///
/// The pipeline keeps no per-file state, so a single instance can process
/// many files concurrently. Steps within one file run strictly in order.
#[derive(Debug, Clone)]
pub struct Pipeline {
    registry: Arc<TransformerRegistry>,
}

impl Pipeline {
    pub fn new(registry: Arc<TransformerRegistry>) -> Self {
        Pipeline { registry }
    }

    /// A pipeline over the built-in transformers only.
    pub fn with_builtins() -> Self {
        Self::new(Arc::new(TransformerRegistry::with_builtins()))
    }

    pub fn registry(&self) -> &TransformerRegistry {
        &self.registry
    }

    /// Parse and transform one content file.
    ///
    /// A file whose extension no parser claims is not an error: it comes back
    /// as `{ id, body: content }` with no transform steps applied. Errors from
    /// a parser or step abort this file only and are returned as-is.
    pub async fn transform(
        &self,
        id: &str,
        content: &str,
        options: &TransformOptions,
    ) -> Result<TransformedContent> {
        let ext = extname(id);

        let parser = match self.registry.find_parser(ext, &options.transformers) {
            Some(parser) => parser,
            None => {
                log::warn!("{ext} files are not supported, \"{id}\" falling back to raw content");
                return Ok(TransformedContent::raw(id, content));
            }
        };

        let parse = match parser.parse_capability() {
            Some(parse) => parse,
            None => return Ok(TransformedContent::raw(id, content)),
        };

        log::debug!("Parsing {id} with '{}'", parser.name());
        let parser_options = options.parser_options(&parser.option_key());
        let mut document = parse.parse(id, content, &parser_options).await?;

        for step in self.registry.find_transforms(ext, &options.transformers) {
            let Some(transform) = step.transform_capability() else {
                continue;
            };
            match options.step_setting(&step.option_key()) {
                StepSetting::Disabled => {
                    log::debug!("Skipping disabled transformer '{}' for {id}", step.name());
                }
                StepSetting::Enabled(step_options) => {
                    log::debug!("Applying '{}' to {id}", step.name());
                    document = transform.transform(document, &step_options).await?;
                }
            }
        }

        Ok(document)
    }

    /// Transform several `(id, content)` files concurrently.
    ///
    /// Results come back in input order. A failing file does not affect the
    /// others.
    pub async fn transform_all(
        &self,
        files: &[(String, String)],
        options: &TransformOptions,
    ) -> Vec<Result<TransformedContent>> {
        futures::future::join_all(
            files
                .iter()
                .map(|(id, content)| self.transform(id, content, options)),
        )
        .await
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContentDbError;
    use crate::transform::{ContentTransformer, FnParser, FnTransform, StepOptions};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn append(name: &'static str) -> impl Fn(TransformedContent, &StepOptions) -> Result<TransformedContent> {
        move |mut doc: TransformedContent, options: &StepOptions| {
            let mut trail = doc
                .get("trail")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let suffix = options.get("suffix").and_then(Value::as_str).unwrap_or("");
            trail.push(json!(format!("{name}{suffix}")));
            doc.insert("trail", Value::Array(trail));
            doc.insert("last", json!(name));
            Ok(doc)
        }
    }

    fn md_step(name: &'static str) -> ContentTransformer {
        ContentTransformer::transformer(name, &[r"\.md$"], FnTransform::new(append(name))).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_extension_returns_raw_body() {
        let pipeline = Pipeline::with_builtins();
        let raw = "just some bytes\n---\nnot: yaml";
        let doc = pipeline
            .transform("notes/file.unknown-ext", raw, &TransformOptions::new())
            .await
            .unwrap();
        assert_eq!(doc, TransformedContent::raw("notes/file.unknown-ext", raw));
        assert_eq!(doc.body(), Some(&json!(raw)));
        assert_eq!(doc.fields.len(), 1);
    }

    #[tokio::test]
    async fn test_steps_fold_in_registration_order() {
        let mut registry = TransformerRegistry::new();
        registry.register(
            ContentTransformer::parser(
                "plain",
                &[r"\.md$"],
                FnParser::new(|id, content, _| {
                    let mut doc = TransformedContent::new(id);
                    doc.insert("body", json!(content));
                    Ok(doc)
                }),
            )
            .unwrap(),
        );
        registry.register(md_step("a"));
        registry.register(md_step("b"));
        let pipeline = Pipeline::new(Arc::new(registry));

        let options = TransformOptions::new().set("a", json!({ "suffix": "!" }));
        let doc = pipeline.transform("x.md", "hello", &options).await.unwrap();

        // Apply the same steps by hand: B(A(X)), each with its own slice.
        let mut expected = TransformedContent::new("x.md");
        expected.insert("body", json!("hello"));
        let a_options = json!({ "suffix": "!" }).as_object().cloned().unwrap();
        let expected = append("a")(expected, &a_options).unwrap();
        let expected = append("b")(expected, &StepOptions::new()).unwrap();

        assert_eq!(doc, expected);
        assert_eq!(doc.get("trail"), Some(&json!(["a!", "b"])));
        assert_eq!(doc.get_str("last"), Some("b"));
    }

    #[tokio::test]
    async fn test_per_call_transformers_run_first() {
        let mut registry = TransformerRegistry::with_builtins();
        registry.register(md_step("registered"));
        let pipeline = Pipeline::new(Arc::new(registry));

        let options = TransformOptions::new().with_transformer(md_step("per-call"));
        let doc = pipeline.transform("a.md", "# Hi", &options).await.unwrap();
        assert_eq!(doc.get("trail"), Some(&json!(["per-call", "registered"])));
    }

    #[tokio::test]
    async fn test_false_slice_skips_step() {
        let mut registry = TransformerRegistry::with_builtins();
        registry.register(md_step("a"));
        registry.register(md_step("b"));
        let pipeline = Pipeline::new(Arc::new(registry));

        let options = TransformOptions::new().set("a", json!(false));
        let doc = pipeline.transform("a.md", "text", &options).await.unwrap();
        assert_eq!(doc.get("trail"), Some(&json!(["b"])));
    }

    #[tokio::test]
    async fn test_csv_disabled_still_parses() {
        let pipeline = Pipeline::with_builtins();
        let raw = "name,age,admin\nAda,36,true\n";

        let typed = pipeline
            .transform("people.csv", raw, &TransformOptions::new())
            .await
            .unwrap();
        assert_eq!(
            typed.body(),
            Some(&json!([{ "name": "Ada", "age": 36, "admin": true }]))
        );

        let untyped = pipeline
            .transform("people.csv", raw, &TransformOptions::new().set("csv", json!(false)))
            .await
            .unwrap();
        assert_eq!(
            untyped.body(),
            Some(&json!([{ "name": "Ada", "age": "36", "admin": "true" }]))
        );
        // Other steps are unaffected.
        assert_eq!(untyped.get_str("extension"), Some("csv"));
    }

    #[tokio::test]
    async fn test_step_error_propagates() {
        let mut registry = TransformerRegistry::with_builtins();
        registry.register(
            ContentTransformer::transformer(
                "strict",
                &[r"\.md$"],
                FnTransform::new(|doc, _| {
                    if doc.get("title").is_none() {
                        return Err(ContentDbError::transform(&doc.id, "missing title"));
                    }
                    Ok(doc)
                }),
            )
            .unwrap(),
        );
        let pipeline = Pipeline::new(Arc::new(registry));

        let err = pipeline
            .transform("untitled.md", "no heading here", &TransformOptions::new())
            .await
            .unwrap_err();
        match err {
            ContentDbError::Transform { id, message } => {
                assert_eq!(id, "untitled.md");
                assert_eq!(message, "missing title");
            }
            other => panic!("unexpected error: {other}"),
        }

        // Sibling files are unaffected.
        let ok = pipeline
            .transform("titled.md", "# Title", &TransformOptions::new())
            .await
            .unwrap();
        assert_eq!(ok.get_str("title"), Some("Title"));
    }

    #[tokio::test]
    async fn test_files_can_be_processed_concurrently() {
        let pipeline = Pipeline::with_builtins();
        let options = TransformOptions::new();
        let files = vec![
            ("a.md", "# A"),
            ("b.yml", "title: B"),
            ("c.json", r#"{"title": "C"}"#),
        ];

        let docs = futures::future::try_join_all(
            files
                .iter()
                .map(|(id, raw)| pipeline.transform(id, raw, &options)),
        )
        .await
        .unwrap();

        let titles: Vec<&str> = docs.iter().filter_map(|d| d.get_str("title")).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_transform_all_isolates_failures() {
        let pipeline = Pipeline::with_builtins();
        let files = vec![
            ("good.json".to_string(), r#"{"title": "Good"}"#.to_string()),
            ("bad.json".to_string(), "{ nope".to_string()),
            ("notes.txt".to_string(), "plain".to_string()),
        ];

        let results = pipeline.transform_all(&files, &TransformOptions::new()).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().get_str("title"), Some("Good"));
        assert!(matches!(results[1], Err(ContentDbError::Transform { .. })));
        assert_eq!(results[2].as_ref().unwrap().body(), Some(&json!("plain")));
    }
}
