use super::content::TransformedContent;
use crate::error::Result;
use async_trait::async_trait;
use heck::ToLowerCamelCase;
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Options handed to a single parser or transform step.
pub type StepOptions = Map<String, Value>;

/// Turns raw file content into a document.
#[async_trait]
pub trait Parse: Send + Sync {
    async fn parse(&self, id: &str, content: &str, options: &StepOptions) -> Result<TransformedContent>;
}

/// Rewrites an already-parsed document.
#[async_trait]
pub trait Transform: Send + Sync {
    async fn transform(
        &self,
        content: TransformedContent,
        options: &StepOptions,
    ) -> Result<TransformedContent>;
}

/// Adapts a synchronous closure into a [`Parse`] implementation.
pub struct FnParser<F>(pub F);

impl<F> FnParser<F>
where
    F: Fn(&str, &str, &StepOptions) -> Result<TransformedContent> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        FnParser(f)
    }
}

#[async_trait]
impl<F> Parse for FnParser<F>
where
    F: Fn(&str, &str, &StepOptions) -> Result<TransformedContent> + Send + Sync,
{
    async fn parse(&self, id: &str, content: &str, options: &StepOptions) -> Result<TransformedContent> {
        (self.0)(id, content, options)
    }
}

/// Adapts a synchronous closure into a [`Transform`] implementation.
pub struct FnTransform<F>(pub F);

impl<F> FnTransform<F>
where
    F: Fn(TransformedContent, &StepOptions) -> Result<TransformedContent> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        FnTransform(f)
    }
}

#[async_trait]
impl<F> Transform for FnTransform<F>
where
    F: Fn(TransformedContent, &StepOptions) -> Result<TransformedContent> + Send + Sync,
{
    async fn transform(
        &self,
        content: TransformedContent,
        options: &StepOptions,
    ) -> Result<TransformedContent> {
        (self.0)(content, options)
    }
}

/// A named plugin that claims a set of file extensions and can parse them,
/// transform them, or both.
///
/// The constructors require one capability up front, so a transformer with
/// neither cannot be built.
#[derive(Clone)]
pub struct ContentTransformer {
    name: String,
    extensions: Vec<String>,
    matcher: Regex,
    parser: Option<Arc<dyn Parse>>,
    transformer: Option<Arc<dyn Transform>>,
}

impl ContentTransformer {
    /// A transformer that can parse files. `extensions` are regex patterns
    /// matched case-insensitively against the extension (`.md`, `.yaml`, ...).
    pub fn parser<P: Parse + 'static>(name: &str, extensions: &[&str], parser: P) -> Result<Self> {
        let mut t = Self::bare(name, extensions)?;
        t.parser = Some(Arc::new(parser));
        Ok(t)
    }

    /// A transformer that can rewrite parsed documents.
    pub fn transformer<T: Transform + 'static>(
        name: &str,
        extensions: &[&str],
        transformer: T,
    ) -> Result<Self> {
        let mut t = Self::bare(name, extensions)?;
        t.transformer = Some(Arc::new(transformer));
        Ok(t)
    }

    pub fn with_parser<P: Parse + 'static>(mut self, parser: P) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    pub fn with_transform<T: Transform + 'static>(mut self, transformer: T) -> Self {
        self.transformer = Some(Arc::new(transformer));
        self
    }

    fn bare(name: &str, extensions: &[&str]) -> Result<Self> {
        let matcher = RegexBuilder::new(&extensions.join("|"))
            .case_insensitive(true)
            .build()?;
        Ok(ContentTransformer {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            matcher,
            parser: None,
            transformer: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// The key this transformer's options live under (`path-meta` -> `pathMeta`).
    pub fn option_key(&self) -> String {
        self.name.to_lower_camel_case()
    }

    pub fn matches(&self, ext: &str) -> bool {
        self.matcher.is_match(ext)
    }

    pub fn can_parse(&self) -> bool {
        self.parser.is_some()
    }

    pub fn can_transform(&self) -> bool {
        self.transformer.is_some()
    }

    pub fn parse_capability(&self) -> Option<&dyn Parse> {
        self.parser.as_deref()
    }

    pub fn transform_capability(&self) -> Option<&dyn Transform> {
        self.transformer.as_deref()
    }
}

impl fmt::Debug for ContentTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentTransformer")
            .field("name", &self.name)
            .field("extensions", &self.extensions)
            .field("parse", &self.can_parse())
            .field("transform", &self.can_transform())
            .finish()
    }
}
