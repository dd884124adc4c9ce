use super::builtins;
use super::transformer::ContentTransformer;

/// The set of transformers available to the pipeline.
///
/// Built once during setup. User transformers always take precedence over the
/// built-ins, and per-call transformers (see `TransformOptions`) over both.
#[derive(Debug, Clone, Default)]
pub struct TransformerRegistry {
    user: Vec<ContentTransformer>,
    builtins: Vec<ContentTransformer>,
}

impl TransformerRegistry {
    /// An empty registry with no built-in transformers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in transformers, in priority order:
    /// csv, markdown, json, yaml, path-meta.
    pub fn with_builtins() -> Self {
        TransformerRegistry {
            user: Vec::new(),
            builtins: builtins::all(),
        }
    }

    /// Register a user-supplied transformer.
    pub fn register(&mut self, transformer: ContentTransformer) -> &mut Self {
        log::debug!("Registering transformer '{}'", transformer.name());
        self.user.push(transformer);
        self
    }

    /// Every transformer in lookup order: `extra` first, then user, then built-ins.
    pub fn lookup_order<'a>(
        &'a self,
        extra: &'a [ContentTransformer],
    ) -> impl Iterator<Item = &'a ContentTransformer> {
        extra.iter().chain(self.user.iter()).chain(self.builtins.iter())
    }

    /// The first transformer that claims `ext` and can parse it.
    pub fn find_parser<'a>(
        &'a self,
        ext: &str,
        extra: &'a [ContentTransformer],
    ) -> Option<&'a ContentTransformer> {
        self.lookup_order(extra)
            .find(|t| t.can_parse() && t.matches(ext))
    }

    /// Every transformer that claims `ext` and can transform it, in the order
    /// the steps must run.
    pub fn find_transforms<'a>(
        &'a self,
        ext: &str,
        extra: &'a [ContentTransformer],
    ) -> Vec<&'a ContentTransformer> {
        self.lookup_order(extra)
            .filter(|t| t.can_transform() && t.matches(ext))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.user.len() + self.builtins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
