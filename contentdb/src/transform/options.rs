use super::transformer::{ContentTransformer, StepOptions};
use crate::error::{ContentDbError, Result};
use serde_json::{Map, Value};

/// Configuration for one pipeline invocation.
///
/// `transformers` are consulted ahead of everything in the registry. Every
/// other entry is an options slice keyed by a transformer's camel-cased name.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    pub transformers: Vec<ContentTransformer>,
    slices: Map<String, Value>,
}

/// How a transform step should run for a given options slice.
#[derive(Debug, Clone, PartialEq)]
pub enum StepSetting {
    /// The slice is exactly `false`.
    Disabled,
    Enabled(StepOptions),
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from a JSON configuration object. The `transformers` key,
    /// if present, is ignored; transformers are code and must be added with
    /// [`TransformOptions::with_transformer`].
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(mut map) => {
                map.remove("transformers");
                Ok(TransformOptions {
                    transformers: Vec::new(),
                    slices: map,
                })
            }
            Value::Null => Ok(Self::default()),
            other => Err(ContentDbError::Other(format!(
                "Transform options must be an object, got {other}"
            ))),
        }
    }

    pub fn with_transformer(mut self, transformer: ContentTransformer) -> Self {
        self.transformers.push(transformer);
        self
    }

    pub fn set(mut self, key: &str, value: Value) -> Self {
        self.slices.insert(key.to_string(), value);
        self
    }

    pub fn slice(&self, key: &str) -> Option<&Value> {
        self.slices.get(key)
    }

    /// Options for a parser. Parsers always run; anything that is not an
    /// object (including `false`) yields empty options.
    pub fn parser_options(&self, key: &str) -> StepOptions {
        match self.slices.get(key) {
            Some(Value::Object(map)) => map.clone(),
            _ => StepOptions::new(),
        }
    }

    /// Options for a transform step. An explicit `false` disables the step;
    /// an absent slice runs it with defaults.
    pub fn step_setting(&self, key: &str) -> StepSetting {
        match self.slices.get(key) {
            Some(Value::Bool(false)) => StepSetting::Disabled,
            Some(Value::Object(map)) => StepSetting::Enabled(map.clone()),
            _ => StepSetting::Enabled(StepOptions::new()),
        }
    }
}
