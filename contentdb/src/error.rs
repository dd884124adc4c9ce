use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentDbError {
    /// A field type has no storage column mapping.
    #[error("Unsupported field type: {0}")]
    UnsupportedType(String),

    /// A parse or transform step failed for one content file.
    #[error("Failed to transform {id}: {message}")]
    Transform { id: String, message: String },

    /// An insert-time value does not have the shape its field declares.
    #[error("Field '{field}' expected {expected}, got {found}")]
    Conversion {
        field: String,
        expected: String,
        found: String,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid extension pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("{0}")]
    Other(String),
}

impl ContentDbError {
    pub fn transform(id: &str, message: impl std::fmt::Display) -> Self {
        ContentDbError::Transform {
            id: id.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ContentDbError>;
