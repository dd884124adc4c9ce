use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A parsed content file: its identifier plus an open set of fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformedContent {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TransformedContent {
    pub fn new(id: &str) -> Self {
        TransformedContent {
            id: id.to_string(),
            fields: Map::new(),
        }
    }

    /// The untouched document a file falls back to when nothing can parse it.
    pub fn raw(id: &str, content: &str) -> Self {
        let mut doc = Self::new(id);
        doc.insert("body", Value::String(content.to_string()));
        doc
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        self.fields.insert(key.to_string(), value)
    }

    /// Insert only when the field is missing or null.
    pub fn insert_if_absent(&mut self, key: &str, value: Value) {
        let present = self.fields.get(key).map(|v| !v.is_null()).unwrap_or(false);
        if !present {
            self.fields.insert(key.to_string(), value);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn body(&self) -> Option<&Value> {
        self.get("body")
    }

    /// Merge a parsed mapping into the document. The file identifier always
    /// wins over an `id` key in the data.
    pub fn merge(&mut self, data: Map<String, Value>) {
        for (key, value) in data {
            if key == "id" {
                continue;
            }
            self.fields.insert(key, value);
        }
    }

    /// The document as a flat record, `id` included, ready for insertion.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = self.fields.clone();
        record.insert("id".to_string(), Value::String(self.id.clone()));
        record
    }
}

/// The extension of a content identifier, leading dot included.
///
/// Only the final `/` segment is considered, and a leading dot (as in
/// `.gitignore`) does not start an extension.
pub fn extname(id: &str) -> &str {
    let file = id.rsplit('/').next().unwrap_or(id);
    match file.rfind('.') {
        Some(0) | None => "",
        Some(pos) => &file[pos..],
    }
}
