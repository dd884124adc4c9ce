use super::literal;
use crate::error::Result;
use crate::schema::ResolvedCollection;
use serde_json::{Map, Value};

/// Build an `INSERT OR REPLACE` statement for one record.
///
/// Every field of the collection is listed, in declaration order, whether or
/// not the record carries a value for it. Keys the collection does not declare
/// are ignored. A collision on the primary key replaces the existing row.
pub fn generate_insert(collection: &ResolvedCollection, data: &Map<String, Value>) -> Result<String> {
    let mut fields = Vec::with_capacity(collection.fields.len());
    let mut values = Vec::with_capacity(collection.fields.len());

    for (key, field) in &collection.fields {
        let json_field = collection.is_json_field(key);
        values.push(literal::encode(key, &field.field_type, json_field, data.get(key))?);
        fields.push(key.as_str());
    }

    Ok(format!(
        "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
        collection.name,
        fields.join(", "),
        values.join(", ")
    ))
}
