use super::literal::default_literal;
use super::mapper::storage_type;
use crate::error::Result;
use crate::schema::FieldDescriptor;
use indexmap::IndexMap;

/// The field that becomes the table's primary key.
pub const ID_FIELD: &str = "id";

/// Compile a collection's fields into a `CREATE TABLE IF NOT EXISTS` statement.
///
/// Fails with `UnsupportedType` if any scalar field has no column mapping;
/// no partial table is produced.
pub fn generate_table_definition(
    name: &str,
    fields: &IndexMap<String, FieldDescriptor>,
) -> Result<String> {
    let columns = fields
        .iter()
        .map(|(key, field)| column_definition(key, field))
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {name} ({})",
        columns.join(", ")
    ))
}

fn column_definition(key: &str, field: &FieldDescriptor) -> Result<String> {
    if field.field_type.is_compound() {
        return Ok(format!("{key} TEXT"));
    }

    if key == ID_FIELD {
        return Ok(format!("{key} TEXT PRIMARY KEY"));
    }

    let column = storage_type(&field.field_type)?;
    let mut definition = format!("{key} {column}");
    definition.push_str(if field.required { " NOT NULL" } else { " NULL" });

    if let Some(default) = &field.default {
        definition.push_str(" DEFAULT ");
        definition.push_str(&default_literal(default));
    }

    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContentDbError;
    use crate::schema::FieldType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fields(list: Vec<FieldDescriptor>) -> IndexMap<String, FieldDescriptor> {
        list.into_iter().map(|f| (f.name.clone(), f)).collect()
    }

    #[test]
    fn test_table_definition() {
        let schema = fields(vec![
            FieldDescriptor::required("id", FieldType::string()),
            FieldDescriptor::required("title", FieldType::String { max_length: Some(200) }),
            FieldDescriptor::optional("summary", FieldType::string()),
            FieldDescriptor::new("rating", FieldType::Number.with_default(json!(3)), false),
            FieldDescriptor::new(
                "status",
                FieldType::Enum(vec!["draft".into(), "live".into()]).with_default(json!("draft")),
                false,
            ),
            FieldDescriptor::new("featured", FieldType::Boolean.with_default(json!(false)), false),
            FieldDescriptor::optional("published", FieldType::Date),
            FieldDescriptor::optional("tags", FieldType::Array(Box::new(FieldType::string()))),
        ]);

        assert_eq!(
            generate_table_definition("blog", &schema).unwrap(),
            "CREATE TABLE IF NOT EXISTS blog (id TEXT PRIMARY KEY, title VARCHAR(200) NOT NULL, \
             summary VARCHAR NULL, rating INT NULL DEFAULT 3, status VARCHAR NULL DEFAULT 'draft', \
             featured BOOLEAN NULL DEFAULT false, published DATE NULL, tags TEXT)"
        );
    }

    #[test]
    fn test_compound_id_is_plain_text() {
        let schema = fields(vec![FieldDescriptor::required(
            "id",
            FieldType::Record(Box::new(FieldType::Number)),
        )]);
        assert_eq!(
            generate_table_definition("odd", &schema).unwrap(),
            "CREATE TABLE IF NOT EXISTS odd (id TEXT)"
        );
    }

    #[test]
    fn test_compilation_is_idempotent() {
        let schema = fields(vec![
            FieldDescriptor::required("id", FieldType::string()),
            FieldDescriptor::optional("meta", FieldType::Object(IndexMap::new())),
        ]);
        let first = generate_table_definition("docs", &schema).unwrap();
        let second = generate_table_definition("docs", &schema).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unmapped_field_aborts_whole_table() {
        let schema = fields(vec![
            FieldDescriptor::required("id", FieldType::string()),
            FieldDescriptor::optional("location", FieldType::Custom("geo_point".into())),
        ]);
        assert!(matches!(
            generate_table_definition("places", &schema),
            Err(ContentDbError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_generated_ddl_is_accepted_by_sqlite() {
        let schema = fields(vec![
            FieldDescriptor::required("id", FieldType::string()),
            FieldDescriptor::new("label", FieldType::string().with_default(json!("it's")), false),
            FieldDescriptor::optional("tags", FieldType::Array(Box::new(FieldType::string()))),
        ]);
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(&generate_table_definition("things", &schema).unwrap())
            .unwrap();
    }
}
