use crate::error::{ContentDbError, Result};
use crate::schema::FieldType;
use std::fmt;

/// A storage column type with an optional length bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnType {
    pub sql_type: &'static str,
    pub length: Option<u32>,
}

impl ColumnType {
    const fn plain(sql_type: &'static str) -> Self {
        ColumnType {
            sql_type,
            length: None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.length {
            Some(length) => write!(f, "{}({})", self.sql_type, length),
            None => f.write_str(self.sql_type),
        }
    }
}

/// Map a field type to the column type that stores it.
pub fn storage_type(field_type: &FieldType) -> Result<ColumnType> {
    let column = match field_type {
        FieldType::String { max_length } => ColumnType {
            sql_type: "VARCHAR",
            length: *max_length,
        },
        FieldType::Enum(_) => ColumnType::plain("VARCHAR"),
        FieldType::Date => ColumnType::plain("DATE"),
        FieldType::Boolean => ColumnType::plain("BOOLEAN"),
        FieldType::Number => ColumnType::plain("INT"),
        FieldType::Object(_)
        | FieldType::Array(_)
        | FieldType::Record(_)
        | FieldType::Intersection(_) => ColumnType::plain("TEXT"),
        FieldType::Optional(inner) | FieldType::Default(inner, _) => return storage_type(inner),
        FieldType::Custom(name) => return Err(ContentDbError::UnsupportedType(name.clone())),
    };
    Ok(column)
}
