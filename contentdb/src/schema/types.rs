use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The closed set of field types a collection schema can declare.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String { max_length: Option<u32> },
    Enum(Vec<String>),
    Date,
    Boolean,
    Number,
    Object(IndexMap<String, FieldType>),
    Array(Box<FieldType>),
    Record(Box<FieldType>),
    Intersection(Vec<FieldType>),
    Optional(Box<FieldType>),
    Default(Box<FieldType>, serde_json::Value),
    /// A named type reference that did not resolve to a reusable type.
    Custom(std::string::String),
}

impl FieldType {
    pub fn string() -> Self {
        FieldType::String { max_length: None }
    }

    pub fn optional(self) -> Self {
        FieldType::Optional(Box::new(self))
    }

    pub fn with_default(self, value: serde_json::Value) -> Self {
        FieldType::Default(Box::new(self), value)
    }

    /// Strip Optional/Default wrappers.
    pub fn underlying(&self) -> &FieldType {
        let mut current = self;
        loop {
            match current {
                FieldType::Optional(inner) | FieldType::Default(inner, _) => current = inner,
                other => return other,
            }
        }
    }

    /// Object, Array, Record and Intersection are stored as serialized JSON text.
    pub fn is_compound(&self) -> bool {
        matches!(
            self.underlying(),
            FieldType::Object(_)
                | FieldType::Array(_)
                | FieldType::Record(_)
                | FieldType::Intersection(_)
        )
    }

    /// The default carried by the outermost Default wrapper, looking through Optional.
    pub fn default_value(&self) -> Option<&serde_json::Value> {
        match self {
            FieldType::Default(_, value) => Some(value),
            FieldType::Optional(inner) => inner.default_value(),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &str {
        match self {
            FieldType::String { .. } => "string",
            FieldType::Enum(_) => "enum",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Number => "number",
            FieldType::Object(_) => "object",
            FieldType::Array(_) => "array",
            FieldType::Record(_) => "record",
            FieldType::Intersection(_) => "intersection",
            FieldType::Optional(_) => "optional",
            FieldType::Default(..) => "default",
            FieldType::Custom(name) => name.as_str(),
        }
    }
}

/// A named field within a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub default: Option<serde_json::Value>,
}

impl FieldDescriptor {
    pub fn new(name: &str, field_type: FieldType, required: bool) -> Self {
        let default = field_type.default_value().cloned();
        FieldDescriptor {
            name: name.to_string(),
            field_type,
            required,
            default,
        }
    }

    pub fn required(name: &str, field_type: FieldType) -> Self {
        Self::new(name, field_type, true)
    }

    pub fn optional(name: &str, field_type: FieldType) -> Self {
        Self::new(name, field_type.optional(), false)
    }

    pub fn underlying_type(&self) -> &FieldType {
        self.field_type.underlying()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    #[default]
    Page,
    Data,
}

/// Where a collection's files live. Opaque to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSource {
    pub driver: String,
    pub base: String,
    #[serde(default)]
    pub prefix: String,
}

impl CollectionSource {
    pub fn fs(base: &str) -> Self {
        CollectionSource {
            driver: "fs".to_string(),
            base: base.to_string(),
            prefix: String::new(),
        }
    }
}

/// A collection as declared by the user, before base fields are merged in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub kind: Option<CollectionType>,
    pub source: Option<CollectionSource>,
    pub fields: IndexMap<String, FieldDescriptor>,
}

impl Collection {
    pub fn page() -> Self {
        Collection {
            kind: Some(CollectionType::Page),
            ..Default::default()
        }
    }

    pub fn data() -> Self {
        Collection {
            kind: Some(CollectionType::Data),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: CollectionSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn effective_kind(&self) -> CollectionType {
        self.kind.unwrap_or_default()
    }
}
