//! Typed value descriptors used for component inputs and outputs.
//!
//! A [`Property`] describes the shape of a named value: its title (which doubles as the variable
//! name used for implicit wiring), an optional description, a JSON-Schema-shaped [`JsonType`] and
//! an optional default. Properties are immutable values compared structurally.

use serde_json::Value;
use std::fmt;

mod cast;
mod schema;

pub use cast::{cast_mismatch, is_castable, is_type_castable};

/// The type descriptor of a [`Property`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonType {
    /// Empty schema, matches every value.
    Any,
    String,
    Integer,
    /// JSON `number`, i.e. a float.
    Number,
    Boolean,
    Null,
    /// JSON `array` with the given item type.
    Array(Box<JsonType>),
    /// JSON `object` with arbitrary keys whose values share one type.
    Dict(Box<JsonType>),
    /// JSON `object` with named, typed fields.
    Object(Vec<Property>),
    /// One of several types (`anyOf`).
    Union(Vec<JsonType>),
}

impl JsonType {
    pub fn array(item: JsonType) -> Self {
        JsonType::Array(Box::new(item))
    }

    pub fn dict(value: JsonType) -> Self {
        JsonType::Dict(Box::new(value))
    }

    /// The JSON Schema `type` keyword of primitive types.
    pub fn primitive_name(&self) -> Option<&'static str> {
        match self {
            JsonType::String => Some("string"),
            JsonType::Integer => Some("integer"),
            JsonType::Number => Some("number"),
            JsonType::Boolean => Some("boolean"),
            JsonType::Null => Some("null"),
            _ => None,
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonType::Any => f.write_str("any"),
            JsonType::Array(item) => write!(f, "array[{}]", item),
            JsonType::Dict(value) => write!(f, "dict[{}]", value),
            JsonType::Object(fields) => {
                let names: Vec<&str> = fields.iter().map(Property::title).collect();
                write!(f, "object{{{}}}", names.join(", "))
            }
            JsonType::Union(members) => {
                let rendered: Vec<String> = members.iter().map(ToString::to_string).collect();
                f.write_str(&rendered.join(" | "))
            }
            primitive => f.write_str(primitive.primitive_name().unwrap_or("any")),
        }
    }
}

/// A named, typed value descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    title: String,
    description: Option<String>,
    json_type: JsonType,
    default: Option<Value>,
}

impl Property {
    pub fn new(title: impl Into<String>, json_type: JsonType) -> Self {
        Self {
            title: title.into(),
            description: None,
            json_type,
            default: None,
        }
    }

    pub fn string(title: impl Into<String>) -> Self {
        Self::new(title, JsonType::String)
    }

    pub fn integer(title: impl Into<String>) -> Self {
        Self::new(title, JsonType::Integer)
    }

    pub fn float(title: impl Into<String>) -> Self {
        Self::new(title, JsonType::Number)
    }

    pub fn boolean(title: impl Into<String>) -> Self {
        Self::new(title, JsonType::Boolean)
    }

    pub fn null(title: impl Into<String>) -> Self {
        Self::new(title, JsonType::Null)
    }

    pub fn any(title: impl Into<String>) -> Self {
        Self::new(title, JsonType::Any)
    }

    pub fn list(title: impl Into<String>, item: JsonType) -> Self {
        Self::new(title, JsonType::array(item))
    }

    pub fn dict(title: impl Into<String>, value: JsonType) -> Self {
        Self::new(title, JsonType::dict(value))
    }

    pub fn object(title: impl Into<String>, fields: Vec<Property>) -> Self {
        Self::new(title, JsonType::Object(fields))
    }

    pub fn union(title: impl Into<String>, any_of: Vec<JsonType>) -> Self {
        Self::new(title, JsonType::Union(any_of))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the default value. `Value::Null` is a valid default, distinct from having none.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn json_type(&self) -> &JsonType {
        &self.json_type
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Finds a property by title.
pub fn find_property<'a>(properties: &'a [Property], title: &str) -> Option<&'a Property> {
    properties.iter().find(|property| property.title() == title)
}
