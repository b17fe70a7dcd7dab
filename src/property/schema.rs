use super::{JsonType, Property};
use crate::error::PropertyError;
use serde_json::{Map, Value};

impl Property {
    /// Renders this property as an inline JSON Schema.
    pub fn to_json_schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("title".to_string(), Value::String(self.title.clone()));
        if let Some(description) = &self.description {
            schema.insert("description".to_string(), Value::String(description.clone()));
        }
        self.json_type.write_schema(&mut schema);
        if let Some(default) = &self.default {
            schema.insert("default".to_string(), default.clone());
        }
        Value::Object(schema)
    }

    /// Reads a property back from its JSON Schema form.
    pub fn from_json_schema(schema: &Value) -> Result<Self, PropertyError> {
        let map = schema
            .as_object()
            .ok_or_else(|| PropertyError::NotAnObject(schema.to_string()))?;
        let title = match map.get("title") {
            Some(Value::String(title)) => title.clone(),
            _ => {
                return Err(PropertyError::InvalidField {
                    title: String::new(),
                    field: "title".to_string(),
                    message: "a property needs a string title".to_string(),
                });
            }
        };
        Self::from_titled_schema(title, map)
    }

    fn from_titled_schema(title: String, map: &Map<String, Value>) -> Result<Self, PropertyError> {
        let description = match map.get("description") {
            None | Some(Value::Null) => None,
            Some(Value::String(description)) => Some(description.clone()),
            Some(other) => {
                return Err(PropertyError::InvalidField {
                    title,
                    field: "description".to_string(),
                    message: format!("expected a string, found {}", other),
                });
            }
        };
        let json_type = JsonType::read_schema(&title, map)?;
        Ok(Self {
            title,
            description,
            json_type,
            default: map.get("default").cloned(),
        })
    }
}

impl JsonType {
    /// Renders the type as a standalone schema, e.g. for `items`.
    pub fn to_json_schema(&self) -> Value {
        let mut schema = Map::new();
        self.write_schema(&mut schema);
        Value::Object(schema)
    }

    fn write_schema(&self, schema: &mut Map<String, Value>) {
        match self {
            JsonType::Any => {}
            JsonType::Array(item) => {
                schema.insert("type".to_string(), Value::from("array"));
                schema.insert("items".to_string(), item.to_json_schema());
            }
            JsonType::Dict(value) => {
                schema.insert("type".to_string(), Value::from("object"));
                schema.insert("additionalProperties".to_string(), value.to_json_schema());
            }
            JsonType::Object(fields) => {
                let properties: Map<String, Value> = fields
                    .iter()
                    .map(|field| (field.title().to_string(), field.to_json_schema()))
                    .collect();
                schema.insert("type".to_string(), Value::from("object"));
                schema.insert("properties".to_string(), Value::Object(properties));
            }
            JsonType::Union(members) => {
                let any_of = members.iter().map(JsonType::to_json_schema).collect();
                schema.insert("anyOf".to_string(), Value::Array(any_of));
            }
            primitive => {
                if let Some(name) = primitive.primitive_name() {
                    schema.insert("type".to_string(), Value::from(name));
                }
            }
        }
    }

    fn read_schema(title: &str, map: &Map<String, Value>) -> Result<Self, PropertyError> {
        if let Some(any_of) = map.get("anyOf") {
            let members = any_of.as_array().ok_or_else(|| PropertyError::InvalidField {
                title: title.to_string(),
                field: "anyOf".to_string(),
                message: "expected a list of schemas".to_string(),
            })?;
            return members
                .iter()
                .map(|member| Self::read_nested(title, "anyOf", member))
                .collect::<Result<Vec<_>, _>>()
                .map(JsonType::Union);
        }

        match map.get("type") {
            None => Ok(JsonType::Any),
            Some(Value::String(type_name)) => Self::read_named(title, type_name, map),
            Some(Value::Array(type_names)) => type_names
                .iter()
                .map(|type_name| match type_name {
                    Value::String(type_name) => Self::read_named(title, type_name, map),
                    other => Err(PropertyError::UnsupportedType {
                        title: title.to_string(),
                        type_name: other.to_string(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(JsonType::Union),
            Some(other) => Err(PropertyError::UnsupportedType {
                title: title.to_string(),
                type_name: other.to_string(),
            }),
        }
    }

    fn read_named(
        title: &str,
        type_name: &str,
        map: &Map<String, Value>,
    ) -> Result<Self, PropertyError> {
        match type_name {
            "string" => Ok(JsonType::String),
            "integer" => Ok(JsonType::Integer),
            "number" => Ok(JsonType::Number),
            "boolean" => Ok(JsonType::Boolean),
            "null" => Ok(JsonType::Null),
            "array" => match map.get("items") {
                Some(items) => Ok(JsonType::array(Self::read_nested(title, "items", items)?)),
                None => Ok(JsonType::array(JsonType::Any)),
            },
            "object" => {
                if let Some(properties) = map.get("properties") {
                    let properties =
                        properties
                            .as_object()
                            .ok_or_else(|| PropertyError::InvalidField {
                                title: title.to_string(),
                                field: "properties".to_string(),
                                message: "expected a mapping of field schemas".to_string(),
                            })?;
                    let fields = properties
                        .iter()
                        .map(|(name, field)| {
                            let field_map =
                                field.as_object().ok_or_else(|| PropertyError::InvalidField {
                                    title: title.to_string(),
                                    field: name.clone(),
                                    message: "expected a schema object".to_string(),
                                })?;
                            Property::from_titled_schema(name.clone(), field_map)
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(JsonType::Object(fields))
                } else {
                    match map.get("additionalProperties") {
                        Some(value @ Value::Object(_)) => Ok(JsonType::dict(Self::read_nested(
                            title,
                            "additionalProperties",
                            value,
                        )?)),
                        _ => Ok(JsonType::dict(JsonType::Any)),
                    }
                }
            }
            other => Err(PropertyError::UnsupportedType {
                title: title.to_string(),
                type_name: other.to_string(),
            }),
        }
    }

    fn read_nested(title: &str, field: &str, schema: &Value) -> Result<Self, PropertyError> {
        let map = schema.as_object().ok_or_else(|| PropertyError::InvalidField {
            title: title.to_string(),
            field: field.to_string(),
            message: format!("expected a schema object, found {}", schema),
        })?;
        Self::read_schema(title, map)
    }
}
