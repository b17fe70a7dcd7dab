//! Field names and low-level helpers shared by the serializer and the deserializer.

use crate::component::ComponentBase;
use crate::error::DeserializationError;
use crate::property::Property;
use serde_json::{Map, Value};

/// Key of a reference marker: `{"$component_ref": "<id>"}`.
pub const COMPONENT_REF: &str = "$component_ref";
/// Key of the table holding shared components inside a record.
pub const REFERENCED_COMPONENTS: &str = "$referenced_components";
/// Discriminator of every component record.
pub const COMPONENT_TYPE: &str = "component_type";

/// Builds a `{"$component_ref": key}` marker.
pub(crate) fn reference_marker(key: &str) -> Value {
    let mut marker = Map::new();
    marker.insert(COMPONENT_REF.to_string(), Value::String(key.to_string()));
    Value::Object(marker)
}

/// The key of a reference marker, if `value` is one.
pub(crate) fn as_reference(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get(COMPONENT_REF).and_then(Value::as_str),
        _ => None,
    }
}

/// Registry key of a sensitive field.
pub(crate) fn sensitive_field_key(component_id: &str, field: &str) -> String {
    format!("{}.{}", component_id, field)
}

pub(crate) fn write_header(record: &mut Map<String, Value>, component_type: &str, base: &ComponentBase) {
    record.insert(COMPONENT_TYPE.to_string(), Value::String(component_type.to_string()));
    record.insert("id".to_string(), Value::String(base.id.clone()));
    record.insert("name".to_string(), Value::String(base.name.clone()));
    record.insert(
        "description".to_string(),
        base.description.clone().map_or(Value::Null, Value::String),
    );
    if let Some(metadata) = &base.metadata {
        record.insert("metadata".to_string(), Value::Object(metadata.clone()));
    }
}

pub(crate) fn properties_to_value(properties: &[Property]) -> Value {
    Value::Array(properties.iter().map(Property::to_json_schema).collect())
}

/// Typed access to the fields of one component record, with errors naming the component.
pub(crate) struct RecordReader<'r> {
    pub(crate) map: &'r Map<String, Value>,
    component: String,
}

impl<'r> RecordReader<'r> {
    pub(crate) fn new(map: &'r Map<String, Value>) -> Self {
        let component = map
            .get("name")
            .or_else(|| map.get("id"))
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>")
            .to_string();
        Self { map, component }
    }

    pub(crate) fn invalid(&self, field: &str, message: impl Into<String>) -> DeserializationError {
        DeserializationError::InvalidField {
            component: self.component.clone(),
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// A field that must be present and non-null.
    pub(crate) fn required(&self, field: &str) -> Result<&'r Value, DeserializationError> {
        match self.map.get(field) {
            Some(Value::Null) | None => Err(DeserializationError::MissingField {
                component: self.component.clone(),
                field: field.to_string(),
            }),
            Some(value) => Ok(value),
        }
    }

    /// A field treated as absent when missing or null.
    pub(crate) fn optional(&self, field: &str) -> Option<&'r Value> {
        self.map.get(field).filter(|value| !value.is_null())
    }

    pub(crate) fn string(&self, field: &str) -> Result<String, DeserializationError> {
        self.required(field)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(field, "expected a string"))
    }

    pub(crate) fn optional_string(&self, field: &str) -> Result<Option<String>, DeserializationError> {
        match self.optional(field) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(_) => Err(self.invalid(field, "expected a string")),
        }
    }

    pub(crate) fn bool_or(&self, field: &str, default: bool) -> Result<bool, DeserializationError> {
        match self.optional(field) {
            None => Ok(default),
            Some(Value::Bool(value)) => Ok(*value),
            Some(_) => Err(self.invalid(field, "expected a boolean")),
        }
    }

    pub(crate) fn object_or_empty(&self, field: &str) -> Result<Map<String, Value>, DeserializationError> {
        match self.optional(field) {
            None => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(self.invalid(field, "expected an object")),
        }
    }

    pub(crate) fn optional_object(
        &self,
        field: &str,
    ) -> Result<Option<Map<String, Value>>, DeserializationError> {
        match self.optional(field) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map.clone())),
            Some(_) => Err(self.invalid(field, "expected an object")),
        }
    }

    pub(crate) fn array(&self, field: &str) -> Result<&'r [Value], DeserializationError> {
        match self.optional(field) {
            None => Ok(&[]),
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(self.invalid(field, "expected an array")),
        }
    }

    /// `None` when the field is absent, so that the component infers its own properties.
    pub(crate) fn properties(&self, field: &str) -> Result<Option<Vec<Property>>, DeserializationError> {
        if self.optional(field).is_none() {
            return Ok(None);
        }
        let properties = self
            .array(field)?
            .iter()
            .map(Property::from_json_schema)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(properties))
    }

    pub(crate) fn strings(&self, field: &str) -> Result<Option<Vec<String>>, DeserializationError> {
        if self.optional(field).is_none() {
            return Ok(None);
        }
        self.array(field)?
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid(field, "expected an array of strings"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    pub(crate) fn base(&self) -> Result<ComponentBase, DeserializationError> {
        let mut base = ComponentBase::new(self.string("name")?).with_id(self.string("id")?);
        base.description = self.optional_string("description")?;
        base.metadata = self.optional_object("metadata")?;
        Ok(base)
    }
}
