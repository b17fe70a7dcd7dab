use crate::component::Component;
use ahash::AHashMap;
use serde_json::Value;

/// A value supplied from outside a serialized document.
#[derive(Debug, Clone)]
pub enum RegistryEntry {
    /// Stands in for a disaggregated component.
    Component(Component),
    /// Stands in for a sensitive field such as `"<component id>.api_key"`.
    Value(Value),
}

impl RegistryEntry {
    /// Short name of what the entry holds, used in type mismatch errors.
    pub(crate) fn type_name(&self) -> String {
        match self {
            RegistryEntry::Component(component) => component.component_type().to_string(),
            RegistryEntry::Value(value) => json_type_name(value).to_string(),
        }
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Components and field values that references in a document may resolve to.
///
/// Keys are the reference strings: the export id of a disaggregated component, or
/// `"<component id>.<field>"` for a sensitive field.
#[derive(Debug, Clone, Default)]
pub struct ComponentsRegistry {
    entries: AHashMap<String, RegistryEntry>,
}

impl ComponentsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, key: impl Into<String>, component: impl Into<Component>) -> Self {
        self.insert_component(key, component);
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert_value(key, value);
        self
    }

    pub fn insert_component(&mut self, key: impl Into<String>, component: impl Into<Component>) {
        self.entries
            .insert(key.into(), RegistryEntry::Component(component.into()));
    }

    pub fn insert_value(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), RegistryEntry::Value(value));
    }

    /// Adds every component of a loaded disaggregated configuration under its export id.
    pub fn extend_components(&mut self, components: impl IntoIterator<Item = (String, Component)>) {
        for (key, component) in components {
            self.insert_component(key, component);
        }
    }

    pub fn get(&self, key: &str) -> Option<&RegistryEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Component)> for ComponentsRegistry {
    fn from_iter<I: IntoIterator<Item = (String, Component)>>(iter: I) -> Self {
        let mut registry = Self::new();
        registry.extend_components(iter);
        registry
    }
}
