use super::deserializer::DeserializationContext;
use super::serializer::SerializationContext;
use crate::component::{BUILTIN_COMPONENT_TYPES, ComponentBase, ExtensionComponent};
use crate::error::{DeserializationError, PluginError, SerializationError};
use ahash::AHashMap;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Defines the contract for writing and reading extension component types.
///
/// A plugin only handles the type-specific fields of a record. The common header (`component_type`,
/// `id`, `name`, `description`, `metadata`) and the placement of shared components are handled by
/// the serializer and deserializer.
pub trait ComponentPlugin: Send + Sync {
    fn plugin_name(&self) -> &str;

    /// The `component_type` values this plugin handles.
    fn supported_component_types(&self) -> Vec<String>;

    /// Writes the type-specific fields of `component`, in record order.
    ///
    /// Fields holding components must be written with
    /// [`SerializationContext::serialize_component`] so they take part in reference placement.
    fn serialize(
        &self,
        component: &dyn ExtensionComponent,
        ctx: &mut SerializationContext<'_>,
    ) -> Result<Map<String, Value>, SerializationError>;

    /// Rebuilds a component from its record. `base` is already read from the record header.
    fn deserialize<'r>(
        &self,
        component_type: &str,
        base: ComponentBase,
        record: &'r Map<String, Value>,
        ctx: &mut DeserializationContext<'_, 'r>,
    ) -> Result<Arc<dyn ExtensionComponent>, DeserializationError>;
}

/// Plugins indexed by the component types they handle.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: AHashMap<String, Arc<dyn ComponentPlugin>>,
}

impl PluginRegistry {
    pub fn new(plugins: Vec<Box<dyn ComponentPlugin>>) -> Result<Self, PluginError> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register(Arc::from(plugin))?;
        }
        Ok(registry)
    }

    fn register(&mut self, plugin: Arc<dyn ComponentPlugin>) -> Result<(), PluginError> {
        for component_type in plugin.supported_component_types() {
            if BUILTIN_COMPONENT_TYPES.contains(&component_type.as_str()) {
                return Err(PluginError::BuiltinComponentType {
                    plugin: plugin.plugin_name().to_string(),
                    component_type,
                });
            }
            if let Some(existing) = self.plugins.get(&component_type) {
                return Err(PluginError::DuplicateComponentType {
                    component_type,
                    first_plugin: existing.plugin_name().to_string(),
                    second_plugin: plugin.plugin_name().to_string(),
                });
            }
            self.plugins.insert(component_type, plugin.clone());
        }
        Ok(())
    }

    pub fn get(&self, component_type: &str) -> Option<&Arc<dyn ComponentPlugin>> {
        self.plugins.get(component_type)
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&String> = self.plugins.keys().collect();
        types.sort();
        f.debug_struct("PluginRegistry")
            .field("component_types", &types)
            .finish()
    }
}
