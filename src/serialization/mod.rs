//! Conversion between component graphs and JSON/YAML documents.
//!
//! A document is a tree of component records. Components used in more than one place are written
//! once, in the `$referenced_components` table of the innermost component that encloses all their
//! uses, and referenced elsewhere by `{"$component_ref": "<id>"}`. Loading restores the sharing:
//! every reference to one id yields the same `Arc`.
//!
//! Components can also be disaggregated: written to a separate document and supplied back through
//! a [`ComponentsRegistry`] when loading. Sensitive values (API keys, sensitive headers) are always
//! disaggregated this way, under the key `"<component id>.<field>"`.

mod deserializer;
mod placement;
mod plugin;
mod record;
mod registry;
mod serializer;

pub use deserializer::{DeserializationContext, Deserializer, DeserializerBuilder, Loaded};
pub use plugin::{ComponentPlugin, PluginRegistry};
pub use record::{COMPONENT_REF, COMPONENT_TYPE, REFERENCED_COMPONENTS};
pub use registry::{ComponentsRegistry, RegistryEntry};
pub use serializer::{DisaggregatedComponents, SerializationContext, Serializer, SerializerBuilder};
