use super::{Component, ComponentBase};
use crate::version::AgentSpecVersion;
use std::any::Any;
use std::fmt::Debug;

/// A component type defined outside this crate.
///
/// Extension components live in the graph like built-in ones: they are shared through
/// [`Component::Extension`], take part in version resolution through their own bounds and the
/// components they reference, and are (de)serialized by the
/// [`ComponentPlugin`](crate::serialization::ComponentPlugin) registered for their type.
pub trait ExtensionComponent: Debug + Send + Sync + 'static {
    fn base(&self) -> &ComponentBase;

    /// The `component_type` discriminator written to records.
    fn component_type(&self) -> &str;

    /// Components this one holds, in the order its plugin serializes them.
    fn references(&self) -> Vec<Component> {
        Vec::new()
    }

    fn min_agentspec_version(&self) -> AgentSpecVersion {
        AgentSpecVersion::DEFAULT_MIN
    }

    fn max_agentspec_version(&self) -> AgentSpecVersion {
        AgentSpecVersion::CURRENT
    }

    fn as_any(&self) -> &dyn Any;

    /// Structural equality with another extension component.
    fn dyn_eq(&self, other: &dyn ExtensionComponent) -> bool {
        self.component_type() == other.component_type()
            && self.base() == other.base()
            && self.references() == other.references()
    }
}
