use crate::version::AgentSpecVersion;
use serde_json::{Map, Value};

/// Attributes shared by every component.
///
/// The `id` is the identity of a component: two handles carrying the same id are one logical
/// object, which is what the serializer deduplicates on. Ids are random UUIDs unless pinned.
///
/// Version pins are export metadata. A pinned minimum can only raise the floor a component's
/// type and configuration impose, a pinned maximum can only lower its ceiling. Pins are ignored
/// by equality.
#[derive(Debug, Clone)]
pub struct ComponentBase {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub metadata: Option<Map<String, Value>>,
    pub min_agentspec_version: Option<AgentSpecVersion>,
    pub max_agentspec_version: Option<AgentSpecVersion>,
}

impl ComponentBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            metadata: None,
            min_agentspec_version: None,
            max_agentspec_version: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_min_version(mut self, version: AgentSpecVersion) -> Self {
        self.min_agentspec_version = Some(version);
        self
    }

    pub fn with_max_version(mut self, version: AgentSpecVersion) -> Self {
        self.max_agentspec_version = Some(version);
        self
    }

    /// Effective `(min, max)` of a component whose type allows `[floor, ceiling]`.
    pub(crate) fn pinned_bounds(
        &self,
        floor: AgentSpecVersion,
        ceiling: AgentSpecVersion,
        apply_min_pin: bool,
    ) -> (AgentSpecVersion, AgentSpecVersion) {
        let min = match self.min_agentspec_version {
            Some(pin) if apply_min_pin => pin.max(floor),
            _ => floor,
        };
        let max = self
            .max_agentspec_version
            .map_or(ceiling, |pin| pin.min(ceiling));
        (min, max)
    }
}

impl PartialEq for ComponentBase {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.description == other.description
            && self.metadata == other.metadata
    }
}

impl Eq for ComponentBase {}

impl From<&str> for ComponentBase {
    fn from(name: &str) -> Self {
        ComponentBase::new(name)
    }
}

impl From<String> for ComponentBase {
    fn from(name: String) -> Self {
        ComponentBase::new(name)
    }
}
