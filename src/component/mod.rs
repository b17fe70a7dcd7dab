//! The component sum type and the attributes every component shares.

use crate::agent::Agent;
use crate::flows::{ControlFlowEdge, DataFlowEdge, Flow, Node};
use crate::llms::LlmConfig;
use crate::tools::Tool;
use crate::version::AgentSpecVersion;
use std::fmt;
use std::sync::Arc;

mod base;
mod extension;

pub use base::ComponentBase;
pub use extension::ExtensionComponent;

/// Component types handled natively by the serializer and deserializer.
pub const BUILTIN_COMPONENT_TYPES: &[&str] = &[
    "Agent",
    "Flow",
    "StartNode",
    "EndNode",
    "BranchingNode",
    "ToolNode",
    "LlmNode",
    "AgentNode",
    "ApiNode",
    "FlowNode",
    "MapNode",
    "ParallelMapNode",
    "ParallelFlowNode",
    "CatchExceptionNode",
    "InputMessageNode",
    "OutputMessageNode",
    "ControlFlowEdge",
    "DataFlowEdge",
    "ServerTool",
    "ClientTool",
    "RemoteTool",
    "VllmConfig",
    "OllamaConfig",
    "OpenAiCompatibleConfig",
    "OpenAiConfig",
];

/// A shared handle to any component of the graph.
///
/// Cloning a `Component` clones the handle, not the component.
#[derive(Debug, Clone)]
pub enum Component {
    Agent(Arc<Agent>),
    Flow(Arc<Flow>),
    Node(Arc<Node>),
    Tool(Arc<Tool>),
    LlmConfig(Arc<LlmConfig>),
    ControlFlowEdge(Arc<ControlFlowEdge>),
    DataFlowEdge(Arc<DataFlowEdge>),
    Extension(Arc<dyn ExtensionComponent>),
}

impl Component {
    pub fn base(&self) -> &ComponentBase {
        match self {
            Component::Agent(agent) => &agent.base,
            Component::Flow(flow) => flow.base(),
            Component::Node(node) => node.base(),
            Component::Tool(tool) => &tool.base,
            Component::LlmConfig(config) => &config.base,
            Component::ControlFlowEdge(edge) => &edge.base,
            Component::DataFlowEdge(edge) => edge.base(),
            Component::Extension(extension) => extension.base(),
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }

    /// The `component_type` discriminator of this component.
    pub fn component_type(&self) -> &str {
        match self {
            Component::Agent(_) => "Agent",
            Component::Flow(_) => "Flow",
            Component::Node(node) => node.component_type(),
            Component::Tool(tool) => tool.component_type(),
            Component::LlmConfig(config) => config.component_type(),
            Component::ControlFlowEdge(_) => "ControlFlowEdge",
            Component::DataFlowEdge(_) => "DataFlowEdge",
            Component::Extension(extension) => extension.component_type(),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Agent(_) => ComponentKind::Agent,
            Component::Flow(_) => ComponentKind::Flow,
            Component::Node(_) => ComponentKind::Node,
            Component::Tool(_) => ComponentKind::Tool,
            Component::LlmConfig(_) => ComponentKind::LlmConfig,
            Component::ControlFlowEdge(_) => ComponentKind::ControlFlowEdge,
            Component::DataFlowEdge(_) => ComponentKind::DataFlowEdge,
            Component::Extension(_) => ComponentKind::Extension,
        }
    }

    /// The components directly held by this one, one entry per field occurrence, in record order.
    pub fn references(&self) -> Vec<Component> {
        match self {
            Component::Agent(agent) => agent.references(),
            Component::Flow(flow) => flow.references(),
            Component::Node(node) => node.references(),
            Component::Tool(_) | Component::LlmConfig(_) => Vec::new(),
            Component::ControlFlowEdge(edge) => vec![
                Component::Node(edge.from_node.clone()),
                Component::Node(edge.to_node.clone()),
            ],
            Component::DataFlowEdge(edge) => vec![
                Component::Node(edge.source_node().clone()),
                Component::Node(edge.destination_node().clone()),
            ],
            Component::Extension(extension) => extension.references(),
        }
    }

    /// `(min, max)` of this component alone, before looking at what it references.
    pub(crate) fn own_version_bounds(
        &self,
        apply_min_pin: bool,
    ) -> (AgentSpecVersion, AgentSpecVersion) {
        let (floor, ceiling) = match self {
            Component::Node(node) => (node.version_floor(), AgentSpecVersion::CURRENT),
            Component::Tool(tool) => (tool.version_floor(), AgentSpecVersion::CURRENT),
            Component::LlmConfig(config) => (config.version_floor(), AgentSpecVersion::CURRENT),
            Component::Extension(extension) => (
                extension.min_agentspec_version(),
                extension.max_agentspec_version(),
            ),
            _ => (AgentSpecVersion::DEFAULT_MIN, AgentSpecVersion::CURRENT),
        };
        self.base().pinned_bounds(floor, ceiling, apply_min_pin)
    }

    /// Whether both handles point to the same allocation.
    pub fn ptr_eq(&self, other: &Component) -> bool {
        match (self, other) {
            (Component::Agent(a), Component::Agent(b)) => Arc::ptr_eq(a, b),
            (Component::Flow(a), Component::Flow(b)) => Arc::ptr_eq(a, b),
            (Component::Node(a), Component::Node(b)) => Arc::ptr_eq(a, b),
            (Component::Tool(a), Component::Tool(b)) => Arc::ptr_eq(a, b),
            (Component::LlmConfig(a), Component::LlmConfig(b)) => Arc::ptr_eq(a, b),
            (Component::ControlFlowEdge(a), Component::ControlFlowEdge(b)) => Arc::ptr_eq(a, b),
            (Component::DataFlowEdge(a), Component::DataFlowEdge(b)) => Arc::ptr_eq(a, b),
            (Component::Extension(a), Component::Extension(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }

    pub fn as_agent(&self) -> Option<&Arc<Agent>> {
        match self {
            Component::Agent(agent) => Some(agent),
            _ => None,
        }
    }

    pub fn as_flow(&self) -> Option<&Arc<Flow>> {
        match self {
            Component::Flow(flow) => Some(flow),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Arc<Node>> {
        match self {
            Component::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_tool(&self) -> Option<&Arc<Tool>> {
        match self {
            Component::Tool(tool) => Some(tool),
            _ => None,
        }
    }

    pub fn as_llm_config(&self) -> Option<&Arc<LlmConfig>> {
        match self {
            Component::LlmConfig(config) => Some(config),
            _ => None,
        }
    }

    pub fn as_control_flow_edge(&self) -> Option<&Arc<ControlFlowEdge>> {
        match self {
            Component::ControlFlowEdge(edge) => Some(edge),
            _ => None,
        }
    }

    pub fn as_data_flow_edge(&self) -> Option<&Arc<DataFlowEdge>> {
        match self {
            Component::DataFlowEdge(edge) => Some(edge),
            _ => None,
        }
    }

    pub fn as_extension(&self) -> Option<&Arc<dyn ExtensionComponent>> {
        match self {
            Component::Extension(extension) => Some(extension),
            _ => None,
        }
    }

    /// Downcasts an extension component to its concrete type.
    pub fn downcast_extension<T: ExtensionComponent>(&self) -> Option<&T> {
        self.as_extension()
            .and_then(|extension| extension.as_any().downcast_ref::<T>())
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Component::Agent(a), Component::Agent(b)) => a == b,
            (Component::Flow(a), Component::Flow(b)) => a == b,
            (Component::Node(a), Component::Node(b)) => a == b,
            (Component::Tool(a), Component::Tool(b)) => a == b,
            (Component::LlmConfig(a), Component::LlmConfig(b)) => a == b,
            (Component::ControlFlowEdge(a), Component::ControlFlowEdge(b)) => a == b,
            (Component::DataFlowEdge(a), Component::DataFlowEdge(b)) => a == b,
            (Component::Extension(a), Component::Extension(b)) => {
                self.ptr_eq(other) || a.dyn_eq(b.as_ref())
            }
            _ => false,
        }
    }
}

impl Eq for Component {}

macro_rules! impl_component_from {
    ( $( ($variant:ident, $ty:ty) ),* $(,)? ) => {
        $(
            impl From<Arc<$ty>> for Component {
                fn from(component: Arc<$ty>) -> Self {
                    Component::$variant(component)
                }
            }
        )*
    };
}

impl_component_from! {
    (Agent, Agent),
    (Flow, Flow),
    (Node, Node),
    (Tool, Tool),
    (LlmConfig, LlmConfig),
    (ControlFlowEdge, ControlFlowEdge),
    (DataFlowEdge, DataFlowEdge),
}

impl From<Arc<dyn ExtensionComponent>> for Component {
    fn from(component: Arc<dyn ExtensionComponent>) -> Self {
        Component::Extension(component)
    }
}

/// The statically expected type of a component slot, checked when loading references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Any component.
    Any,
    Agent,
    Flow,
    Node,
    Tool,
    LlmConfig,
    ControlFlowEdge,
    DataFlowEdge,
    Extension,
}

impl ComponentKind {
    pub fn accepts(&self, component: &Component) -> bool {
        *self == ComponentKind::Any || *self == component.kind()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Any | ComponentKind::Extension => "Component",
            ComponentKind::Agent => "Agent",
            ComponentKind::Flow => "Flow",
            ComponentKind::Node => "Node",
            ComponentKind::Tool => "Tool",
            ComponentKind::LlmConfig => "LlmConfig",
            ComponentKind::ControlFlowEdge => "ControlFlowEdge",
            ComponentKind::DataFlowEdge => "DataFlowEdge",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
