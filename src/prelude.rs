//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the agentspec crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use agentspec::prelude::*;
//! use std::sync::Arc;
//!
//! # fn run_example() -> Result<()> {
//! let llm = Arc::new(LlmConfig::ollama("llm", "http://localhost:11434", "mistral"));
//! let agent = Arc::new(Agent::new("assistant", llm, "You help with {{domain}}"));
//!
//! let yaml = Serializer::new().to_yaml(&Component::from(agent), None)?;
//! let loaded = Deserializer::new().component_from_yaml(&yaml, None)?;
//! println!("Loaded {}", loaded.name());
//! # Ok(())
//! # }
//! ```

// Components
pub use crate::agent::Agent;
pub use crate::component::{Component, ComponentBase, ComponentKind, ExtensionComponent};
pub use crate::flows::{
    ControlFlowEdge, DataFlowEdge, Flow, FlowBuilder, FlowComposer, Node, NodeBuilder, NodeKind,
    ReductionMethod,
};
pub use crate::llms::{LlmConfig, LlmProvider, OpenAiApiType};
pub use crate::tools::{HttpRequest, Tool, ToolKind};

// Properties
pub use crate::property::{JsonType, Property};

// Serialization
pub use crate::serialization::{
    ComponentPlugin, ComponentsRegistry, Deserializer, DisaggregatedComponents, Loaded,
    Serializer,
};
pub use crate::version::AgentSpecVersion;

// Error types
pub use crate::error::{
    ComposeError, DeserializationError, PluginError, PropertyError, SerializationError, ValidationError,
    VersionError,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
