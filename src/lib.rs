//! # agentspec - Agent Configuration Component Graphs
//!
//! **agentspec** models declarative agent configurations as graphs of typed components: LLM
//! configurations, tools, agents, and flows of nodes wired by control flow and data flow edges.
//! Every component is validated when it is built, so a graph that exists is a graph that is
//! structurally sound.
//!
//! ## Core Workflow
//!
//! 1.  **Build Components**: Create LLM configurations, tools and agents, then assemble flows
//!     with `Node` and `Flow` builders. Inputs, outputs and branches are inferred where possible.
//! 2.  **Validate**: `build()` fails fast on the first violated invariant.
//!     `validation_errors()` lists them all without failing.
//! 3.  **Serialize**: `Serializer` writes the graph to JSON or YAML at a chosen format version,
//!     writing each shared component once and referencing it elsewhere.
//! 4.  **Load**: `Deserializer` rebuilds the graph, restoring shared components as shared `Arc`s.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use agentspec::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let llm = Arc::new(LlmConfig::vllm("llm", "http://localhost:8000", "llama-3"));
//!
//!     // 1. Build the nodes. The LLM node takes its inputs from the prompt placeholders.
//!     let start = Node::start("start")
//!         .with_inputs(vec![Property::string("topic")])
//!         .build()?;
//!     let write = Node::llm("write", llm, "Write a haiku about {{topic}}").build()?;
//!     let end = Node::end("end")
//!         .with_outputs(vec![Property::string("generated_text")])
//!         .build()?;
//!
//!     // 2. Wire them into a flow. Construction validates the graph.
//!     let flow = Flow::builder("haiku", &start)
//!         .with_nodes([&start, &write, &end])
//!         .with_control_flow_edges([
//!             ControlFlowEdge::new("start_to_write", &start, &write),
//!             ControlFlowEdge::new("write_to_end", &write, &end),
//!         ])
//!         .build()?;
//!
//!     // 3. Serialize at the lowest version the graph supports.
//!     let json = Serializer::new().to_json(&Component::from(flow), None)?;
//!     println!("{}", json);
//!
//!     // 4. Load it back.
//!     let loaded = Deserializer::new().component_from_json(&json, None)?;
//!     assert_eq!(loaded.component_type(), "Flow");
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod component;
pub mod error;
pub mod flows;
pub mod llms;
pub mod prelude;
pub mod property;
pub mod serialization;
pub mod templating;
pub mod tools;
pub mod version;
