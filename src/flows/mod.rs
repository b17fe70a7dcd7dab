//! Flows: graphs of nodes wired by control flow and data flow edges, validated at construction.

mod composer;
mod edges;
mod equality;
mod flow;
mod node;
mod validation;

pub use composer::{ENTRY_NODE_NAME, FlowComposer};
pub use edges::{ControlFlowEdge, DataFlowEdge};
pub use flow::{Flow, FlowBuilder};
pub use node::{
    API_RESPONSE, BRANCHING_MAPPING_KEY, CAUGHT_EXCEPTION_BRANCH, CAUGHT_EXCEPTION_INFO,
    DEFAULT_BRANCH, GENERATED_TEXT, NEXT_BRANCH, Node, NodeBuilder, NodeKind, ReductionMethod,
    Reducers, USER_INPUT,
};
