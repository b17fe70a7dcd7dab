use super::edges::{ControlFlowEdge, DataFlowEdge};
use super::flow::Flow;
use super::node::{Node, NodeKind};
use ahash::AHashSet;
use std::sync::Arc;

/// Structural comparison of flow graphs.
///
/// Subflows and nodes are shared between many parents, so a pair of handles is compared once per
/// comparison and assumed equal when met again. A mismatch anywhere makes the whole comparison
/// false, so the assumption never hides one.
#[derive(Default)]
pub(crate) struct GraphEq {
    visited: AHashSet<(usize, usize)>,
}

fn address<T>(handle: &Arc<T>) -> usize {
    Arc::as_ptr(handle) as usize
}

impl GraphEq {
    /// Whether the pair still needs comparing.
    fn enter<T>(&mut self, a: &Arc<T>, b: &Arc<T>) -> bool {
        !Arc::ptr_eq(a, b) && self.visited.insert((address(a), address(b)))
    }

    fn pairwise<T>(&mut self, a: &[T], b: &[T], eq: fn(&mut Self, &T, &T) -> bool) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| eq(self, x, y))
    }

    fn flow(&mut self, a: &Arc<Flow>, b: &Arc<Flow>) -> bool {
        !self.enter(a, b) || self.flow_fields(a, b)
    }

    fn node(&mut self, a: &Arc<Node>, b: &Arc<Node>) -> bool {
        !self.enter(a, b) || self.node_fields(a, b)
    }

    pub fn flow_fields(&mut self, a: &Flow, b: &Flow) -> bool {
        a.base() == b.base()
            && a.inputs() == b.inputs()
            && a.outputs() == b.outputs()
            && self.node(a.start_node(), b.start_node())
            && self.pairwise(a.nodes(), b.nodes(), Self::node)
            && self.pairwise(
                a.control_flow_connections(),
                b.control_flow_connections(),
                |eq, x, y| eq.control_edge(x, y),
            )
            && match (a.data_flow_connections(), b.data_flow_connections()) {
                (Some(x), Some(y)) => self.pairwise(x, y, |eq, x, y| eq.data_edge(x, y)),
                (None, None) => true,
                _ => false,
            }
    }

    pub fn node_fields(&mut self, a: &Node, b: &Node) -> bool {
        a.base() == b.base()
            && a.inputs() == b.inputs()
            && a.outputs() == b.outputs()
            && a.branches() == b.branches()
            && self.kind(a.kind(), b.kind())
    }

    pub fn kind(&mut self, a: &NodeKind, b: &NodeKind) -> bool {
        match (a, b) {
            (NodeKind::Start, NodeKind::Start) => true,
            (NodeKind::End { branch_name: x }, NodeKind::End { branch_name: y }) => x == y,
            (NodeKind::Branching { mapping: x }, NodeKind::Branching { mapping: y }) => x == y,
            (NodeKind::Tool { tool: x }, NodeKind::Tool { tool: y }) => x == y,
            (
                NodeKind::Llm {
                    llm_config: x_config,
                    prompt_template: x_template,
                },
                NodeKind::Llm {
                    llm_config: y_config,
                    prompt_template: y_template,
                },
            ) => x_config == y_config && x_template == y_template,
            (NodeKind::Agent { agent: x }, NodeKind::Agent { agent: y }) => x == y,
            (NodeKind::Api { request: x }, NodeKind::Api { request: y }) => x == y,
            (NodeKind::Flow { subflow: x }, NodeKind::Flow { subflow: y })
            | (NodeKind::CatchException { subflow: x }, NodeKind::CatchException { subflow: y }) => {
                self.flow(x, y)
            }
            (
                NodeKind::Map {
                    subflow: x,
                    reducers: x_reducers,
                },
                NodeKind::Map {
                    subflow: y,
                    reducers: y_reducers,
                },
            )
            | (
                NodeKind::ParallelMap {
                    subflow: x,
                    reducers: x_reducers,
                },
                NodeKind::ParallelMap {
                    subflow: y,
                    reducers: y_reducers,
                },
            ) => x_reducers == y_reducers && self.flow(x, y),
            (NodeKind::ParallelFlow { subflows: x }, NodeKind::ParallelFlow { subflows: y }) => {
                self.pairwise(x, y, Self::flow)
            }
            (NodeKind::InputMessage { message: x }, NodeKind::InputMessage { message: y }) => {
                x == y
            }
            (NodeKind::OutputMessage { message: x }, NodeKind::OutputMessage { message: y }) => {
                x == y
            }
            _ => false,
        }
    }

    pub fn control_edge(&mut self, a: &ControlFlowEdge, b: &ControlFlowEdge) -> bool {
        a.base == b.base
            && a.from_branch == b.from_branch
            && self.node(&a.from_node, &b.from_node)
            && self.node(&a.to_node, &b.to_node)
    }

    pub fn data_edge(&mut self, a: &DataFlowEdge, b: &DataFlowEdge) -> bool {
        a.base() == b.base()
            && a.source_output() == b.source_output()
            && a.destination_input() == b.destination_input()
            && self.node(a.source_node(), b.source_node())
            && self.node(a.destination_node(), b.destination_node())
    }
}

impl PartialEq for Flow {
    fn eq(&self, other: &Self) -> bool {
        GraphEq::default().flow_fields(self, other)
    }
}

impl Eq for Flow {}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        GraphEq::default().node_fields(self, other)
    }
}

impl Eq for Node {}

impl PartialEq for NodeKind {
    fn eq(&self, other: &Self) -> bool {
        GraphEq::default().kind(self, other)
    }
}

impl Eq for NodeKind {}

impl PartialEq for ControlFlowEdge {
    fn eq(&self, other: &Self) -> bool {
        GraphEq::default().control_edge(self, other)
    }
}

impl Eq for ControlFlowEdge {}

impl PartialEq for DataFlowEdge {
    fn eq(&self, other: &Self) -> bool {
        GraphEq::default().data_edge(self, other)
    }
}

impl Eq for DataFlowEdge {}
