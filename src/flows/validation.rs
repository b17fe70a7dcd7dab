use super::edges::{ControlFlowEdge, DataFlowEdge};
use super::node::Node;
use crate::error::ValidationError;
use crate::property::{Property, find_property, is_castable};
use ahash::{AHashMap, AHashSet};
use std::sync::Arc;

/// Structural checks of a flow, run in a fixed order.
///
/// In fail-fast mode the validator stops at the first group of checks that reports anything and
/// returns only the first error.
pub(crate) struct FlowValidator<'a> {
    pub flow_name: &'a str,
    pub start_node: &'a Arc<Node>,
    pub nodes: &'a [Arc<Node>],
    pub control_flow_connections: &'a [Arc<ControlFlowEdge>],
    pub data_flow_connections: Option<&'a [Arc<DataFlowEdge>]>,
    pub outputs: &'a [Property],
    pub fail_fast: bool,
}

impl FlowValidator<'_> {
    pub fn run(&self) -> Vec<ValidationError> {
        let checks: [fn(&Self, &mut Vec<ValidationError>); 7] = [
            Self::check_edge_endpoints,
            Self::check_start_node,
            Self::check_start_transitions,
            Self::check_end_nodes,
            Self::check_branches,
            Self::check_outputs,
            Self::check_data_connections,
        ];

        let mut errors = Vec::new();
        for check in checks {
            check(self, &mut errors);
            if self.fail_fast && !errors.is_empty() {
                errors.truncate(1);
                break;
            }
        }
        if !errors.is_empty() {
            tracing::debug!(
                flow = self.flow_name,
                errors = errors.len(),
                "Flow validation failed"
            );
        }
        errors
    }

    fn node_ids(&self) -> AHashSet<&str> {
        self.nodes.iter().map(|node| node.id()).collect()
    }

    fn check_edge_endpoints(&self, errors: &mut Vec<ValidationError>) {
        let node_ids = self.node_ids();
        let mut check = |edge_kind: &'static str, endpoint: &'static str, node: &Arc<Node>| {
            if !node_ids.contains(node.id()) {
                errors.push(ValidationError::EdgeNodeNotInFlow {
                    edge_kind,
                    endpoint,
                    node_name: node.name().to_string(),
                });
            }
        };
        for edge in self.control_flow_connections {
            check("control", "source", &edge.from_node);
            check("control", "destination", &edge.to_node);
        }
        for edge in self.data_flow_connections.unwrap_or_default() {
            check("data", "source", edge.source_node());
            check("data", "destination", edge.destination_node());
        }
    }

    fn check_start_node(&self, errors: &mut Vec<ValidationError>) {
        let starts: Vec<&Arc<Node>> = self.nodes.iter().filter(|node| node.is_start()).collect();
        match starts.as_slice() {
            [start] if start.id() != self.start_node.id() => {
                errors.push(ValidationError::StartNodeMismatch {
                    declared: self.start_node.name().to_string(),
                    found: start.name().to_string(),
                });
            }
            [_] => {}
            _ => errors.push(ValidationError::StartNodeCount {
                flow_name: self.flow_name.to_string(),
                count: starts.len(),
            }),
        }
    }

    fn check_start_transitions(&self, errors: &mut Vec<ValidationError>) {
        let outgoing = self
            .control_flow_connections
            .iter()
            .filter(|edge| edge.from_node.id() == self.start_node.id())
            .count();
        if outgoing != 1 {
            errors.push(ValidationError::StartNodeOutgoingEdges {
                flow_name: self.flow_name.to_string(),
                node_name: self.start_node.name().to_string(),
                count: outgoing,
            });
        }
        for edge in self.control_flow_connections {
            if edge.to_node.is_start() {
                errors.push(ValidationError::TransitionToStart {
                    edge_name: edge.base.name.clone(),
                    node_name: edge.to_node.name().to_string(),
                });
            }
        }
    }

    fn check_end_nodes(&self, errors: &mut Vec<ValidationError>) {
        let ends: Vec<&Arc<Node>> = self.nodes.iter().filter(|node| node.is_end()).collect();
        if ends.is_empty() {
            errors.push(ValidationError::MissingEndNode {
                flow_name: self.flow_name.to_string(),
            });
        }
        for edge in self.control_flow_connections {
            if edge.from_node.is_end() {
                errors.push(ValidationError::TransitionFromEnd {
                    edge_name: edge.base.name.clone(),
                    node_name: edge.from_node.name().to_string(),
                });
            }
        }
        let reached: AHashSet<&str> = self
            .control_flow_connections
            .iter()
            .map(|edge| edge.to_node.id())
            .collect();
        for end in ends {
            if !reached.contains(end.id()) {
                errors.push(ValidationError::UnreachableEndNode {
                    node_name: end.name().to_string(),
                });
            }
        }
    }

    fn check_branches(&self, errors: &mut Vec<ValidationError>) {
        for edge in self.control_flow_connections {
            let node = &edge.from_node;
            if node.is_end() {
                continue;
            }
            let branch = edge.branch();
            if !node.branches().iter().any(|known| known == branch) {
                errors.push(ValidationError::UnknownBranch {
                    edge_name: edge.base.name.clone(),
                    node_name: node.name().to_string(),
                    branch: branch.to_string(),
                    branches: node.branches().to_vec(),
                });
            }
        }
    }

    fn check_outputs(&self, errors: &mut Vec<ValidationError>) {
        let ends: Vec<&Arc<Node>> = self.nodes.iter().filter(|node| node.is_end()).collect();

        let mut first_seen: AHashMap<&str, (&Node, &Property)> = AHashMap::new();
        let mut reported: AHashSet<&str> = AHashSet::new();
        for end in ends.iter().copied() {
            let end: &Node = end;
            for output in end.outputs() {
                match first_seen.get(output.title()) {
                    None => {
                        first_seen.insert(output.title(), (end, output));
                    }
                    Some((first_node, first)) => {
                        let compatible =
                            is_castable(first, output) || is_castable(output, first);
                        if !compatible && reported.insert(output.title()) {
                            errors.push(ValidationError::ConflictingEndOutputs {
                                output: output.title().to_string(),
                                first_node: first_node.name().to_string(),
                                first_type: first.json_type().to_string(),
                                second_node: end.name().to_string(),
                                second_type: output.json_type().to_string(),
                            });
                        }
                    }
                }
            }
        }

        for output in self.outputs.iter().filter(|output| !output.has_default()) {
            let lacking = ends.iter().find(|end| {
                !find_property(end.outputs(), output.title())
                    .is_some_and(|produced| is_castable(produced, output))
            });
            if let Some(end) = lacking {
                errors.push(ValidationError::OutputNotProducedByAllEnds {
                    flow_name: self.flow_name.to_string(),
                    output: output.title().to_string(),
                    node_name: end.name().to_string(),
                });
            }
        }
    }

    fn check_data_connections(&self, errors: &mut Vec<ValidationError>) {
        for edge in self.data_flow_connections.unwrap_or_default() {
            errors.extend(edge.check());
        }
    }
}
