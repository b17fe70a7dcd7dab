use super::edges::{ControlFlowEdge, DataFlowEdge};
use super::node::Node;
use super::validation::FlowValidator;
use crate::component::{Component, ComponentBase};
use crate::error::ValidationError;
use crate::property::{Property, find_property, is_castable};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A directed graph of nodes, connected by control flow edges and optionally data flow edges.
///
/// When `data_flow_connections` is `None`, runtimes route values between nodes by property name.
///
/// Equality is structural, with every shared subflow compared once.
#[derive(Debug, Clone)]
pub struct Flow {
    base: ComponentBase,
    inputs: Vec<Property>,
    outputs: Vec<Property>,
    start_node: Arc<Node>,
    nodes: Vec<Arc<Node>>,
    control_flow_connections: Vec<Arc<ControlFlowEdge>>,
    data_flow_connections: Option<Vec<Arc<DataFlowEdge>>>,
}

impl Flow {
    pub fn builder(base: impl Into<ComponentBase>, start_node: &Arc<Node>) -> FlowBuilder {
        FlowBuilder {
            base: base.into(),
            start_node: start_node.clone(),
            nodes: Vec::new(),
            control_flow_connections: Vec::new(),
            data_flow_connections: None,
            inputs: None,
            outputs: None,
        }
    }

    pub fn base(&self) -> &ComponentBase {
        &self.base
    }

    pub fn id(&self) -> &str {
        &self.base.id
    }

    pub fn name(&self) -> &str {
        &self.base.name
    }

    pub fn inputs(&self) -> &[Property] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Property] {
        &self.outputs
    }

    pub fn start_node(&self) -> &Arc<Node> {
        &self.start_node
    }

    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    pub fn control_flow_connections(&self) -> &[Arc<ControlFlowEdge>] {
        &self.control_flow_connections
    }

    pub fn data_flow_connections(&self) -> Option<&[Arc<DataFlowEdge>]> {
        self.data_flow_connections.as_deref()
    }

    pub fn end_nodes(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.nodes.iter().filter(|node| node.is_end())
    }

    /// Sorted, deduplicated branch names of the EndNodes.
    pub fn end_branch_names(&self) -> Vec<String> {
        self.end_nodes()
            .filter_map(|node| node.end_branch_name())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Re-runs every flow check, collecting all violations.
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        self.validator(false).run()
    }

    fn validator(&self, fail_fast: bool) -> FlowValidator<'_> {
        FlowValidator {
            flow_name: &self.base.name,
            start_node: &self.start_node,
            nodes: &self.nodes,
            control_flow_connections: &self.control_flow_connections,
            data_flow_connections: self.data_flow_connections.as_deref(),
            outputs: &self.outputs,
            fail_fast,
        }
    }

    pub(crate) fn references(&self) -> Vec<Component> {
        let data_edges = self.data_flow_connections.iter().flatten();
        std::iter::once(Component::Node(self.start_node.clone()))
            .chain(self.nodes.iter().cloned().map(Component::Node))
            .chain(
                self.control_flow_connections
                    .iter()
                    .cloned()
                    .map(Component::ControlFlowEdge),
            )
            .chain(data_edges.cloned().map(Component::DataFlowEdge))
            .collect()
    }
}

/// Collects the parts of a [`Flow`] and validates them on [`build`](FlowBuilder::build).
#[derive(Debug, Clone)]
pub struct FlowBuilder {
    base: ComponentBase,
    start_node: Arc<Node>,
    nodes: Vec<Arc<Node>>,
    control_flow_connections: Vec<Arc<ControlFlowEdge>>,
    data_flow_connections: Option<Vec<Arc<DataFlowEdge>>>,
    inputs: Option<Vec<Property>>,
    outputs: Option<Vec<Property>>,
}

impl FlowBuilder {
    /// All nodes of the flow, the start node included.
    pub fn with_nodes<'a>(mut self, nodes: impl IntoIterator<Item = &'a Arc<Node>>) -> Self {
        self.nodes = nodes.into_iter().cloned().collect();
        self
    }

    pub fn with_control_flow_edges<E>(mut self, edges: impl IntoIterator<Item = E>) -> Self
    where
        E: Into<Arc<ControlFlowEdge>>,
    {
        self.control_flow_connections = edges.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_data_flow_edges<E>(mut self, edges: impl IntoIterator<Item = E>) -> Self
    where
        E: Into<Arc<DataFlowEdge>>,
    {
        self.data_flow_connections = Some(edges.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<Property>) -> Self {
        self.inputs = Some(inputs);
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<Property>) -> Self {
        self.outputs = Some(outputs);
        self
    }

    /// Every violation of the flow invariants, without failing.
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        let outputs = self.resolved_outputs();
        self.validator(&outputs, false).run()
    }

    pub fn build(self) -> Result<Arc<Flow>, ValidationError> {
        let outputs = self.resolved_outputs();
        if let Some(error) = self.validator(&outputs, true).run().into_iter().next() {
            return Err(error);
        }
        let inputs = self
            .inputs
            .unwrap_or_else(|| self.start_node.inputs().to_vec());
        Ok(Arc::new(Flow {
            base: self.base,
            inputs,
            outputs,
            start_node: self.start_node,
            nodes: self.nodes,
            control_flow_connections: self.control_flow_connections,
            data_flow_connections: self.data_flow_connections,
        }))
    }

    fn validator<'a>(&'a self, outputs: &'a [Property], fail_fast: bool) -> FlowValidator<'a> {
        FlowValidator {
            flow_name: &self.base.name,
            start_node: &self.start_node,
            nodes: &self.nodes,
            control_flow_connections: &self.control_flow_connections,
            data_flow_connections: self.data_flow_connections.as_deref(),
            outputs,
            fail_fast,
        }
    }

    fn resolved_outputs(&self) -> Vec<Property> {
        match &self.outputs {
            Some(outputs) => outputs.clone(),
            None => infer_flow_outputs(&self.nodes),
        }
    }
}

/// Outputs produced by every EndNode with a type castable to the first EndNode's declaration.
fn infer_flow_outputs(nodes: &[Arc<Node>]) -> Vec<Property> {
    let mut ends = nodes.iter().filter(|node| node.is_end());
    let Some(first) = ends.next() else {
        return Vec::new();
    };
    let others: Vec<&Arc<Node>> = ends.collect();
    first
        .outputs()
        .iter()
        .filter(|output| {
            others.iter().all(|end| {
                find_property(end.outputs(), output.title())
                    .is_some_and(|other| is_castable(other, output))
            })
        })
        .cloned()
        .collect()
}
