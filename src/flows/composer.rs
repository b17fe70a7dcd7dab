use super::edges::{ControlFlowEdge, DataFlowEdge};
use super::flow::Flow;
use super::node::{BRANCHING_MAPPING_KEY, DEFAULT_BRANCH, NEXT_BRANCH, Node};
use crate::component::ComponentBase;
use crate::error::ComposeError;
use crate::property::Property;
use ahash::{AHashMap, AHashSet};
use std::sync::Arc;

/// Name of the StartNode created by [`FlowComposer::set_entry_point`].
pub const ENTRY_NODE_NAME: &str = "StartNode";

/// Wires a flow by node name.
///
/// Nodes are registered once under their name; edges, conditionals, the entry point and the finish
/// points then refer to them by that name. StartNode, EndNodes and the BranchingNodes of
/// conditionals are created on the fly.
///
/// ```
/// use agentspec::flows::{FlowComposer, Node};
///
/// let greet = Node::output_message("greet", "Hello!").build().unwrap();
/// let mut composer = FlowComposer::new();
/// composer.add_node(&greet).unwrap();
/// composer.set_entry_point("greet", None).unwrap();
/// composer.set_finish_points(&["greet"]).unwrap();
/// let flow = composer.build("greeting").unwrap();
/// assert_eq!(flow.nodes().len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlowComposer {
    nodes: Vec<Arc<Node>>,
    positions: AHashMap<String, usize>,
    control_flow_connections: Vec<ControlFlowEdge>,
    data_flow_connections: Vec<DataFlowEdge>,
    start_node: Option<Arc<Node>>,
    conditionals: usize,
    finish_points: usize,
}

impl FlowComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: &Arc<Node>) -> Result<&mut Self, ComposeError> {
        if self.positions.contains_key(node.name()) {
            return Err(ComposeError::DuplicateNodeName(node.name().to_string()));
        }
        self.positions.insert(node.name().to_string(), self.nodes.len());
        self.nodes.push(node.clone());
        Ok(self)
    }

    /// Adds a control flow edge leaving `from` through `from_branch`, `"next"` when `None`.
    pub fn add_edge(
        &mut self,
        from: &str,
        to: &str,
        from_branch: Option<&str>,
    ) -> Result<&mut Self, ComposeError> {
        let from_node = self.node("Start", from)?;
        let to_node = self.node("End", to)?;
        let name = format!(
            "control_edge_{}_{}_{}",
            from,
            to,
            from_branch.unwrap_or(NEXT_BRANCH)
        );
        let mut edge = ControlFlowEdge::new(name, &from_node, &to_node);
        if let Some(branch) = from_branch {
            edge = edge.with_branch(branch);
        }
        self.control_flow_connections.push(edge);
        Ok(self)
    }

    /// Routes output `source_output` of `from` into input `destination_input` of `to`.
    pub fn add_data_edge(
        &mut self,
        from: &str,
        to: &str,
        source_output: &str,
        destination_input: &str,
    ) -> Result<&mut Self, ComposeError> {
        let source = self.node("Source", from)?;
        let destination = self.node("Destination", to)?;
        let name = format!("data_flow_edge_{}_{}_{}", from, to, destination_input);
        let edge = DataFlowEdge::new(name, &source, source_output, &destination, destination_input)?;
        self.data_flow_connections.push(edge);
        Ok(self)
    }

    /// Same as [`add_data_edge`](Self::add_data_edge) when output and input share a name.
    pub fn add_data_edge_by_name(
        &mut self,
        from: &str,
        to: &str,
        property: &str,
    ) -> Result<&mut Self, ComposeError> {
        self.add_data_edge(from, to, property, property)
    }

    /// Adds `nodes` and chains them with `"next"` edges. Nodes added before are not linked.
    pub fn add_sequence(&mut self, nodes: &[Arc<Node>]) -> Result<&mut Self, ComposeError> {
        for node in nodes {
            self.add_node(node)?;
        }
        for (from, to) in nodes.iter().zip(nodes.iter().skip(1)) {
            self.add_edge(from.name(), to.name(), None)?;
        }
        Ok(self)
    }

    /// Branches after `source` on the value of `value_output` of node `value_node`.
    ///
    /// A `ConditionalNode_<n>` BranchingNode is inserted after `source`. Each `(value, node)` of
    /// `destinations` sends that value to the node of that name, anything else goes to
    /// `default_destination`.
    pub fn add_conditional(
        &mut self,
        source: &str,
        (value_node, value_output): (&str, &str),
        destinations: &[(&str, &str)],
        default_destination: &str,
    ) -> Result<&mut Self, ComposeError> {
        if let Some((_, reserved)) = destinations
            .iter()
            .find(|(_, destination)| *destination == DEFAULT_BRANCH)
        {
            return Err(ComposeError::ReservedBranchLabel(reserved.to_string()));
        }
        self.node("Start", source)?;
        self.node("Source", value_node)?;
        for (_, destination) in destinations {
            self.node("End", destination)?;
        }
        self.node("End", default_destination)?;

        self.conditionals += 1;
        let conditional_name = format!("ConditionalNode_{}", self.conditionals);
        let conditional = Node::branching(conditional_name.as_str(), destinations.iter().copied())
            .build()?;
        self.add_node(&conditional)?;
        self.add_edge(source, &conditional_name, None)?;

        let mut linked = AHashSet::new();
        for (_, destination) in destinations {
            if linked.insert(*destination) {
                self.add_edge(&conditional_name, destination, Some(*destination))?;
            }
        }
        self.add_edge(&conditional_name, default_destination, Some(DEFAULT_BRANCH))?;

        let value_source = self.node("Source", value_node)?;
        let edge = DataFlowEdge::new(
            format!("DataEdgeForConditional_{}", self.conditionals),
            &value_source,
            value_output,
            &conditional,
            BRANCHING_MAPPING_KEY,
        )?;
        self.data_flow_connections.push(edge);
        Ok(self)
    }

    /// Creates the StartNode, with `inputs` as flow inputs, and links it to `node`.
    pub fn set_entry_point(
        &mut self,
        node: &str,
        inputs: Option<Vec<Property>>,
    ) -> Result<&mut Self, ComposeError> {
        if self.start_node.is_some() {
            return Err(ComposeError::EntryPointAlreadySet);
        }
        self.node("End", node)?;
        let start = Node::start(ENTRY_NODE_NAME)
            .with_inputs(inputs.unwrap_or_default())
            .build()?;
        self.add_node(&start)?;
        self.add_edge(ENTRY_NODE_NAME, node, None)?;
        self.start_node = Some(start);
        Ok(self)
    }

    /// Creates an `EndNode_<n>` after `node`, exposing `outputs`.
    pub fn set_finish_point(
        &mut self,
        node: &str,
        outputs: Option<Vec<Property>>,
    ) -> Result<&mut Self, ComposeError> {
        self.node("Start", node)?;
        self.finish_points += 1;
        let end_name = format!("EndNode_{}", self.finish_points);
        let mut end = Node::end(end_name.as_str());
        if let Some(outputs) = outputs {
            end = end.with_outputs(outputs);
        }
        self.add_node(&end.build()?)?;
        self.add_edge(node, &end_name, None)?;
        Ok(self)
    }

    pub fn set_finish_points(&mut self, nodes: &[&str]) -> Result<&mut Self, ComposeError> {
        for node in nodes {
            self.set_finish_point(node, None)?;
        }
        Ok(self)
    }

    /// Validates and builds the flow. Data flow edges are kept only when some were added.
    pub fn build(self, base: impl Into<ComponentBase>) -> Result<Arc<Flow>, ComposeError> {
        let start = match self.start_node {
            Some(start) => start,
            None => {
                let mut starts = self.nodes.iter().filter(|node| node.is_start());
                match (starts.next(), starts.next()) {
                    (Some(start), None) => start.clone(),
                    (Some(_), Some(_)) => return Err(ComposeError::MultipleStartNodes),
                    (None, _) => return Err(ComposeError::MissingStartNode),
                }
            }
        };
        if !self.nodes.iter().any(|node| node.is_end()) {
            return Err(ComposeError::MissingFinishNode);
        }

        let base = base.into();
        tracing::debug!(
            flow = %base.name,
            nodes = self.nodes.len(),
            control_edges = self.control_flow_connections.len(),
            data_edges = self.data_flow_connections.len(),
            "composing flow"
        );
        let mut builder = Flow::builder(base, &start)
            .with_nodes(&self.nodes)
            .with_control_flow_edges(self.control_flow_connections);
        if !self.data_flow_connections.is_empty() {
            builder = builder.with_data_flow_edges(self.data_flow_connections);
        }
        Ok(builder.build()?)
    }

    /// Builds `Start -> nodes[0] -> ... -> nodes[n-1] -> End`.
    ///
    /// Without `inputs`, the flow takes every node input no earlier node produces. Without
    /// `outputs`, it exposes every node output, in order of first appearance. Each entry of
    /// `data_flow_edges` is `(from, to, source_output, destination_input)`.
    pub fn build_linear_flow(
        base: impl Into<ComponentBase>,
        nodes: &[Arc<Node>],
        data_flow_edges: &[(&str, &str, &str, &str)],
        inputs: Option<Vec<Property>>,
        outputs: Option<Vec<Property>>,
    ) -> Result<Arc<Flow>, ComposeError> {
        let (Some(first), Some(last)) = (nodes.first(), nodes.last()) else {
            return Err(ComposeError::EmptySequence);
        };
        if first.is_start() {
            return Err(ComposeError::LeadingStartNode);
        }
        if last.is_end() {
            return Err(ComposeError::TrailingEndNode);
        }

        let mut composer = Self::new();
        composer.add_sequence(nodes)?;
        for (from, to, source_output, destination_input) in data_flow_edges {
            composer.add_data_edge(from, to, source_output, destination_input)?;
        }
        let inputs = inputs.unwrap_or_else(|| unproduced_inputs(nodes));
        let outputs = outputs.unwrap_or_else(|| produced_outputs(nodes));
        composer.set_entry_point(first.name(), Some(inputs))?;
        composer.set_finish_point(last.name(), Some(outputs))?;
        composer.build(base)
    }

    fn node(&self, role: &'static str, name: &str) -> Result<Arc<Node>, ComposeError> {
        self.positions
            .get(name)
            .map(|&position| self.nodes[position].clone())
            .ok_or_else(|| ComposeError::NodeNotFound {
                role,
                node_name: name.to_string(),
            })
    }
}

/// Inputs of a sequence that no earlier node outputs, first occurrence wins.
fn unproduced_inputs(nodes: &[Arc<Node>]) -> Vec<Property> {
    let mut produced = AHashSet::new();
    let mut seen = AHashSet::new();
    let mut inputs = Vec::new();
    for node in nodes {
        for input in node.inputs() {
            if !produced.contains(input.title()) && seen.insert(input.title()) {
                inputs.push(input.clone());
            }
        }
        produced.extend(node.outputs().iter().map(Property::title));
    }
    inputs
}

fn produced_outputs(nodes: &[Arc<Node>]) -> Vec<Property> {
    let mut seen = AHashSet::new();
    nodes
        .iter()
        .flat_map(|node| node.outputs())
        .filter(|output| seen.insert(output.title().to_string()))
        .cloned()
        .collect()
}
