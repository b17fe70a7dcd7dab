use super::node::{NEXT_BRANCH, Node};
use crate::component::ComponentBase;
use crate::error::ValidationError;
use crate::property::{cast_mismatch, find_property};
use std::sync::Arc;

/// A transition between two nodes, taken when `from_node` exits through `from_branch`.
#[derive(Debug, Clone)]
pub struct ControlFlowEdge {
    pub base: ComponentBase,
    pub from_node: Arc<Node>,
    /// `None` stands for the `"next"` branch.
    pub from_branch: Option<String>,
    pub to_node: Arc<Node>,
}

impl ControlFlowEdge {
    pub fn new(base: impl Into<ComponentBase>, from_node: &Arc<Node>, to_node: &Arc<Node>) -> Self {
        Self {
            base: base.into(),
            from_node: from_node.clone(),
            from_branch: None,
            to_node: to_node.clone(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.from_branch = Some(branch.into());
        self
    }

    /// The branch this edge leaves through.
    pub fn branch(&self) -> &str {
        self.from_branch.as_deref().unwrap_or(NEXT_BRANCH)
    }
}

/// Routes an output of one node into an input of another.
#[derive(Debug, Clone)]
pub struct DataFlowEdge {
    base: ComponentBase,
    source_node: Arc<Node>,
    source_output: String,
    destination_node: Arc<Node>,
    destination_input: String,
}

impl DataFlowEdge {
    /// Fails when either property does not exist or the output cannot be cast to the input.
    pub fn new(
        base: impl Into<ComponentBase>,
        source_node: &Arc<Node>,
        source_output: impl Into<String>,
        destination_node: &Arc<Node>,
        destination_input: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let edge = Self {
            base: base.into(),
            source_node: source_node.clone(),
            source_output: source_output.into(),
            destination_node: destination_node.clone(),
            destination_input: destination_input.into(),
        };
        match edge.check().into_iter().next() {
            Some(error) => Err(error),
            None => Ok(edge),
        }
    }

    pub fn base(&self) -> &ComponentBase {
        &self.base
    }

    pub fn source_node(&self) -> &Arc<Node> {
        &self.source_node
    }

    pub fn source_output(&self) -> &str {
        &self.source_output
    }

    pub fn destination_node(&self) -> &Arc<Node> {
        &self.destination_node
    }

    pub fn destination_input(&self) -> &str {
        &self.destination_input
    }

    pub(crate) fn check(&self) -> Vec<ValidationError> {
        let source = find_property(self.source_node.outputs(), &self.source_output);
        let destination = find_property(self.destination_node.inputs(), &self.destination_input);

        let mut errors = Vec::new();
        if source.is_none() {
            errors.push(self.unknown_property("source", &self.source_node, &self.source_output));
        }
        if destination.is_none() {
            errors.push(self.unknown_property(
                "destination",
                &self.destination_node,
                &self.destination_input,
            ));
        }
        if let (Some(source), Some(destination)) = (source, destination) {
            if let Some((expected, found)) = cast_mismatch(source, destination) {
                errors.push(ValidationError::IncompatibleDataConnection {
                    edge_name: self.base.name.clone(),
                    source_node: self.source_node.name().to_string(),
                    source_output: self.source_output.clone(),
                    destination_node: self.destination_node.name().to_string(),
                    destination_input: self.destination_input.clone(),
                    expected,
                    found,
                });
            }
        }
        errors
    }

    fn unknown_property(&self, endpoint: &'static str, node: &Node, property: &str) -> ValidationError {
        ValidationError::UnknownDataProperty {
            edge_name: self.base.name.clone(),
            endpoint,
            node_name: node.name().to_string(),
            property: property.to_string(),
        }
    }
}
