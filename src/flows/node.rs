use super::Flow;
use crate::agent::Agent;
use crate::component::{Component, ComponentBase};
use crate::error::ValidationError;
use crate::llms::LlmConfig;
use crate::property::{JsonType, Property, find_property};
use crate::templating::placeholder_properties;
use crate::tools::{HttpRequest, Tool};
use crate::version::AgentSpecVersion;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Branch taken by nodes with a single way out.
pub const NEXT_BRANCH: &str = "next";
/// Fallback branch of a `BranchingNode`.
pub const DEFAULT_BRANCH: &str = "default";
/// Branch a `CatchExceptionNode` takes when its subflow fails.
pub const CAUGHT_EXCEPTION_BRANCH: &str = "caught_exception_branch";
/// Output of a `CatchExceptionNode` describing the caught failure.
pub const CAUGHT_EXCEPTION_INFO: &str = "caught_exception_info";
/// Default input of a `BranchingNode`.
pub const BRANCHING_MAPPING_KEY: &str = "branching_mapping_key";
/// Default output of an `LlmNode`.
pub const GENERATED_TEXT: &str = "generated_text";
/// Default output of an `ApiNode`.
pub const API_RESPONSE: &str = "response";
/// Default output of an `InputMessageNode`.
pub const USER_INPUT: &str = "user_input";

const MAP_INPUT_PREFIX: &str = "iterated_";
const MAP_OUTPUT_PREFIX: &str = "collected_";

/// How a map node combines the values a subflow output takes across iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReductionMethod {
    Append,
    Sum,
    Average,
    Max,
    Min,
}

impl ReductionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ReductionMethod::Append => "append",
            ReductionMethod::Sum => "sum",
            ReductionMethod::Average => "average",
            ReductionMethod::Max => "max",
            ReductionMethod::Min => "min",
        }
    }

    fn needs_numbers(self) -> bool {
        matches!(self, ReductionMethod::Sum | ReductionMethod::Average)
    }
}

/// Reduction per subflow output title. Outputs without an entry are appended.
pub type Reducers = BTreeMap<String, ReductionMethod>;

/// What a node does, with the kind-specific attributes.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Sole entry point of a flow. Its outputs mirror its inputs.
    Start,
    /// Exit point of a flow. `branch_name` is the branch a wrapping `FlowNode` takes.
    End { branch_name: String },
    /// Routes on the value of its single input, falling back to `"default"`.
    Branching { mapping: Vec<(String, String)> },
    Tool { tool: Arc<Tool> },
    Llm {
        llm_config: Arc<LlmConfig>,
        prompt_template: String,
    },
    Agent { agent: Arc<Agent> },
    Api { request: HttpRequest },
    /// Runs a subflow and continues on the branch of the EndNode it stopped at.
    Flow { subflow: Arc<Flow> },
    /// Runs a subflow once per element of its list inputs.
    Map {
        subflow: Arc<Flow>,
        reducers: Option<Reducers>,
    },
    /// Same as `Map`, with the iterations running concurrently.
    ParallelMap {
        subflow: Arc<Flow>,
        reducers: Option<Reducers>,
    },
    /// Runs several subflows concurrently on the union of their inputs.
    ParallelFlow { subflows: Vec<Arc<Flow>> },
    /// Runs a subflow, turning a failure into the `caught_exception_branch`.
    CatchException { subflow: Arc<Flow> },
    /// Shows an optional message, then waits for the user to answer.
    InputMessage { message: Option<String> },
    /// Shows a message to the user.
    OutputMessage { message: String },
}

impl NodeKind {
    pub fn component_type(&self) -> &'static str {
        match self {
            NodeKind::Start => "StartNode",
            NodeKind::End { .. } => "EndNode",
            NodeKind::Branching { .. } => "BranchingNode",
            NodeKind::Tool { .. } => "ToolNode",
            NodeKind::Llm { .. } => "LlmNode",
            NodeKind::Agent { .. } => "AgentNode",
            NodeKind::Api { .. } => "ApiNode",
            NodeKind::Flow { .. } => "FlowNode",
            NodeKind::Map { .. } => "MapNode",
            NodeKind::ParallelMap { .. } => "ParallelMapNode",
            NodeKind::ParallelFlow { .. } => "ParallelFlowNode",
            NodeKind::CatchException { .. } => "CatchExceptionNode",
            NodeKind::InputMessage { .. } => "InputMessageNode",
            NodeKind::OutputMessage { .. } => "OutputMessageNode",
        }
    }

    /// The message template of a message node.
    fn message(&self) -> Option<&str> {
        match self {
            NodeKind::InputMessage { message } => message.as_deref(),
            NodeKind::OutputMessage { message } => Some(message),
            _ => None,
        }
    }

    /// The branches this kind must declare. `None` when any branch list is accepted.
    fn computed_branches(&self) -> Option<Vec<String>> {
        let branches = match self {
            NodeKind::End { .. } => Vec::new(),
            NodeKind::Agent { .. } => return None,
            NodeKind::Branching { mapping } => mapping
                .iter()
                .map(|(_, branch)| branch.as_str())
                .chain([DEFAULT_BRANCH])
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(str::to_string)
                .collect(),
            NodeKind::Flow { subflow } => subflow.end_branch_names(),
            NodeKind::CatchException { subflow } => std::iter::once(CAUGHT_EXCEPTION_BRANCH.to_string())
                .chain(subflow.end_branch_names())
                .collect(),
            NodeKind::Start
            | NodeKind::Tool { .. }
            | NodeKind::Llm { .. }
            | NodeKind::Api { .. }
            | NodeKind::Map { .. }
            | NodeKind::ParallelMap { .. }
            | NodeKind::ParallelFlow { .. }
            | NodeKind::InputMessage { .. }
            | NodeKind::OutputMessage { .. } => vec![NEXT_BRANCH.to_string()],
        };
        Some(branches)
    }

    fn inferred_inputs(&self) -> Vec<Property> {
        match self {
            NodeKind::Start | NodeKind::End { .. } => Vec::new(),
            NodeKind::Branching { .. } => vec![
                Property::string(BRANCHING_MAPPING_KEY).with_description("Next branch name in the flow"),
            ],
            NodeKind::Tool { tool } => tool.inputs.clone(),
            NodeKind::Llm {
                prompt_template, ..
            } => placeholder_properties([prompt_template.as_str()]),
            NodeKind::Agent { agent } => agent.inputs.clone(),
            NodeKind::Api { request } => request.placeholder_inputs(),
            NodeKind::Flow { subflow } | NodeKind::CatchException { subflow } => {
                subflow.inputs().to_vec()
            }
            NodeKind::Map { subflow, .. } | NodeKind::ParallelMap { subflow, .. } => subflow
                .inputs()
                .iter()
                .map(|input| map_property(MAP_INPUT_PREFIX, input))
                .collect(),
            NodeKind::ParallelFlow { subflows } => subflows
                .iter()
                .flat_map(|subflow| subflow.inputs())
                .unique_by(|input| input.title().to_string())
                .cloned()
                .collect(),
            NodeKind::InputMessage { .. } | NodeKind::OutputMessage { .. } => {
                placeholder_properties(self.message())
            }
        }
    }

    fn inferred_outputs(&self) -> Vec<Property> {
        match self {
            NodeKind::Start | NodeKind::End { .. } | NodeKind::Branching { .. } => Vec::new(),
            NodeKind::Tool { tool } => tool.outputs.clone(),
            NodeKind::Llm { .. } => vec![Property::string(GENERATED_TEXT)],
            NodeKind::Agent { agent } => agent.outputs.clone(),
            NodeKind::Api { .. } => vec![Property::any(API_RESPONSE)],
            NodeKind::Flow { subflow } | NodeKind::CatchException { subflow } => {
                subflow.outputs().to_vec()
            }
            NodeKind::Map { subflow, reducers } | NodeKind::ParallelMap { subflow, reducers } => {
                subflow
                    .outputs()
                    .iter()
                    .map(|output| {
                        let method = reducers
                            .as_ref()
                            .and_then(|reducers| reducers.get(output.title()))
                            .copied()
                            .unwrap_or(ReductionMethod::Append);
                        reduced_property(output, method)
                    })
                    .collect()
            }
            NodeKind::ParallelFlow { subflows } => subflows
                .iter()
                .flat_map(|subflow| subflow.outputs())
                .cloned()
                .collect(),
            NodeKind::InputMessage { .. } => vec![Property::string(USER_INPUT)],
            NodeKind::OutputMessage { .. } => Vec::new(),
        }
    }
}

fn map_property(prefix: &str, property: &Property) -> Property {
    renamed(
        Property::list(
            format!("{}{}", prefix, property.title()),
            property.json_type().clone(),
        ),
        property,
    )
}

/// A collected map output: a list when appended, the item type otherwise.
fn reduced_property(property: &Property, method: ReductionMethod) -> Property {
    match method {
        ReductionMethod::Append => map_property(MAP_OUTPUT_PREFIX, property),
        _ => renamed(
            Property::new(
                format!("{}{}", MAP_OUTPUT_PREFIX, property.title()),
                property.json_type().clone(),
            ),
            property,
        ),
    }
}

fn renamed(mapped: Property, original: &Property) -> Property {
    match original.description() {
        Some(description) => mapped.with_description(description),
        None => mapped,
    }
}

fn caught_exception_info() -> Property {
    Property::union(CAUGHT_EXCEPTION_INFO, vec![JsonType::String, JsonType::Null])
        .with_default(Value::Null)
}

/// A step of a [`Flow`].
#[derive(Debug, Clone)]
pub struct Node {
    base: ComponentBase,
    inputs: Vec<Property>,
    outputs: Vec<Property>,
    branches: Vec<String>,
    kind: NodeKind,
}

impl Node {
    pub fn builder(base: impl Into<ComponentBase>, kind: NodeKind) -> NodeBuilder {
        NodeBuilder {
            base: base.into(),
            kind,
            inputs: None,
            outputs: None,
            branches: None,
        }
    }

    pub fn start(base: impl Into<ComponentBase>) -> NodeBuilder {
        Self::builder(base, NodeKind::Start)
    }

    pub fn end(base: impl Into<ComponentBase>) -> NodeBuilder {
        Self::end_with_branch(base, NEXT_BRANCH)
    }

    pub fn end_with_branch(
        base: impl Into<ComponentBase>,
        branch_name: impl Into<String>,
    ) -> NodeBuilder {
        Self::builder(
            base,
            NodeKind::End {
                branch_name: branch_name.into(),
            },
        )
    }

    pub fn branching<K, V>(
        base: impl Into<ComponentBase>,
        mapping: impl IntoIterator<Item = (K, V)>,
    ) -> NodeBuilder
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mapping = mapping
            .into_iter()
            .map(|(value, branch)| (value.into(), branch.into()))
            .collect();
        Self::builder(base, NodeKind::Branching { mapping })
    }

    pub fn tool(base: impl Into<ComponentBase>, tool: Arc<Tool>) -> NodeBuilder {
        Self::builder(base, NodeKind::Tool { tool })
    }

    pub fn llm(
        base: impl Into<ComponentBase>,
        llm_config: Arc<LlmConfig>,
        prompt_template: impl Into<String>,
    ) -> NodeBuilder {
        Self::builder(
            base,
            NodeKind::Llm {
                llm_config,
                prompt_template: prompt_template.into(),
            },
        )
    }

    pub fn agent(base: impl Into<ComponentBase>, agent: Arc<Agent>) -> NodeBuilder {
        Self::builder(base, NodeKind::Agent { agent })
    }

    pub fn api(base: impl Into<ComponentBase>, request: HttpRequest) -> NodeBuilder {
        Self::builder(base, NodeKind::Api { request })
    }

    pub fn flow(base: impl Into<ComponentBase>, subflow: Arc<Flow>) -> NodeBuilder {
        Self::builder(base, NodeKind::Flow { subflow })
    }

    pub fn map(base: impl Into<ComponentBase>, subflow: Arc<Flow>) -> NodeBuilder {
        Self::builder(
            base,
            NodeKind::Map {
                subflow,
                reducers: None,
            },
        )
    }

    pub fn map_with_reducers(
        base: impl Into<ComponentBase>,
        subflow: Arc<Flow>,
        reducers: Reducers,
    ) -> NodeBuilder {
        Self::builder(
            base,
            NodeKind::Map {
                subflow,
                reducers: Some(reducers),
            },
        )
    }

    pub fn parallel_map(base: impl Into<ComponentBase>, subflow: Arc<Flow>) -> NodeBuilder {
        Self::builder(
            base,
            NodeKind::ParallelMap {
                subflow,
                reducers: None,
            },
        )
    }

    pub fn parallel_map_with_reducers(
        base: impl Into<ComponentBase>,
        subflow: Arc<Flow>,
        reducers: Reducers,
    ) -> NodeBuilder {
        Self::builder(
            base,
            NodeKind::ParallelMap {
                subflow,
                reducers: Some(reducers),
            },
        )
    }

    pub fn parallel_flow(base: impl Into<ComponentBase>, subflows: Vec<Arc<Flow>>) -> NodeBuilder {
        Self::builder(base, NodeKind::ParallelFlow { subflows })
    }

    pub fn input_message(base: impl Into<ComponentBase>, message: Option<String>) -> NodeBuilder {
        Self::builder(base, NodeKind::InputMessage { message })
    }

    pub fn output_message(base: impl Into<ComponentBase>, message: impl Into<String>) -> NodeBuilder {
        Self::builder(
            base,
            NodeKind::OutputMessage {
                message: message.into(),
            },
        )
    }

    pub fn catch_exception(base: impl Into<ComponentBase>, subflow: Arc<Flow>) -> NodeBuilder {
        Self::builder(base, NodeKind::CatchException { subflow })
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

    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn component_type(&self) -> &'static str {
        self.kind.component_type()
    }

    pub fn is_start(&self) -> bool {
        matches!(self.kind, NodeKind::Start)
    }

    pub fn is_end(&self) -> bool {
        matches!(self.kind, NodeKind::End { .. })
    }

    /// The branch name of an EndNode.
    pub fn end_branch_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::End { branch_name } => Some(branch_name),
            _ => None,
        }
    }

    pub(crate) fn references(&self) -> Vec<Component> {
        match &self.kind {
            NodeKind::Tool { tool } => vec![Component::Tool(tool.clone())],
            NodeKind::Llm { llm_config, .. } => vec![Component::LlmConfig(llm_config.clone())],
            NodeKind::Agent { agent } => vec![Component::Agent(agent.clone())],
            NodeKind::Flow { subflow }
            | NodeKind::Map { subflow, .. }
            | NodeKind::ParallelMap { subflow, .. }
            | NodeKind::CatchException { subflow } => vec![Component::Flow(subflow.clone())],
            NodeKind::ParallelFlow { subflows } => {
                subflows.iter().cloned().map(Component::Flow).collect()
            }
            NodeKind::Start
            | NodeKind::End { .. }
            | NodeKind::Branching { .. }
            | NodeKind::Api { .. }
            | NodeKind::InputMessage { .. }
            | NodeKind::OutputMessage { .. } => Vec::new(),
        }
    }

    pub(crate) fn version_floor(&self) -> AgentSpecVersion {
        match &self.kind {
            NodeKind::CatchException { .. } => AgentSpecVersion::V26_2_0,
            NodeKind::ParallelMap { .. } | NodeKind::ParallelFlow { .. } => {
                AgentSpecVersion::V25_4_2
            }
            NodeKind::Api { request } => request.version_floor(),
            _ => AgentSpecVersion::DEFAULT_MIN,
        }
    }
}

/// Assembles a [`Node`], inferring whatever inputs, outputs and branches are not given.
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    base: ComponentBase,
    kind: NodeKind,
    inputs: Option<Vec<Property>>,
    outputs: Option<Vec<Property>>,
    branches: Option<Vec<String>>,
}

impl NodeBuilder {
    pub fn with_inputs(mut self, inputs: Vec<Property>) -> Self {
        self.inputs = Some(inputs);
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<Property>) -> Self {
        self.outputs = Some(outputs);
        self
    }

    pub fn with_branches<S: Into<String>>(mut self, branches: impl IntoIterator<Item = S>) -> Self {
        self.branches = Some(branches.into_iter().map(Into::into).collect());
        self
    }

    /// Every violation of the node invariants, without failing.
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        let (inputs, outputs) = self.resolve_io();
        self.check(&inputs, &outputs, false)
    }

    pub fn build(self) -> Result<Arc<Node>, ValidationError> {
        let (inputs, outputs) = self.resolve_io();
        if let Some(error) = self.check(&inputs, &outputs, true).into_iter().next() {
            return Err(error);
        }
        let branches = match (self.branches, self.kind.computed_branches()) {
            (Some(declared), _) => declared,
            (None, Some(computed)) => computed,
            (None, None) => vec![NEXT_BRANCH.to_string()],
        };
        Ok(Arc::new(Node {
            base: self.base,
            inputs,
            outputs,
            branches,
            kind: self.kind,
        }))
    }

    fn resolve_io(&self) -> (Vec<Property>, Vec<Property>) {
        match &self.kind {
            NodeKind::Start | NodeKind::End { .. } => {
                match (self.inputs.clone(), self.outputs.clone()) {
                    (Some(inputs), Some(outputs)) => (inputs, outputs),
                    (Some(inputs), None) => (inputs.clone(), inputs),
                    (None, Some(outputs)) => (outputs.clone(), outputs),
                    (None, None) => (Vec::new(), Vec::new()),
                }
            }
            NodeKind::CatchException { .. } => {
                let inputs = self
                    .inputs
                    .clone()
                    .unwrap_or_else(|| self.kind.inferred_inputs());
                let mut outputs = self
                    .outputs
                    .clone()
                    .unwrap_or_else(|| self.kind.inferred_outputs());
                if !outputs.iter().any(|output| output.title() == CAUGHT_EXCEPTION_INFO) {
                    outputs.push(caught_exception_info());
                }
                (inputs, outputs)
            }
            _ => (
                self.inputs
                    .clone()
                    .unwrap_or_else(|| self.kind.inferred_inputs()),
                self.outputs
                    .clone()
                    .unwrap_or_else(|| self.kind.inferred_outputs()),
            ),
        }
    }

    fn check(
        &self,
        inputs: &[Property],
        outputs: &[Property],
        fail_fast: bool,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let node_name = &self.base.name;

        if let Some(declared) = &self.branches {
            if declared.iter().duplicates().next().is_some() {
                errors.push(ValidationError::DuplicateBranches {
                    node_name: node_name.clone(),
                    branches: declared.clone(),
                });
            } else if let Some(expected) = self.kind.computed_branches() {
                let declared_set: BTreeSet<&String> = declared.iter().collect();
                let expected_set: BTreeSet<&String> = expected.iter().collect();
                if declared_set != expected_set {
                    errors.push(ValidationError::BranchMismatch {
                        node_name: node_name.clone(),
                        declared: declared.clone(),
                        expected,
                    });
                }
            }
        }
        if fail_fast && !errors.is_empty() {
            return errors;
        }

        match &self.kind {
            NodeKind::Branching { mapping } => {
                let keys: Vec<String> = mapping
                    .iter()
                    .map(|(value, _)| value)
                    .duplicates()
                    .sorted()
                    .cloned()
                    .collect();
                if !keys.is_empty() {
                    errors.push(ValidationError::DuplicateMappingKeys {
                        node_name: node_name.clone(),
                        keys,
                    });
                }
            }
            NodeKind::Api { request } => {
                if let Err(error) = request.validate(node_name) {
                    errors.push(error);
                }
            }
            NodeKind::CatchException { subflow } => {
                errors.extend(check_catch_exception(node_name, subflow, outputs));
            }
            NodeKind::Map { subflow, reducers } | NodeKind::ParallelMap { subflow, reducers } => {
                if let Some(reducers) = reducers {
                    errors.extend(check_reducers(node_name, subflow, reducers));
                }
            }
            NodeKind::ParallelFlow { subflows } => {
                errors.extend(check_parallel_subflows(node_name, subflows));
            }
            NodeKind::InputMessage { .. } => {
                errors.extend(self.check_message_inputs(inputs));
                let single_string = matches!(
                    outputs,
                    [output] if *output.json_type() == JsonType::String
                );
                if !single_string {
                    errors.push(ValidationError::InvalidMessageOutput {
                        node_name: node_name.clone(),
                        outputs: titles(outputs),
                    });
                }
            }
            NodeKind::OutputMessage { .. } => {
                errors.extend(self.check_message_inputs(inputs));
                if !outputs.is_empty() {
                    errors.push(ValidationError::UnexpectedOutputs {
                        node_name: node_name.clone(),
                        outputs: titles(outputs),
                    });
                }
            }
            _ => {}
        }

        if fail_fast {
            errors.truncate(1);
        }
        errors
    }

    /// The inputs of a message node are the placeholders of its message.
    fn check_message_inputs(&self, inputs: &[Property]) -> Option<ValidationError> {
        let provided: BTreeSet<&str> = inputs.iter().map(Property::title).collect();
        let placeholders = self.kind.inferred_inputs();
        let expected: BTreeSet<&str> = placeholders.iter().map(Property::title).collect();
        (provided != expected).then(|| ValidationError::InputNamesMismatch {
            node_name: self.base.name.clone(),
            provided: provided.iter().map(|title| title.to_string()).collect(),
            expected: expected.iter().map(|title| title.to_string()).collect(),
        })
    }
}

fn titles(properties: &[Property]) -> Vec<String> {
    properties
        .iter()
        .map(|property| property.title().to_string())
        .collect()
}

fn check_reducers(node_name: &str, subflow: &Flow, reducers: &Reducers) -> Vec<ValidationError> {
    reducers
        .iter()
        .filter_map(|(title, method)| {
            let Some(output) = find_property(subflow.outputs(), title) else {
                return Some(ValidationError::UnknownReducedOutput {
                    node_name: node_name.to_string(),
                    output: title.clone(),
                });
            };
            let numeric = matches!(
                output.json_type(),
                JsonType::Integer | JsonType::Number | JsonType::Any
            );
            (method.needs_numbers() && !numeric).then(|| ValidationError::NonNumericReduction {
                node_name: node_name.to_string(),
                output: title.clone(),
                method: method.as_str().to_string(),
                found: output.json_type().to_string(),
            })
        })
        .collect()
}

/// Subflows may share an input only with one type, and may not share outputs.
fn check_parallel_subflows(node_name: &str, subflows: &[Arc<Flow>]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut inputs: BTreeMap<&str, &Property> = BTreeMap::new();
    let mut outputs: BTreeSet<&str> = BTreeSet::new();

    for subflow in subflows {
        for input in subflow.inputs() {
            match inputs.get(input.title()) {
                Some(first) if first.json_type() != input.json_type() => {
                    errors.push(ValidationError::ConflictingParallelInputs {
                        node_name: node_name.to_string(),
                        input: input.title().to_string(),
                        first_type: first.json_type().to_string(),
                        second_type: input.json_type().to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    inputs.insert(input.title(), input);
                }
            }
        }
        for output in subflow.outputs() {
            if !outputs.insert(output.title()) {
                errors.push(ValidationError::DuplicateParallelOutputs {
                    node_name: node_name.to_string(),
                    output: output.title().to_string(),
                });
            }
        }
    }
    errors
}

fn check_catch_exception(
    node_name: &str,
    subflow: &Flow,
    outputs: &[Property],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if subflow
        .end_branch_names()
        .iter()
        .any(|branch| branch == CAUGHT_EXCEPTION_BRANCH)
    {
        errors.push(ValidationError::ReservedBranchName {
            node_name: node_name.to_string(),
            branch: CAUGHT_EXCEPTION_BRANCH.to_string(),
        });
    }
    if subflow
        .outputs()
        .iter()
        .any(|output| output.title() == CAUGHT_EXCEPTION_INFO)
    {
        errors.push(ValidationError::ReservedOutputName {
            node_name: node_name.to_string(),
            output: CAUGHT_EXCEPTION_INFO.to_string(),
        });
    }

    let provided: BTreeSet<&str> = outputs.iter().map(Property::title).collect();
    let expected: BTreeSet<&str> = subflow
        .outputs()
        .iter()
        .map(Property::title)
        .chain([CAUGHT_EXCEPTION_INFO])
        .collect();
    if provided != expected {
        errors.push(ValidationError::OutputNamesMismatch {
            node_name: node_name.to_string(),
            provided: provided.iter().map(|title| title.to_string()).collect(),
            subflow: subflow
                .outputs()
                .iter()
                .map(|output| output.title().to_string())
                .sorted()
                .collect(),
        });
    }

    errors.extend(
        outputs
            .iter()
            .filter(|output| !output.has_default())
            .map(|output| ValidationError::MissingOutputDefault {
                node_name: node_name.to_string(),
                output: output.title().to_string(),
            }),
    );
    errors
}
