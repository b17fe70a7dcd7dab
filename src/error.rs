use crate::version::AgentSpecVersion;
use thiserror::Error;

/// Errors that can occur while reading a JSON Schema into a `Property`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    #[error("A property schema must be a JSON object, found: {0}")]
    NotAnObject(String),

    #[error("Property '{title}' declares an unsupported type '{type_name}'")]
    UnsupportedType { title: String, type_name: String },

    #[error("Property '{title}' has an invalid '{field}' entry: {message}")]
    InvalidField {
        title: String,
        field: String,
        message: String,
    },
}

/// Structural and type violations raised when constructing nodes, edges and flows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("The branches of a node should have no duplicate, found {branches:?} on node '{node_name}'")]
    DuplicateBranches {
        node_name: String,
        branches: Vec<String>,
    },

    #[error("BranchingNode '{node_name}' maps the same input values to several branches: {keys:?}")]
    DuplicateMappingKeys {
        node_name: String,
        keys: Vec<String>,
    },

    #[error(
        "Node '{node_name}' has branches {declared:?} which does not match expected branches {expected:?}"
    )]
    BranchMismatch {
        node_name: String,
        declared: Vec<String>,
        expected: Vec<String>,
    },

    #[error(
        "CatchExceptionNode '{node_name}': subflow contains a branch named '{branch}', which conflicts with the exception branch name"
    )]
    ReservedBranchName { node_name: String, branch: String },

    #[error(
        "CatchExceptionNode '{node_name}': subflow output '{output}' conflicts with the reserved exception information output name"
    )]
    ReservedOutputName { node_name: String, output: String },

    #[error(
        "CatchExceptionNode '{node_name}': provided outputs must have the same names as subflow outputs. Provided: {provided:?}, Subflow: {subflow:?}"
    )]
    OutputNamesMismatch {
        node_name: String,
        provided: Vec<String>,
        subflow: Vec<String>,
    },

    #[error(
        "CatchExceptionNode '{node_name}': output '{output}' must define a default value to be used when exceptions are caught"
    )]
    MissingOutputDefault { node_name: String, output: String },

    #[error(
        "Node '{node_name}' has inputs {provided:?} but its message or subflows require {expected:?}"
    )]
    InputNamesMismatch {
        node_name: String,
        provided: Vec<String>,
        expected: Vec<String>,
    },

    #[error("InputMessageNode '{node_name}' should have exactly one string output, found {outputs:?}")]
    InvalidMessageOutput {
        node_name: String,
        outputs: Vec<String>,
    },

    #[error("OutputMessageNode '{node_name}' should not have outputs, found {outputs:?}")]
    UnexpectedOutputs {
        node_name: String,
        outputs: Vec<String>,
    },

    #[error(
        "Subflows of ParallelFlowNode '{node_name}' have inputs with the same name '{input}' but different types: {first_type} and {second_type}"
    )]
    ConflictingParallelInputs {
        node_name: String,
        input: String,
        first_type: String,
        second_type: String,
    },

    #[error("Subflows of ParallelFlowNode '{node_name}' have outputs with the same name '{output}'")]
    DuplicateParallelOutputs { node_name: String, output: String },

    #[error("Node '{node_name}' defines a reducer for '{output}', which is not an output of its subflow")]
    UnknownReducedOutput { node_name: String, output: String },

    #[error(
        "Node '{node_name}' reduces output '{output}' with '{method}', which needs numbers but the output is {found}"
    )]
    NonNumericReduction {
        node_name: String,
        output: String,
        method: String,
        found: String,
    },

    #[error(
        "Component '{component_name}' specifies some headers in both `headers` and `sensitive_headers`: {headers:?}"
    )]
    OverlappingHeaders {
        component_name: String,
        headers: Vec<String>,
    },

    #[error(
        "A {edge_kind} flow edge was defined, but the flow does not contain the {endpoint} node '{node_name}'"
    )]
    EdgeNodeNotInFlow {
        edge_kind: &'static str,
        endpoint: &'static str,
        node_name: String,
    },

    #[error("A Flow should be composed of exactly one StartNode, flow '{flow_name}' contains {count}")]
    StartNodeCount { flow_name: String, count: usize },

    #[error(
        "The `start_node` is not matching the start node from the list of nodes in the flow `nodes` (start node was '{declared}', found '{found}' in `nodes`)"
    )]
    StartNodeMismatch { declared: String, found: String },

    #[error(
        "The `start_node` '{node_name}' of flow '{flow_name}' should have exactly one outgoing control flow edge, found {count}"
    )]
    StartNodeOutgoingEdges {
        flow_name: String,
        node_name: String,
        count: usize,
    },

    #[error("Transitions to StartNode is not accepted (edge '{edge_name}' targets '{node_name}')")]
    TransitionToStart { edge_name: String, node_name: String },

    #[error("A Flow should be composed of at least one EndNode but didn't find any in `nodes` of flow '{flow_name}'")]
    MissingEndNode { flow_name: String },

    #[error(
        "Found an end node without any incoming control flow edge, which is not permitted (node is '{node_name}')"
    )]
    UnreachableEndNode { node_name: String },

    #[error("Transitions from EndNode is not accepted (edge '{edge_name}' leaves '{node_name}')")]
    TransitionFromEnd { edge_name: String, node_name: String },

    #[error(
        "Control flow edge '{edge_name}' leaves node '{node_name}' through branch '{branch}', which is not one of its branches {branches:?}"
    )]
    UnknownBranch {
        edge_name: String,
        node_name: String,
        branch: String,
        branches: Vec<String>,
    },

    #[error(
        "Output `{output}` of flow '{flow_name}' does not have a default value and EndNode '{node_name}' does not produce it with the expected type"
    )]
    OutputNotProducedByAllEnds {
        flow_name: String,
        output: String,
        node_name: String,
    },

    #[error(
        "Two EndNode outputs have the same name `{output}`, but different types: '{first_node}' declares {first_type} and '{second_node}' declares {second_type}"
    )]
    ConflictingEndOutputs {
        output: String,
        first_node: String,
        first_type: String,
        second_node: String,
        second_type: String,
    },

    #[error(
        "Flow data connection named `{edge_name}` is connected to a property named `{property}` of the {endpoint} node `{node_name}`, but the node does not have any property with that name"
    )]
    UnknownDataProperty {
        edge_name: String,
        endpoint: &'static str,
        node_name: String,
        property: String,
    },

    #[error(
        "Flow data connection named `{edge_name}` connects two properties with incompatible types: node `{destination_node}` expects `{destination_input}` of type {expected}, but node `{source_node}` produces `{source_output}` of type {found}"
    )]
    IncompatibleDataConnection {
        edge_name: String,
        source_node: String,
        source_output: String,
        destination_node: String,
        destination_input: String,
        expected: String,
        found: String,
    },
}

/// Errors related to the format-version bounds of a component graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Unknown agentspec_version '{0}'")]
    UnknownVersion(String),

    #[error(
        "Invalid min/max versioning for component '{component}': min version {min} is greater than max version {max}"
    )]
    InvalidComponentBounds {
        component: String,
        min: AgentSpecVersion,
        max: AgentSpecVersion,
    },

    #[error(
        "Incompatible agentspec_versions: min agentspec_version={min} (bounded by '{min_component}' with id '{min_component_id}') is greater than max agentspec_version={max} (bounded by '{max_component}' with id '{max_component_id}')"
    )]
    IncompatibleBounds {
        min: AgentSpecVersion,
        min_component: String,
        min_component_id: String,
        max: AgentSpecVersion,
        max_component: String,
        max_component_id: String,
    },

    #[error(
        "Invalid agentspec_version: component agentspec_version={requested} but the minimum allowed version is {min} (bounded by '{component}' with id '{component_id}')"
    )]
    BelowMinimum {
        requested: AgentSpecVersion,
        min: AgentSpecVersion,
        component: String,
        component_id: String,
    },

    #[error(
        "Invalid agentspec_version: component agentspec_version={requested} but the maximum allowed version is {max} (bounded by '{component}' with id '{component_id}')"
    )]
    AboveMaximum {
        requested: AgentSpecVersion,
        max: AgentSpecVersion,
        component: String,
        component_id: String,
    },
}

/// Errors raised while wiring a flow by node name with a [`FlowComposer`](crate::flows::FlowComposer).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Node with name '{0}' already exists")]
    DuplicateNodeName(String),

    #[error("{role} node '{node_name}' not found")]
    NodeNotFound {
        role: &'static str,
        node_name: String,
    },

    #[error("Entry point already set")]
    EntryPointAlreadySet,

    #[error("'{0}' is a reserved branch label and cannot be a conditional destination")]
    ReservedBranchLabel(String),

    #[error("Missing start node, make sure to call `set_entry_point`")]
    MissingStartNode,

    #[error("There cannot be more than one start node in a Flow")]
    MultipleStartNodes,

    #[error("Missing finish node, make sure to call `set_finish_points`")]
    MissingFinishNode,

    #[error("It is not necessary to add a StartNode to the list of nodes")]
    LeadingStartNode,

    #[error("It is not necessary to add an EndNode to the list of nodes")]
    TrailingEndNode,

    #[error("A linear flow needs at least one node")]
    EmptySequence,
}

/// Errors raised while registering (de)serialization plugins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    #[error(
        "Component type '{component_type}' is handled by both plugin '{first_plugin}' and plugin '{second_plugin}'"
    )]
    DuplicateComponentType {
        component_type: String,
        first_plugin: String,
        second_plugin: String,
    },

    #[error("Plugin '{plugin}' cannot handle the built-in component type '{component_type}'")]
    BuiltinComponentType {
        plugin: String,
        component_type: String,
    },
}

/// Errors that can occur while turning a component graph into a record.
#[derive(Error, Debug, Clone)]
pub enum SerializationError {
    #[error(transparent)]
    Version(#[from] VersionError),

    #[error("Found a circular dependency during serialization of object with id: '{id}'")]
    CircularDependency { id: String },

    #[error("Disaggregating the root component is not allowed (component '{id}')")]
    DisaggregatedRoot { id: String },

    #[error("No registered plugin can serialize component '{id}' of type '{component_type}'")]
    UnsupportedComponentType { id: String, component_type: String },

    #[error("Plugin '{plugin}' failed to serialize component '{id}': {message}")]
    Plugin {
        plugin: String,
        id: String,
        message: String,
    },

    #[error("Failed to encode record as {format}: {message}")]
    Encoding {
        format: &'static str,
        message: String,
    },
}

/// Errors that can occur while rebuilding a component graph from a record.
#[derive(Error, Debug, Clone)]
pub enum DeserializationError {
    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(
        "The following references to fields or components are missing and should be passed as part of the component registry when deserializing: {0:?}"
    )]
    MissingReferences(Vec<String>),

    #[error("The objects: {0:?} appear multiple times at different levels in referenced components")]
    AmbiguousReferences(Vec<String>),

    #[error("Found a circular dependency during deserialization of object with id: '{id}'")]
    CircularDependency { id: String },

    #[error(
        "Type mismatch when loading component with reference '{reference}': expected '{expected}', got '{found}'"
    )]
    TypeMismatch {
        reference: String,
        expected: String,
        found: String,
    },

    #[error("Type mismatch for ID {reference}: expected Component, got {found}")]
    NotAComponent { reference: String, found: String },

    #[error("The serialized component is missing the `agentspec_version` field")]
    MissingVersion,

    #[error("No built-in type or registered plugin can load component type '{0}'")]
    UnknownComponentType(String),

    #[error("Component '{component}' is missing the required field '{field}'")]
    MissingField { component: String, field: String },

    #[error("Component '{component}' has an invalid '{field}' field: {message}")]
    InvalidField {
        component: String,
        field: String,
        message: String,
    },

    #[error(
        "The serialized object is a disaggregated components configuration, make sure that `import_only_referenced` is set to load it"
    )]
    UnexpectedDisaggregatedConfig,

    #[error(
        "`import_only_referenced` is set, but the serialized object is not a disaggregated components configuration"
    )]
    NotADisaggregatedConfig,

    #[error("Found extra fields on disaggregated components configuration: {0:?}")]
    ExtraFields(Vec<String>),

    #[error("Failed to decode {format}: {message}")]
    Decoding {
        format: &'static str,
        message: String,
    },
}
