use super::plugin::{ComponentPlugin, PluginRegistry};
use super::record::{COMPONENT_TYPE, REFERENCED_COMPONENTS, RecordReader, as_reference};
use super::registry::{ComponentsRegistry, RegistryEntry, json_type_name};
use crate::agent::Agent;
use crate::component::{Component, ComponentBase, ComponentKind};
use crate::error::{DeserializationError, PluginError, VersionError};
use crate::flows::{
    ControlFlowEdge, DataFlowEdge, Flow, NEXT_BRANCH, Node, NodeBuilder, ReductionMethod, Reducers,
};
use crate::llms::{LlmConfig, OpenAiApiType};
use crate::property::Property;
use crate::tools::{HttpRequest, Tool};
use crate::version::{
    AGENTSPEC_VERSION_FIELD, AgentSpecVersion, LEGACY_VERSION_FIELD, resolve_intrinsic_bounds,
};
use ahash::{AHashMap, AHashSet};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

/// What a document loads into.
#[derive(Debug, Clone)]
pub enum Loaded {
    /// A regular document: one root component.
    Component(Component),
    /// A disaggregated components document: components by export id.
    Referenced(AHashMap<String, Component>),
}

impl Loaded {
    pub fn into_component(self) -> Option<Component> {
        match self {
            Loaded::Component(component) => Some(component),
            Loaded::Referenced(_) => None,
        }
    }

    pub fn into_referenced(self) -> Option<AHashMap<String, Component>> {
        match self {
            Loaded::Referenced(components) => Some(components),
            Loaded::Component(_) => None,
        }
    }
}

/// Rebuilds component graphs from records, JSON or YAML.
#[derive(Debug, Default)]
pub struct Deserializer {
    plugins: PluginRegistry,
}

/// Configures a [`Deserializer`] with plugins for extension component types.
#[derive(Default)]
pub struct DeserializerBuilder {
    plugins: Vec<Box<dyn ComponentPlugin>>,
}

impl DeserializerBuilder {
    pub fn with_plugin(mut self, plugin: Box<dyn ComponentPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn build(self) -> Result<Deserializer, PluginError> {
        Ok(Deserializer {
            plugins: PluginRegistry::new(self.plugins)?,
        })
    }
}

impl Deserializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> DeserializerBuilder {
        DeserializerBuilder::default()
    }

    /// Loads a document.
    ///
    /// References that no `$referenced_components` table of the document resolves are looked up
    /// in `registry`. A disaggregated components document is only accepted, and then required,
    /// when `import_only_referenced` is set.
    pub fn from_record(
        &self,
        record: &Value,
        registry: Option<&ComponentsRegistry>,
        import_only_referenced: bool,
    ) -> Result<Loaded, DeserializationError> {
        let map = record.as_object().ok_or_else(|| DeserializationError::Decoding {
            format: "record",
            message: format!("expected a JSON object, got {}", json_type_name(record)),
        })?;
        let version = read_version(map)?;

        let is_disaggregated =
            !map.contains_key(COMPONENT_TYPE) && map.contains_key(REFERENCED_COMPONENTS);
        match (is_disaggregated, import_only_referenced) {
            (true, false) => return Err(DeserializationError::UnexpectedDisaggregatedConfig),
            (false, true) => return Err(DeserializationError::NotADisaggregatedConfig),
            _ => {}
        }

        ReferenceScan::run(record, registry)?;

        let mut ctx = DeserializationContext {
            plugins: &self.plugins,
            registry,
            version,
            scopes: Vec::new(),
            memo: AHashMap::new(),
            in_progress: AHashSet::new(),
        };

        if !is_disaggregated {
            let component = ctx.load_record(map)?;
            resolve_intrinsic_bounds(&component)?.check(version)?;
            return Ok(Loaded::Component(component));
        }

        let extra_fields: Vec<String> = map
            .keys()
            .filter(|key| {
                ![REFERENCED_COMPONENTS, AGENTSPEC_VERSION_FIELD, LEGACY_VERSION_FIELD]
                    .contains(&key.as_str())
            })
            .cloned()
            .collect();
        if !extra_fields.is_empty() {
            return Err(DeserializationError::ExtraFields(extra_fields));
        }

        let table = map
            .get(REFERENCED_COMPONENTS)
            .and_then(Value::as_object)
            .ok_or_else(|| DeserializationError::InvalidField {
                component: "<disaggregated components>".to_string(),
                field: REFERENCED_COMPONENTS.to_string(),
                message: "expected an object".to_string(),
            })?;
        ctx.scopes.push(table);
        let mut components = AHashMap::new();
        for key in table.keys() {
            let component = ctx.resolve_reference(key)?;
            resolve_intrinsic_bounds(&component)?.check(version)?;
            components.insert(key.clone(), component);
        }
        Ok(Loaded::Referenced(components))
    }

    pub fn from_json(
        &self,
        json: &str,
        registry: Option<&ComponentsRegistry>,
        import_only_referenced: bool,
    ) -> Result<Loaded, DeserializationError> {
        let record: Value = serde_json::from_str(json).map_err(|e| DeserializationError::Decoding {
            format: "JSON",
            message: e.to_string(),
        })?;
        self.from_record(&record, registry, import_only_referenced)
    }

    pub fn from_yaml(
        &self,
        yaml: &str,
        registry: Option<&ComponentsRegistry>,
        import_only_referenced: bool,
    ) -> Result<Loaded, DeserializationError> {
        let record: Value = serde_yaml::from_str(yaml).map_err(|e| DeserializationError::Decoding {
            format: "YAML",
            message: e.to_string(),
        })?;
        self.from_record(&record, registry, import_only_referenced)
    }

    /// Loads a regular JSON document into its root component.
    pub fn component_from_json(
        &self,
        json: &str,
        registry: Option<&ComponentsRegistry>,
    ) -> Result<Component, DeserializationError> {
        match self.from_json(json, registry, false)? {
            Loaded::Component(component) => Ok(component),
            Loaded::Referenced(_) => Err(DeserializationError::UnexpectedDisaggregatedConfig),
        }
    }

    /// Loads a regular YAML document into its root component.
    pub fn component_from_yaml(
        &self,
        yaml: &str,
        registry: Option<&ComponentsRegistry>,
    ) -> Result<Component, DeserializationError> {
        match self.from_yaml(yaml, registry, false)? {
            Loaded::Component(component) => Ok(component),
            Loaded::Referenced(_) => Err(DeserializationError::UnexpectedDisaggregatedConfig),
        }
    }

    /// Loads a disaggregated components JSON document into a registry for the main document.
    pub fn referenced_components_from_json(
        &self,
        json: &str,
        registry: Option<&ComponentsRegistry>,
    ) -> Result<ComponentsRegistry, DeserializationError> {
        match self.from_json(json, registry, true)? {
            Loaded::Referenced(components) => Ok(components.into_iter().collect()),
            Loaded::Component(_) => Err(DeserializationError::NotADisaggregatedConfig),
        }
    }

    /// Loads a disaggregated components YAML document into a registry for the main document.
    pub fn referenced_components_from_yaml(
        &self,
        yaml: &str,
        registry: Option<&ComponentsRegistry>,
    ) -> Result<ComponentsRegistry, DeserializationError> {
        match self.from_yaml(yaml, registry, true)? {
            Loaded::Referenced(components) => Ok(components.into_iter().collect()),
            Loaded::Component(_) => Err(DeserializationError::NotADisaggregatedConfig),
        }
    }
}

/// The `reducers` of a map node, `None` when absent.
fn read_reducers(reader: &RecordReader<'_>) -> Result<Option<Reducers>, DeserializationError> {
    let Some(reducers) = reader.optional_object("reducers")? else {
        return Ok(None);
    };
    reducers
        .into_iter()
        .map(|(output, method)| {
            serde_json::from_value::<ReductionMethod>(method)
                .map(|method| (output, method))
                .map_err(|err| reader.invalid("reducers", err.to_string()))
        })
        .collect::<Result<Reducers, _>>()
        .map(Some)
}

fn read_version(map: &Map<String, Value>) -> Result<AgentSpecVersion, DeserializationError> {
    let raw = map
        .get(AGENTSPEC_VERSION_FIELD)
        .or_else(|| map.get(LEGACY_VERSION_FIELD))
        .ok_or(DeserializationError::MissingVersion)?;
    let raw = raw
        .as_str()
        .ok_or_else(|| VersionError::UnknownVersion(raw.to_string()))?;
    let version: AgentSpecVersion = raw.parse()?;
    if version.is_legacy() {
        tracing::warn!(
            declared = %version,
            loaded_as = %version.normalized(),
            "document declares a pre-release agentspec_version"
        );
    }
    Ok(version.normalized())
}

/// Walks a whole document before loading it, to report every unresolvable reference at once.
struct ReferenceScan<'r> {
    registry: Option<&'r ComponentsRegistry>,
    scopes: Vec<&'r Map<String, Value>>,
    enclosing_ids: Vec<&'r str>,
    missing: BTreeSet<String>,
    ambiguous: BTreeSet<String>,
}

impl<'r> ReferenceScan<'r> {
    fn run(
        record: &'r Value,
        registry: Option<&'r ComponentsRegistry>,
    ) -> Result<(), DeserializationError> {
        let mut scan = Self {
            registry,
            scopes: Vec::new(),
            enclosing_ids: Vec::new(),
            missing: BTreeSet::new(),
            ambiguous: BTreeSet::new(),
        };
        scan.visit(record);
        if !scan.ambiguous.is_empty() {
            return Err(DeserializationError::AmbiguousReferences(
                scan.ambiguous.into_iter().collect(),
            ));
        }
        if !scan.missing.is_empty() {
            return Err(DeserializationError::MissingReferences(
                scan.missing.into_iter().collect(),
            ));
        }
        Ok(())
    }

    fn resolves(&self, key: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains_key(key))
            || self.enclosing_ids.contains(&key)
            || self.registry.is_some_and(|registry| registry.contains(key))
    }

    fn visit(&mut self, value: &'r Value) {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.visit(item);
                }
            }
            Value::Object(map) => {
                if let Some(key) = as_reference(value) {
                    if !self.resolves(key) {
                        self.missing.insert(key.to_string());
                    }
                    return;
                }

                let table = map.get(REFERENCED_COMPONENTS).and_then(Value::as_object);
                if let Some(table) = table {
                    for key in table.keys() {
                        if self.scopes.iter().any(|scope| scope.contains_key(key)) {
                            self.ambiguous.insert(key.clone());
                        }
                    }
                    self.scopes.push(table);
                }
                let id = if map.contains_key(COMPONENT_TYPE) {
                    map.get("id").and_then(Value::as_str)
                } else {
                    None
                };
                if let Some(id) = id {
                    self.enclosing_ids.push(id);
                }

                for (key, child) in map {
                    if key != "metadata" {
                        self.visit(child);
                    }
                }

                if id.is_some() {
                    self.enclosing_ids.pop();
                }
                if table.is_some() {
                    self.scopes.pop();
                }
            }
            _ => {}
        }
    }
}

/// State of one deserialization call, handed to plugins.
///
/// Every component is loaded once per call: later references to the same id return the same
/// shared handle.
pub struct DeserializationContext<'d, 'r> {
    plugins: &'d PluginRegistry,
    registry: Option<&'d ComponentsRegistry>,
    version: AgentSpecVersion,
    scopes: Vec<&'r Map<String, Value>>,
    memo: AHashMap<String, Component>,
    in_progress: AHashSet<String>,
}

impl<'d, 'r> DeserializationContext<'d, 'r> {
    /// The version the document declares.
    pub fn version(&self) -> AgentSpecVersion {
        self.version
    }

    /// Loads a field holding a component: an inline record or a reference marker.
    pub fn load_component(
        &mut self,
        value: &'r Value,
        kind: ComponentKind,
    ) -> Result<Component, DeserializationError> {
        let (reference, component) = match (as_reference(value), value) {
            (Some(key), _) => (key.to_string(), self.resolve_reference(key)?),
            (None, Value::Object(map)) if map.contains_key(COMPONENT_TYPE) => {
                let component = self.load_record(map)?;
                (component.id().to_string(), component)
            }
            (None, other) => {
                return Err(DeserializationError::NotAComponent {
                    reference: other.to_string(),
                    found: json_type_name(other).to_string(),
                });
            }
        };
        if !kind.accepts(&component) {
            return Err(DeserializationError::TypeMismatch {
                reference,
                expected: kind.name().to_string(),
                found: component.component_type().to_string(),
            });
        }
        Ok(component)
    }

    pub fn load_properties(&self, value: &Value) -> Result<Vec<Property>, DeserializationError> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| Property::from_json_schema(item).map_err(Into::into))
                .collect(),
            other => Err(DeserializationError::NotAComponent {
                reference: other.to_string(),
                found: json_type_name(other).to_string(),
            }),
        }
    }

    fn load_typed<T: ?Sized>(
        &mut self,
        value: &'r Value,
        kind: ComponentKind,
        extract: fn(&Component) -> Option<&Arc<T>>,
    ) -> Result<Arc<T>, DeserializationError> {
        let component = self.load_component(value, kind)?;
        extract(&component)
            .cloned()
            .ok_or_else(|| DeserializationError::TypeMismatch {
                reference: component.id().to_string(),
                expected: kind.name().to_string(),
                found: component.component_type().to_string(),
            })
    }

    fn load_typed_list<T: ?Sized>(
        &mut self,
        values: &'r [Value],
        kind: ComponentKind,
        extract: fn(&Component) -> Option<&Arc<T>>,
    ) -> Result<Vec<Arc<T>>, DeserializationError> {
        values
            .iter()
            .map(|value| self.load_typed(value, kind, extract))
            .collect()
    }

    /// Resolves a `$component_ref`: enclosing `$referenced_components` tables first, innermost
    /// wins, then the registry.
    fn resolve_reference(&mut self, key: &str) -> Result<Component, DeserializationError> {
        if let Some(depth) = self.scopes.iter().rposition(|scope| scope.contains_key(key)) {
            let record = self.scopes[depth]
                .get(key)
                .and_then(Value::as_object)
                .ok_or_else(|| DeserializationError::InvalidField {
                    component: key.to_string(),
                    field: REFERENCED_COMPONENTS.to_string(),
                    message: "referenced components must be component records".to_string(),
                })?;
            // The referenced record only sees the tables enclosing its own definition.
            let hidden = self.scopes.split_off(depth + 1);
            let result = self.load_record(record);
            self.scopes.extend(hidden);
            return result;
        }

        match self.registry.and_then(|registry| registry.get(key)) {
            Some(RegistryEntry::Component(component)) => return Ok(component.clone()),
            Some(entry @ RegistryEntry::Value(_)) => {
                return Err(DeserializationError::NotAComponent {
                    reference: key.to_string(),
                    found: entry.type_name(),
                });
            }
            None => {}
        }

        if self.in_progress.contains(key) {
            return Err(DeserializationError::CircularDependency { id: key.to_string() });
        }
        Err(DeserializationError::MissingReferences(vec![key.to_string()]))
    }

    fn load_record(&mut self, map: &'r Map<String, Value>) -> Result<Component, DeserializationError> {
        let reader = RecordReader::new(map);
        let id = reader.string("id")?;
        if let Some(component) = self.memo.get(&id) {
            return Ok(component.clone());
        }
        if !self.in_progress.insert(id.clone()) {
            return Err(DeserializationError::CircularDependency { id });
        }

        let own_table = map.get(REFERENCED_COMPONENTS).and_then(Value::as_object);
        if let Some(table) = own_table {
            self.scopes.push(table);
        }
        let result = self.build_component(&reader);
        if own_table.is_some() {
            self.scopes.pop();
        }
        self.in_progress.remove(&id);

        let component = result?;
        self.memo.insert(id, component.clone());
        Ok(component)
    }

    fn build_component(&mut self, reader: &RecordReader<'r>) -> Result<Component, DeserializationError> {
        let component_type = reader.string(COMPONENT_TYPE)?;
        let mut base = reader.base()?;
        base.min_agentspec_version = Some(self.version);

        let component = match component_type.as_str() {
            "Agent" => Component::Agent(Arc::new(self.load_agent(base, reader)?)),
            "Flow" => Component::Flow(self.load_flow(base, reader)?),
            "StartNode" | "EndNode" | "BranchingNode" | "ToolNode" | "LlmNode" | "AgentNode"
            | "ApiNode" | "FlowNode" | "MapNode" | "ParallelMapNode" | "ParallelFlowNode"
            | "CatchExceptionNode" | "InputMessageNode" | "OutputMessageNode" => {
                Component::Node(self.load_node(&component_type, base, reader)?)
            }
            "ControlFlowEdge" => {
                Component::ControlFlowEdge(Arc::new(self.load_control_edge(base, reader)?))
            }
            "DataFlowEdge" => Component::DataFlowEdge(Arc::new(self.load_data_edge(base, reader)?)),
            "ServerTool" | "ClientTool" | "RemoteTool" => {
                Component::Tool(Arc::new(self.load_tool(&component_type, base, reader)?))
            }
            "VllmConfig" | "OllamaConfig" | "OpenAiCompatibleConfig" | "OpenAiConfig" => {
                Component::LlmConfig(Arc::new(self.load_llm_config(&component_type, base, reader)?))
            }
            other => {
                let plugins = self.plugins;
                let plugin = plugins
                    .get(other)
                    .ok_or_else(|| DeserializationError::UnknownComponentType(other.to_string()))?;
                Component::Extension(plugin.deserialize(other, base, reader.map, self)?)
            }
        };
        Ok(component)
    }

    fn load_agent(
        &mut self,
        base: ComponentBase,
        reader: &RecordReader<'r>,
    ) -> Result<Agent, DeserializationError> {
        let llm_config = self.load_typed(
            reader.required("llm_config")?,
            ComponentKind::LlmConfig,
            Component::as_llm_config,
        )?;
        let tools =
            self.load_typed_list(reader.array("tools")?, ComponentKind::Tool, Component::as_tool)?;
        let mut agent =
            Agent::new(base, llm_config, reader.string("system_prompt")?).with_tools(tools);
        if let Some(inputs) = reader.properties("inputs")? {
            agent = agent.with_inputs(inputs);
        }
        if let Some(outputs) = reader.properties("outputs")? {
            agent = agent.with_outputs(outputs);
        }
        Ok(agent)
    }

    fn load_flow(
        &mut self,
        base: ComponentBase,
        reader: &RecordReader<'r>,
    ) -> Result<Arc<Flow>, DeserializationError> {
        let start_node = self.load_typed(
            reader.required("start_node")?,
            ComponentKind::Node,
            Component::as_node,
        )?;
        let nodes = self.load_typed_list(reader.array("nodes")?, ComponentKind::Node, Component::as_node)?;
        let control_edges = self.load_typed_list(
            reader.array("control_flow_connections")?,
            ComponentKind::ControlFlowEdge,
            Component::as_control_flow_edge,
        )?;

        let mut builder = Flow::builder(base, &start_node)
            .with_nodes(&nodes)
            .with_control_flow_edges(control_edges);
        if reader.optional("data_flow_connections").is_some() {
            let data_edges = self.load_typed_list(
                reader.array("data_flow_connections")?,
                ComponentKind::DataFlowEdge,
                Component::as_data_flow_edge,
            )?;
            builder = builder.with_data_flow_edges(data_edges);
        }
        if let Some(inputs) = reader.properties("inputs")? {
            builder = builder.with_inputs(inputs);
        }
        if let Some(outputs) = reader.properties("outputs")? {
            builder = builder.with_outputs(outputs);
        }
        Ok(builder.build()?)
    }

    fn load_node(
        &mut self,
        component_type: &str,
        base: ComponentBase,
        reader: &RecordReader<'r>,
    ) -> Result<Arc<Node>, DeserializationError> {
        let mut builder: NodeBuilder = match component_type {
            "StartNode" => Node::start(base),
            "EndNode" => {
                let branch_name = reader
                    .optional_string("branch_name")?
                    .unwrap_or_else(|| NEXT_BRANCH.to_string());
                Node::end_with_branch(base, branch_name)
            }
            "BranchingNode" => {
                let mapping = reader
                    .object_or_empty("mapping")?
                    .into_iter()
                    .map(|(value, branch)| match branch {
                        Value::String(branch) => Ok((value, branch)),
                        _ => Err(reader.invalid("mapping", "branch names must be strings")),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Node::branching(base, mapping)
            }
            "ToolNode" => {
                let tool =
                    self.load_typed(reader.required("tool")?, ComponentKind::Tool, Component::as_tool)?;
                Node::tool(base, tool)
            }
            "LlmNode" => {
                let llm_config = self.load_typed(
                    reader.required("llm_config")?,
                    ComponentKind::LlmConfig,
                    Component::as_llm_config,
                )?;
                Node::llm(base, llm_config, reader.string("prompt_template")?)
            }
            "AgentNode" => {
                let agent =
                    self.load_typed(reader.required("agent")?, ComponentKind::Agent, Component::as_agent)?;
                Node::agent(base, agent)
            }
            "ApiNode" => {
                let request = self.load_request(&base.id, reader)?;
                Node::api(base, request)
            }
            "ParallelFlowNode" => {
                let subflows =
                    self.load_typed_list(reader.array("subflows")?, ComponentKind::Flow, Component::as_flow)?;
                Node::parallel_flow(base, subflows)
            }
            "InputMessageNode" => Node::input_message(base, reader.optional_string("message")?),
            "OutputMessageNode" => Node::output_message(base, reader.string("message")?),
            _ => {
                let subflow =
                    self.load_typed(reader.required("subflow")?, ComponentKind::Flow, Component::as_flow)?;
                match (component_type, read_reducers(reader)?) {
                    ("FlowNode", _) => Node::flow(base, subflow),
                    ("MapNode", None) => Node::map(base, subflow),
                    ("MapNode", Some(reducers)) => Node::map_with_reducers(base, subflow, reducers),
                    ("ParallelMapNode", None) => Node::parallel_map(base, subflow),
                    ("ParallelMapNode", Some(reducers)) => {
                        Node::parallel_map_with_reducers(base, subflow, reducers)
                    }
                    _ => Node::catch_exception(base, subflow),
                }
            }
        };

        if let Some(inputs) = reader.properties("inputs")? {
            builder = builder.with_inputs(inputs);
        }
        if let Some(outputs) = reader.properties("outputs")? {
            builder = builder.with_outputs(outputs);
        }
        if let Some(branches) = reader.strings("branches")? {
            builder = builder.with_branches(branches);
        }
        Ok(builder.build()?)
    }

    fn load_control_edge(
        &mut self,
        base: ComponentBase,
        reader: &RecordReader<'r>,
    ) -> Result<ControlFlowEdge, DeserializationError> {
        let from_node =
            self.load_typed(reader.required("from_node")?, ComponentKind::Node, Component::as_node)?;
        let to_node =
            self.load_typed(reader.required("to_node")?, ComponentKind::Node, Component::as_node)?;
        let mut edge = ControlFlowEdge::new(base, &from_node, &to_node);
        if let Some(branch) = reader.optional_string("from_branch")? {
            edge = edge.with_branch(branch);
        }
        Ok(edge)
    }

    fn load_data_edge(
        &mut self,
        base: ComponentBase,
        reader: &RecordReader<'r>,
    ) -> Result<DataFlowEdge, DeserializationError> {
        let source_node =
            self.load_typed(reader.required("source_node")?, ComponentKind::Node, Component::as_node)?;
        let destination_node = self.load_typed(
            reader.required("destination_node")?,
            ComponentKind::Node,
            Component::as_node,
        )?;
        Ok(DataFlowEdge::new(
            base,
            &source_node,
            reader.string("source_output")?,
            &destination_node,
            reader.string("destination_input")?,
        )?)
    }

    fn load_tool(
        &mut self,
        component_type: &str,
        base: ComponentBase,
        reader: &RecordReader<'r>,
    ) -> Result<Tool, DeserializationError> {
        let mut tool = match component_type {
            "ServerTool" => Tool::server(base),
            "ClientTool" => Tool::client(base),
            _ => {
                let request = self.load_request(&base.id, reader)?;
                Tool::remote(base, request)?
            }
        };
        tool = tool.with_requires_confirmation(reader.bool_or("requires_confirmation", false)?);
        if let Some(inputs) = reader.properties("inputs")? {
            tool = tool.with_inputs(inputs);
        }
        if let Some(outputs) = reader.properties("outputs")? {
            tool = tool.with_outputs(outputs);
        }
        Ok(tool)
    }

    fn load_request(
        &self,
        component_id: &str,
        reader: &RecordReader<'r>,
    ) -> Result<HttpRequest, DeserializationError> {
        let sensitive_headers = match self.sensitive_value(component_id, reader, "sensitive_headers")? {
            None => Map::new(),
            Some(Value::Object(headers)) => headers,
            Some(_) => return Err(reader.invalid("sensitive_headers", "expected an object")),
        };
        Ok(HttpRequest::new(reader.string("url")?, reader.string("http_method")?)
            .with_data(reader.object_or_empty("data")?)
            .with_query_params(reader.object_or_empty("query_params")?)
            .with_headers(reader.object_or_empty("headers")?)
            .with_sensitive_headers(sensitive_headers))
    }

    fn load_llm_config(
        &mut self,
        component_type: &str,
        base: ComponentBase,
        reader: &RecordReader<'r>,
    ) -> Result<LlmConfig, DeserializationError> {
        let api_key = match self.sensitive_value(&base.id, reader, "api_key")? {
            None => None,
            Some(Value::String(key)) => Some(key),
            Some(_) => return Err(reader.invalid("api_key", "expected a string")),
        };
        let model_id = reader.string("model_id")?;

        let mut config = match component_type {
            "VllmConfig" => LlmConfig::vllm(base, reader.string("url")?, model_id),
            "OllamaConfig" => LlmConfig::ollama(base, reader.string("url")?, model_id),
            "OpenAiCompatibleConfig" => {
                LlmConfig::openai_compatible(base, reader.string("url")?, model_id)
            }
            _ => {
                let api_type = match reader.optional("api_type") {
                    None => OpenAiApiType::default(),
                    Some(value) => serde_json::from_value(value.clone())
                        .map_err(|e| reader.invalid("api_type", e.to_string()))?,
                };
                LlmConfig::openai(base, model_id).with_api_type(api_type)
            }
        };
        if let Some(key) = api_key {
            config = config.with_api_key(key);
        }
        if let Some(parameters) = reader.optional_object("default_generation_parameters")? {
            config = config.with_generation_parameters(parameters);
        }
        Ok(config)
    }

    /// Reads a sensitive field, either inlined or referenced as `"<id>.<field>"`.
    fn sensitive_value(
        &self,
        component_id: &str,
        reader: &RecordReader<'r>,
        field: &str,
    ) -> Result<Option<Value>, DeserializationError> {
        let Some(value) = reader.optional(field) else {
            return Ok(None);
        };
        let Some(key) = as_reference(value) else {
            return Ok(Some(value.clone()));
        };
        match self.registry.and_then(|registry| registry.get(key)) {
            Some(RegistryEntry::Value(value)) => Ok(Some(value.clone())),
            Some(RegistryEntry::Component(component)) => Err(DeserializationError::TypeMismatch {
                reference: key.to_string(),
                expected: format!("value of {}.{}", component_id, field),
                found: component.component_type().to_string(),
            }),
            None => Err(DeserializationError::MissingReferences(vec![key.to_string()])),
        }
    }
}
