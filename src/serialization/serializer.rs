use super::placement::Placement;
use super::plugin::{ComponentPlugin, PluginRegistry};
use super::record::{
    REFERENCED_COMPONENTS, properties_to_value, reference_marker, sensitive_field_key,
    write_header,
};
use crate::agent::Agent;
use crate::component::{Component, ExtensionComponent};
use crate::error::{PluginError, SerializationError};
use crate::flows::{ControlFlowEdge, DataFlowEdge, Flow, Node, NodeKind};
use crate::llms::{LlmConfig, LlmProvider};
use crate::property::Property;
use crate::tools::{HttpRequest, Tool, ToolKind};
use crate::version::{AGENTSPEC_VERSION_FIELD, AgentSpecVersion, resolve_version_bounds};
use ahash::{AHashMap, AHashSet};
use serde_json::{Map, Value};

/// Components to export into a separate document, each under an export id.
///
/// The main document references them by export id; the loader expects them back through a
/// [`ComponentsRegistry`](super::ComponentsRegistry) keyed the same way.
#[derive(Debug, Clone, Default)]
pub struct DisaggregatedComponents {
    entries: Vec<(Component, String)>,
}

impl DisaggregatedComponents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exports `component` under its own id.
    pub fn add(self, component: impl Into<Component>) -> Self {
        let component = component.into();
        let export_id = component.id().to_string();
        self.add_with_id(component, export_id)
    }

    pub fn add_with_id(mut self, component: impl Into<Component>, export_id: impl Into<String>) -> Self {
        self.entries.push((component.into(), export_id.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Component id to the export id references use. The first export id of a component wins.
    fn export_ids(&self) -> AHashMap<String, String> {
        let mut export_ids = AHashMap::new();
        for (component, export_id) in &self.entries {
            export_ids
                .entry(component.id().to_string())
                .or_insert_with(|| export_id.clone());
        }
        export_ids
    }

    fn distinct_components(&self) -> Vec<Component> {
        let mut seen = AHashSet::new();
        self.entries
            .iter()
            .filter(|(component, _)| seen.insert(component.id().to_string()))
            .map(|(component, _)| component.clone())
            .collect()
    }
}

/// Ids of the side roots the main document reaches, directly or through other side roots.
fn used_side_roots(
    main_placement: &Placement,
    side_roots: &[Component],
    external: &AHashSet<String>,
) -> Result<AHashSet<String>, SerializationError> {
    let mut used = AHashSet::new();
    let mut pending = Vec::new();
    for side_root in side_roots {
        if main_placement.saw_external(side_root.id()) && used.insert(side_root.id().to_string()) {
            pending.push(side_root);
        }
    }
    while let Some(root) = pending.pop() {
        let placement = Placement::compute(std::slice::from_ref(root), external)?;
        for side_root in side_roots {
            if placement.saw_external(side_root.id()) && used.insert(side_root.id().to_string()) {
                pending.push(side_root);
            }
        }
    }
    Ok(used)
}

/// Turns component graphs into records, JSON or YAML.
#[derive(Debug, Default)]
pub struct Serializer {
    plugins: PluginRegistry,
}

/// Configures a [`Serializer`] with plugins for extension component types.
#[derive(Default)]
pub struct SerializerBuilder {
    plugins: Vec<Box<dyn ComponentPlugin>>,
}

impl SerializerBuilder {
    pub fn with_plugin(mut self, plugin: Box<dyn ComponentPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn build(self) -> Result<Serializer, PluginError> {
        Ok(Serializer {
            plugins: PluginRegistry::new(self.plugins)?,
        })
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> SerializerBuilder {
        SerializerBuilder::default()
    }

    /// Serializes `component` and everything it references into one record.
    ///
    /// Without `version`, the lowest version the graph supports is used.
    pub fn to_record(
        &self,
        component: &Component,
        version: Option<AgentSpecVersion>,
    ) -> Result<Value, SerializationError> {
        let external = AHashMap::new();
        let placement = Placement::compute(std::slice::from_ref(component), &AHashSet::new())?;
        let version = export_version(version, std::slice::from_ref(component))?;
        self.write_document(component, &placement, &external, version)
    }

    /// Serializes `component` into a main record and a side record holding the disaggregated
    /// components, which the main record only references.
    pub fn to_disaggregated_records(
        &self,
        component: &Component,
        version: Option<AgentSpecVersion>,
        disaggregated: &DisaggregatedComponents,
    ) -> Result<(Value, Value), SerializationError> {
        let export_ids = disaggregated.export_ids();
        if export_ids.contains_key(component.id()) {
            return Err(SerializationError::DisaggregatedRoot {
                id: component.id().to_string(),
            });
        }
        let external: AHashSet<String> = export_ids.keys().cloned().collect();

        let main_placement = Placement::compute(std::slice::from_ref(component), &external)?;
        let side_roots = disaggregated.distinct_components();
        let used = used_side_roots(&main_placement, &side_roots, &external)?;
        let mut exported = vec![component.clone()];
        for side_root in &side_roots {
            if !used.contains(side_root.id()) {
                tracing::warn!(
                    id = side_root.id(),
                    name = side_root.name(),
                    "disaggregated component is not used by the serialized component"
                );
                exported.push(side_root.clone());
            }
        }
        let version = export_version(version, &exported)?;

        let main = self.write_document(component, &main_placement, &export_ids, version)?;

        let side_placement = Placement::compute(&side_roots, &external)?;
        let mut ctx = SerializationContext {
            plugins: &self.plugins,
            placement: &side_placement,
            export_ids: &export_ids,
            version,
        };
        let mut table = Map::new();
        for (component, export_id) in &disaggregated.entries {
            let record = ctx.write_record(component)?;
            table.insert(export_id.clone(), Value::Object(record));
        }
        for shared in side_placement.top_level() {
            let record = ctx.write_record(shared)?;
            table.insert(shared.id().to_string(), Value::Object(record));
        }

        let mut side = Map::new();
        side.insert(REFERENCED_COMPONENTS.to_string(), Value::Object(table));
        side.insert(
            AGENTSPEC_VERSION_FIELD.to_string(),
            Value::String(version.to_string()),
        );
        Ok((main, Value::Object(side)))
    }

    pub fn to_json(
        &self,
        component: &Component,
        version: Option<AgentSpecVersion>,
    ) -> Result<String, SerializationError> {
        encode_json(&self.to_record(component, version)?)
    }

    pub fn to_yaml(
        &self,
        component: &Component,
        version: Option<AgentSpecVersion>,
    ) -> Result<String, SerializationError> {
        encode_yaml(&self.to_record(component, version)?)
    }

    pub fn to_disaggregated_json(
        &self,
        component: &Component,
        version: Option<AgentSpecVersion>,
        disaggregated: &DisaggregatedComponents,
    ) -> Result<(String, String), SerializationError> {
        let (main, side) = self.to_disaggregated_records(component, version, disaggregated)?;
        Ok((encode_json(&main)?, encode_json(&side)?))
    }

    pub fn to_disaggregated_yaml(
        &self,
        component: &Component,
        version: Option<AgentSpecVersion>,
        disaggregated: &DisaggregatedComponents,
    ) -> Result<(String, String), SerializationError> {
        let (main, side) = self.to_disaggregated_records(component, version, disaggregated)?;
        Ok((encode_yaml(&main)?, encode_yaml(&side)?))
    }

    fn write_document(
        &self,
        component: &Component,
        placement: &Placement,
        export_ids: &AHashMap<String, String>,
        version: AgentSpecVersion,
    ) -> Result<Value, SerializationError> {
        let mut ctx = SerializationContext {
            plugins: &self.plugins,
            placement,
            export_ids,
            version,
        };
        let mut record = ctx.write_record(component)?;
        record.insert(
            AGENTSPEC_VERSION_FIELD.to_string(),
            Value::String(version.to_string()),
        );
        Ok(Value::Object(record))
    }
}

/// The version to export at: `requested`, or the lowest version every component supports.
fn export_version(
    requested: Option<AgentSpecVersion>,
    components: &[Component],
) -> Result<AgentSpecVersion, SerializationError> {
    let bounds = components
        .iter()
        .map(resolve_version_bounds)
        .collect::<Result<Vec<_>, _>>()?;
    let version = requested.unwrap_or_else(|| {
        bounds
            .iter()
            .map(|bounds| bounds.min)
            .max()
            .unwrap_or(AgentSpecVersion::DEFAULT_MIN)
    });
    for bounds in &bounds {
        bounds.check(version)?;
    }
    Ok(version)
}

fn encode_json(record: &Value) -> Result<String, SerializationError> {
    serde_json::to_string_pretty(record).map_err(|e| SerializationError::Encoding {
        format: "JSON",
        message: e.to_string(),
    })
}

fn encode_yaml(record: &Value) -> Result<String, SerializationError> {
    serde_yaml::to_string(record).map_err(|e| SerializationError::Encoding {
        format: "YAML",
        message: e.to_string(),
    })
}

/// State of one serialization call, handed to plugins.
pub struct SerializationContext<'s> {
    plugins: &'s PluginRegistry,
    placement: &'s Placement,
    export_ids: &'s AHashMap<String, String>,
    version: AgentSpecVersion,
}

impl SerializationContext<'_> {
    /// The version being exported.
    pub fn version(&self) -> AgentSpecVersion {
        self.version
    }

    /// Writes a field holding a component: either its inline record or a reference marker.
    pub fn serialize_component(&mut self, component: &Component) -> Result<Value, SerializationError> {
        if let Some(export_id) = self.export_ids.get(component.id()) {
            return Ok(reference_marker(export_id));
        }
        if self.placement.is_referenced(component.id()) {
            return Ok(reference_marker(component.id()));
        }
        self.write_record(component).map(Value::Object)
    }

    pub fn serialize_properties(&self, properties: &[Property]) -> Value {
        properties_to_value(properties)
    }

    fn serialize_all(
        &mut self,
        components: impl IntoIterator<Item = Component>,
    ) -> Result<Value, SerializationError> {
        let values = components
            .into_iter()
            .map(|component| self.serialize_component(&component))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Array(values))
    }

    /// Writes the full record of `component`, with the shared components it owns.
    pub(crate) fn write_record(
        &mut self,
        component: &Component,
    ) -> Result<Map<String, Value>, SerializationError> {
        let mut record = Map::new();
        write_header(&mut record, component.component_type(), component.base());

        match component {
            Component::Agent(agent) => self.write_agent(&mut record, agent)?,
            Component::Flow(flow) => self.write_flow(&mut record, flow)?,
            Component::Node(node) => self.write_node(&mut record, node)?,
            Component::Tool(tool) => self.write_tool(&mut record, tool),
            Component::LlmConfig(config) => self.write_llm_config(&mut record, config),
            Component::ControlFlowEdge(edge) => self.write_control_edge(&mut record, edge)?,
            Component::DataFlowEdge(edge) => self.write_data_edge(&mut record, edge)?,
            Component::Extension(extension) => {
                self.write_extension(&mut record, extension.as_ref())?
            }
        }

        let owned = self.placement.hoisted_in(component.id());
        if !owned.is_empty() {
            let mut table = Map::new();
            for shared in owned {
                let shared_record = self.write_record(shared)?;
                table.insert(shared.id().to_string(), Value::Object(shared_record));
            }
            record.insert(REFERENCED_COMPONENTS.to_string(), Value::Object(table));
        }
        Ok(record)
    }

    fn write_agent(&mut self, record: &mut Map<String, Value>, agent: &Agent) -> Result<(), SerializationError> {
        record.insert("inputs".to_string(), properties_to_value(&agent.inputs));
        record.insert("outputs".to_string(), properties_to_value(&agent.outputs));
        record.insert(
            "llm_config".to_string(),
            self.serialize_component(&Component::LlmConfig(agent.llm_config.clone()))?,
        );
        record.insert(
            "system_prompt".to_string(),
            Value::String(agent.system_prompt.clone()),
        );
        let tools = self.serialize_all(agent.tools.iter().cloned().map(Component::Tool))?;
        record.insert("tools".to_string(), tools);
        Ok(())
    }

    fn write_flow(&mut self, record: &mut Map<String, Value>, flow: &Flow) -> Result<(), SerializationError> {
        record.insert("inputs".to_string(), properties_to_value(flow.inputs()));
        record.insert("outputs".to_string(), properties_to_value(flow.outputs()));
        record.insert(
            "start_node".to_string(),
            self.serialize_component(&Component::Node(flow.start_node().clone()))?,
        );
        let nodes = self.serialize_all(flow.nodes().iter().cloned().map(Component::Node))?;
        record.insert("nodes".to_string(), nodes);
        let control_edges = self.serialize_all(
            flow.control_flow_connections()
                .iter()
                .cloned()
                .map(Component::ControlFlowEdge),
        )?;
        record.insert("control_flow_connections".to_string(), control_edges);
        let data_edges = match flow.data_flow_connections() {
            Some(edges) => {
                self.serialize_all(edges.iter().cloned().map(Component::DataFlowEdge))?
            }
            None => Value::Null,
        };
        record.insert("data_flow_connections".to_string(), data_edges);
        Ok(())
    }

    fn write_node(&mut self, record: &mut Map<String, Value>, node: &Node) -> Result<(), SerializationError> {
        record.insert("inputs".to_string(), properties_to_value(node.inputs()));
        record.insert("outputs".to_string(), properties_to_value(node.outputs()));
        record.insert(
            "branches".to_string(),
            Value::Array(node.branches().iter().cloned().map(Value::String).collect()),
        );

        match node.kind() {
            NodeKind::Start => {}
            NodeKind::End { branch_name } => {
                record.insert("branch_name".to_string(), Value::String(branch_name.clone()));
            }
            NodeKind::Branching { mapping } => {
                let mapping: Map<String, Value> = mapping
                    .iter()
                    .map(|(value, branch)| (value.clone(), Value::String(branch.clone())))
                    .collect();
                record.insert("mapping".to_string(), Value::Object(mapping));
            }
            NodeKind::Tool { tool } => {
                let tool = self.serialize_component(&Component::Tool(tool.clone()))?;
                record.insert("tool".to_string(), tool);
            }
            NodeKind::Llm {
                llm_config,
                prompt_template,
            } => {
                let llm_config = self.serialize_component(&Component::LlmConfig(llm_config.clone()))?;
                record.insert("llm_config".to_string(), llm_config);
                record.insert(
                    "prompt_template".to_string(),
                    Value::String(prompt_template.clone()),
                );
            }
            NodeKind::Agent { agent } => {
                let agent = self.serialize_component(&Component::Agent(agent.clone()))?;
                record.insert("agent".to_string(), agent);
            }
            NodeKind::Api { request } => self.write_request(record, node.id(), request),
            NodeKind::Flow { subflow } | NodeKind::CatchException { subflow } => {
                let subflow = self.serialize_component(&Component::Flow(subflow.clone()))?;
                record.insert("subflow".to_string(), subflow);
            }
            NodeKind::Map { subflow, reducers } | NodeKind::ParallelMap { subflow, reducers } => {
                let subflow = self.serialize_component(&Component::Flow(subflow.clone()))?;
                record.insert("subflow".to_string(), subflow);
                if let Some(reducers) = reducers {
                    let reducers: Map<String, Value> = reducers
                        .iter()
                        .map(|(output, method)| {
                            (output.clone(), Value::String(method.as_str().to_string()))
                        })
                        .collect();
                    record.insert("reducers".to_string(), Value::Object(reducers));
                }
            }
            NodeKind::ParallelFlow { subflows } => {
                let subflows =
                    self.serialize_all(subflows.iter().cloned().map(Component::Flow))?;
                record.insert("subflows".to_string(), subflows);
            }
            NodeKind::InputMessage { message } => {
                let message = message.clone().map_or(Value::Null, Value::String);
                record.insert("message".to_string(), message);
            }
            NodeKind::OutputMessage { message } => {
                record.insert("message".to_string(), Value::String(message.clone()));
            }
        }
        Ok(())
    }

    fn write_tool(&self, record: &mut Map<String, Value>, tool: &Tool) {
        record.insert("inputs".to_string(), properties_to_value(&tool.inputs));
        record.insert("outputs".to_string(), properties_to_value(&tool.outputs));
        record.insert(
            "requires_confirmation".to_string(),
            Value::Bool(tool.requires_confirmation),
        );
        if let ToolKind::Remote(request) = &tool.kind {
            self.write_request(record, &tool.base.id, request);
        }
    }

    fn write_request(&self, record: &mut Map<String, Value>, component_id: &str, request: &HttpRequest) {
        record.insert("url".to_string(), Value::String(request.url.clone()));
        record.insert(
            "http_method".to_string(),
            Value::String(request.http_method.clone()),
        );
        record.insert("data".to_string(), Value::Object(request.data.clone()));
        record.insert(
            "query_params".to_string(),
            Value::Object(request.query_params.clone()),
        );
        record.insert("headers".to_string(), Value::Object(request.headers.clone()));
        if self.version >= AgentSpecVersion::V25_4_2 && !request.sensitive_headers.is_empty() {
            record.insert(
                "sensitive_headers".to_string(),
                reference_marker(&sensitive_field_key(component_id, "sensitive_headers")),
            );
        }
    }

    fn write_llm_config(&self, record: &mut Map<String, Value>, config: &LlmConfig) {
        if let Some(parameters) = &config.default_generation_parameters {
            record.insert(
                "default_generation_parameters".to_string(),
                Value::Object(parameters.clone()),
            );
        }
        match &config.provider {
            LlmProvider::Vllm { url, model_id }
            | LlmProvider::Ollama { url, model_id }
            | LlmProvider::OpenAiCompatible { url, model_id, .. } => {
                record.insert("url".to_string(), Value::String(url.clone()));
                record.insert("model_id".to_string(), Value::String(model_id.clone()));
            }
            LlmProvider::OpenAi {
                model_id, api_type, ..
            } => {
                record.insert("model_id".to_string(), Value::String(model_id.clone()));
                if self.version >= AgentSpecVersion::V25_4_2 {
                    record.insert(
                        "api_type".to_string(),
                        Value::String(api_type.as_str().to_string()),
                    );
                }
            }
        }
        if config.api_key().is_some_and(|key| !key.is_empty()) {
            record.insert(
                "api_key".to_string(),
                reference_marker(&sensitive_field_key(&config.base.id, "api_key")),
            );
        }
    }

    fn write_control_edge(
        &mut self,
        record: &mut Map<String, Value>,
        edge: &ControlFlowEdge,
    ) -> Result<(), SerializationError> {
        let from_node = self.serialize_component(&Component::Node(edge.from_node.clone()))?;
        record.insert("from_node".to_string(), from_node);
        record.insert(
            "from_branch".to_string(),
            edge.from_branch.clone().map_or(Value::Null, Value::String),
        );
        let to_node = self.serialize_component(&Component::Node(edge.to_node.clone()))?;
        record.insert("to_node".to_string(), to_node);
        Ok(())
    }

    fn write_data_edge(
        &mut self,
        record: &mut Map<String, Value>,
        edge: &DataFlowEdge,
    ) -> Result<(), SerializationError> {
        let source = self.serialize_component(&Component::Node(edge.source_node().clone()))?;
        record.insert("source_node".to_string(), source);
        record.insert(
            "source_output".to_string(),
            Value::String(edge.source_output().to_string()),
        );
        let destination =
            self.serialize_component(&Component::Node(edge.destination_node().clone()))?;
        record.insert("destination_node".to_string(), destination);
        record.insert(
            "destination_input".to_string(),
            Value::String(edge.destination_input().to_string()),
        );
        Ok(())
    }

    fn write_extension(
        &mut self,
        record: &mut Map<String, Value>,
        extension: &dyn ExtensionComponent,
    ) -> Result<(), SerializationError> {
        let plugins = self.plugins;
        let plugin = plugins.get(extension.component_type()).ok_or_else(|| {
            SerializationError::UnsupportedComponentType {
                id: extension.base().id.clone(),
                component_type: extension.component_type().to_string(),
            }
        })?;
        let fields = plugin.serialize(extension, self)?;
        record.extend(fields);
        Ok(())
    }
}
