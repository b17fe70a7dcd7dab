//! Tools agents and tool nodes can call. The crate never invokes them: runtimes resolve a tool by
//! name and bind it to their own implementation.

use crate::component::ComponentBase;
use crate::error::ValidationError;
use crate::property::Property;
use crate::templating::placeholder_properties;
use crate::version::AgentSpecVersion;
use serde_json::{Map, Value};

/// An HTTP call description, shared by remote tools and API nodes.
///
/// String values of `url`, `data`, `query_params` and `headers` may contain `{{placeholders}}`,
/// which become the inputs of the owning component when none are given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub http_method: String,
    pub data: Map<String, Value>,
    pub query_params: Map<String, Value>,
    pub headers: Map<String, Value>,
    /// Credential-bearing headers. Never written to serialized records.
    pub sensitive_headers: Map<String, Value>,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>, http_method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http_method: http_method.into(),
            data: Map::new(),
            query_params: Map::new(),
            headers: Map::new(),
            sensitive_headers: Map::new(),
        }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn with_query_params(mut self, query_params: Map<String, Value>) -> Self {
        self.query_params = query_params;
        self
    }

    pub fn with_headers(mut self, headers: Map<String, Value>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_sensitive_headers(mut self, sensitive_headers: Map<String, Value>) -> Self {
        self.sensitive_headers = sensitive_headers;
        self
    }

    /// String inputs for every placeholder of the request.
    pub(crate) fn placeholder_inputs(&self) -> Vec<Property> {
        let templated_values = self
            .data
            .values()
            .chain(self.query_params.values())
            .chain(self.headers.values())
            .filter_map(Value::as_str);
        placeholder_properties(std::iter::once(self.url.as_str()).chain(templated_values))
    }

    pub(crate) fn validate(&self, component_name: &str) -> Result<(), ValidationError> {
        let repeated: Vec<String> = self
            .headers
            .keys()
            .filter(|header| self.sensitive_headers.contains_key(*header))
            .cloned()
            .collect();
        if repeated.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::OverlappingHeaders {
                component_name: component_name.to_string(),
                headers: repeated,
            })
        }
    }

    /// Sensitive headers were introduced in 25.4.2.
    pub(crate) fn version_floor(&self) -> AgentSpecVersion {
        if self.sensitive_headers.is_empty() {
            AgentSpecVersion::DEFAULT_MIN
        } else {
            AgentSpecVersion::V25_4_2
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolKind {
    /// Executed by the runtime hosting the agent.
    Server,
    /// Executed by the client talking to the agent.
    Client,
    /// An HTTP endpoint.
    Remote(HttpRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub base: ComponentBase,
    pub inputs: Vec<Property>,
    pub outputs: Vec<Property>,
    pub requires_confirmation: bool,
    pub kind: ToolKind,
}

impl Tool {
    pub fn server(base: impl Into<ComponentBase>) -> Self {
        Self::new(base, ToolKind::Server)
    }

    pub fn client(base: impl Into<ComponentBase>) -> Self {
        Self::new(base, ToolKind::Client)
    }

    /// A remote tool whose inputs default to the placeholders of its request.
    pub fn remote(
        base: impl Into<ComponentBase>,
        request: HttpRequest,
    ) -> Result<Self, ValidationError> {
        let base = base.into();
        request.validate(&base.name)?;
        let inputs = request.placeholder_inputs();
        Ok(Self::new(base, ToolKind::Remote(request)).with_inputs(inputs))
    }

    fn new(base: impl Into<ComponentBase>, kind: ToolKind) -> Self {
        Self {
            base: base.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            requires_confirmation: false,
            kind,
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<Property>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<Property>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_requires_confirmation(mut self, requires_confirmation: bool) -> Self {
        self.requires_confirmation = requires_confirmation;
        self
    }

    pub fn component_type(&self) -> &'static str {
        match self.kind {
            ToolKind::Server => "ServerTool",
            ToolKind::Client => "ClientTool",
            ToolKind::Remote(_) => "RemoteTool",
        }
    }

    pub(crate) fn version_floor(&self) -> AgentSpecVersion {
        match &self.kind {
            ToolKind::Remote(request) => request.version_floor(),
            ToolKind::Server | ToolKind::Client => AgentSpecVersion::DEFAULT_MIN,
        }
    }
}
