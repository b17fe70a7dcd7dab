use crate::component::{Component, ComponentBase};
use crate::llms::LlmConfig;
use crate::property::Property;
use crate::templating::placeholder_properties;
use crate::tools::Tool;
use std::sync::Arc;

/// A conversational agent driven by an LLM, optionally equipped with tools.
///
/// Inputs default to the `{{placeholders}}` of the system prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub base: ComponentBase,
    pub inputs: Vec<Property>,
    pub outputs: Vec<Property>,
    pub llm_config: Arc<LlmConfig>,
    pub system_prompt: String,
    pub tools: Vec<Arc<Tool>>,
}

impl Agent {
    pub fn new(
        base: impl Into<ComponentBase>,
        llm_config: Arc<LlmConfig>,
        system_prompt: impl Into<String>,
    ) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            base: base.into(),
            inputs: placeholder_properties([system_prompt.as_str()]),
            outputs: Vec::new(),
            llm_config,
            system_prompt,
            tools: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<Arc<Tool>>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<Property>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<Property>) -> Self {
        self.outputs = outputs;
        self
    }

    pub(crate) fn references(&self) -> Vec<Component> {
        std::iter::once(Component::LlmConfig(self.llm_config.clone()))
            .chain(self.tools.iter().cloned().map(Component::Tool))
            .collect()
    }
}
