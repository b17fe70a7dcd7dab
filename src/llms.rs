//! Connection configurations for the LLMs used by agents and LLM nodes.

use crate::component::ComponentBase;
use crate::version::AgentSpecVersion;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protocol spoken with an OpenAI endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenAiApiType {
    #[default]
    ChatCompletions,
    Responses,
}

impl OpenAiApiType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenAiApiType::ChatCompletions => "chat_completions",
            OpenAiApiType::Responses => "responses",
        }
    }
}

/// Where and how the model is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    Vllm {
        url: String,
        model_id: String,
    },
    Ollama {
        url: String,
        model_id: String,
    },
    OpenAiCompatible {
        url: String,
        model_id: String,
        api_key: Option<String>,
    },
    OpenAi {
        model_id: String,
        api_type: OpenAiApiType,
        api_key: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub base: ComponentBase,
    /// Free-form sampling parameters (temperature, max tokens, ...) passed to the model.
    pub default_generation_parameters: Option<Map<String, Value>>,
    pub provider: LlmProvider,
}

impl LlmConfig {
    pub fn new(base: impl Into<ComponentBase>, provider: LlmProvider) -> Self {
        Self {
            base: base.into(),
            default_generation_parameters: None,
            provider,
        }
    }

    pub fn vllm(
        base: impl Into<ComponentBase>,
        url: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self::new(
            base,
            LlmProvider::Vllm {
                url: url.into(),
                model_id: model_id.into(),
            },
        )
    }

    pub fn ollama(
        base: impl Into<ComponentBase>,
        url: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self::new(
            base,
            LlmProvider::Ollama {
                url: url.into(),
                model_id: model_id.into(),
            },
        )
    }

    pub fn openai_compatible(
        base: impl Into<ComponentBase>,
        url: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self::new(
            base,
            LlmProvider::OpenAiCompatible {
                url: url.into(),
                model_id: model_id.into(),
                api_key: None,
            },
        )
    }

    pub fn openai(base: impl Into<ComponentBase>, model_id: impl Into<String>) -> Self {
        Self::new(
            base,
            LlmProvider::OpenAi {
                model_id: model_id.into(),
                api_type: OpenAiApiType::default(),
                api_key: None,
            },
        )
    }

    /// Sets the API key of OpenAI-flavoured providers. Other providers ignore it.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        match &mut self.provider {
            LlmProvider::OpenAiCompatible { api_key, .. } | LlmProvider::OpenAi { api_key, .. } => {
                *api_key = Some(key.into());
            }
            LlmProvider::Vllm { .. } | LlmProvider::Ollama { .. } => {}
        }
        self
    }

    /// Sets the API protocol of an OpenAI provider. Other providers ignore it.
    pub fn with_api_type(mut self, value: OpenAiApiType) -> Self {
        if let LlmProvider::OpenAi { api_type, .. } = &mut self.provider {
            *api_type = value;
        }
        self
    }

    pub fn with_generation_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.default_generation_parameters = Some(parameters);
        self
    }

    pub fn component_type(&self) -> &'static str {
        match self.provider {
            LlmProvider::Vllm { .. } => "VllmConfig",
            LlmProvider::Ollama { .. } => "OllamaConfig",
            LlmProvider::OpenAiCompatible { .. } => "OpenAiCompatibleConfig",
            LlmProvider::OpenAi { .. } => "OpenAiConfig",
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        match &self.provider {
            LlmProvider::OpenAiCompatible { api_key, .. } | LlmProvider::OpenAi { api_key, .. } => {
                api_key.as_deref()
            }
            LlmProvider::Vllm { .. } | LlmProvider::Ollama { .. } => None,
        }
    }

    /// API keys and non-default API protocols were introduced in 25.4.2.
    pub(crate) fn version_floor(&self) -> AgentSpecVersion {
        let has_api_key = self.api_key().is_some_and(|key| !key.is_empty());
        let custom_api_type = matches!(
            self.provider,
            LlmProvider::OpenAi { api_type, .. } if api_type != OpenAiApiType::ChatCompletions
        );
        if has_api_key || custom_api_type {
            AgentSpecVersion::V25_4_2
        } else {
            AgentSpecVersion::DEFAULT_MIN
        }
    }
}
