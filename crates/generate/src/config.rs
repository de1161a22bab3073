use std::fmt;
use std::str::FromStr;

use semantic::retry::RetryConfig;
use serde::{Deserialize, Serialize};

use crate::GenerateError;

const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";

/// Wire dialect of the generation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Hugging Face text-generation: `{"inputs", "parameters"}` -> `[{"generated_text"}]`.
    #[default]
    #[serde(alias = "hf")]
    HuggingFace,
    /// OpenAI-compatible `/chat/completions`, with `response_format` for structured output.
    OpenAi,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::HuggingFace => "huggingface",
            Provider::OpenAi => "openai",
        }
    }

    /// Whether the endpoint can be asked to follow a JSON schema.
    pub fn supports_json_schema(&self) -> bool {
        matches!(self, Provider::OpenAi)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Provider::HuggingFace),
            "openai" => Ok(Provider::OpenAi),
            other => Err(format!("unknown generation provider '{other}'")),
        }
    }
}

/// Settings for the hosted LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: Provider,
    /// Full URL requests are POSTed to.
    pub endpoint: String,
    /// Model name sent to OpenAI-compatible endpoints and reported in logs.
    pub model: String,
    /// Bearer token. Only ever read from the environment.
    #[serde(skip)]
    pub api_token: Option<String>,
    pub temperature: f32,
    pub max_new_tokens: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: Provider::HuggingFace,
            endpoint: format!("https://api-inference.huggingface.co/models/{DEFAULT_MODEL}"),
            model: DEFAULT_MODEL.into(),
            api_token: None,
            temperature: 0.5,
            max_new_tokens: 512,
            timeout_secs: 60,
            retry: RetryConfig::default(),
        }
    }
}

impl GenerationConfig {
    pub fn with_endpoint(mut self, provider: Provider, endpoint: impl Into<String>) -> Self {
        self.provider = provider;
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn validate(&self) -> Result<(), GenerateError> {
        let endpoint = self.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(GenerateError::InvalidConfig(format!(
                "endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(GenerateError::InvalidConfig(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        if self.max_new_tokens == 0 {
            return Err(GenerateError::InvalidConfig(
                "max_new_tokens must be greater than zero".into(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(GenerateError::InvalidConfig(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_hosted_mistral() {
        let cfg = GenerationConfig::default();
        assert_eq!(cfg.provider, Provider::HuggingFace);
        assert!(cfg.endpoint.ends_with("Mistral-7B-Instruct-v0.2"));
        assert_eq!(cfg.temperature, 0.5);
        assert_eq!(cfg.max_new_tokens, 512);
        assert_eq!(cfg.timeout_secs, 60);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn token_is_never_serialized_or_read_from_files() {
        let cfg = GenerationConfig::default().with_api_token("hf_secret");
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("hf_secret"));

        let parsed: GenerationConfig =
            serde_json::from_str(r#"{"api_token": "hf_leak", "provider": "hf"}"#).unwrap();
        assert_eq!(parsed.api_token, None);
        assert_eq!(parsed.provider, Provider::HuggingFace);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let bad_url = GenerationConfig::default().with_endpoint(Provider::OpenAi, "ftp://x");
        assert!(bad_url.validate().is_err());

        let hot = GenerationConfig {
            temperature: 3.5,
            ..Default::default()
        };
        assert!(hot.validate().is_err());

        let no_tokens = GenerationConfig {
            max_new_tokens: 0,
            ..Default::default()
        };
        assert!(no_tokens.validate().is_err());
    }

    #[test]
    fn provider_parsing() {
        assert_eq!("HF".parse::<Provider>().unwrap(), Provider::HuggingFace);
        assert_eq!("openai".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert!("anthropic".parse::<Provider>().is_err());
        assert!(Provider::OpenAi.supports_json_schema());
        assert!(!Provider::HuggingFace.supports_json_schema());
    }
}
