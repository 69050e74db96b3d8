use anyhow::{anyhow, Result};

use crate::agent::llm::gemini::GeminiProvider;
use crate::agent::llm::model_provider::{LLMChatter, LLMModelConfig, ModelProvider};
use crate::agent::llm::openai::OpenAiProvider;

/// Builds a chat client for the configured provider. Fails fast when no API
/// key is present so callers can degrade to non-LLM behavior.
pub fn get_model(config: &LLMModelConfig) -> Result<Box<dyn LLMChatter>> {
  let api_key : &str = config
    .api_key
    .as_deref()
    .filter(|key| !key.is_empty())
    .ok_or_else(|| anyhow!("No API key configured for provider {}", config.provider))?;

  match config.provider {
    ModelProvider::Gemini => Ok(Box::new(GeminiProvider::new(&config.model_name, api_key))),
    ModelProvider::OpenAI => Ok(Box::new(OpenAiProvider::new(&config.model_name, api_key))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn get_model_requires_an_api_key() {
    let config = LLMModelConfig {
      provider: ModelProvider::Gemini,
      model_name: "gemini-2.5-pro".to_string(),
      api_key: None,
      temperature: None,
      max_tokens: None,
    };
    assert!(get_model(&config).is_err());

    let config = LLMModelConfig { api_key: Some(String::new()), ..config };
    assert!(get_model(&config).is_err());

    let config = LLMModelConfig { api_key: Some("key".to_string()), ..config };
    assert!(get_model(&config).is_ok());
  }
}
