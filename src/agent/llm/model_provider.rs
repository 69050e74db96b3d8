use serde::{Serialize, Deserialize};
use std::str::FromStr;
use std::fmt;
use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelProvider {
  Gemini,
  OpenAI,
}

impl ModelProvider {

  pub fn as_str(&self) -> &'static str {
    match self {
      ModelProvider::Gemini => "gemini",
      ModelProvider::OpenAI => "openai",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMModelConfig {
  pub provider: ModelProvider,
  pub model_name: String,
  pub api_key: Option<String>,
  pub temperature: Option<f32>,
  pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role: String, // e.g., "user", "assistant", "system"
  pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
  pub content: String,
}

impl fmt::Display for ModelProvider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for ModelProvider {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "gemini" => Ok(ModelProvider::Gemini),
      "openai" => Ok(ModelProvider::OpenAI),
      _ => Err(format!("Unknown model provider: {}", s)),
    }
  }
}

#[async_trait]
pub trait LLMChatter : Send + Sync {
  async fn chat(&self, messages: Vec<ChatMessage>, config: &LLMModelConfig) -> Result<LLMResponse>;
}
