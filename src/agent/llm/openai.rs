use crate::agent::llm::model_provider::{ChatMessage, LLMChatter, LLMModelConfig, LLMResponse};

use reqwest::{header::HeaderMap, Client, Response};
use serde::{Deserialize, Serialize};
use anyhow::{anyhow, Result};
use async_trait::async_trait;

#[derive(Serialize, Debug)]
struct OpenAiChatRequest {
  messages: Vec<ChatMessage>, // Reusing the generic ChatMessage from model_provider
  model: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  temperature: Option<f32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct OpenAiResponseMessage {
  content: String,
}

#[derive(Deserialize, Debug)]
struct OpenAiChoice {
  message: OpenAiResponseMessage,
}

#[derive(Deserialize, Debug)]
struct OpenAiChatResponse {
  choices: Vec<OpenAiChoice>,
}

pub struct OpenAiProvider {
  chat_url : String,
  api_key : String,
  model_name : String,
  client : Client,
}

impl OpenAiProvider {

  pub fn new(model_name: &str, api_key: &str) -> Self {
    let chat_url : String = "https://api.openai.com/v1/chat/completions".to_string();
    OpenAiProvider {
      chat_url,
      api_key: api_key.to_string(),
      model_name: model_name.to_string(),
      client: Client::new(),
    }
  }
}

#[async_trait]
impl LLMChatter for OpenAiProvider {
  async fn chat(&self, messages: Vec<ChatMessage>, config: &LLMModelConfig) -> Result<LLMResponse> {
    let request : OpenAiChatRequest = OpenAiChatRequest {
      model: self.model_name.clone(),
      messages,
      temperature: config.temperature,
      max_tokens: config.max_tokens,
    };

    let mut headers = HeaderMap::new();
    headers.insert("Authorization", format!("Bearer {}", self.api_key).parse()?);
    headers.insert("Content-Type", "application/json".parse()?);
    let response : Response = self.client.post(&self.chat_url).headers(headers).json(&request).send().await?;

    if !response.status().is_success() {
      return Err(anyhow!("OpenAI request failed with status {}", response.status()));
    }

    let chat_response : OpenAiChatResponse = response.json().await?;
    let first : OpenAiChoice = chat_response
      .choices
      .into_iter()
      .next()
      .ok_or_else(|| anyhow!("No response choices received from OpenAI"))?;

    return Ok(LLMResponse { content: first.message.content });
  }
}
