use crate::agent::llm::model_provider::{ChatMessage, LLMChatter, LLMModelConfig, LLMResponse};

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use anyhow::{anyhow, Result};
use async_trait::async_trait;

#[derive(Serialize, Debug)]
struct GeminiPart {
  text: String,
}

#[derive(Serialize, Debug)]
struct GeminiContent {
  role: String, // "user" or "model"
  parts: Vec<GeminiPart>,
}

#[derive(Serialize, Debug)]
struct GenerationConfig {
  #[serde(skip_serializing_if = "Option::is_none")]
  temperature: Option<f32>,
  #[serde(rename = "maxOutputTokens")]
  #[serde(skip_serializing_if = "Option::is_none")]
  max_output_tokens: Option<u32>,
}

#[derive(Serialize, Debug)]
struct GeminiRequest {
  contents: Vec<GeminiContent>,
  #[serde(rename = "generationConfig")]
  generation_config: GenerationConfig,
}

#[derive(Deserialize, Debug)]
struct GeminiResponsePart {
  text: String,
}

#[derive(Deserialize, Debug)]
struct GeminiResponseContent {
  parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidate {
  content: GeminiResponseContent,
}

#[derive(Deserialize, Debug)]
struct GeminiResponse {
  candidates: Vec<GeminiCandidate>,
}

pub struct GeminiProvider {
  base_url : String,
  api_key : String,
  model_name : String,
  client : Client,
}

impl GeminiProvider {

  pub fn new(model_name: &str, api_key: &str) -> Self {
    let base_url : String = "https://generativelanguage.googleapis.com/v1beta/models".to_string();
    GeminiProvider {
      base_url,
      api_key: api_key.to_string(),
      model_name: model_name.to_string(),
      client: Client::new(),
    }
  }

  // Gemini has no system role. System messages are folded into the first
  // user turn, assistant turns map to "model".
  fn to_contents(messages: Vec<ChatMessage>) -> Vec<GeminiContent> {
    let mut system_prefix : Vec<String> = Vec::new();
    let mut contents : Vec<GeminiContent> = Vec::new();

    for message in messages {
      match message.role.as_str() {
        "system" => system_prefix.push(message.content),
        "assistant" => contents.push(GeminiContent {
          role: "model".to_string(),
          parts: vec![GeminiPart { text: message.content }],
        }),
        _ => {
          let text : String = if system_prefix.is_empty() {
            message.content
          } else {
            let merged = format!("{}\n\n{}", system_prefix.join("\n\n"), message.content);
            system_prefix.clear();
            merged
          };
          contents.push(GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart { text }],
          });
        },
      }
    }

    if !system_prefix.is_empty() {
      contents.push(GeminiContent {
        role: "user".to_string(),
        parts: vec![GeminiPart { text: system_prefix.join("\n\n") }],
      });
    }
    return contents;
  }
}

#[async_trait]
impl LLMChatter for GeminiProvider {
  async fn chat(&self, messages: Vec<ChatMessage>, config: &LLMModelConfig) -> Result<LLMResponse> {
    let request : GeminiRequest = GeminiRequest {
      contents: Self::to_contents(messages),
      generation_config: GenerationConfig {
        temperature: config.temperature,
        max_output_tokens: config.max_tokens,
      },
    };

    let url : String = format!("{}/{}:generateContent?key={}", self.base_url, self.model_name, self.api_key);
    let response : Response = self.client.post(&url).json(&request).send().await?;

    if !response.status().is_success() {
      return Err(anyhow!("Gemini request failed with status {}", response.status()));
    }

    let gemini_response : GeminiResponse = response.json().await?;
    let candidate : GeminiCandidate = gemini_response
      .candidates
      .into_iter()
      .next()
      .ok_or_else(|| anyhow!("No candidates received from Gemini"))?;
    let text : String = candidate
      .content
      .parts
      .into_iter()
      .map(|part| part.text)
      .collect::<Vec<String>>()
      .join("");

    return Ok(LLMResponse { content: text });
  }
}
