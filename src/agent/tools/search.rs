use reqwest::{header::HeaderMap, Client, Response};
use serde::{Deserialize, Serialize};
use anyhow::{anyhow, Result};

const SERPER_URL : &str = "https://google.serper.dev/search";

/// One organic result from the Serper API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
  #[serde(default)]
  pub title : String,
  #[serde(default)]
  pub snippet : String,
  #[serde(default)]
  pub link : String,
  #[serde(default)]
  pub source : String,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
  #[serde(default)]
  organic : Vec<SearchHit>,
}

/// Thin Serper web-search client shared by the leadership, technology and
/// sentiment extractors.
pub struct SearchClient {
  api_key : String,
  client : Client,
}

impl SearchClient {

  pub fn new(api_key: String) -> Self {
    SearchClient { api_key, client: Client::new() }
  }

  pub async fn search(&self, query: &str, num_results: u32) -> Result<Vec<SearchHit>> {
    let payload = serde_json::json!({
      "q": query,
      "num": num_results,
      "gl": "us",
      "hl": "en",
    });

    let mut headers = HeaderMap::new();
    headers.insert("X-API-KEY", self.api_key.parse()?);
    headers.insert("Content-Type", "application/json".parse()?);

    log::debug!("Serper query: {}", query);
    let response : Response = self.client.post(SERPER_URL).headers(headers).json(&payload).send().await?;

    if !response.status().is_success() {
      return Err(anyhow!("Serper request failed with status {}", response.status()));
    }

    let serper_response : SerperResponse = response.json().await?;
    return Ok(serper_response.organic);
  }
}
