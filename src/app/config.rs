use std::env;
use std::str::FromStr;

use log;

use crate::agent::llm::model_provider::ModelProvider;

#[derive(Clone)]
pub struct Config {
  pub google_api_key : String,
  pub openai_api_key : String,
  pub serper_api_key : String,
  pub financial_datasets_api_key : String,
  pub reports_dir : String,
}

impl Config {

  pub fn load() -> Self {
    match dotenv::dotenv() {
      Ok(_) => log::info!("Loaded .env file"),
      Err(_) => log::error!("No .env file found"),
    }

    let google_api_key : String = env::var("GOOGLE_API_KEY").unwrap_or_else(|_| {
      log::warn!("GOOGLE_API_KEY not found, Gemini insights will be unavailable");
      String::new()
    });

    let openai_api_key : String = env::var("OPENAI_API_KEY").unwrap_or_else(|_| {
      log::warn!("OPENAI_API_KEY not found, OpenAI insights will be unavailable");
      String::new()
    });

    let serper_api_key : String = env::var("SERPER_API_KEY").unwrap_or_else(|_| {
      log::warn!("SERPER_API_KEY not found, web search lookups will fail");
      String::new()
    });

    let financial_datasets_api_key : String = env::var("FINANCIAL_DATASETS_API_KEY").unwrap_or_else(|_| {
      log::warn!("FINANCIAL_DATASETS_API_KEY not found, financial data lookups will fail");
      String::new()
    });

    let reports_dir : String = env::var("REPORTS_DIR").unwrap_or_else(|_| "reports".to_string());

    return Config {
      google_api_key, openai_api_key, serper_api_key, financial_datasets_api_key, reports_dir
    }
  }

}

/// Explicit LLM selection handed to the pipeline and recommender constructors.
#[derive(Clone)]
pub struct LlmConfig {
  pub provider : ModelProvider,
  pub model_name : String,
  pub api_key : Option<String>,
}

impl LlmConfig {

  /// Resolves the user's `--llm` preference against the keys that are actually
  /// configured, falling back to the other provider when the preferred key is
  /// missing.
  pub fn for_preference(preference: &str, config: &Config) -> Self {
    let provider : ModelProvider = ModelProvider::from_str(preference).unwrap_or_else(|e| {
      log::warn!("{}. Defaulting to Gemini.", e);
      ModelProvider::Gemini
    });

    let gemini_ready : bool = !config.google_api_key.is_empty();
    let openai_ready : bool = !config.openai_api_key.is_empty();

    match (provider, gemini_ready, openai_ready) {
      (ModelProvider::Gemini, true, _) => Self::gemini(config),
      (ModelProvider::OpenAI, _, true) => Self::openai(config),
      (ModelProvider::Gemini, false, true) => {
        log::warn!("GOOGLE_API_KEY missing, falling back to OpenAI");
        Self::openai(config)
      },
      (ModelProvider::OpenAI, true, false) => {
        log::warn!("OPENAI_API_KEY missing, falling back to Gemini");
        Self::gemini(config)
      },
      (provider, _, _) => {
        log::warn!("No LLM API key configured, narrative insights will be skipped");
        LlmConfig { provider, model_name: Self::default_model(&provider).to_string(), api_key: None }
      },
    }
  }

  fn gemini(config: &Config) -> Self {
    LlmConfig {
      provider: ModelProvider::Gemini,
      model_name: Self::default_model(&ModelProvider::Gemini).to_string(),
      api_key: Some(config.google_api_key.clone()),
    }
  }

  fn openai(config: &Config) -> Self {
    LlmConfig {
      provider: ModelProvider::OpenAI,
      model_name: Self::default_model(&ModelProvider::OpenAI).to_string(),
      api_key: Some(config.openai_api_key.clone()),
    }
  }

  fn default_model(provider: &ModelProvider) -> &'static str {
    match provider {
      ModelProvider::Gemini => "gemini-2.5-pro",
      ModelProvider::OpenAI => "gpt-4o",
    }
  }

}
