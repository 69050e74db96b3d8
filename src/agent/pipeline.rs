use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;

use crate::agent::data::analysis::{AnalysisStatus, Dimension, TickerAnalysis};
use crate::agent::error::PipelineError;
use crate::agent::extractors::financial::{CashFlowExtractor, FinancialClient, ProfitExtractor};
use crate::agent::extractors::leadership::LeadershipExtractor;
use crate::agent::extractors::sentiment::SentimentExtractor;
use crate::agent::extractors::technology::TechnologyExtractor;
use crate::agent::knowledge;
use crate::agent::llm::model_provider::{ChatMessage, LLMModelConfig};
use crate::agent::llm::models::get_model;
use crate::agent::report::ReportEmitter;
use crate::agent::scoring;
use crate::agent::store::SnapshotStore;
use crate::agent::tools::search::SearchClient;
use crate::agent::workflow::chain::AnalysisChain;
use crate::agent::workflow::state::AnalysisState;
use crate::app::config::{Config, LlmConfig};

/// Pre-flight check that the ticker exists at the data provider. A failure
/// here is the pipeline's only hard stop.
#[async_trait]
pub trait TickerValidator: Send + Sync {
  async fn validate(&self, ticker: &str) -> Result<()>;
}

pub struct AnalyzeOptions {
  pub force_new : bool,
  pub freshness_days : i64,
}

impl Default for AnalyzeOptions {
  fn default() -> Self {
    AnalyzeOptions { force_new: false, freshness_days: 15 }
  }
}

/// The cache-aware analysis state machine:
/// validate → cache check → dimension chain → insights → aggregate →
/// persist → report. Only validation aborts; everything downstream of it
/// degrades softly.
pub struct AnalysisPipeline {
  store : SnapshotStore,
  validator : Arc<dyn TickerValidator>,
  chain : AnalysisChain,
  llm : LlmConfig,
}

impl AnalysisPipeline {

  pub fn new(store: SnapshotStore, validator: Arc<dyn TickerValidator>, chain: AnalysisChain, llm: LlmConfig) -> Self {
    AnalysisPipeline { store, validator, chain, llm }
  }

  /// Production wiring: financialdatasets.ai for validation and financial
  /// dimensions, Serper search for the rest.
  pub fn with_default_extractors(config: &Config, llm: LlmConfig) -> Self {
    let financial : Arc<FinancialClient> = Arc::new(FinancialClient::new(config));
    let search : Arc<SearchClient> = Arc::new(SearchClient::new(config.serper_api_key.clone()));

    let mut chain : AnalysisChain = AnalysisChain::new();
    chain.add_step(Box::new(CashFlowExtractor::new(financial.clone())));
    chain.add_step(Box::new(ProfitExtractor::new(financial.clone())));
    chain.add_step(Box::new(LeadershipExtractor::new(financial.clone(), search.clone())));
    chain.add_step(Box::new(TechnologyExtractor::new(financial.clone(), search.clone())));
    chain.add_step(Box::new(SentimentExtractor::new(financial.clone(), search)));

    let store : SnapshotStore = SnapshotStore::new(config.reports_dir.clone());
    return AnalysisPipeline::new(store, financial, chain, llm);
  }

  pub async fn analyze(&self, ticker: &str, options: &AnalyzeOptions) -> Result<TickerAnalysis, PipelineError> {
    let ticker : String = ticker.trim().to_uppercase();
    log::info!("Starting comprehensive analysis for {}", ticker);

    if let Err(e) = self.validator.validate(&ticker).await {
      log::error!("Validation failed for {}: {}", ticker, e);
      return Err(PipelineError::ValidationFailure { ticker, detail: e.to_string() });
    }

    if !options.force_new {
      if let Some(entry) = self.store.find_recent(&ticker, options.freshness_days) {
        match self.store.load(&entry) {
          Ok(cached) => {
            log::info!("Using cached analysis for {} ({} days old)", ticker, entry.age_in_days);
            return Ok(cached);
          },
          Err(e) => log::warn!("Discarding unreadable snapshot {:?}: {}", entry.folder, e),
        }
      }
      log::info!("No recent analysis found for {}, running a fresh pipeline", ticker);
    }

    let started : Instant = Instant::now();
    let mut state : AnalysisState = AnalysisState::new(&ticker);
    self.chain.run(&mut state).await;

    let insights : HashMap<String, String> = self.generate_insights(&state).await;
    let overall_scores = scoring::overall_scores(&state.results);
    let status : AnalysisStatus = AnalysisStatus::from_results(&state.results);

    let analysis : TickerAnalysis = TickerAnalysis {
      ticker: ticker.clone(),
      analysis_timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
      llm_used: self.llm.provider.to_string(),
      dimension_results: state.results,
      insights,
      overall_scores,
      status,
      analysis_duration: format!("{:.2} seconds", started.elapsed().as_secs_f64()),
      is_cached: false,
      cache_age_days: None,
    };

    // Persistence failures never discard the in-memory result.
    match self.store.write(&analysis) {
      Ok(folder) => {
        if let Err(e) = ReportEmitter::emit(&folder, &analysis) {
          log::error!("Report generation failed for {}: {}", ticker, e);
        }
      },
      Err(e) => log::error!("Failed to persist analysis for {}: {}", ticker, e),
    }

    log::info!(
      "Analysis for {} finished with status {} and overall score {:.2}",
      ticker, analysis.status, analysis.overall_scores.overall_investment_score
    );
    return Ok(analysis);
  }

  fn model_config(&self) -> LLMModelConfig {
    return LLMModelConfig {
      provider: self.llm.provider,
      model_name: self.llm.model_name.clone(),
      api_key: self.llm.api_key.clone(),
      temperature: Some(0.5),
      max_tokens: Some(600),
    };
  }

  /// One short narrative insight per completed analysis area. All failures
  /// are recorded in place of the insight text; nothing here aborts the run.
  async fn generate_insights(&self, state: &AnalysisState) -> HashMap<String, String> {
    let mut insights : HashMap<String, String> = HashMap::new();

    let model = match get_model(&self.model_config()) {
      Ok(model) => model,
      Err(e) => {
        log::warn!("Skipping LLM insights for {}: {}", state.ticker, e);
        return insights;
      },
    };

    let financial_done : bool = state.completed.contains(&Dimension::CashFlow)
      || state.completed.contains(&Dimension::Profit);
    let mut areas : Vec<(&str, Dimension)> = Vec::new();
    if financial_done {
      areas.push(("financial", Dimension::CashFlow));
    }
    for (area, dimension) in [
      ("leadership", Dimension::Leadership),
      ("technology", Dimension::Technology),
      ("sentiment", Dimension::Sentiment),
    ] {
      if state.completed.contains(&dimension) {
        areas.push((area, dimension));
      }
    }

    for (area, dimension) in areas {
      let context : &str = knowledge::get_context(dimension.as_str()).unwrap_or("");
      let data : String = state
        .results
        .get(&dimension)
        .map(|outcome| serde_json::to_string(&outcome.raw).unwrap_or_default())
        .unwrap_or_default();
      // Keep prompts bounded; char-based so multi-byte snippets stay intact.
      let data_excerpt : String = data.chars().take(2000).collect();

      let prompt : String = format!(
        "Analyst context:\n{}\n\nAnalysis data for {}:\n{}\n\nIn 3-4 sentences, \
         give an investment-relevant insight on the company's {} position.",
        context, state.ticker, data_excerpt, area
      );
      let messages : Vec<ChatMessage> = vec![
        ChatMessage { role: "system".to_string(), content: "You are a seasoned equity research analyst.".to_string() },
        ChatMessage { role: "user".to_string(), content: prompt },
      ];

      match model.chat(messages, &self.model_config()).await {
        Ok(response) => {
          insights.insert(area.to_string(), response.content);
        },
        Err(e) => {
          log::warn!("LLM insight for {} {} failed: {}", state.ticker, area, e);
          insights.insert(area.to_string(), format!("LLM analysis failed: {}", e));
        },
      }
    }
    return insights;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::agent::data::analysis::DimensionResult;
  use crate::agent::llm::model_provider::ModelProvider;
  use crate::agent::workflow::chain::DimensionExtractor;
  use anyhow::anyhow;
  use serde_json::json;
  use tempfile::TempDir;

  struct StaticValidator {
    ok : bool,
  }

  #[async_trait]
  impl TickerValidator for StaticValidator {
    async fn validate(&self, ticker: &str) -> Result<()> {
      if self.ok {
        Ok(())
      } else {
        Err(anyhow!("No financial data available for {}", ticker))
      }
    }
  }

  struct FixedExtractor {
    dimension : Dimension,
    score : f64,
  }

  #[async_trait]
  impl DimensionExtractor for FixedExtractor {
    fn dimension(&self) -> Dimension {
      self.dimension
    }

    async fn extract(&self, _ticker: &str) -> Result<DimensionResult> {
      Ok(DimensionResult { score: self.score, raw: json!({}), strengths: Vec::new(), risks: Vec::new() })
    }
  }

  struct FailingExtractor {
    dimension : Dimension,
  }

  #[async_trait]
  impl DimensionExtractor for FailingExtractor {
    fn dimension(&self) -> Dimension {
      self.dimension
    }

    async fn extract(&self, _ticker: &str) -> Result<DimensionResult> {
      Err(anyhow!("upstream unavailable"))
    }
  }

  fn offline_llm() -> LlmConfig {
    // No key: the insight stage logs and skips instead of calling out.
    LlmConfig {
      provider: ModelProvider::Gemini,
      model_name: "gemini-2.5-pro".to_string(),
      api_key: None,
    }
  }

  fn full_chain(failing: Option<Dimension>) -> AnalysisChain {
    let mut chain = AnalysisChain::new();
    for (dimension, score) in [
      (Dimension::CashFlow, 9.0),
      (Dimension::Profit, 6.0),
      (Dimension::Leadership, 8.0),
      (Dimension::Technology, 7.0),
      (Dimension::Sentiment, 0.4),
    ] {
      if failing == Some(dimension) {
        chain.add_step(Box::new(FailingExtractor { dimension }));
      } else {
        chain.add_step(Box::new(FixedExtractor { dimension, score }));
      }
    }
    chain
  }

  fn pipeline_in(dir: &TempDir, validator_ok: bool, failing: Option<Dimension>) -> AnalysisPipeline {
    AnalysisPipeline::new(
      SnapshotStore::new(dir.path()),
      Arc::new(StaticValidator { ok: validator_ok }),
      full_chain(failing),
      offline_llm(),
    )
  }

  #[tokio::test]
  async fn full_run_is_complete_and_persisted() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline_in(&dir, true, None);

    let analysis = pipeline.analyze("aapl", &AnalyzeOptions::default()).await.unwrap();
    assert_eq!(analysis.ticker, "AAPL");
    assert_eq!(analysis.status, AnalysisStatus::Complete);
    assert_eq!(analysis.overall_scores.overall_investment_score, 7.5);
    assert!(!analysis.is_cached);

    let entry = pipeline.store.find_recent("AAPL", 15).expect("snapshot persisted");
    assert_eq!(entry.age_in_days, 0);
  }

  #[tokio::test]
  async fn failed_dimension_yields_partial_status() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline_in(&dir, true, Some(Dimension::Profit));

    let analysis = pipeline.analyze("MSFT", &AnalyzeOptions::default()).await.unwrap();
    assert_eq!(analysis.status, AnalysisStatus::Partial);
    assert!(analysis.dimension_results[&Dimension::Profit].error.is_some());
    // 7.5 minus profit's 6.0 * 0.20 contribution
    assert_eq!(analysis.overall_scores.overall_investment_score, 6.3);
  }

  #[tokio::test]
  async fn validation_failure_is_fatal_and_caches_nothing() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline_in(&dir, false, None);

    let result = pipeline.analyze("FAKE", &AnalyzeOptions::default()).await;
    match result {
      Err(PipelineError::ValidationFailure { ticker, .. }) => assert_eq!(ticker, "FAKE"),
      other => panic!("expected validation failure, got {:?}", other.map(|a| a.status)),
    }
    assert!(!dir.path().join("FAKE").exists());
  }

  #[tokio::test]
  async fn second_run_hits_the_cache() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline_in(&dir, true, None);

    let first = pipeline.analyze("NVDA", &AnalyzeOptions::default()).await.unwrap();
    let second = pipeline.analyze("NVDA", &AnalyzeOptions::default()).await.unwrap();

    assert!(!first.is_cached);
    assert!(second.is_cached);
    assert_eq!(second.cache_age_days, Some(0));
    assert_eq!(
      second.overall_scores.overall_investment_score,
      first.overall_scores.overall_investment_score
    );
  }

  #[tokio::test]
  async fn force_new_bypasses_the_cache() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline_in(&dir, true, None);

    pipeline.analyze("AMD", &AnalyzeOptions::default()).await.unwrap();
    let options = AnalyzeOptions { force_new: true, ..AnalyzeOptions::default() };
    let rerun = pipeline.analyze("AMD", &options).await.unwrap();
    assert!(!rerun.is_cached);

    // Both snapshots are on disk.
    let folders = std::fs::read_dir(dir.path().join("AMD")).unwrap().count();
    assert_eq!(folders, 2);
  }
}
