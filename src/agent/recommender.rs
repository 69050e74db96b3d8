use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::Value;

use crate::agent::data::analysis::{
  Dimension, Recommendation, RecommendationCategory, RecommendationMetrics, TickerAnalysis,
};
use crate::agent::error::PipelineError;
use crate::agent::knowledge;
use crate::agent::llm::model_provider::{ChatMessage, LLMModelConfig};
use crate::agent::llm::models::get_model;
use crate::agent::scoring;
use crate::agent::store::SnapshotStore;
use crate::app::config::LlmConfig;

/// Derives a buy/hold/sell call from the latest stored analysis snapshot.
/// Never re-runs the pipeline; an existing snapshot of any age is the
/// prerequisite.
pub struct InvestmentRecommender {
  store : SnapshotStore,
  llm : LlmConfig,
}

impl InvestmentRecommender {

  pub fn new(store: SnapshotStore, llm: LlmConfig) -> Self {
    InvestmentRecommender { store, llm }
  }

  pub async fn recommend(&self, ticker: &str) -> Result<Recommendation, PipelineError> {
    let ticker : String = ticker.trim().to_uppercase();
    log::info!("Generating investment recommendation for {}", ticker);

    let entry = self
      .store
      .latest(&ticker)
      .ok_or_else(|| PipelineError::RecommendationPrerequisiteMissing { ticker: ticker.clone() })?;
    let analysis : TickerAnalysis = self.store.load(&entry).map_err(PipelineError::Other)?;

    let (metrics, key_risks, key_opportunities) = Self::calculate_metrics(&analysis);
    let overall_score : f64 = scoring::recommendation_score(&metrics);
    let category : RecommendationCategory = scoring::recommendation_category(overall_score);

    let llm_reasoning : String = self
      .generate_reasoning(&ticker, &metrics, category, &key_risks, &key_opportunities)
      .await;

    let mut recommendation : Recommendation = Recommendation {
      ticker: ticker.clone(),
      recommendation: category,
      overall_score,
      confidence_level: category.confidence().to_string(),
      detailed_scores: metrics,
      key_risks,
      key_opportunities,
      llm_reasoning,
      recommendation_date: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
      analyst: "AI Investment Recommendation System".to_string(),
      report_path: None,
    };

    match self.save(&recommendation) {
      Ok(path) => recommendation.report_path = Some(path.to_string_lossy().to_string()),
      Err(e) => log::error!("Failed to save recommendation files for {}: {}", ticker, e),
    }

    log::info!("{}: {} (score {:.2})", ticker, category, overall_score);
    return Ok(recommendation);
  }

  /// The five blended metrics plus the risk/opportunity call-outs derived
  /// from them and from the underlying dimension findings.
  fn calculate_metrics(analysis: &TickerAnalysis) -> (RecommendationMetrics, Vec<String>, Vec<String>) {
    let future_focus : f64 = analysis.dimension_score(Dimension::CashFlow).unwrap_or(0.0);
    let technology : f64 = analysis.dimension_score(Dimension::Technology).unwrap_or(0.0);
    let leadership : f64 = analysis.dimension_score(Dimension::Leadership).unwrap_or(0.0);

    let growth_potential : f64 = (future_focus * 0.4 + technology * 0.6).min(10.0);

    // Stability reads the stored profitability figures directly; the
    // dimension score alone hides the downside adjustments.
    let mut financial_stability : f64 = 5.0;
    if let Some(outcome) = analysis.dimension_results.get(&Dimension::Profit) {
      let company_metrics : Option<&Value> = outcome.raw.get("company_metrics");
      let roe : f64 = company_metrics
        .and_then(|m| m.get("roe"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
      let profit_margin : f64 = company_metrics
        .and_then(|m| m.get("profit_margins_current"))
        .and_then(|m| m.get("profit_margin"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

      if roe > 0.15 {
        financial_stability += 2.0;
      } else if roe < 0.05 {
        financial_stability -= 1.0;
      }
      if profit_margin > 0.10 {
        financial_stability += 2.0;
      } else if profit_margin < 0.02 {
        financial_stability -= 1.0;
      }
    }
    let financial_stability : f64 = financial_stability.clamp(0.0, 10.0);

    let market_sentiment : f64 = analysis
      .dimension_score(Dimension::Sentiment)
      .map(scoring::rescale_sentiment)
      .unwrap_or(0.0);

    let metrics : RecommendationMetrics = RecommendationMetrics {
      growth_potential,
      financial_stability,
      leadership_quality: leadership,
      innovation_capacity: growth_potential,
      market_sentiment,
    };

    let mut key_risks : Vec<String> = Vec::new();
    if financial_stability < 5.0 {
      key_risks.push("Low financial stability indicators".to_string());
    }
    if leadership < 5.0 {
      key_risks.push("Questionable leadership effectiveness".to_string());
    }
    if market_sentiment < 4.0 {
      key_risks.push("Negative market sentiment".to_string());
    }

    let mut key_opportunities : Vec<String> = Vec::new();
    if growth_potential > 7.0 {
      key_opportunities.push("Strong growth potential from R&D and technology position".to_string());
    }
    if market_sentiment > 6.0 {
      key_opportunities.push("Favorable market sentiment".to_string());
    }

    if let Some(outcome) = analysis.dimension_results.get(&Dimension::Technology) {
      key_risks.extend(outcome.risks.iter().take(2).cloned());
      key_opportunities.extend(outcome.strengths.iter().take(2).cloned());
    }

    return (metrics, key_risks, key_opportunities);
  }

  /// LLM narrative for the recommendation. Falls back to a quantitative
  /// summary when the model is unavailable.
  async fn generate_reasoning(
    &self,
    ticker: &str,
    metrics: &RecommendationMetrics,
    category: RecommendationCategory,
    risks: &[String],
    opportunities: &[String],
  ) -> String {
    let fallback = || {
      format!(
        "Based on the quantitative analysis, this {} recommendation for {} is \
         supported by the overall score and the individual metric assessments.",
        category, ticker
      )
    };

    let config : LLMModelConfig = LLMModelConfig {
      provider: self.llm.provider,
      model_name: self.llm.model_name.clone(),
      api_key: self.llm.api_key.clone(),
      temperature: Some(0.5),
      max_tokens: Some(600),
    };
    let model = match get_model(&config) {
      Ok(model) => model,
      Err(e) => {
        log::warn!("Skipping LLM reasoning for {}: {}", ticker, e);
        return fallback();
      },
    };

    let context : &str = knowledge::get_context("investment").unwrap_or("");
    let prompt : String = format!(
      "Analyst context:\n{}\n\nTicker: {}\nRecommendation: {}\n\
       Growth potential: {:.1}/10\nFinancial stability: {:.1}/10\n\
       Leadership quality: {:.1}/10\nInnovation capacity: {:.1}/10\n\
       Market sentiment: {:.1}/10\nKey risks: {}\nKey opportunities: {}\n\n\
       In one short paragraph, explain the reasoning behind this recommendation.",
      context, ticker, category,
      metrics.growth_potential, metrics.financial_stability, metrics.leadership_quality,
      metrics.innovation_capacity, metrics.market_sentiment,
      risks.join("; "), opportunities.join("; ")
    );
    let messages : Vec<ChatMessage> = vec![
      ChatMessage { role: "system".to_string(), content: "You are a senior investment analyst.".to_string() },
      ChatMessage { role: "user".to_string(), content: prompt },
    ];

    match model.chat(messages, &config).await {
      Ok(response) => response.content,
      Err(e) => {
        log::warn!("LLM reasoning for {} failed: {}", ticker, e);
        fallback()
      },
    }
  }

  /// Writes the JSON and Markdown side files next to the ticker's snapshot
  /// folders and returns the Markdown path.
  fn save(&self, recommendation: &Recommendation) -> Result<PathBuf> {
    let ticker_dir : PathBuf = self.store.ticker_dir(&recommendation.ticker);
    fs::create_dir_all(&ticker_dir)
      .with_context(|| format!("Failed to create ticker folder {:?}", ticker_dir))?;

    let stamp : String = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let json_path : PathBuf = ticker_dir.join(format!("investment_recommendation_{}.json", stamp));
    fs::write(&json_path, serde_json::to_string_pretty(recommendation)?)
      .with_context(|| format!("Failed to write {:?}", json_path))?;

    let md_path : PathBuf = ticker_dir.join(format!("investment_recommendation_{}.md", stamp));
    fs::write(&md_path, Self::render_markdown(recommendation))
      .with_context(|| format!("Failed to write {:?}", md_path))?;

    log::info!("Recommendation files written to {:?}", ticker_dir);
    return Ok(md_path);
  }

  fn render_markdown(recommendation: &Recommendation) -> String {
    let metrics = &recommendation.detailed_scores;
    let mut report : String = String::new();

    report.push_str(&format!("# Investment Recommendation: {}\n\n", recommendation.ticker));
    report.push_str(&format!("**Date:** {}\n", recommendation.recommendation_date));
    report.push_str(&format!("**Analyst:** {}\n\n", recommendation.analyst));
    report.push_str(&format!(
      "## {} (Score: {:.2}/10, Confidence: {})\n\n",
      recommendation.recommendation, recommendation.overall_score, recommendation.confidence_level
    ));

    report.push_str("## Detailed Scores\n\n");
    report.push_str("| Metric | Score |\n|---|---|\n");
    report.push_str(&format!("| Growth Potential | {:.2}/10 |\n", metrics.growth_potential));
    report.push_str(&format!("| Financial Stability | {:.2}/10 |\n", metrics.financial_stability));
    report.push_str(&format!("| Leadership Quality | {:.2}/10 |\n", metrics.leadership_quality));
    report.push_str(&format!("| Innovation Capacity | {:.2}/10 |\n", metrics.innovation_capacity));
    report.push_str(&format!("| Market Sentiment | {:.2}/10 |\n\n", metrics.market_sentiment));

    if !recommendation.key_opportunities.is_empty() {
      report.push_str("## Key Opportunities\n\n");
      for opportunity in &recommendation.key_opportunities {
        report.push_str(&format!("- {}\n", opportunity));
      }
      report.push('\n');
    }
    if !recommendation.key_risks.is_empty() {
      report.push_str("## Key Risks\n\n");
      for risk in &recommendation.key_risks {
        report.push_str(&format!("- {}\n", risk));
      }
      report.push('\n');
    }

    report.push_str("## Analyst Reasoning\n\n");
    report.push_str(&recommendation.llm_reasoning);
    report.push_str("\n\n---\n\n*Not financial advice. Always do your own research before investing.*\n");
    return report;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::agent::data::analysis::{AnalysisStatus, DimensionOutcome, DimensionResult};
  use crate::agent::llm::model_provider::ModelProvider;
  use serde_json::json;
  use std::collections::{BTreeMap, HashMap};
  use tempfile::TempDir;

  fn offline_llm() -> LlmConfig {
    LlmConfig {
      provider: ModelProvider::Gemini,
      model_name: "gemini-2.5-pro".to_string(),
      api_key: None,
    }
  }

  fn seeded_store(dir: &TempDir) -> SnapshotStore {
    let store = SnapshotStore::new(dir.path());
    let mut results = BTreeMap::new();
    for (dimension, score) in [
      (Dimension::CashFlow, 9.0),
      (Dimension::Leadership, 8.0),
      (Dimension::Technology, 7.0),
      (Dimension::Sentiment, 0.4),
    ] {
      results.insert(
        dimension,
        DimensionOutcome::success(DimensionResult {
          score,
          raw: json!({}),
          strengths: Vec::new(),
          risks: Vec::new(),
        }),
      );
    }
    let overall_scores = scoring::overall_scores(&results);
    let analysis = TickerAnalysis {
      ticker: "AAPL".to_string(),
      analysis_timestamp: "2026-08-30T10:00:00".to_string(),
      llm_used: "gemini".to_string(),
      status: AnalysisStatus::from_results(&results),
      dimension_results: results,
      insights: HashMap::new(),
      overall_scores,
      analysis_duration: "5.00 seconds".to_string(),
      is_cached: false,
      cache_age_days: None,
    };
    store.write(&analysis).unwrap();
    store
  }

  #[tokio::test]
  async fn missing_snapshot_is_a_structured_error() {
    let dir = TempDir::new().unwrap();
    let recommender = InvestmentRecommender::new(SnapshotStore::new(dir.path()), offline_llm());

    match recommender.recommend("TSLA").await {
      Err(PipelineError::RecommendationPrerequisiteMissing { ticker }) => assert_eq!(ticker, "TSLA"),
      other => panic!("expected prerequisite error, got {:?}", other.map(|r| r.recommendation)),
    }
  }

  #[tokio::test]
  async fn recommendation_from_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir);
    let recommender = InvestmentRecommender::new(store, offline_llm());

    let recommendation = recommender.recommend("aapl").await.unwrap();

    // growth = 9*0.4 + 7*0.6 = 7.8; stability baseline 5 (no profit data);
    // sentiment 0.4 rescales to 7.0; blend lands at 7.01 -> BUY.
    assert!((recommendation.detailed_scores.growth_potential - 7.8).abs() < 1e-9);
    assert_eq!(recommendation.detailed_scores.financial_stability, 5.0);
    assert!((recommendation.detailed_scores.market_sentiment - 7.0).abs() < 1e-9);
    assert_eq!(recommendation.overall_score, 7.01);
    assert_eq!(recommendation.recommendation, RecommendationCategory::Buy);
    assert_eq!(recommendation.confidence_level, "Medium-High");
    // No API key: the quantitative fallback reasoning is used.
    assert!(recommendation.llm_reasoning.contains("quantitative"));

    let report_path = recommendation.report_path.expect("side files written");
    assert!(std::path::Path::new(&report_path).exists());
    let json_twin = report_path.replace(".md", ".json");
    assert!(std::path::Path::new(&json_twin).exists());
  }

  #[tokio::test]
  async fn stability_adjustments_from_profit_raw() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());
    let mut results = BTreeMap::new();
    results.insert(
      Dimension::Profit,
      DimensionOutcome::success(DimensionResult {
        score: 9.0,
        raw: json!({
          "company_metrics": {
            "roe": 0.25,
            "profit_margins_current": { "profit_margin": 0.18 },
          }
        }),
        strengths: Vec::new(),
        risks: Vec::new(),
      }),
    );
    let overall_scores = scoring::overall_scores(&results);
    let analysis = TickerAnalysis {
      ticker: "MSFT".to_string(),
      analysis_timestamp: "2026-08-30T10:00:00".to_string(),
      llm_used: "gemini".to_string(),
      status: AnalysisStatus::from_results(&results),
      dimension_results: results,
      insights: HashMap::new(),
      overall_scores,
      analysis_duration: "5.00 seconds".to_string(),
      is_cached: false,
      cache_age_days: None,
    };
    store.write(&analysis).unwrap();

    let recommender = InvestmentRecommender::new(store, offline_llm());
    let recommendation = recommender.recommend("MSFT").await.unwrap();
    // baseline 5 + 2 (ROE > 0.15) + 2 (margin > 0.10)
    assert_eq!(recommendation.detailed_scores.financial_stability, 9.0);
  }

  #[test]
  fn markdown_carries_the_call_and_scores() {
    let recommendation = Recommendation {
      ticker: "AAPL".to_string(),
      recommendation: RecommendationCategory::Buy,
      overall_score: 7.01,
      confidence_level: "Medium-High".to_string(),
      detailed_scores: RecommendationMetrics {
        growth_potential: 7.8,
        financial_stability: 5.0,
        leadership_quality: 8.0,
        innovation_capacity: 7.8,
        market_sentiment: 7.0,
      },
      key_risks: vec!["Thin coverage".to_string()],
      key_opportunities: vec!["Strong growth".to_string()],
      llm_reasoning: "Balanced profile.".to_string(),
      recommendation_date: "2026-08-30T10:00:00".to_string(),
      analyst: "AI Investment Recommendation System".to_string(),
      report_path: None,
    };
    let markdown = InvestmentRecommender::render_markdown(&recommendation);
    assert!(markdown.contains("# Investment Recommendation: AAPL"));
    assert!(markdown.contains("## BUY (Score: 7.01/10, Confidence: Medium-High)"));
    assert!(markdown.contains("| Growth Potential | 7.80/10 |"));
    assert!(markdown.contains("Balanced profile."));
  }
}
