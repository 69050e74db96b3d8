use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The five analysis dimensions, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
  CashFlow,
  Profit,
  Leadership,
  Technology,
  Sentiment,
}

impl Dimension {

  pub const ORDER : [Dimension; 5] = [
    Dimension::CashFlow,
    Dimension::Profit,
    Dimension::Leadership,
    Dimension::Technology,
    Dimension::Sentiment,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Dimension::CashFlow => "cash_flow",
      Dimension::Profit => "profit",
      Dimension::Leadership => "leadership",
      Dimension::Technology => "technology",
      Dimension::Sentiment => "sentiment",
    }
  }

  pub fn display_name(&self) -> &'static str {
    match self {
      Dimension::CashFlow => "Cash Flow & R&D Analysis",
      Dimension::Profit => "Profitability Analysis",
      Dimension::Leadership => "Leadership Analysis",
      Dimension::Technology => "Technology & IP Analysis",
      Dimension::Sentiment => "Market Sentiment Analysis",
    }
  }

  /// File name of this dimension's payload inside a snapshot's raw_data/.
  pub fn raw_file_name(&self) -> String {
    return format!("{}_data.json", self.as_str());
  }
}

impl fmt::Display for Dimension {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Dimension {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "cash_flow" => Ok(Dimension::CashFlow),
      "profit" => Ok(Dimension::Profit),
      "leadership" => Ok(Dimension::Leadership),
      "technology" => Ok(Dimension::Technology),
      "sentiment" => Ok(Dimension::Sentiment),
      _ => Err(format!("Unknown dimension: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
  Complete,
  Partial,
  FailedValidation,
  Failed,
}

impl AnalysisStatus {

  pub fn as_str(&self) -> &'static str {
    match self {
      AnalysisStatus::Complete => "complete",
      AnalysisStatus::Partial => "partial",
      AnalysisStatus::FailedValidation => "failed_validation",
      AnalysisStatus::Failed => "failed",
    }
  }

  /// Status derived from what the dimension runs actually produced.
  pub fn from_results(results: &BTreeMap<Dimension, DimensionOutcome>) -> Self {
    let succeeded : usize = results.values().filter(|r| r.error.is_none()).count();
    if succeeded == Dimension::ORDER.len() {
      return AnalysisStatus::Complete;
    }
    if succeeded > 0 {
      return AnalysisStatus::Partial;
    }
    return AnalysisStatus::Failed;
  }
}

impl fmt::Display for AnalysisStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
  Low,
  Medium,
  High,
}

impl RiskLevel {
  pub fn as_str(&self) -> &'static str {
    match self {
      RiskLevel::Low => "low",
      RiskLevel::Medium => "medium",
      RiskLevel::High => "high",
    }
  }
}

impl Default for RiskLevel {
  fn default() -> Self {
    RiskLevel::Medium
  }
}

impl fmt::Display for RiskLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// What a single extractor returns on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionResult {
  pub score : f64,
  pub raw : Value,
  pub strengths : Vec<String>,
  pub risks : Vec<String>,
}

/// The captured outcome of one dimension run, success or failure.
/// `error.is_some()` iff the extractor failed; the aggregator then treats
/// the dimension as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DimensionOutcome {
  #[serde(default)]
  pub score : Option<f64>,
  #[serde(default)]
  pub raw : Value,
  #[serde(default)]
  pub strengths : Vec<String>,
  #[serde(default)]
  pub risks : Vec<String>,
  #[serde(default)]
  pub error : Option<String>,
}

impl DimensionOutcome {

  pub fn success(result: DimensionResult) -> Self {
    DimensionOutcome {
      score: Some(result.score),
      raw: result.raw,
      strengths: result.strengths,
      risks: result.risks,
      error: None,
    }
  }

  pub fn failure(message: String) -> Self {
    DimensionOutcome {
      score: None,
      raw: Value::Null,
      strengths: Vec::new(),
      risks: Vec::new(),
      error: Some(message),
    }
  }

  /// The score that participates in aggregation. None for failed runs.
  pub fn effective_score(&self) -> Option<f64> {
    if self.error.is_some() {
      return None;
    }
    return self.score;
  }
}

/// Weighted per-dimension scores plus the blended overall score, as persisted
/// in analysis_metadata.json.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverallScores {
  #[serde(default)]
  pub future_focus_score : f64,
  #[serde(default)]
  pub leadership_score : f64,
  #[serde(default)]
  pub technology_score : f64,
  #[serde(default)]
  pub financial_health_score : f64,
  #[serde(default)]
  pub sentiment_score : f64,
  #[serde(default)]
  pub overall_investment_score : f64,
  #[serde(default)]
  pub risk_level : RiskLevel,
}

/// The in-memory result of one pipeline run (fresh or reconstructed from a
/// cached snapshot).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerAnalysis {
  pub ticker : String,
  pub analysis_timestamp : String,
  pub llm_used : String,
  pub dimension_results : BTreeMap<Dimension, DimensionOutcome>,
  pub insights : HashMap<String, String>,
  pub overall_scores : OverallScores,
  pub status : AnalysisStatus,
  #[serde(default)]
  pub analysis_duration : String,
  #[serde(default)]
  pub is_cached : bool,
  #[serde(default)]
  pub cache_age_days : Option<i64>,
}

impl TickerAnalysis {
  pub fn dimension_score(&self, dimension: Dimension) -> Option<f64> {
    return self.dimension_results.get(&dimension).and_then(|r| r.effective_score());
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationCategory {
  #[serde(rename = "STRONG BUY")]
  StrongBuy,
  #[serde(rename = "BUY")]
  Buy,
  #[serde(rename = "HOLD")]
  Hold,
  #[serde(rename = "WEAK HOLD")]
  WeakHold,
  #[serde(rename = "SELL")]
  Sell,
}

impl RecommendationCategory {

  pub fn as_str(&self) -> &'static str {
    match self {
      RecommendationCategory::StrongBuy => "STRONG BUY",
      RecommendationCategory::Buy => "BUY",
      RecommendationCategory::Hold => "HOLD",
      RecommendationCategory::WeakHold => "WEAK HOLD",
      RecommendationCategory::Sell => "SELL",
    }
  }

  /// Confidence label paired one-to-one with the category thresholds.
  pub fn confidence(&self) -> &'static str {
    match self {
      RecommendationCategory::StrongBuy => "High",
      RecommendationCategory::Buy => "Medium-High",
      RecommendationCategory::Hold => "Medium",
      RecommendationCategory::WeakHold => "Medium-Low",
      RecommendationCategory::Sell => "High",
    }
  }
}

impl fmt::Display for RecommendationCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// The five blended recommendation metrics, all on the 0-10 scale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationMetrics {
  pub growth_potential : f64,
  pub financial_stability : f64,
  pub leadership_quality : f64,
  pub innovation_capacity : f64,
  pub market_sentiment : f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
  pub ticker : String,
  pub recommendation : RecommendationCategory,
  pub overall_score : f64,
  pub confidence_level : String,
  pub detailed_scores : RecommendationMetrics,
  pub key_risks : Vec<String>,
  pub key_opportunities : Vec<String>,
  pub llm_reasoning : String,
  pub recommendation_date : String,
  pub analyst : String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub report_path : Option<String>,
}
