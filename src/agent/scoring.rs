use std::collections::BTreeMap;

use crate::agent::data::analysis::{
  Dimension, DimensionOutcome, OverallScores, RecommendationCategory, RecommendationMetrics,
  RiskLevel,
};

// Overall investment score weights. Sentiment carries the smallest weight
// because the lexicon scorer is the noisiest input.
const WEIGHT_FUTURE_FOCUS : f64 = 0.25;
const WEIGHT_LEADERSHIP : f64 = 0.20;
const WEIGHT_TECHNOLOGY : f64 = 0.25;
const WEIGHT_FINANCIAL_HEALTH : f64 = 0.20;
const WEIGHT_SENTIMENT : f64 = 0.10;

// Recommendation blend weights.
const WEIGHT_GROWTH : f64 = 0.25;
const WEIGHT_STABILITY : f64 = 0.25;
const WEIGHT_REC_LEADERSHIP : f64 = 0.15;
const WEIGHT_INNOVATION : f64 = 0.20;
const WEIGHT_REC_SENTIMENT : f64 = 0.15;

/// Maps a raw sentiment value in [-1, 1] onto the shared 0-10 scale.
pub fn rescale_sentiment(raw: f64) -> f64 {
  return (raw + 1.0) * 5.0;
}

fn round2(value: f64) -> f64 {
  return (value * 100.0).round() / 100.0;
}

/// Blends the per-dimension scores into the overall investment score.
/// A missing or failed dimension contributes 0 to the weighted sum; the
/// denominator is not renormalized, so a single strong dimension still yields
/// a low overall score.
pub fn overall_scores(results: &BTreeMap<Dimension, DimensionOutcome>) -> OverallScores {
  let effective = |dimension: Dimension| -> f64 {
    results.get(&dimension).and_then(|r| r.effective_score()).unwrap_or(0.0)
  };

  let future_focus : f64 = effective(Dimension::CashFlow);
  let financial_health : f64 = effective(Dimension::Profit);
  let leadership : f64 = effective(Dimension::Leadership);
  let technology : f64 = effective(Dimension::Technology);
  // Sentiment extractors score on [-1, 1]; missing sentiment stays 0 rather
  // than being rescaled to the 5.0 midpoint.
  let sentiment : f64 = results
    .get(&Dimension::Sentiment)
    .and_then(|r| r.effective_score())
    .map(rescale_sentiment)
    .unwrap_or(0.0);

  let overall : f64 = round2(
    future_focus * WEIGHT_FUTURE_FOCUS
      + leadership * WEIGHT_LEADERSHIP
      + technology * WEIGHT_TECHNOLOGY
      + financial_health * WEIGHT_FINANCIAL_HEALTH
      + sentiment * WEIGHT_SENTIMENT,
  );

  return OverallScores {
    future_focus_score: round2(future_focus),
    leadership_score: round2(leadership),
    technology_score: round2(technology),
    financial_health_score: round2(financial_health),
    sentiment_score: round2(sentiment),
    overall_investment_score: overall,
    risk_level: risk_level(overall),
  };
}

pub fn risk_level(overall_score: f64) -> RiskLevel {
  if overall_score >= 7.5 {
    return RiskLevel::Low;
  }
  if overall_score >= 5.5 {
    return RiskLevel::Medium;
  }
  return RiskLevel::High;
}

/// Weighted blend of the five recommendation metrics, rounded to 2 decimals.
pub fn recommendation_score(metrics: &RecommendationMetrics) -> f64 {
  return round2(
    metrics.growth_potential * WEIGHT_GROWTH
      + metrics.financial_stability * WEIGHT_STABILITY
      + metrics.leadership_quality * WEIGHT_REC_LEADERSHIP
      + metrics.innovation_capacity * WEIGHT_INNOVATION
      + metrics.market_sentiment * WEIGHT_REC_SENTIMENT,
  );
}

pub fn recommendation_category(score: f64) -> RecommendationCategory {
  if score >= 8.0 {
    return RecommendationCategory::StrongBuy;
  }
  if score >= 6.5 {
    return RecommendationCategory::Buy;
  }
  if score >= 5.0 {
    return RecommendationCategory::Hold;
  }
  if score >= 3.5 {
    return RecommendationCategory::WeakHold;
  }
  return RecommendationCategory::Sell;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::agent::data::analysis::DimensionResult;
  use serde_json::json;

  fn outcome(score: f64) -> DimensionOutcome {
    DimensionOutcome::success(DimensionResult {
      score,
      raw: json!({}),
      strengths: Vec::new(),
      risks: Vec::new(),
    })
  }

  #[test]
  fn weighted_sum_at_low_risk_boundary() {
    let mut results = BTreeMap::new();
    results.insert(Dimension::CashFlow, outcome(9.0));
    results.insert(Dimension::Profit, outcome(6.0));
    results.insert(Dimension::Leadership, outcome(8.0));
    results.insert(Dimension::Technology, outcome(7.0));
    results.insert(Dimension::Sentiment, outcome(0.4)); // rescales to 7.0

    let scores = overall_scores(&results);
    assert_eq!(scores.overall_investment_score, 7.5);
    assert_eq!(scores.risk_level, RiskLevel::Low);
    assert_eq!(scores.sentiment_score, 7.0);
  }

  #[test]
  fn single_dimension_drags_overall_down() {
    let mut results = BTreeMap::new();
    results.insert(Dimension::CashFlow, outcome(9.0));

    let scores = overall_scores(&results);
    assert_eq!(scores.overall_investment_score, 2.25);
    assert_eq!(scores.risk_level, RiskLevel::High);
  }

  #[test]
  fn failed_dimension_contributes_zero() {
    let mut results = BTreeMap::new();
    results.insert(Dimension::CashFlow, outcome(9.0));
    results.insert(Dimension::Profit, DimensionOutcome::failure("timeout".to_string()));

    let scores = overall_scores(&results);
    assert_eq!(scores.overall_investment_score, 2.25);
    assert_eq!(scores.financial_health_score, 0.0);
  }

  #[test]
  fn overall_score_stays_in_range() {
    let mut results = BTreeMap::new();
    for dimension in Dimension::ORDER {
      let score = if dimension == Dimension::Sentiment { 1.0 } else { 10.0 };
      results.insert(dimension, outcome(score));
    }
    let scores = overall_scores(&results);
    assert!(scores.overall_investment_score >= 0.0 && scores.overall_investment_score <= 10.0);
    assert_eq!(scores.overall_investment_score, 10.0);

    let empty = BTreeMap::new();
    assert_eq!(overall_scores(&empty).overall_investment_score, 0.0);
  }

  #[test]
  fn sentiment_rescaling_endpoints() {
    assert_eq!(rescale_sentiment(-1.0), 0.0);
    assert_eq!(rescale_sentiment(0.0), 5.0);
    assert_eq!(rescale_sentiment(1.0), 10.0);
  }

  #[test]
  fn risk_thresholds() {
    assert_eq!(risk_level(7.5), RiskLevel::Low);
    assert_eq!(risk_level(7.49), RiskLevel::Medium);
    assert_eq!(risk_level(5.5), RiskLevel::Medium);
    assert_eq!(risk_level(5.49), RiskLevel::High);
  }

  #[test]
  fn recommendation_thresholds() {
    assert_eq!(recommendation_category(8.0), RecommendationCategory::StrongBuy);
    assert_eq!(recommendation_category(7.99), RecommendationCategory::Buy);
    assert_eq!(recommendation_category(6.5), RecommendationCategory::Buy);
    assert_eq!(recommendation_category(5.0), RecommendationCategory::Hold);
    assert_eq!(recommendation_category(3.5), RecommendationCategory::WeakHold);
    assert_eq!(recommendation_category(3.49), RecommendationCategory::Sell);
  }

  #[test]
  fn recommendation_blend() {
    let metrics = RecommendationMetrics {
      growth_potential: 7.8,
      financial_stability: 5.0,
      leadership_quality: 8.0,
      innovation_capacity: 7.8,
      market_sentiment: 7.0,
    };
    assert_eq!(recommendation_score(&metrics), 7.01);
    assert_eq!(recommendation_category(7.01), RecommendationCategory::Buy);
  }
}
