use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agent::data::analysis::{Dimension, DimensionResult};
use crate::agent::extractors::financial::FinancialClient;
use crate::agent::tools::search::{SearchClient, SearchHit};
use crate::agent::workflow::chain::DimensionExtractor;

const CORE_TECH_CATEGORIES : [&str; 8] = [
  "artificial intelligence", "cloud", "semiconductor", "robotics",
  "biotech", "cybersecurity", "analytics", "automation",
];

const EMERGING_TECH_CATEGORIES : [&str; 6] = [
  "quantum", "generative ai", "autonomous", "edge computing",
  "augmented reality", "machine learning",
];

const INNOVATION_INDICATORS : [&str; 6] = [
  "patent", "breakthrough", "novel", "first-of-its-kind", "r&d", "prototype",
];

const MOAT_INDICATORS : [&str; 6] = [
  "partnership", "ecosystem", "platform", "proprietary", "licensing", "moat",
];

fn category_presence(text: &str, categories: &[&str]) -> usize {
  let lowered : String = text.to_lowercase();
  return categories.iter().filter(|category| lowered.contains(*category)).count();
}

/// Component scores for the technology dimension, each on 0-10.
struct TechScores {
  innovation : f64,
  patent_strength : f64,
  tech_adoption : f64,
  moat : f64,
  overall : f64,
}

/// Scores the technology and IP posture from patent and tech-stack search
/// results.
pub struct TechnologyExtractor {
  financial : Arc<FinancialClient>,
  search : Arc<SearchClient>,
}

impl TechnologyExtractor {

  pub fn new(financial: Arc<FinancialClient>, search: Arc<SearchClient>) -> Self {
    TechnologyExtractor { financial, search }
  }

  async fn gather(&self, query: &str) -> Vec<SearchHit> {
    match self.search.search(query, 5).await {
      Ok(hits) => hits,
      Err(e) => {
        log::warn!("Technology search failed for '{}': {}", query, e);
        Vec::new()
      },
    }
  }

  fn snippets(hits: &[SearchHit]) -> String {
    return hits
      .iter()
      .map(|hit| format!("{} {}", hit.title, hit.snippet))
      .collect::<Vec<String>>()
      .join(" ");
  }

  fn tech_scores(
    recent_patents: usize,
    ip_mentions: usize,
    patent_text: &str,
    tech_text: &str,
    moat_text: &str,
  ) -> TechScores {
    let innovation_signals : usize = category_presence(patent_text, &INNOVATION_INDICATORS);
    let innovation : f64 = ((recent_patents + innovation_signals) as f64 * 1.5).min(10.0);
    let patent_strength : f64 = ((ip_mentions * 2) as f64).min(10.0);

    let core : usize = category_presence(tech_text, &CORE_TECH_CATEGORIES);
    let emerging : usize = category_presence(tech_text, &EMERGING_TECH_CATEGORIES);
    let tech_adoption : f64 = ((core + emerging * 2) as f64 * 0.8).min(10.0);

    let moat_signals : usize = category_presence(moat_text, &MOAT_INDICATORS);
    let moat : f64 = (moat_signals as f64 * 1.2).min(10.0);

    let overall : f64 =
      innovation * 0.3 + patent_strength * 0.25 + tech_adoption * 0.25 + moat * 0.2;
    return TechScores { innovation, patent_strength, tech_adoption, moat, overall };
  }
}

#[async_trait]
impl DimensionExtractor for TechnologyExtractor {
  fn dimension(&self) -> Dimension {
    Dimension::Technology
  }

  async fn extract(&self, ticker: &str) -> Result<DimensionResult> {
    let facts = self.financial.get_company_facts(ticker).await?;
    let company : &str = if facts.name.trim().is_empty() { ticker } else { &facts.name };

    let patent_hits : Vec<SearchHit> =
      self.gather(&format!("{} recent patents filed innovation", company)).await;
    let ip_hits : Vec<SearchHit> =
      self.gather(&format!("{} intellectual property portfolio strategy", company)).await;
    let tech_hits : Vec<SearchHit> =
      self.gather(&format!("{} core technologies products platform", company)).await;
    let moat_hits : Vec<SearchHit> =
      self.gather(&format!("{} technology partnerships competitive advantage", company)).await;

    let patent_text : String = Self::snippets(&patent_hits);
    let tech_text : String = Self::snippets(&tech_hits);
    let moat_text : String = Self::snippets(&moat_hits);

    let scores : TechScores = Self::tech_scores(
      patent_hits.len(),
      ip_hits.len(),
      &patent_text,
      &tech_text,
      &moat_text,
    );

    let mut strengths : Vec<String> = Vec::new();
    let mut risks : Vec<String> = Vec::new();
    if scores.innovation >= 7.0 {
      strengths.push("Active patent filing and innovation pipeline".to_string());
    }
    if scores.tech_adoption >= 7.0 {
      strengths.push("Broad adoption of core and emerging technologies".to_string());
    }
    if scores.moat >= 7.0 {
      strengths.push("Defensible technology moat through partnerships and proprietary platforms".to_string());
    }
    if scores.innovation <= 3.0 {
      risks.push("Little visible innovation activity".to_string());
    }
    if scores.patent_strength <= 3.0 {
      risks.push("Weak intellectual property position".to_string());
    }
    if scores.moat <= 3.0 {
      risks.push("No clear competitive technology moat".to_string());
    }

    let raw : Value = json!({
      "ticker": ticker,
      "company_info": {
        "name": facts.name,
        "industry": facts.industry,
      },
      "patent_analysis": {
        "recent_patent_results": patent_hits.len(),
        "ip_strategy_results": ip_hits.len(),
      },
      "technology_analysis": {
        "innovation_score": scores.innovation,
        "patent_strength": scores.patent_strength,
        "tech_adoption": scores.tech_adoption,
        "moat_score": scores.moat,
        "overall_tech_score": scores.overall,
      },
      "analysis_summary": {
        "overall_tech_score": scores.overall,
        "key_strengths": strengths,
        "potential_risks": risks,
      },
    });

    return Ok(DimensionResult { score: scores.overall, raw, strengths, risks });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tech_scores_cap_components() {
    let patent_text = "patent breakthrough novel r&d prototype first-of-its-kind";
    let tech_text = "cloud analytics automation quantum machine learning";
    let moat_text = "partnership ecosystem platform proprietary licensing moat";
    let scores = TechnologyExtractor::tech_scores(5, 5, patent_text, tech_text, moat_text);

    assert_eq!(scores.innovation, 10.0); // (5 + 6) * 1.5 capped
    assert_eq!(scores.patent_strength, 10.0);
    // 3 core + 2 emerging * 2 = 7 signals * 0.8
    assert!((scores.tech_adoption - 5.6).abs() < 1e-9);
    assert!((scores.moat - 7.2).abs() < 1e-9);
    assert!(scores.overall <= 10.0 && scores.overall > 0.0);
  }

  #[test]
  fn empty_inputs_score_zero() {
    let scores = TechnologyExtractor::tech_scores(0, 0, "", "", "");
    assert_eq!(scores.overall, 0.0);
  }
}
