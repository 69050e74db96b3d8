use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agent::data::analysis::{Dimension, DimensionResult};
use crate::agent::extractors::financial::FinancialClient;
use crate::agent::tools::search::{SearchClient, SearchHit};
use crate::agent::workflow::chain::DimensionExtractor;

const TECH_KEYWORDS : [&str; 10] = [
  "engineering", "computer science", "technology", "software", "ai",
  "machine learning", "data", "technical", "developer", "programming",
];

const LEADERSHIP_KEYWORDS : [&str; 8] = [
  "vision", "strategy", "transform", "culture", "growth",
  "execution", "operational", "turnaround",
];

const INNOVATION_KEYWORDS : [&str; 8] = [
  "innovation", "disrupt", "future", "invest", "research",
  "breakthrough", "pioneer", "experiment",
];

/// Counts how many keywords from the list appear in the text. Presence, not
/// occurrences.
fn keyword_presence(text: &str, keywords: &[&str]) -> usize {
  let lowered : String = text.to_lowercase();
  return keywords.iter().filter(|keyword| lowered.contains(*keyword)).count();
}

/// Scores CEO/leadership impact from web-search snippets about the
/// executive's background, style and public statements.
pub struct LeadershipExtractor {
  financial : Arc<FinancialClient>,
  search : Arc<SearchClient>,
}

impl LeadershipExtractor {

  pub fn new(financial: Arc<FinancialClient>, search: Arc<SearchClient>) -> Self {
    LeadershipExtractor { financial, search }
  }

  async fn gather(&self, query: &str) -> Vec<SearchHit> {
    match self.search.search(query, 5).await {
      Ok(hits) => hits,
      Err(e) => {
        log::warn!("Leadership search failed for '{}': {}", query, e);
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

  fn impact_scores(background: &str, style: &str, statements: &str) -> (f64, f64, f64, f64) {
    let technical : f64 = ((keyword_presence(background, &TECH_KEYWORDS) * 2) as f64).min(10.0);
    let leadership : f64 = (keyword_presence(style, &LEADERSHIP_KEYWORDS) as f64 * 1.5).min(10.0);
    let combined : String = format!("{} {}", style, statements);
    let innovation : f64 = (keyword_presence(&combined, &INNOVATION_KEYWORDS) as f64 * 1.2).min(10.0);
    let future_impact : f64 = technical * 0.4 + leadership * 0.4 + innovation * 0.2;
    return (technical, leadership, innovation, future_impact);
  }
}

#[async_trait]
impl DimensionExtractor for LeadershipExtractor {
  fn dimension(&self) -> Dimension {
    Dimension::Leadership
  }

  async fn extract(&self, ticker: &str) -> Result<DimensionResult> {
    let facts = self.financial.get_company_facts(ticker).await?;
    let company : &str = if facts.name.trim().is_empty() { ticker } else { &facts.name };

    let background_hits : Vec<SearchHit> =
      self.gather(&format!("{} CEO biography education background", company)).await;
    let style_hits : Vec<SearchHit> =
      self.gather(&format!("{} CEO leadership style management approach", company)).await;
    let technical_hits : Vec<SearchHit> =
      self.gather(&format!("{} CEO technical background engineering experience", company)).await;
    let statement_hits : Vec<SearchHit> =
      self.gather(&format!("{} CEO interviews quotes vision", company)).await;

    let background : String = format!("{} {}", Self::snippets(&background_hits), Self::snippets(&technical_hits));
    let style : String = Self::snippets(&style_hits);
    let statements : String = Self::snippets(&statement_hits);

    let (technical, leadership, innovation, future_impact) =
      Self::impact_scores(&background, &style, &statements);

    let mut strengths : Vec<String> = Vec::new();
    let mut risks : Vec<String> = Vec::new();
    if technical >= 7.0 {
      strengths.push("CEO has a strong technical background".to_string());
    }
    if leadership >= 7.0 {
      strengths.push("Proven leadership and execution track record".to_string());
    }
    if innovation >= 7.0 {
      strengths.push("Innovation-oriented public communication".to_string());
    }
    if technical <= 3.0 {
      risks.push("Limited evidence of technical depth in leadership".to_string());
    }
    if leadership <= 3.0 {
      risks.push("Sparse public record of leadership effectiveness".to_string());
    }

    let raw : Value = json!({
      "ticker": ticker,
      "company_info": {
        "name": facts.name,
        "sector": facts.sector,
        "industry": facts.industry,
      },
      "ceo_background": {
        "education_and_background": background,
        "leadership_style": style,
        "public_statements": statements,
      },
      "leadership_analysis": {
        "technical_competency": technical,
        "leadership_effectiveness": leadership,
        "innovation_orientation": innovation,
        "future_impact_score": future_impact,
      },
      "analysis_summary": {
        "future_impact_score": future_impact,
        "key_strengths": strengths,
        "potential_risks": risks,
      },
    });

    return Ok(DimensionResult { score: future_impact, raw, strengths, risks });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keyword_presence_counts_distinct_keywords() {
    let text = "A software engineering leader focused on AI and machine learning. Software everywhere.";
    // software, engineering, ai, machine learning — "software" only counts once
    assert_eq!(keyword_presence(text, &TECH_KEYWORDS), 4);
    assert_eq!(keyword_presence("", &TECH_KEYWORDS), 0);
  }

  #[test]
  fn impact_scores_are_capped_and_blended() {
    let background = "engineering computer science technology software ai machine learning data technical developer programming";
    let style = "vision strategy transform culture growth execution operational turnaround";
    let statements = "innovation disrupt future invest research breakthrough pioneer experiment";
    let (technical, leadership, innovation, future_impact) =
      LeadershipExtractor::impact_scores(background, style, statements);
    assert_eq!(technical, 10.0);
    assert_eq!(leadership, 10.0);
    assert_eq!(innovation, 9.6);
    assert!((future_impact - (10.0 * 0.4 + 10.0 * 0.4 + 9.6 * 0.2)).abs() < 1e-9);
  }
}
