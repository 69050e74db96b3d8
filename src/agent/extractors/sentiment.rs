use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agent::data::analysis::{Dimension, DimensionResult};
use crate::agent::extractors::financial::FinancialClient;
use crate::agent::tools::search::{SearchClient, SearchHit};
use crate::agent::workflow::chain::DimensionExtractor;

const POSITIVE_WORDS : [&str; 16] = [
  "beat", "beats", "growth", "surge", "soar", "record", "strong", "upgrade",
  "bullish", "rally", "gain", "gains", "outperform", "profit", "momentum", "breakthrough",
];

const NEGATIVE_WORDS : [&str; 16] = [
  "miss", "misses", "decline", "drop", "plunge", "weak", "downgrade", "bearish",
  "loss", "losses", "lawsuit", "recall", "layoffs", "warning", "underperform", "slump",
];

/// Lexicon polarity of a text: `(positives - negatives) / (positives + negatives)`
/// over word occurrences, in [-1, 1]. 0 when no sentiment words appear.
pub fn score_text(text: &str) -> f64 {
  let lowered : String = text.to_lowercase();
  let words : Vec<&str> = lowered
    .split(|c: char| !c.is_alphanumeric())
    .filter(|w| !w.is_empty())
    .collect();

  let positives : usize = words.iter().filter(|w| POSITIVE_WORDS.contains(w)).count();
  let negatives : usize = words.iter().filter(|w| NEGATIVE_WORDS.contains(w)).count();
  if positives + negatives == 0 {
    return 0.0;
  }
  let score : f64 = (positives as f64 - negatives as f64) / (positives + negatives) as f64;
  return score.clamp(-1.0, 1.0);
}

fn article_category(score: f64) -> &'static str {
  if score > 0.1 {
    return "positive";
  }
  if score < -0.1 {
    return "negative";
  }
  return "neutral";
}

fn overall_category(score: f64) -> &'static str {
  if score > 0.15 {
    return "positive";
  }
  if score < -0.15 {
    return "negative";
  }
  return "neutral";
}

/// Scores market sentiment from recent news search results using the
/// lexicon above. News is the only source; the combined score keeps the
/// news-only confidence level.
pub struct SentimentExtractor {
  financial : Arc<FinancialClient>,
  search : Arc<SearchClient>,
}

impl SentimentExtractor {

  pub fn new(financial: Arc<FinancialClient>, search: Arc<SearchClient>) -> Self {
    SentimentExtractor { financial, search }
  }

  async fn gather(&self, query: &str) -> Vec<SearchHit> {
    match self.search.search(query, 5).await {
      Ok(hits) => hits,
      Err(e) => {
        log::warn!("Sentiment search failed for '{}': {}", query, e);
        Vec::new()
      },
    }
  }
}

#[async_trait]
impl DimensionExtractor for SentimentExtractor {
  fn dimension(&self) -> Dimension {
    Dimension::Sentiment
  }

  async fn extract(&self, ticker: &str) -> Result<DimensionResult> {
    let facts = self.financial.get_company_facts(ticker).await?;
    let company : &str = if facts.name.trim().is_empty() { ticker } else { &facts.name };

    let queries : [String; 4] = [
      format!("{} stock news today", company),
      format!("{} earnings report analysis", company),
      format!("{} analyst rating price target", company),
      format!("{} company announcement", company),
    ];

    let mut articles : Vec<Value> = Vec::new();
    let mut scores : Vec<f64> = Vec::new();
    let mut positive : usize = 0;
    let mut neutral : usize = 0;
    let mut negative : usize = 0;

    for query in &queries {
      for hit in self.gather(query).await {
        let text : String = format!("{} {}", hit.title, hit.snippet);
        let score : f64 = score_text(&text);
        let category : &str = article_category(score);
        match category {
          "positive" => positive += 1,
          "negative" => negative += 1,
          _ => neutral += 1,
        }
        scores.push(score);
        articles.push(json!({
          "title": hit.title,
          "snippet": hit.snippet,
          "url": hit.link,
          "source": hit.source,
          "sentiment_score": score,
          "sentiment_category": category,
        }));
      }
    }

    let overall : f64 = if scores.is_empty() {
      0.0
    } else {
      scores.iter().sum::<f64>() / scores.len() as f64
    };
    let category : &str = overall_category(overall);
    let data_quality : &str = if scores.len() >= 10 { "good" } else { "limited" };

    let mut strengths : Vec<String> = Vec::new();
    let mut risks : Vec<String> = Vec::new();
    if category == "positive" {
      strengths.push(format!("Positive news coverage across {} recent articles", scores.len()));
    }
    if category == "negative" {
      risks.push("Negative tone in recent news coverage".to_string());
    }
    if scores.len() < 5 {
      risks.push("Thin news coverage, sentiment reading is low-confidence".to_string());
    }

    let raw : Value = json!({
      "ticker": ticker,
      "news_analysis": {
        "articles": articles,
        "articles_analyzed": scores.len(),
        "overall_sentiment": overall,
        "sentiment_distribution": {
          "positive": positive,
          "neutral": neutral,
          "negative": negative,
        },
      },
      "combined_sentiment": {
        "score": overall,
        "category": category,
        "sources": ["news"],
      },
      "analysis_summary": {
        "overall_sentiment_score": overall,
        "sentiment_category": category,
        "confidence_level": 0.7,
        "data_quality": data_quality,
      },
    });

    return Ok(DimensionResult { score: overall, raw, strengths, risks });
  }
}
