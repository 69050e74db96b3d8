use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agent::data::analysis::{Dimension, DimensionResult};
use crate::agent::data::models::{
  CompanyFacts, CompanyFactsResponse, FinancialMetrics, FinancialMetricsResponse, LineItem,
  LineItemResponse,
};
use crate::agent::pipeline::TickerValidator;
use crate::agent::workflow::chain::DimensionExtractor;
use crate::app::config::Config;

const BASE_URL : &str = "https://api.financialdatasets.ai";

/// Client for the financialdatasets.ai endpoints. Also serves as the
/// validation probe: a ticker with no company facts is treated as invalid.
pub struct FinancialClient {
  api_key : String,
  client : Client,
}

impl FinancialClient {

  pub fn new(config: &Config) -> Self {
    FinancialClient {
      api_key: config.financial_datasets_api_key.clone(),
      client: Client::new(),
    }
  }

  fn headers(&self) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert("X-API-KEY", self.api_key.parse()?);
    return Ok(headers);
  }

  pub async fn get_company_facts(&self, ticker: &str) -> Result<CompanyFacts> {
    let url : String = format!("{}/company/facts?ticker={}", BASE_URL, ticker);
    let response : Response = self.client.get(&url).headers(self.headers()?).send().await?;

    if !response.status().is_success() {
      return Err(anyhow!("Company facts request for {} failed with status {}", ticker, response.status()));
    }
    let facts_response : CompanyFactsResponse = response.json().await?;
    return Ok(facts_response.company_facts);
  }

  pub async fn get_financial_metrics(&self, ticker: &str, limit: u32) -> Result<Vec<FinancialMetrics>> {
    let url : String = format!(
      "{}/financial-metrics/?ticker={}&period=ttm&limit={}",
      BASE_URL, ticker, limit
    );
    let response : Response = self.client.get(&url).headers(self.headers()?).send().await?;

    if !response.status().is_success() {
      return Err(anyhow!("Financial metrics request for {} failed with status {}", ticker, response.status()));
    }
    let metrics_response : FinancialMetricsResponse = response.json().await?;
    return Ok(metrics_response.financial_metrics);
  }

  pub async fn search_line_items(&self, ticker: &str, line_items: &[&str], limit: u32) -> Result<Vec<LineItem>> {
    let url : String = format!("{}/financials/search/line-items", BASE_URL);
    let body = json!({
      "tickers": [ticker],
      "line_items": line_items,
      "period": "annual",
      "limit": limit,
    });
    let response : Response = self.client.post(&url).headers(self.headers()?).json(&body).send().await?;

    if !response.status().is_success() {
      return Err(anyhow!("Line item search for {} failed with status {}", ticker, response.status()));
    }
    let line_item_response : LineItemResponse = response.json().await?;
    return Ok(line_item_response.search_results);
  }
}

#[async_trait]
impl TickerValidator for FinancialClient {
  async fn validate(&self, ticker: &str) -> Result<()> {
    let facts : CompanyFacts = self
      .get_company_facts(ticker)
      .await
      .with_context(|| format!("No company information found for {}", ticker))?;
    if facts.name.trim().is_empty() {
      bail!("No financial data available for {}", ticker);
    }
    log::info!("Validated ticker {} ({})", ticker, facts.name);
    return Ok(());
  }
}

/// Scores future focus from the R&D-to-revenue ratio across recent annual
/// reports, plus the revenue growth trend.
pub struct CashFlowExtractor {
  client : Arc<FinancialClient>,
}

impl CashFlowExtractor {

  pub fn new(client: Arc<FinancialClient>) -> Self {
    CashFlowExtractor { client }
  }

  fn future_focus_score(average_rd_ratio: f64) -> f64 {
    if average_rd_ratio > 15.0 {
      return 9.0;
    }
    if average_rd_ratio > 10.0 {
      return 7.0;
    }
    if average_rd_ratio > 5.0 {
      return 5.0;
    }
    return 3.0;
  }
}

#[async_trait]
impl DimensionExtractor for CashFlowExtractor {
  fn dimension(&self) -> Dimension {
    Dimension::CashFlow
  }

  async fn extract(&self, ticker: &str) -> Result<DimensionResult> {
    let facts : CompanyFacts = self.client.get_company_facts(ticker).await?;
    let items : Vec<LineItem> = self
      .client
      .search_line_items(ticker, &["revenue", "research_and_development"], 5)
      .await?;

    // Newest report first, matching the provider's ordering.
    let rd_ratios : Vec<(String, f64)> = items
      .iter()
      .filter_map(|item| {
        let revenue : f64 = item.figure("revenue")?;
        let rd : f64 = item.figure("research_and_development")?;
        if revenue.abs() < f64::EPSILON {
          return None;
        }
        Some((item.report_period.clone(), rd / revenue * 100.0))
      })
      .collect();

    let mut score : f64 = 0.0;
    let mut average_ratio : f64 = 0.0;
    let mut trend : &str = "unknown";
    if !rd_ratios.is_empty() {
      average_ratio = rd_ratios.iter().map(|(_, ratio)| ratio).sum::<f64>() / rd_ratios.len() as f64;
      score = Self::future_focus_score(average_ratio);
      if rd_ratios.len() > 1 {
        trend = if rd_ratios[0].1 >= rd_ratios[rd_ratios.len() - 1].1 { "increasing" } else { "decreasing" };
      }
    }

    let revenue_growth : Option<f64> = self
      .client
      .get_financial_metrics(ticker, 1)
      .await
      .ok()
      .and_then(|metrics| metrics.first().and_then(|m| m.revenue_growth));

    let mut strengths : Vec<String> = Vec::new();
    let mut risks : Vec<String> = Vec::new();
    if score >= 7.0 {
      strengths.push(format!("Sustained R&D investment averaging {:.1}% of revenue", average_ratio));
    }
    if score <= 3.0 {
      risks.push("Low R&D investment relative to revenue".to_string());
    }
    if trend == "decreasing" {
      risks.push("R&D intensity is declining across recent reports".to_string());
    }

    let ratio_map : Value = rd_ratios
      .iter()
      .map(|(period, ratio)| (period.clone(), json!(ratio)))
      .collect::<serde_json::Map<String, Value>>()
      .into();

    let raw : Value = json!({
      "ticker": ticker,
      "company_name": facts.name,
      "sector": facts.sector,
      "rd_analysis": {
        "rd_ratio_to_revenue": ratio_map,
        "average_rd_ratio": average_ratio,
        "trend_direction": trend,
        "future_focus_score": score,
      },
      "revenue_analysis": {
        "latest_revenue_growth": revenue_growth,
      },
      "analysis_summary": {
        "company_name": facts.name,
        "sector": facts.sector,
        "market_cap": facts.market_cap,
        "future_focus_score": score,
      },
    });

    return Ok(DimensionResult { score, raw, strengths, risks });
  }
}

/// Scores financial health from current margins and return on equity:
/// baseline 5, +2 for ROE above 15%, +2 for net margin above 10%.
pub struct ProfitExtractor {
  client : Arc<FinancialClient>,
}

impl ProfitExtractor {

  pub fn new(client: Arc<FinancialClient>) -> Self {
    ProfitExtractor { client }
  }

  fn financial_health_score(roe: Option<f64>, net_margin: Option<f64>) -> f64 {
    let mut score : f64 = 5.0;
    if roe.unwrap_or(0.0) > 0.15 {
      score += 2.0;
    }
    if net_margin.unwrap_or(0.0) > 0.10 {
      score += 2.0;
    }
    return score.min(10.0);
  }
}

#[async_trait]
impl DimensionExtractor for ProfitExtractor {
  fn dimension(&self) -> Dimension {
    Dimension::Profit
  }

  async fn extract(&self, ticker: &str) -> Result<DimensionResult> {
    let metrics : Vec<FinancialMetrics> = self.client.get_financial_metrics(ticker, 5).await?;
    let latest : &FinancialMetrics = metrics
      .first()
      .ok_or_else(|| anyhow!("No financial metrics available for {}", ticker))?;

    let roe : Option<f64> = latest.return_on_equity;
    let net_margin : Option<f64> = latest.net_margin;
    let score : f64 = Self::financial_health_score(roe, net_margin);

    let mut strengths : Vec<String> = Vec::new();
    let mut risks : Vec<String> = Vec::new();
    if roe.unwrap_or(0.0) > 0.15 {
      strengths.push(format!("Strong return on equity at {:.1}%", roe.unwrap_or(0.0) * 100.0));
    }
    if net_margin.unwrap_or(0.0) > 0.10 {
      strengths.push(format!("Healthy net margin at {:.1}%", net_margin.unwrap_or(0.0) * 100.0));
    }
    if net_margin.unwrap_or(0.0) < 0.02 {
      risks.push("Thin net margins leave little room for execution errors".to_string());
    }
    if roe.unwrap_or(0.0) < 0.05 {
      risks.push("Weak return on equity".to_string());
    }

    let margin_history : Value = metrics
      .iter()
      .map(|m| {
        (
          m.report_period.clone(),
          json!({
            "gross_margin": m.gross_margin,
            "operating_margin": m.operating_margin,
            "net_margin": m.net_margin,
          }),
        )
      })
      .collect::<serde_json::Map<String, Value>>()
      .into();

    let raw : Value = json!({
      "ticker": ticker,
      "profit_margins": margin_history,
      "company_metrics": {
        "roe": roe,
        "profit_margins_current": {
          "gross_margin": latest.gross_margin,
          "operating_margin": latest.operating_margin,
          "profit_margin": net_margin,
        },
        "earnings_growth": latest.earnings_growth,
      },
      "analysis_summary": {
        "financial_health_score": score,
      },
    });

    return Ok(DimensionResult { score, raw, strengths, risks });
  }
}
