use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// Wire models for the financialdatasets.ai endpoints the extractors use.
// Fields the analyzers never read are left off.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyFacts {
  pub ticker : String,
  #[serde(default)]
  pub name : String,
  #[serde(default)]
  pub sector : Option<String>,
  #[serde(default)]
  pub industry : Option<String>,
  #[serde(default)]
  pub market_cap : Option<f64>,
  #[serde(default)]
  pub number_of_employees : Option<i64>,
  #[serde(default)]
  pub website_url : Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyFactsResponse {
  pub company_facts : CompanyFacts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialMetrics {
  pub ticker : String,
  pub report_period : String,
  #[serde(default)]
  pub period : Option<String>,
  #[serde(default)]
  pub gross_margin : Option<f64>,
  #[serde(default)]
  pub operating_margin : Option<f64>,
  #[serde(default)]
  pub net_margin : Option<f64>,
  #[serde(default)]
  pub return_on_equity : Option<f64>,
  #[serde(default)]
  pub revenue_growth : Option<f64>,
  #[serde(default)]
  pub earnings_growth : Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinancialMetricsResponse {
  pub financial_metrics : Vec<FinancialMetrics>,
}

/// A reported line item. Requested figures (revenue, R&D, ...) arrive as
/// extra keys, so everything beyond the identifying fields stays loose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
  pub ticker : String,
  pub report_period : String,
  #[serde(default)]
  pub period : Option<String>,
  #[serde(flatten)]
  pub extra : HashMap<String, Value>,
}

impl LineItem {
  pub fn figure(&self, name: &str) -> Option<f64> {
    return self.extra.get(name).and_then(Value::as_f64);
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineItemResponse {
  pub search_results : Vec<LineItem>,
}
