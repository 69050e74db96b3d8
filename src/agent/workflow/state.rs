use std::collections::BTreeMap;

use crate::agent::data::analysis::{Dimension, DimensionOutcome, DimensionResult};

/// Mutable state threaded through the analysis chain. Every step records an
/// outcome here; nothing is ever removed.
#[derive(Debug, Clone)]
pub struct AnalysisState {
  pub ticker : String,
  pub results : BTreeMap<Dimension, DimensionOutcome>,
  pub completed : Vec<Dimension>,
  pub errors : Vec<String>,
}

impl AnalysisState {

  pub fn new(ticker: &str) -> Self {
    AnalysisState {
      ticker: ticker.to_string(),
      results: BTreeMap::new(),
      completed: Vec::new(),
      errors: Vec::new(),
    }
  }

  pub fn record_success(&mut self, dimension: Dimension, result: DimensionResult) {
    self.results.insert(dimension, DimensionOutcome::success(result));
    self.completed.push(dimension);
  }

  pub fn record_failure(&mut self, dimension: Dimension, message: String) {
    self.errors.push(format!("{}: {}", dimension, message));
    self.results.insert(dimension, DimensionOutcome::failure(message));
  }
}
