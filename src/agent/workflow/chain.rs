use anyhow::Result;
use async_trait::async_trait;

use crate::agent::data::analysis::{Dimension, DimensionResult};
use crate::agent::workflow::state::AnalysisState;

/// One analysis dimension. Implementations fetch whatever external data they
/// need and reduce it to a scored DimensionResult.
#[async_trait]
pub trait DimensionExtractor: Send + Sync {
  fn dimension(&self) -> Dimension;
  async fn extract(&self, ticker: &str) -> Result<DimensionResult>;
}

/// Ordered, strictly linear list of extractors. One run-and-capture routine
/// covers every step: a failing step is recorded on the state and the chain
/// moves on.
pub struct AnalysisChain {
  steps : Vec<Box<dyn DimensionExtractor>>,
}

impl AnalysisChain {

  pub fn new() -> Self {
    AnalysisChain { steps: Vec::new() }
  }

  pub fn add_step(&mut self, step: Box<dyn DimensionExtractor>) {
    self.steps.push(step);
  }

  pub fn len(&self) -> usize {
    return self.steps.len();
  }

  pub fn is_empty(&self) -> bool {
    return self.steps.is_empty();
  }

  pub async fn run(&self, state: &mut AnalysisState) {
    for step in &self.steps {
      let dimension : Dimension = step.dimension();
      log::info!("[{}] Running {} for {}", dimension, dimension.display_name(), state.ticker);

      match step.extract(&state.ticker).await {
        Ok(result) => {
          log::info!("[{}] Completed with score {:.2}", dimension, result.score);
          state.record_success(dimension, result);
        },
        Err(e) => {
          log::error!("[{}] Failed for {}: {}", dimension, state.ticker, e);
          state.record_failure(dimension, e.to_string());
        },
      }
    }
  }
}
