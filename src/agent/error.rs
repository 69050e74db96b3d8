use std::fmt;

/// The two structured failure modes the CLI reports distinctly. Everything
/// else travels as a plain anyhow error.
#[derive(Debug)]
pub enum PipelineError {
  ValidationFailure { ticker: String, detail: String },
  RecommendationPrerequisiteMissing { ticker: String },
  Other(anyhow::Error),
}

impl fmt::Display for PipelineError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PipelineError::ValidationFailure { ticker, detail } => {
        write!(f, "Ticker validation failed for {}: {}", ticker, detail)
      },
      PipelineError::RecommendationPrerequisiteMissing { ticker } => {
        write!(f, "No analysis data found for {}. Run `analyze {}` first.", ticker, ticker)
      },
      PipelineError::Other(e) => write!(f, "{}", e),
    }
  }
}

impl std::error::Error for PipelineError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      PipelineError::Other(e) => Some(e.as_ref()),
      _ => None,
    }
  }
}

impl From<anyhow::Error> for PipelineError {
  fn from(e: anyhow::Error) -> Self {
    PipelineError::Other(e)
  }
}
