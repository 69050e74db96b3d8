use std::collections::HashMap;

use once_cell::sync::Lazy;

// Curated analyst context snippets, keyed by analysis area. Prepended to the
// LLM insight prompts so the model grounds its narrative in the same
// heuristics the extractors use.
static CONTEXTS : Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
  let mut contexts : HashMap<&'static str, &'static str> = HashMap::new();

  contexts.insert(
    "cash_flow",
    "R&D spending above 15% of revenue signals aggressive future-focused \
     investment, typical of companies building durable technology advantages. \
     Ratios between 5% and 15% indicate steady reinvestment; below 5% suggests \
     a mature, margin-focused business. A rising R&D ratio alongside revenue \
     growth is the strongest forward indicator.",
  );

  contexts.insert(
    "profit",
    "Return on equity above 15% and net margins above 10% indicate efficient, \
     defensible operations. Margins should be read against sector norms: thin \
     margins with high turnover can be healthy in retail but signal trouble in \
     software. Watch for margin compression across consecutive periods.",
  );

  contexts.insert(
    "leadership",
    "CEOs with technical backgrounds tend to outperform in technology-driven \
     sectors. Look for a track record of execution, a clear articulated \
     vision, and consistency between public statements and capital allocation. \
     Founder-led companies often sustain higher innovation rates.",
  );

  contexts.insert(
    "technology",
    "Patent velocity and breadth of core-technology adoption proxy for \
     innovation capacity. A defensible moat shows up as proprietary platforms, \
     ecosystem partnerships and licensing leverage rather than raw patent \
     counts. Presence in emerging areas (AI, quantum, autonomy) is weighted \
     double as it indicates option value.",
  );

  contexts.insert(
    "sentiment",
    "News sentiment is a short-horizon, mean-reverting signal and should carry \
     the smallest weight in a long-term thesis. Persistent negative coverage \
     around fundamentals (guidance cuts, downgrades, litigation) matters more \
     than price-move commentary.",
  );

  contexts.insert(
    "investment",
    "A sound recommendation blends growth potential, financial stability, \
     leadership quality, innovation capacity and market sentiment. Strong \
     conviction requires agreement across independent dimensions; a single \
     outlier score, positive or negative, warrants a hold rather than an \
     extreme call.",
  );

  contexts
});

/// Context snippet for an analysis area ("cash_flow", "profit", "leadership",
/// "technology", "sentiment", "investment").
pub fn get_context(topic: &str) -> Option<&'static str> {
  return CONTEXTS.get(topic).copied();
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::agent::data::analysis::Dimension;

  #[test]
  fn every_dimension_has_context() {
    for dimension in Dimension::ORDER {
      assert!(get_context(dimension.as_str()).is_some(), "missing context for {}", dimension);
    }
    assert!(get_context("investment").is_some());
    assert!(get_context("astrology").is_none());
  }
}
