use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::agent::data::analysis::{Dimension, DimensionOutcome, TickerAnalysis};

/// Renders the comprehensive Markdown report and writes it into a snapshot
/// folder. Rendering is pure; only `emit` touches the filesystem.
pub struct ReportEmitter;

impl ReportEmitter {

  pub fn emit(folder: &Path, analysis: &TickerAnalysis) -> Result<PathBuf> {
    let content : String = Self::render(analysis);
    let file_name : String = format!(
      "{}_comprehensive_report_{}.md",
      analysis.ticker,
      Local::now().format("%Y%m%d_%H%M%S")
    );
    let path : PathBuf = folder.join(file_name);
    fs::write(&path, content).with_context(|| format!("Failed to write report {:?}", path))?;
    log::info!("Report written to {:?}", path);
    return Ok(path);
  }

  pub fn render(analysis: &TickerAnalysis) -> String {
    let scores = &analysis.overall_scores;
    let mut report : String = String::new();

    report.push_str(&format!("# Comprehensive Investment Analysis: {}\n\n", analysis.ticker));
    report.push_str(&format!("**Analysis Date:** {}\n", analysis.analysis_timestamp));
    report.push_str(&format!("**Analysis Duration:** {}\n", analysis.analysis_duration));
    report.push_str(&format!("**LLM Used:** {}\n", analysis.llm_used));
    report.push_str(&format!("**Status:** {}\n\n", analysis.status));

    report.push_str("## Executive Summary\n\n");
    report.push_str(&format!(
      "**Overall Investment Score: {:.2}/10** (Risk Level: {})\n\n",
      scores.overall_investment_score,
      scores.risk_level.as_str().to_uppercase()
    ));
    report.push_str("| Dimension | Score |\n|---|---|\n");
    report.push_str(&format!("| Future Focus (R&D) | {} |\n", Self::fmt_score(Some(scores.future_focus_score))));
    report.push_str(&format!("| Financial Health | {} |\n", Self::fmt_score(Some(scores.financial_health_score))));
    report.push_str(&format!("| Leadership | {} |\n", Self::fmt_score(Some(scores.leadership_score))));
    report.push_str(&format!("| Technology & IP | {} |\n", Self::fmt_score(Some(scores.technology_score))));
    report.push_str(&format!("| Market Sentiment | {} |\n\n", Self::fmt_score(Some(scores.sentiment_score))));

    for dimension in Dimension::ORDER {
      report.push_str(&format!("## {}\n\n", dimension.display_name()));
      match analysis.dimension_results.get(&dimension) {
        Some(outcome) => report.push_str(&Self::render_dimension(outcome)),
        None => report.push_str("Not analyzed.\n\n"),
      }
    }

    if !analysis.insights.is_empty() {
      report.push_str("## AI-Generated Insights\n\n");
      let mut areas : Vec<&String> = analysis.insights.keys().collect();
      areas.sort();
      for area in areas {
        report.push_str(&format!("### {}\n\n{}\n\n", Self::title_case(area), analysis.insights[area]));
      }
    }

    let (strengths, risks) = Self::rollup(analysis);
    if !strengths.is_empty() {
      report.push_str("## Key Strengths\n\n");
      for strength in strengths {
        report.push_str(&format!("- {}\n", strength));
      }
      report.push('\n');
    }
    if !risks.is_empty() {
      report.push_str("## Key Risks\n\n");
      for risk in risks {
        report.push_str(&format!("- {}\n", risk));
      }
      report.push('\n');
    }

    report.push_str("---\n\n");
    report.push_str(
      "*This report was generated by an automated analysis system. It is not \
       financial advice. Always do your own research before investing.*\n",
    );
    return report;
  }

  fn render_dimension(outcome: &DimensionOutcome) -> String {
    let mut section : String = String::new();
    if let Some(error) = &outcome.error {
      section.push_str(&format!("Analysis failed: {}\n\n", error));
      return section;
    }

    section.push_str(&format!("**Score:** {}\n\n", Self::fmt_score(outcome.score)));
    if !outcome.strengths.is_empty() {
      section.push_str("**Strengths:**\n");
      for strength in &outcome.strengths {
        section.push_str(&format!("- {}\n", strength));
      }
      section.push('\n');
    }
    if !outcome.risks.is_empty() {
      section.push_str("**Risks:**\n");
      for risk in &outcome.risks {
        section.push_str(&format!("- {}\n", risk));
      }
      section.push('\n');
    }
    return section;
  }

  /// Top strengths and risks across all dimensions, capped at five each.
  fn rollup(analysis: &TickerAnalysis) -> (Vec<String>, Vec<String>) {
    let mut strengths : Vec<String> = Vec::new();
    let mut risks : Vec<String> = Vec::new();
    for outcome in analysis.dimension_results.values() {
      strengths.extend(outcome.strengths.iter().cloned());
      risks.extend(outcome.risks.iter().cloned());
    }
    strengths.truncate(5);
    risks.truncate(5);
    return (strengths, risks);
  }

  fn fmt_score(score: Option<f64>) -> String {
    match score {
      Some(value) => format!("{:.2}/10", value),
      None => "N/A".to_string(),
    }
  }

  fn title_case(area: &str) -> String {
    return area
      .split('_')
      .map(|word| {
        let mut chars = word.chars();
        match chars.next() {
          Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
          None => String::new(),
        }
      })
      .collect::<Vec<String>>()
      .join(" ");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::agent::data::analysis::{AnalysisStatus, DimensionResult, OverallScores};
  use crate::agent::scoring;
  use serde_json::json;
  use std::collections::{BTreeMap, HashMap};

  fn analysis_with_failure() -> TickerAnalysis {
    let mut results = BTreeMap::new();
    results.insert(
      Dimension::CashFlow,
      crate::agent::data::analysis::DimensionOutcome::success(DimensionResult {
        score: 9.0,
        raw: json!({}),
        strengths: vec!["Sustained R&D investment".to_string()],
        risks: Vec::new(),
      }),
    );
    results.insert(
      Dimension::Profit,
      crate::agent::data::analysis::DimensionOutcome::failure("provider down".to_string()),
    );
    let overall_scores : OverallScores = scoring::overall_scores(&results);
    TickerAnalysis {
      ticker: "AAPL".to_string(),
      analysis_timestamp: "2026-08-30T10:00:00".to_string(),
      llm_used: "gemini".to_string(),
      status: AnalysisStatus::from_results(&results),
      dimension_results: results,
      insights: HashMap::from([("financial".to_string(), "Solid R&D profile.".to_string())]),
      overall_scores,
      analysis_duration: "8.00 seconds".to_string(),
      is_cached: false,
      cache_age_days: None,
    }
  }

  #[test]
  fn render_includes_scores_failures_and_insights() {
    let report = ReportEmitter::render(&analysis_with_failure());
    assert!(report.contains("# Comprehensive Investment Analysis: AAPL"));
    assert!(report.contains("**Score:** 9.00/10"));
    assert!(report.contains("Analysis failed: provider down"));
    assert!(report.contains("Not analyzed."));
    assert!(report.contains("### Financial"));
    assert!(report.contains("Solid R&D profile."));
    assert!(report.contains("- Sustained R&D investment"));
  }

  #[test]
  fn emit_writes_markdown_into_folder() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = ReportEmitter::emit(dir.path(), &analysis_with_failure()).unwrap();
    assert!(path.exists());
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("AAPL_comprehensive_report_"));
    assert!(name.ends_with(".md"));
  }
}
