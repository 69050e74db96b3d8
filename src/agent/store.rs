use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::agent::data::analysis::{
  AnalysisStatus, Dimension, DimensionOutcome, OverallScores, TickerAnalysis,
};

/// Snapshot folder name format, e.g. `2026-08-30_141503`.
pub const SNAPSHOT_FORMAT : &str = "%Y-%m-%d_%H%M%S";

const METADATA_FILE : &str = "analysis_metadata.json";
const RAW_DATA_DIR : &str = "raw_data";
const INSIGHTS_FILE : &str = "llm_insights_data.json";

/// Contents of analysis_metadata.json inside each snapshot folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
  pub ticker : String,
  pub analysis_date : String,
  pub analysis_timestamp : String,
  pub components_analyzed : Vec<String>,
  #[serde(default)]
  pub analysis_duration : String,
  #[serde(default)]
  pub llm_used : String,
  #[serde(default)]
  pub overall_scores : OverallScores,
  #[serde(default)]
  pub system_version : String,
}

/// A snapshot folder that parsed as a candidate for reuse.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  pub ticker : String,
  pub folder : PathBuf,
  pub timestamp : NaiveDateTime,
  pub age_in_days : i64,
}

/// Filesystem store of dated analysis snapshots:
/// `<base>/<TICKER>/<timestamp>/{analysis_metadata.json, raw_data/*.json, report md}`.
pub struct SnapshotStore {
  base_dir : PathBuf,
}

impl SnapshotStore {

  pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
    SnapshotStore { base_dir: base_dir.into() }
  }

  pub fn ticker_dir(&self, ticker: &str) -> PathBuf {
    return self.base_dir.join(ticker.to_uppercase());
  }

  /// Persists one analysis as a new snapshot folder and returns its path.
  /// Folders are write-once; a timestamp collision gets a `_2`, `_3`…
  /// uniqueness suffix instead of overwriting.
  pub fn write(&self, analysis: &TickerAnalysis) -> Result<PathBuf> {
    let ticker_dir : PathBuf = self.ticker_dir(&analysis.ticker);
    fs::create_dir_all(&ticker_dir)
      .with_context(|| format!("Failed to create ticker folder {:?}", ticker_dir))?;

    let stamp : String = Local::now().format(SNAPSHOT_FORMAT).to_string();
    let mut folder_name : String = stamp.clone();
    let mut suffix : u32 = 2;
    let folder : PathBuf = loop {
      let candidate : PathBuf = ticker_dir.join(&folder_name);
      match fs::create_dir(&candidate) {
        Ok(()) => break candidate,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
          folder_name = format!("{}_{}", stamp, suffix);
          suffix += 1;
        },
        Err(e) => {
          return Err(e).with_context(|| format!("Failed to create snapshot folder in {:?}", ticker_dir));
        },
      }
    };

    let raw_dir : PathBuf = folder.join(RAW_DATA_DIR);
    fs::create_dir_all(&raw_dir)?;
    for (dimension, outcome) in &analysis.dimension_results {
      let path : PathBuf = raw_dir.join(dimension.raw_file_name());
      fs::write(&path, serde_json::to_string_pretty(outcome)?)
        .with_context(|| format!("Failed to write raw data file {:?}", path))?;
    }
    if !analysis.insights.is_empty() {
      fs::write(raw_dir.join(INSIGHTS_FILE), serde_json::to_string_pretty(&analysis.insights)?)?;
    }

    let components : Vec<String> = analysis
      .dimension_results
      .iter()
      .filter(|(_, outcome)| outcome.error.is_none())
      .map(|(dimension, _)| dimension.as_str().to_string())
      .collect();

    let metadata : AnalysisMetadata = AnalysisMetadata {
      ticker: analysis.ticker.clone(),
      analysis_date: analysis.analysis_timestamp.clone(),
      analysis_timestamp: folder_name,
      components_analyzed: components,
      analysis_duration: analysis.analysis_duration.clone(),
      llm_used: analysis.llm_used.clone(),
      overall_scores: analysis.overall_scores.clone(),
      system_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let metadata_path : PathBuf = folder.join(METADATA_FILE);
    fs::write(&metadata_path, serde_json::to_string_pretty(&metadata)?)
      .with_context(|| format!("Failed to write metadata file {:?}", metadata_path))?;

    log::info!("Saved analysis snapshot for {} at {:?}", analysis.ticker, folder);
    return Ok(folder);
  }

  /// Newest usable snapshot no older than `threshold_days`. A folder whose
  /// name does not parse, or whose metadata is missing or unparseable, is
  /// skipped rather than treated as an error.
  pub fn find_recent(&self, ticker: &str, threshold_days: i64) -> Option<CacheEntry> {
    let mut snapshots : Vec<(NaiveDateTime, String, PathBuf)> = self.snapshots(ticker);

    // Newest first; equal timestamps break on the folder name, so a `_2`
    // collision suffix wins over the bare name.
    while let Some((timestamp, name, folder)) = snapshots.pop() {
      if self.read_metadata(&folder).is_none() {
        log::warn!("Skipping snapshot {:?} with missing or unreadable metadata", folder);
        continue;
      }
      let age_in_days : i64 = (Local::now().naive_local() - timestamp).num_days();
      if age_in_days > threshold_days {
        log::info!("Newest snapshot for {} is {} days old, over the {} day threshold", ticker, age_in_days, threshold_days);
        return None;
      }
      return Some(CacheEntry {
        ticker: ticker.to_uppercase(),
        folder,
        timestamp,
        age_in_days,
      });
    }
    return None;
  }

  /// Newest usable snapshot of any age.
  pub fn latest(&self, ticker: &str) -> Option<CacheEntry> {
    return self.find_recent(ticker, i64::MAX);
  }

  /// Reconstructs a TickerAnalysis from a snapshot folder. Raw-data files
  /// that fail to parse are dropped from the result; the metadata file must
  /// parse.
  pub fn load(&self, entry: &CacheEntry) -> Result<TickerAnalysis> {
    let metadata : AnalysisMetadata = self
      .read_metadata(&entry.folder)
      .with_context(|| format!("Unreadable metadata in snapshot {:?}", entry.folder))?;

    let raw_dir : PathBuf = entry.folder.join(RAW_DATA_DIR);
    let mut results : BTreeMap<Dimension, DimensionOutcome> = BTreeMap::new();
    for dimension in Dimension::ORDER {
      let path : PathBuf = raw_dir.join(dimension.raw_file_name());
      if !path.exists() {
        continue;
      }
      match fs::read_to_string(&path) {
        Ok(content) => match serde_json::from_str::<DimensionOutcome>(&content) {
          Ok(outcome) => {
            results.insert(dimension, outcome);
          },
          Err(e) => log::warn!("Skipping unparseable raw data file {:?}: {}", path, e),
        },
        Err(e) => log::warn!("Skipping unreadable raw data file {:?}: {}", path, e),
      }
    }

    let insights : HashMap<String, String> = fs::read_to_string(raw_dir.join(INSIGHTS_FILE))
      .ok()
      .and_then(|content| serde_json::from_str(&content).ok())
      .unwrap_or_default();

    return Ok(TickerAnalysis {
      ticker: metadata.ticker,
      analysis_timestamp: metadata.analysis_date,
      llm_used: metadata.llm_used,
      status: AnalysisStatus::from_results(&results),
      dimension_results: results,
      insights,
      overall_scores: metadata.overall_scores,
      analysis_duration: metadata.analysis_duration,
      is_cached: true,
      cache_age_days: Some(entry.age_in_days),
    });
  }

  /// All snapshot folders for a ticker, sorted ascending by (timestamp, name).
  fn snapshots(&self, ticker: &str) -> Vec<(NaiveDateTime, String, PathBuf)> {
    let ticker_dir : PathBuf = self.ticker_dir(ticker);
    let entries = match fs::read_dir(&ticker_dir) {
      Ok(entries) => entries,
      Err(_) => return Vec::new(),
    };

    let mut snapshots : Vec<(NaiveDateTime, String, PathBuf)> = entries
      .filter_map(|entry| entry.ok())
      .filter(|entry| entry.path().is_dir())
      .filter_map(|entry| {
        let name : String = entry.file_name().to_string_lossy().to_string();
        let timestamp : NaiveDateTime = Self::parse_snapshot_name(&name)?;
        Some((timestamp, name, entry.path()))
      })
      .collect();
    snapshots.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
    return snapshots;
  }

  /// Accepts `%Y-%m-%d_%H%M%S` names, optionally followed by a `_N`
  /// collision suffix. Anything else is not a snapshot.
  fn parse_snapshot_name(name: &str) -> Option<NaiveDateTime> {
    let stamp : &str = name.get(..17)?;
    if name.len() > 17 && !name[17..].starts_with('_') {
      return None;
    }
    return NaiveDateTime::parse_from_str(stamp, SNAPSHOT_FORMAT).ok();
  }

  fn read_metadata(&self, folder: &Path) -> Option<AnalysisMetadata> {
    let content : String = fs::read_to_string(folder.join(METADATA_FILE)).ok()?;
    return serde_json::from_str(&content).ok();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::agent::data::analysis::DimensionResult;
  use crate::agent::scoring;
  use chrono::Duration;
  use serde_json::json;
  use tempfile::TempDir;

  fn sample_analysis(ticker: &str) -> TickerAnalysis {
    let mut results = BTreeMap::new();
    results.insert(
      Dimension::CashFlow,
      DimensionOutcome::success(DimensionResult {
        score: 9.0,
        raw: json!({"rd_analysis": {"trend_direction": "increasing"}}),
        strengths: vec!["Sustained R&D investment".to_string()],
        risks: Vec::new(),
      }),
    );
    results.insert(
      Dimension::Sentiment,
      DimensionOutcome::success(DimensionResult {
        score: 0.4,
        raw: json!({"news_analysis": {"overall_sentiment": 0.4}}),
        strengths: Vec::new(),
        risks: Vec::new(),
      }),
    );
    results.insert(Dimension::Profit, DimensionOutcome::failure("provider timeout".to_string()));

    let overall_scores = scoring::overall_scores(&results);
    TickerAnalysis {
      ticker: ticker.to_string(),
      analysis_timestamp: "2026-08-30T10:00:00".to_string(),
      llm_used: "gemini".to_string(),
      status: AnalysisStatus::from_results(&results),
      dimension_results: results,
      insights: HashMap::new(),
      overall_scores,
      analysis_duration: "12.40 seconds".to_string(),
      is_cached: false,
      cache_age_days: None,
    }
  }

  fn write_fake_snapshot(store: &SnapshotStore, ticker: &str, name: &str, with_metadata: bool) {
    let folder = store.ticker_dir(ticker).join(name);
    fs::create_dir_all(folder.join(RAW_DATA_DIR)).unwrap();
    if with_metadata {
      let metadata = AnalysisMetadata {
        ticker: ticker.to_string(),
        analysis_date: "2026-01-01T00:00:00".to_string(),
        analysis_timestamp: name.to_string(),
        components_analyzed: Vec::new(),
        analysis_duration: String::new(),
        llm_used: "gemini".to_string(),
        overall_scores: OverallScores::default(),
        system_version: "test".to_string(),
      };
      fs::write(folder.join(METADATA_FILE), serde_json::to_string(&metadata).unwrap()).unwrap();
    }
  }

  fn stamp_days_ago(days: i64) -> String {
    (Local::now() - Duration::days(days)).format(SNAPSHOT_FORMAT).to_string()
  }

  #[test]
  fn write_then_load_round_trips_scores() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());
    let analysis = sample_analysis("AAPL");

    let folder = store.write(&analysis).unwrap();
    assert!(folder.join(METADATA_FILE).exists());
    assert!(folder.join(RAW_DATA_DIR).join("cash_flow_data.json").exists());

    let entry = store.find_recent("AAPL", 15).expect("fresh snapshot should be found");
    assert_eq!(entry.age_in_days, 0);
    let loaded = store.load(&entry).unwrap();

    assert!(loaded.is_cached);
    assert_eq!(loaded.dimension_score(Dimension::CashFlow), Some(9.0));
    assert_eq!(loaded.dimension_score(Dimension::Sentiment), Some(0.4));
    assert_eq!(loaded.dimension_score(Dimension::Profit), None);
    assert_eq!(
      loaded.overall_scores.overall_investment_score,
      analysis.overall_scores.overall_investment_score
    );
    assert_eq!(loaded.status, AnalysisStatus::Partial);
  }

  #[test]
  fn find_recent_misses_for_absent_ticker_and_empty_folder() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());
    assert!(store.find_recent("MSFT", 15).is_none());

    fs::create_dir_all(store.ticker_dir("MSFT")).unwrap();
    assert!(store.find_recent("MSFT", 15).is_none());
  }

  #[test]
  fn find_recent_rejects_stale_newest() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());
    write_fake_snapshot(&store, "TSLA", &stamp_days_ago(30), true);
    assert!(store.find_recent("TSLA", 15).is_none());
    // The recommender path still sees it.
    assert!(store.latest("TSLA").is_some());
  }

  #[test]
  fn find_recent_picks_newest_and_ignores_junk_names() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());
    let old = stamp_days_ago(10);
    let new = stamp_days_ago(2);
    write_fake_snapshot(&store, "NVDA", &old, true);
    write_fake_snapshot(&store, "NVDA", &new, true);
    write_fake_snapshot(&store, "NVDA", "not-a-timestamp", true);

    let entry = store.find_recent("NVDA", 15).unwrap();
    assert_eq!(entry.folder.file_name().unwrap().to_string_lossy(), new);
    assert_eq!(entry.age_in_days, 2);
  }

  #[test]
  fn snapshot_without_metadata_is_skipped() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());
    let older = stamp_days_ago(3);
    let newer = stamp_days_ago(1);
    write_fake_snapshot(&store, "AMD", &older, true);
    write_fake_snapshot(&store, "AMD", &newer, false); // corrupted: no metadata

    let entry = store.find_recent("AMD", 15).unwrap();
    assert_eq!(entry.folder.file_name().unwrap().to_string_lossy(), older);
  }

  #[test]
  fn successive_writes_get_distinct_folders() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());
    let analysis = sample_analysis("GOOG");

    let first = store.write(&analysis).unwrap();
    let second = store.write(&analysis).unwrap();
    assert_ne!(first, second);

    // Whichever folder carries the collision suffix still parses, and the
    // suffixed name wins the timestamp tie.
    let entry = store.find_recent("GOOG", 15).unwrap();
    assert_eq!(entry.folder, second.max(first));
  }

  #[test]
  fn parse_snapshot_name_accepts_suffix_rejects_junk() {
    assert!(SnapshotStore::parse_snapshot_name("2026-08-30_141503").is_some());
    assert!(SnapshotStore::parse_snapshot_name("2026-08-30_141503_2").is_some());
    assert!(SnapshotStore::parse_snapshot_name("2026-08-30_1415").is_none());
    assert!(SnapshotStore::parse_snapshot_name("2026-08-30_141503x").is_none());
    assert!(SnapshotStore::parse_snapshot_name("notes").is_none());
  }
}
