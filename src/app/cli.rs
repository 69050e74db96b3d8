use clap::{Parser, Subcommand};

use crate::agent::data::analysis::{AnalysisStatus, TickerAnalysis};
use crate::agent::error::PipelineError;
use crate::agent::pipeline::{AnalysisPipeline, AnalyzeOptions};
use crate::agent::recommender::InvestmentRecommender;
use crate::agent::store::SnapshotStore;
use crate::app::config::{Config, LlmConfig};

#[derive(Parser)]
#[command(name = "ticker-analyzer", version, about = "AI-powered stock ticker analyzer and investment recommender")]
pub struct Cli {
  #[command(subcommand)]
  pub command : Command,
}

#[derive(Subcommand)]
pub enum Command {
  /// Run a comprehensive analysis for a ticker
  Analyze {
    /// Stock ticker symbol, e.g. AAPL
    ticker: String,
    /// LLM provider for narrative insights: gemini or openai
    #[arg(short, long, default_value = "gemini")]
    llm: String,
    /// Skip the investment recommendation after the analysis
    #[arg(long, overrides_with = "recommend")]
    no_recommend: bool,
    /// Generate an investment recommendation after the analysis (default)
    #[arg(long)]
    recommend: bool,
    /// Run a fresh analysis even when a recent snapshot exists
    #[arg(long, overrides_with = "use_cache")]
    force_new: bool,
    /// Reuse a recent snapshot when one is fresh enough (default)
    #[arg(long)]
    use_cache: bool,
  },
  /// Generate an investment recommendation from the latest stored analysis
  Recommend {
    /// Stock ticker symbol, e.g. AAPL
    ticker: String,
    /// LLM provider for the reasoning narrative: gemini or openai
    #[arg(short, long, default_value = "gemini")]
    llm: String,
  },
  /// Show the latest stored analysis for a ticker
  Status {
    /// Stock ticker symbol, e.g. AAPL
    ticker: String,
  },
  /// Show which API keys are configured
  Config,
}

pub async fn run(cli: Cli, config: Config) -> i32 {
  match cli.command {
    Command::Analyze { ticker, llm, no_recommend, recommend: _, force_new, use_cache: _ } => {
      return run_analyze(&ticker, &llm, !no_recommend, force_new, &config).await;
    },
    Command::Recommend { ticker, llm } => {
      return run_recommend(&ticker, &llm, &config).await;
    },
    Command::Status { ticker } => {
      return run_status(&ticker, &config);
    },
    Command::Config => {
      return run_config(&config);
    },
  }
}

async fn run_analyze(ticker: &str, llm: &str, recommend: bool, force_new: bool, config: &Config) -> i32 {
  let ticker : String = ticker.trim().to_uppercase();
  if ticker.len() > 5 || ticker.is_empty() {
    eprintln!("'{}' does not look like a ticker symbol. Use the exchange symbol, e.g. AAPL for Apple.", ticker);
    return 1;
  }

  let llm_config : LlmConfig = LlmConfig::for_preference(llm, config);
  let pipeline : AnalysisPipeline = AnalysisPipeline::with_default_extractors(config, llm_config.clone());
  let options : AnalyzeOptions = AnalyzeOptions { force_new, ..AnalyzeOptions::default() };

  let analysis : TickerAnalysis = match pipeline.analyze(&ticker, &options).await {
    Ok(analysis) => analysis,
    Err(e) => {
      eprintln!("ERROR: {}", e);
      if let PipelineError::ValidationFailure { .. } = e {
        eprintln!("Check that the ticker symbol is correct and traded on a supported exchange.");
      }
      return 1;
    },
  };

  print_analysis_summary(&analysis);

  if analysis.status == AnalysisStatus::Failed {
    eprintln!("Analysis failed: no dimension could be completed.");
    return 1;
  }

  if recommend {
    let recommender : InvestmentRecommender =
      InvestmentRecommender::new(SnapshotStore::new(config.reports_dir.clone()), llm_config);
    match recommender.recommend(&ticker).await {
      Ok(recommendation) => {
        println!();
        println!(
          "Recommendation: {} (score {:.2}/10, confidence {})",
          recommendation.recommendation, recommendation.overall_score, recommendation.confidence_level
        );
        if let Some(path) = recommendation.report_path {
          println!("Recommendation report: {}", path);
        }
      },
      Err(e) => eprintln!("Recommendation failed: {}", e),
    }
  }
  return 0;
}

async fn run_recommend(ticker: &str, llm: &str, config: &Config) -> i32 {
  let llm_config : LlmConfig = LlmConfig::for_preference(llm, config);
  let recommender : InvestmentRecommender =
    InvestmentRecommender::new(SnapshotStore::new(config.reports_dir.clone()), llm_config);

  match recommender.recommend(ticker).await {
    Ok(recommendation) => {
      println!("Investment recommendation for {}", recommendation.ticker);
      println!(
        "  {} (score {:.2}/10, confidence {})",
        recommendation.recommendation, recommendation.overall_score, recommendation.confidence_level
      );
      for risk in &recommendation.key_risks {
        println!("  Risk: {}", risk);
      }
      for opportunity in &recommendation.key_opportunities {
        println!("  Opportunity: {}", opportunity);
      }
      println!();
      println!("{}", recommendation.llm_reasoning);
      if let Some(path) = recommendation.report_path {
        println!();
        println!("Recommendation report: {}", path);
      }
      return 0;
    },
    Err(e) => {
      eprintln!("ERROR: {}", e);
      return 1;
    },
  }
}

fn run_status(ticker: &str, config: &Config) -> i32 {
  let ticker : String = ticker.trim().to_uppercase();
  let store : SnapshotStore = SnapshotStore::new(config.reports_dir.clone());

  let entry = match store.latest(&ticker) {
    Some(entry) => entry,
    None => {
      println!("No analysis found for {}. Run `analyze {}` first.", ticker, ticker);
      return 0;
    },
  };

  match store.load(&entry) {
    Ok(analysis) => {
      let scores = &analysis.overall_scores;
      println!("Latest analysis for {}", ticker);
      println!("  Date: {} ({} days old)", analysis.analysis_timestamp, entry.age_in_days);
      println!("  Status: {}", analysis.status);
      println!("  LLM: {}", analysis.llm_used);
      println!("  Overall score: {:.2}/10 (risk: {})", scores.overall_investment_score, scores.risk_level);
      println!("  Future focus: {:.2}  Financial health: {:.2}", scores.future_focus_score, scores.financial_health_score);
      println!("  Leadership: {:.2}  Technology: {:.2}  Sentiment: {:.2}", scores.leadership_score, scores.technology_score, scores.sentiment_score);
      println!("  Folder: {}", entry.folder.display());
      return 0;
    },
    Err(e) => {
      eprintln!("ERROR: Could not read snapshot {}: {}", entry.folder.display(), e);
      return 1;
    },
  }
}

fn run_config(config: &Config) -> i32 {
  let flag = |key: &str| if key.is_empty() { "not set" } else { "set" };
  println!("Configuration");
  println!("  GOOGLE_API_KEY: {}", flag(&config.google_api_key));
  println!("  OPENAI_API_KEY: {}", flag(&config.openai_api_key));
  println!("  SERPER_API_KEY: {}", flag(&config.serper_api_key));
  println!("  FINANCIAL_DATASETS_API_KEY: {}", flag(&config.financial_datasets_api_key));
  println!("  Reports directory: {}", config.reports_dir);
  return 0;
}

fn print_analysis_summary(analysis: &TickerAnalysis) {
  let scores = &analysis.overall_scores;
  println!();
  println!("Analysis for {} ({})", analysis.ticker, analysis.status);
  if analysis.is_cached {
    println!("  Source: cached snapshot, {} days old", analysis.cache_age_days.unwrap_or(0));
  } else {
    println!("  Duration: {}", analysis.analysis_duration);
  }
  println!("  Future Focus (R&D):  {:.2}/10", scores.future_focus_score);
  println!("  Financial Health:    {:.2}/10", scores.financial_health_score);
  println!("  Leadership:          {:.2}/10", scores.leadership_score);
  println!("  Technology & IP:     {:.2}/10", scores.technology_score);
  println!("  Market Sentiment:    {:.2}/10", scores.sentiment_score);
  println!("  Overall Investment Score: {:.2}/10", scores.overall_investment_score);
  println!("  Risk Level: {}", scores.risk_level.as_str().to_uppercase());

  for (dimension, outcome) in &analysis.dimension_results {
    if let Some(error) = &outcome.error {
      println!("  WARNING: {} failed: {}", dimension.display_name(), error);
    }
  }
}
