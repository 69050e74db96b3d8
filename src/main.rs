use clap::Parser;
use std::env;

use crate::app::cli::Cli;
use crate::app::config::Config;

mod app;
mod agent;

#[tokio::main]
async fn main() {
  if env::var_os("RUST_LOG").is_none() {
    env::set_var("RUST_LOG", "info"); // Default to info for the analyzer
  }
  env_logger::init();

  dotenv::dotenv().ok();

  let cli : Cli = Cli::parse();
  let config : Config = Config::load();

  let exit_code : i32 = app::cli::run(cli, config).await;
  std::process::exit(exit_code);
}
