mod api;
mod commands;
mod config;
mod feed;
mod logging;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::{info, warn};

use api::HttpGateway;
use feed::FeedCache;

#[derive(Parser, Debug)]
#[command(name = "feedsync")]
#[command(about = "Browse and update a social feed from the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/feedsync/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = config::Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(&config.logging)?;

  let gateway = HttpGateway::new(&config.api)?;
  let cache = FeedCache::new(gateway, config.feed.page_size);
  if let Some(token) = config::Config::session_token() {
    cache.sign_in(token);
  }
  if !cache.is_authenticated() {
    info!("No session token, running signed out");
  }

  let result = commands::run(args.command, &cache).await;

  // Failures a command recovered from, e.g. a reload after posting
  if let Some(error) = cache.errors().take() {
    if result.is_ok() {
      eprintln!("warning: {}", error);
    }
    warn!(%error, "Last recorded feed error");
  }
  cache.reset();

  result
}
