//! Command-line front end for the ERP transaction API.
//!
//! One-shot commands print a single query. `shell` keeps one cache alive
//! across commands.

mod commands;
mod config;
mod paths;
mod shell;

use std::fs;
use std::fs::File;

use clap::Parser;
use clap::Subcommand;
use erpdash_lib::CachedApi;
use erpdash_lib::cache::Cache;
use erpdash_lib::cache::InMemoryCache;
use log::info;
use simplelog::WriteLogger;

use crate::commands::Query;
use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "erpdash", version, about = "Browse tenants and transactions of the ERP API")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Query(Query),
    /// Interactive shell sharing one cache across commands
    Shell,
}

fn init_logging(config: &Config) {
    paths::rotate_logs();
    let Some(path) = paths::log_file() else { return };
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    let Ok(file) = File::create(&path) else { return };
    let _ = WriteLogger::init(config.log_level, simplelog::Config::default(), file);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(&cli.config);

    let client = cli.config.client()?;
    info!("using {}", client.base_url());
    let cache = Cache::new(InMemoryCache::new(), cli.config.cache_config());
    let api = CachedApi::new(client, cache);

    let result = match &cli.command {
        Command::Query(query) => query.run(&api).await,
        Command::Shell => shell::run(&api).await,
    };

    api.shutdown().await;
    result
}
