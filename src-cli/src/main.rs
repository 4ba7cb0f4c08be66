mod commands;
mod config;
mod output;

use std::sync::Arc;

use clap::Parser;
use comment_tree::{CommentTreeStore, HttpCommentApi};
use log::LevelFilter;

use crate::commands::Command;
use crate::config::Config;

#[derive(Parser)]
#[command(name = "rtc", about = "Browse and manage research project discussion threads")]
struct Cli {
    /// Comment API base URL, overrides apiBaseUrl from settings
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Threads per page, overrides itemsPerPage from settings
    #[arg(long, global = true)]
    per_page: Option<usize>,
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(LevelFilter::Warn)
        .format_timestamp_millis()
        .parse_default_env();
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Info);
        }
        2 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder.init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let dir = config::get_config_dir()?;
    let mut config = Config::load(&dir)?;
    if let Some(url) = cli.api_url {
        config.settings.api_base_url = url;
    }
    if let Some(per_page) = cli.per_page {
        config.settings.items_per_page = per_page;
    }

    if let Command::Config = cli.command {
        return output::print_config(&config);
    }

    let api = HttpCommentApi::new(
        &config.settings.api_base_url,
        config.token.clone(),
        config.settings.timeout(),
    )?;
    let store = CommentTreeStore::new(Arc::new(api), config.auth_context()?);
    let result = commands::run(&store, &config.settings, cli.command).await;
    store.dispose();
    result
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    log::info!("rtc {}", env!("CARGO_PKG_VERSION"));

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
