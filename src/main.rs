use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use tribunal_crawler::domain::docket::ScanMode;
use tribunal_crawler::infrastructure::database_connection::DatabaseConnection;
use tribunal_crawler::infrastructure::logging::init_logging;
use tribunal_crawler::{CrawlerConfig, DiscoveryEngine, EnrichmentEngine};

#[derive(Parser)]
#[command(name = "tribunal-crawler", version, about = "Incremental docket discovery and enrichment")]
struct Cli {
    /// Path to a JSON configuration file; defaults apply when omitted.
    #[arg(long, env = "TRIBUNAL_CRAWLER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Highest,
    Lowest,
    Category,
}

impl ModeArg {
    fn as_str(self) -> &'static str {
        match self {
            Self::Highest => "highest",
            Self::Lowest => "lowest",
            Self::Category => "category",
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Scan the next id interval and stage discovered dockets.
    Discover {
        #[arg(long, value_enum, default_value_t = ModeArg::Highest)]
        mode: ModeArg,

        /// Process class for `--mode category`.
        #[arg(long)]
        category: Option<String>,

        /// Keep scanning until a pass makes no progress.
        #[arg(long)]
        follow: bool,
    },
    /// Drain the enrichment queue.
    Enrich {
        /// Keep draining until the incomplete set is empty.
        #[arg(long)]
        follow: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("info");
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CrawlerConfig::load(path).await?,
        None => CrawlerConfig::default(),
    };

    let db = DatabaseConnection::new(&config.database_url).await?;
    db.migrate().await?;

    match cli.command {
        Command::Discover { mode, category, follow } => {
            let mode = ScanMode::from_parts(mode.as_str(), category)?;
            let engine = DiscoveryEngine::new(config, db.pool().clone())?;
            loop {
                let progressed = engine.run(mode.clone()).await?;
                if !progressed {
                    info!("discovery made no progress, stopping");
                    break;
                }
                if !follow {
                    break;
                }
            }
        }
        Command::Enrich { follow } => {
            let engine = EnrichmentEngine::new(config, db.pool().clone())?;
            loop {
                let completed = engine.run().await?;
                if completed == 0 || !follow {
                    break;
                }
            }
        }
    }

    Ok(())
}
