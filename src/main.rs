use anyhow::{Context, Result};
use blindtest::app::singers_use_case::SingersUseCase;
use blindtest::config::Config;
use blindtest::infra::ReqwestFetcher;
use blindtest::logging;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "blindtest")]
#[command(about = "Singer dataset builder for the blind test")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for JSON log files (overrides the config file)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the singers category and write the cleaned table
    GetSingers {
        /// Path for singers file
        #[arg(default_value = "./data/singers.csv")]
        singer_file: PathBuf,
    },
    /// Crawl only, writing raw records as a JSON array
    Crawl {
        /// Destination JSON file
        dest: PathBuf,
    },
    /// Clean previously crawled raw records into a table
    Clean {
        /// Raw records JSON file
        source: PathBuf,
        /// Destination CSV file
        dest: PathBuf,
    },
}

async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Ctrl-C received, stopping crawl");
    } else {
        // no signal handler available: never cancel
        std::future::pending::<()>().await;
    }
}

fn use_case(config: &Config) -> Result<SingersUseCase> {
    let fetcher = ReqwestFetcher::new(&config.crawler).context("building HTTP client")?;
    Ok(SingersUseCase::new(
        config.crawler.clone(),
        Arc::new(fetcher),
        tracing::info_span!("singers"),
    ))
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::GetSingers { singer_file } => {
            let report = use_case(&config)?
                .get_singers(&singer_file, ctrl_c())
                .await
                .with_context(|| format!("building {}", singer_file.display()))?;
            println!(
                "Wrote {} singers to {} ({} pages fetched, {} failed{})",
                report.rows_written,
                report.output.display(),
                report.crawl.index_pages + report.crawl.detail_pages,
                report.crawl.failed_fetches,
                if report.crawl.cancelled { ", cancelled" } else { "" }
            );
        }
        Commands::Crawl { dest } => {
            let summary = use_case(&config)?
                .crawl(&dest, ctrl_c())
                .await
                .with_context(|| format!("crawling into {}", dest.display()))?;
            println!("Wrote {} raw records to {}", summary.records, dest.display());
        }
        Commands::Clean { source, dest } => {
            let rows = SingersUseCase::clean(&source, &dest)
                .with_context(|| format!("cleaning {}", source.display()))?;
            println!("Wrote {} singers to {}", rows, dest.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(dir) = &cli.log_dir {
        config.logging.directory = Some(dir.clone());
    }
    let _log_guard = logging::init_logging(&config.logging);

    let result = run(cli, config).await;
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
