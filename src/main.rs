use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ratings_scraper::server::{router, AppState};
use ratings_scraper::{ProfileUrl, RatingsScraper, ScraperConfig, ScraperService, ServerConfig};

#[derive(Parser, Debug)]
#[command(version, about = "映画評価スクレイパー")]
struct Cli {
    #[command(flatten)]
    scraper: ScraperArgs,

    #[arg(long, env = "RATINGS_BIND", default_value = "127.0.0.1:5000", global = true)]
    bind: SocketAddr,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// HTTP サーバーを起動（既定）
    Serve,
    /// 1プロフィールをスクレイピングして CSV を書き出す
    Scrape {
        /// プロフィールURL（配下のページでも可）
        url: String,
    },
}

#[derive(Args, Debug)]
struct ScraperArgs {
    #[arg(long, env = "RATINGS_OUTPUT_DIR", default_value = "./downloads", global = true)]
    output_dir: PathBuf,

    #[arg(long, env = "RATINGS_HEADLESS", default_value_t = true, action = clap::ArgAction::Set, global = true)]
    headless: bool,

    #[arg(long, env = "RATINGS_DEBUG", global = true)]
    debug: bool,

    #[arg(long, env = "CHROME_PATH", global = true)]
    chrome: Option<PathBuf>,

    #[arg(long, env = "RATINGS_PAGE_TIMEOUT_SECS", default_value_t = 30, global = true)]
    page_timeout_secs: u64,

    #[arg(long, env = "RATINGS_SCRAPE_TIMEOUT_SECS", default_value_t = 600, global = true)]
    scrape_timeout_secs: u64,

    #[arg(long, env = "RATINGS_POLL_INTERVAL_MS", default_value_t = 250, global = true)]
    poll_interval_ms: u64,

    #[arg(long, env = "RATINGS_MAX_PAGES", default_value_t = 500, global = true)]
    max_pages: usize,
}

impl From<ScraperArgs> for ScraperConfig {
    fn from(args: ScraperArgs) -> Self {
        let mut config = ScraperConfig::new()
            .with_output_dir(args.output_dir)
            .with_headless(args.headless)
            .with_debug(args.debug)
            .with_page_timeout(Duration::from_secs(args.page_timeout_secs))
            .with_scrape_timeout(Duration::from_secs(args.scrape_timeout_secs))
            .with_poll_interval(Duration::from_millis(args.poll_interval_ms))
            .with_max_pages(args.max_pages);
        if let Some(chrome) = args.chrome {
            config = config.with_chrome_executable(chrome);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ratings_scraper=debug")),
        )
        .init();

    let cli = Cli::parse();
    let scraper_config: ScraperConfig = cli.scraper.into();

    match cli.command {
        Some(Command::Scrape { url }) => scrape(scraper_config, &url).await,
        Some(Command::Serve) | None => {
            serve(ServerConfig {
                bind: cli.bind,
                scraper: scraper_config,
            })
            .await
        }
    }
}

async fn scrape(config: ScraperConfig, url: &str) -> Result<()> {
    let profile = ProfileUrl::parse(url)?;
    let outcome = RatingsScraper::new(config)
        .scrape(&profile)
        .await
        .with_context(|| format!("failed to scrape ratings for {}", profile.username))?;

    info!(
        "Data has been written to {:?} ({} ratings, {} pages)",
        outcome.csv_path,
        outcome.records.len(),
        outcome.pages
    );
    Ok(())
}

async fn serve(config: ServerConfig) -> Result<()> {
    let state = AppState::new(ScraperService::new(config.scraper));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!("Listening on http://{}", config.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
