use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::browser::ChromeLauncher;
use crate::config::ScraperConfig;
use crate::csv::render_csv;
use crate::error::ScraperError;
use crate::profile::ProfileUrl;
use crate::scraper::RatingsScraper;
use crate::traits::Launcher;

/// スクレイピングリクエスト
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub profile_url: String,
    pub output_dir: Option<PathBuf>,
    pub headless: Option<bool>,
}

impl ScrapeRequest {
    pub fn new(profile_url: impl Into<String>) -> Self {
        Self {
            profile_url: profile_url.into(),
            output_dir: None,
            headless: None,
        }
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = Some(headless);
        self
    }

    /// サービス既定の設定にリクエスト固有の値を上書きする
    fn apply(&self, base: &ScraperConfig) -> ScraperConfig {
        let mut config = base.clone();
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(headless) = self.headless {
            config.headless = headless;
        }
        config
    }
}

/// スクレイピング結果
#[derive(Debug)]
pub struct ScrapeResult {
    pub username: String,
    pub csv_path: PathBuf,
    pub csv_content: Vec<u8>,
    pub record_count: usize,
}

impl ScrapeResult {
    pub fn file_name(&self) -> String {
        crate::csv::ratings_file_name(&self.username)
    }
}

/// tower::Serviceを実装したスクレイパーサービス
///
/// リクエストごとに独立したブラウザセッションを開く。
#[derive(Debug, Clone, Default)]
pub struct ScraperService<L = ChromeLauncher> {
    config: ScraperConfig,
    launcher: L,
}

impl ScraperService<ChromeLauncher> {
    pub fn new(config: ScraperConfig) -> Self {
        Self::with_launcher(config, ChromeLauncher)
    }
}

impl<L> ScraperService<L> {
    pub fn with_launcher(config: ScraperConfig, launcher: L) -> Self {
        Self { config, launcher }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }
}

impl<L> Service<ScrapeRequest> for ScraperService<L>
where
    L: Launcher + Clone + 'static,
{
    type Response = ScrapeResult;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        info!("スクレイピングリクエスト受信: url={}", req.profile_url);

        let config = req.apply(&self.config);
        let launcher = self.launcher.clone();

        Box::pin(async move {
            let profile = ProfileUrl::parse(&req.profile_url)?;
            let scraper = RatingsScraper::with_launcher(config, launcher);

            let outcome = scraper.scrape(&profile).await?;
            // ファイルは同一ユーザーの別リクエストで上書きされうるため、
            // 読み戻さずにこのリクエストのレコードから生成する
            let csv_content = render_csv(&outcome.records).into_bytes();

            info!(
                "スクレイピング完了: path={:?}, size={}bytes, ratings={}",
                outcome.csv_path,
                csv_content.len(),
                outcome.records.len()
            );

            Ok(ScrapeResult {
                username: outcome.profile.username,
                csv_path: outcome.csv_path,
                csv_content,
                record_count: outcome.records.len(),
            })
        })
    }
}
