//! 評価一覧スクレイパー
//!
//! 状態遷移: INIT → LOADING_PAGE → EXTRACTING → CHECKING_PAGINATION
//! → (LOADING_PAGE | DONE) → WRITING_OUTPUT → CLOSED

use std::path::PathBuf;

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::browser::ChromeLauncher;
use crate::config::ScraperConfig;
use crate::csv::write_ratings_csv;
use crate::error::ScraperError;
use crate::extract::extract_page;
use crate::pagination::{advance, inspect, PageStep};
use crate::profile::ProfileUrl;
use crate::record::RatingRecord;
use crate::traits::{Launcher, ListingPage};

/// スクレイピング結果
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub profile: ProfileUrl,
    /// 出現順（1ページ目 → 2ページ目 …）
    pub records: Vec<RatingRecord>,
    pub pages: usize,
    pub csv_path: PathBuf,
}

pub struct RatingsScraper<L: Launcher = ChromeLauncher> {
    config: ScraperConfig,
    launcher: L,
}

impl RatingsScraper<ChromeLauncher> {
    pub fn new(config: ScraperConfig) -> Self {
        Self::with_launcher(config, ChromeLauncher)
    }
}

impl<L: Launcher> RatingsScraper<L> {
    pub fn with_launcher(config: ScraperConfig, launcher: L) -> Self {
        Self { config, launcher }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// 一覧を最後まで辿って CSV を書き出す
    ///
    /// ブラウザセッションは成功・失敗・タイムアウトのいずれでも必ず閉じる。
    pub async fn scrape(&self, profile: &ProfileUrl) -> Result<ScrapeOutcome, ScraperError> {
        info!("[INIT] Starting scrape for {}", profile.username);
        let mut session = self.launcher.launch(&self.config).await?;

        let result = self.run(&session, profile).await;

        if let Err(e) = &result {
            error!("Scrape failed for {}: {}", profile.username, e);
            if self.config.debug {
                if let Some(png) = session.screenshot_base64().await {
                    debug!("Failure screenshot: data:image/png;base64,{}", png);
                }
            }
        }

        info!("[CLOSED] Closing browser session");
        if let Err(e) = session.close().await {
            warn!("Failed to close browser session: {}", e);
        }

        result
    }

    async fn run(
        &self,
        session: &L::Session,
        profile: &ProfileUrl,
    ) -> Result<ScrapeOutcome, ScraperError> {
        let (records, pages) = match timeout(
            self.config.scrape_timeout,
            self.collect(session, profile),
        )
        .await
        {
            Ok(collected) => collected?,
            Err(_) => {
                return Err(ScraperError::Timeout(format!(
                    "スクレイピングが{:?}以内に完了しませんでした",
                    self.config.scrape_timeout
                )))
            }
        };

        info!("[WRITING_OUTPUT] {} ratings from {} pages", records.len(), pages);
        let csv_path = write_ratings_csv(&self.config.output_dir, &profile.username, &records)?;

        Ok(ScrapeOutcome {
            profile: profile.clone(),
            records,
            pages,
            csv_path,
        })
    }

    async fn collect(
        &self,
        session: &L::Session,
        profile: &ProfileUrl,
    ) -> Result<(Vec<RatingRecord>, usize), ScraperError> {
        let url = profile.ratings_url();
        info!("[LOADING_PAGE] {}", url);
        session.goto(&url).await?;

        if session.is_missing_profile().await? {
            return Err(ScraperError::ProfileNotFound(profile.username.clone()));
        }

        let mut records = Vec::new();
        let mut pages = 0;

        loop {
            session.wait_for_listing(self.config.page_timeout).await?;
            pages += 1;

            debug!("[EXTRACTING] page {}", pages);
            let page_records = extract_page(session).await?;
            info!("Page {}: {} ratings", pages, page_records.len());
            records.extend(page_records);

            debug!("[CHECKING_PAGINATION] page {}", pages);
            // 上限到達後は「次へ」をクリックしない
            let step = if pages >= self.config.max_pages {
                inspect(session).await?
            } else {
                advance(session).await?
            };

            match step {
                PageStep::Continue if pages >= self.config.max_pages => {
                    return Err(ScraperError::Pagination(format!(
                        "ページ数が上限 ({}) に達しました",
                        self.config.max_pages
                    )));
                }
                PageStep::Continue => debug!("[LOADING_PAGE] page {}", pages + 1),
                PageStep::Done => break,
                PageStep::NoNext => {
                    // 同じページを再抽出しても重複するだけなので終了する
                    warn!("No next page control on page {}, stopping", pages);
                    break;
                }
            }
        }

        info!("[DONE] {} ratings collected", records.len());
        Ok((records, pages))
    }
}
