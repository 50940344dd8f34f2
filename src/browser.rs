//! chromiumoxide による一覧ページ操作

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::{Launcher, ListingPage};
use crate::types::{ListingEntry, NavControl, DOM};

/// クリック前の文書に付けるマーカー属性（遷移後の新しい文書には存在しない）
const STALE_MARKER: &str = "data-ratings-scraper-stale";

#[derive(Deserialize)]
struct ListingScan {
    found: bool,
    entries: Vec<ListingEntry>,
}

/// セッションごとのユーザーデータディレクトリ。破棄時に削除する
#[derive(Debug)]
struct UserDataDir(PathBuf);

impl UserDataDir {
    fn unique() -> Self {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let unique_id = format!(
            "{}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            SEQ.fetch_add(1, Ordering::Relaxed)
        );
        Self(std::env::temp_dir().join(format!("ratings-scraper-{}", unique_id)))
    }

    fn path(&self) -> &Path {
        &self.0
    }

    fn remove(&self) {
        match std::fs::remove_dir_all(&self.0) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!("Failed to remove user data dir {:?}: {}", self.0, e),
        }
    }
}

impl Drop for UserDataDir {
    fn drop(&mut self) {
        self.remove();
    }
}

/// ウィンドウ表示モード（ヘッドレス時は `--headless=new`）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowMode {
    Headed,
    NewHeadless,
}

impl WindowMode {
    fn for_config(config: &ScraperConfig) -> Self {
        if config.headless {
            WindowMode::NewHeadless
        } else {
            WindowMode::Headed
        }
    }
}

/// Chromium を起動するランチャー
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeLauncher;

#[async_trait]
impl Launcher for ChromeLauncher {
    type Session = BrowserSession;

    async fn launch(&self, config: &ScraperConfig) -> Result<BrowserSession, ScraperError> {
        BrowserSession::launch(config).await
    }
}

/// 1回のスクレイピングで使うブラウザとページ
pub struct BrowserSession {
    browser: Option<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    // browser より後に破棄する（プロセス終了後にディレクトリを削除）
    user_data_dir: UserDataDir,
    poll_interval: Duration,
}

impl BrowserSession {
    pub async fn launch(config: &ScraperConfig) -> Result<Self, ScraperError> {
        info!("Initializing browser...");

        let user_data_dir = UserDataDir::unique();

        let (width, height) = config.window_size;
        let mut builder = BrowserConfig::builder()
            .user_data_dir(user_data_dir.path())
            .window_size(width, height);

        if let Some(chrome_path) = config.resolve_chrome_executable() {
            builder = builder.chrome_executable(chrome_path);
        }

        builder = match WindowMode::for_config(config) {
            WindowMode::Headed => builder.with_head(),
            WindowMode::NewHeadless => builder.new_headless_mode(),
        };

        builder = builder
            .no_sandbox()
            .request_timeout(config.page_timeout)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        if config.debug {
            builder = builder.arg("--enable-logging=stderr").arg("--v=1");
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(format!("ブラウザ設定エラー: {}", e)))?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        // ブラウザイベントハンドラをバックグラウンドで実行
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {:?}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                // 起動済みのプロセスを残さない
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(ScraperError::BrowserInit(e.to_string()));
            }
        };

        info!("Browser initialized successfully");
        Ok(Self {
            browser: Some(browser),
            page,
            handler,
            user_data_dir,
            poll_interval: config.poll_interval,
        })
    }

    async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T, ScraperError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| ScraperError::JavaScript(e.to_string()))
    }
}

#[async_trait]
impl ListingPage for BrowserSession {
    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        debug!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn wait_for_listing(&self, timeout: Duration) -> Result<(), ScraperError> {
        let script = format!(
            "!document.documentElement.hasAttribute('{}') && document.querySelector('{}') !== null",
            STALE_MARKER,
            DOM.listing()
        );
        let start = Instant::now();

        while start.elapsed() < timeout {
            match self.eval::<bool>(&script).await {
                Ok(true) => {
                    debug!("Listing container present after {:?}", start.elapsed());
                    return Ok(());
                }
                Ok(false) => {}
                // 遷移中は実行コンテキストが破棄されるため失敗しうる
                Err(e) => debug!("Listing check error: {}", e),
            }
            sleep(self.poll_interval).await;
        }

        Err(ScraperError::Timeout(format!(
            "一覧コンテナ ({}) が{:?}以内に表示されませんでした",
            DOM.listing(),
            timeout
        )))
    }

    async fn is_missing_profile(&self) -> Result<bool, ScraperError> {
        self.eval(&format!(
            "document.querySelector('{}') !== null",
            DOM.missing_profile
        ))
        .await
    }

    async fn listing_entries(&self) -> Result<Vec<ListingEntry>, ScraperError> {
        let script = format!(
            r#"
            (() => {{
                const list = document.querySelector('{listing}');
                if (!list) return {{ found: false, entries: [] }};
                const entries = Array.from(list.querySelectorAll(':scope > {item}')).map(li => {{
                    const poster = li.querySelector('{poster}');
                    const rating = li.querySelector('{rating}');
                    return {{
                        title: poster ? poster.getAttribute('{title}') : null,
                        year: poster ? poster.getAttribute('{year}') : null,
                        ratingText: rating ? rating.textContent : null,
                    }};
                }});
                return {{ found: true, entries }};
            }})()
            "#,
            listing = DOM.listing(),
            item = DOM.list_item,
            poster = DOM.film_poster,
            rating = DOM.rating,
            title = DOM.title_attr,
            year = DOM.year_attr,
        );

        let scan: ListingScan = self.eval(&script).await?;
        if scan.found {
            Ok(scan.entries)
        } else {
            Err(ScraperError::ElementNotFound(DOM.listing()))
        }
    }

    async fn has_pagination(&self) -> Result<bool, ScraperError> {
        self.eval(&format!(
            "document.querySelector('{}') !== null",
            DOM.pagination
        ))
        .await
    }

    async fn pagination_controls(&self) -> Result<Vec<NavControl>, ScraperError> {
        let script = format!(
            r#"
            Array.from(document.querySelectorAll('{pagination} {nextprev}')).map(e => ({{
                classes: Array.from(e.classList),
                hasNext: e.matches('{next}') || e.querySelector('{next}') !== null,
            }}))
            "#,
            pagination = DOM.pagination,
            nextprev = DOM.nextprev,
            next = DOM.next,
        );
        self.eval(&script).await
    }

    async fn click_next(&self) -> Result<(), ScraperError> {
        let script = format!(
            r#"
            (() => {{
                const next = document.querySelector('{pagination} {next}');
                if (!next) return false;
                document.documentElement.setAttribute('{marker}', '1');
                next.click();
                return true;
            }})()
            "#,
            pagination = DOM.pagination,
            next = DOM.next,
            marker = STALE_MARKER,
        );

        if self.eval::<bool>(&script).await? {
            Ok(())
        } else {
            Err(ScraperError::ElementNotFound(format!(
                "{} {}",
                DOM.pagination, DOM.next
            )))
        }
    }

    async fn screenshot_base64(&self) -> Option<String> {
        match self
            .page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
        {
            Ok(png) => Some(base64::engine::general_purpose::STANDARD.encode(png)),
            Err(e) => {
                debug!("Failed to take screenshot: {}", e);
                None
            }
        }
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        info!("ブラウザを終了中...");

        if let Err(e) = browser.close().await {
            warn!("Failed to close browser gracefully: {}", e);
            let _ = browser.kill().await;
        }
        if let Err(e) = browser.wait().await {
            warn!("Failed to wait for browser process: {}", e);
        }
        self.handler.abort();

        self.user_data_dir.remove();

        info!("ブラウザ終了完了");
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // close() されずに破棄された場合（パニック、クライアント切断等）も子プロセスを残さない
        // chromiumoxide の Browser は Drop 時に子プロセスを kill する
        // user_data_dir はフィールドの破棄時に削除される
        if self.browser.is_some() {
            warn!("Browser session dropped without close(), killing browser process");
            self.browser = None;
            self.handler.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_data_dir_removed_on_drop() {
        let dir = UserDataDir::unique();
        let path = dir.path().to_path_buf();
        std::fs::create_dir_all(path.join("Default")).unwrap();
        std::fs::write(path.join("Default").join("Preferences"), "{}").unwrap();

        drop(dir);
        assert!(!path.exists());
    }

    #[test]
    fn test_user_data_dirs_are_unique() {
        let a = UserDataDir::unique();
        let b = UserDataDir::unique();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_user_data_dir_remove_is_idempotent() {
        let dir = UserDataDir::unique();
        std::fs::create_dir_all(dir.path()).unwrap();
        dir.remove();
        assert!(!dir.path().exists());
        dir.remove();
    }

    #[test]
    fn test_window_mode_uses_new_headless() {
        assert_eq!(
            WindowMode::for_config(&ScraperConfig::default()),
            WindowMode::NewHeadless
        );
        assert_eq!(
            WindowMode::for_config(&ScraperConfig::default().with_headless(false)),
            WindowMode::Headed
        );
    }

    #[tokio::test]
    #[ignore] // 実環境テスト用: RATINGS_PROFILE_URL=... cargo test live_browser -- --ignored --nocapture
    async fn test_live_browser_first_page() {
        let url = std::env::var("RATINGS_PROFILE_URL").expect("RATINGS_PROFILE_URL not set");
        let profile = crate::profile::ProfileUrl::parse(&url).expect("invalid profile url");

        let config = ScraperConfig::default().with_debug(true);
        let mut session = ChromeLauncher.launch(&config).await.expect("launch failed");

        let result = async {
            session.goto(&profile.ratings_url()).await?;
            session.wait_for_listing(config.page_timeout).await?;
            let entries = session.listing_entries().await?;
            let controls = session.pagination_controls().await?;
            Ok::<_, ScraperError>((entries, controls))
        }
        .await;
        session.close().await.expect("close failed");

        let (entries, controls) = result.expect("scrape failed");
        println!("entries: {}", entries.len());
        println!("controls: {:?}", controls);
        assert!(!entries.is_empty());
    }
}
