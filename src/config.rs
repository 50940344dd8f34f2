use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// CSV出力先
    pub output_dir: PathBuf,
    pub headless: bool,
    /// デバッグモード（失敗時にスクリーンショットをログ出力）
    pub debug: bool,
    /// 未指定時は CHROME_PATH / CHROMIUM_PATH → 自動検出
    pub chrome_executable: Option<PathBuf>,
    pub window_size: (u32, u32),
    /// 1ページ分の一覧コンテナ出現待ち
    pub page_timeout: Duration,
    /// スクレイピング全体のタイムアウト
    pub scrape_timeout: Duration,
    pub poll_interval: Duration,
    pub max_pages: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./downloads"),
            headless: true,
            debug: false,
            chrome_executable: None,
            window_size: (1280, 800),
            page_timeout: Duration::from_secs(30),
            scrape_timeout: Duration::from_secs(600),
            poll_interval: Duration::from_millis(250),
            max_pages: 500,
        }
    }
}

impl ScraperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }

    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    pub fn with_scrape_timeout(mut self, timeout: Duration) -> Self {
        self.scrape_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// 明示指定 → 環境変数の順で Chrome 実行ファイルを決定
    pub fn resolve_chrome_executable(&self) -> Option<PathBuf> {
        self.chrome_executable.clone().or_else(|| {
            std::env::var("CHROME_PATH")
                .or_else(|_| std::env::var("CHROMIUM_PATH"))
                .ok()
                .map(PathBuf::from)
        })
    }
}

/// HTTP サーバー設定
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub scraper: ScraperConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            scraper: ScraperConfig::default(),
        }
    }
}
