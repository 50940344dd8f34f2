//! 映画評価スクレイパーライブラリ
//!
//! - プロフィールの評価済み作品一覧をヘッドレスブラウザでページ送りしながら取得
//! - 星グリフ表記を数値評価に変換して `<username>_ratings.csv` に出力
//! - HTTP エンドポイント (`/scrape_ratings`, `/get_csv/{file_name}`) として公開
//!
//! # 使用例
//!
//! ```rust,ignore
//! use ratings_scraper::{ScrapeRequest, ScraperConfig, ScraperService};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ScraperConfig::new().with_output_dir("./downloads");
//!     let mut service = ScraperService::new(config);
//!
//!     let request = ScrapeRequest::new("https://letterboxd.com/alice/films/");
//!     let result = service.call(request).await.unwrap();
//!     println!("CSV: {:?} ({} ratings)", result.csv_path, result.record_count);
//! }
//! ```

pub mod browser;
pub mod config;
pub mod csv;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod profile;
pub mod rating;
pub mod record;
pub mod scraper;
pub mod server;
pub mod service;
pub mod traits;
pub mod types;

#[cfg(test)]
mod testing;

// 主要な型をリエクスポート
pub use browser::{BrowserSession, ChromeLauncher};
pub use config::{ScraperConfig, ServerConfig};
pub use error::ScraperError;
pub use pagination::{NavDirection, PageStep};
pub use profile::ProfileUrl;
pub use rating::Rating;
pub use record::RatingRecord;
pub use scraper::{RatingsScraper, ScrapeOutcome};
pub use service::{ScrapeRequest, ScrapeResult, ScraperService};
pub use traits::{Launcher, ListingPage};
