use std::time::Duration;

use async_trait::async_trait;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::types::{ListingEntry, NavControl};

/// 一覧ページに対するブラウザ操作
#[async_trait]
pub trait ListingPage: Send + Sync {
    /// URLへ移動
    async fn goto(&self, url: &str) -> Result<(), ScraperError>;

    /// 一覧コンテナが現れるまで待機
    async fn wait_for_listing(&self, timeout: Duration) -> Result<(), ScraperError>;

    /// 存在しないプロフィールのエラーページか
    async fn is_missing_profile(&self) -> Result<bool, ScraperError>;

    /// 一覧の項目を文書順に取得
    async fn listing_entries(&self) -> Result<Vec<ListingEntry>, ScraperError>;

    /// ページネーション領域があるか
    async fn has_pagination(&self) -> Result<bool, ScraperError>;

    /// ページネーションの前後リンクを取得
    async fn pagination_controls(&self) -> Result<Vec<NavControl>, ScraperError>;

    /// 「次へ」をクリック
    async fn click_next(&self) -> Result<(), ScraperError>;

    /// デバッグ用スクリーンショット（base64 PNG）
    async fn screenshot_base64(&self) -> Option<String> {
        None
    }

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;
}

/// ブラウザセッションの起動
#[async_trait]
pub trait Launcher: Send + Sync {
    type Session: ListingPage + 'static;

    async fn launch(&self, config: &ScraperConfig) -> Result<Self::Session, ScraperError>;
}
