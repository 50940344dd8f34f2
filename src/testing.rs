//! テスト用のインメモリ一覧ページ

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::{Launcher, ListingPage};
use crate::types::{ListingEntry, NavControl};

/// 1ページ分のスクリプト
#[derive(Debug, Clone)]
pub struct MockPageData {
    pub entries: Vec<ListingEntry>,
    pub pagination: bool,
    pub controls: Vec<NavControl>,
    pub missing_profile: bool,
    /// 一覧コンテナが表示されない
    pub hang: bool,
    pub broken_listing: bool,
}

impl Default for MockPageData {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            pagination: true,
            controls: Vec::new(),
            missing_profile: false,
            hang: false,
            broken_listing: false,
        }
    }
}

fn nav(classes: &[&str], has_next: bool) -> NavControl {
    NavControl {
        classes: classes.iter().map(|c| c.to_string()).collect(),
        has_next,
    }
}

impl MockPageData {
    /// 「次へ」が有効なページ
    pub fn middle(entries: Vec<ListingEntry>) -> Self {
        Self {
            entries,
            controls: vec![
                nav(&["paginate-nextprev", "paginate-disabled"], false),
                nav(&["paginate-nextprev"], true),
            ],
            ..Self::default()
        }
    }

    /// 「次へ」が disabled の最終ページ
    pub fn last(entries: Vec<ListingEntry>) -> Self {
        Self {
            entries,
            controls: vec![
                nav(&["paginate-nextprev"], false),
                nav(&["paginate-nextprev", "paginate-disabled"], true),
            ],
            ..Self::default()
        }
    }

    /// ページネーション領域のないページ
    pub fn single(entries: Vec<ListingEntry>) -> Self {
        Self {
            entries,
            pagination: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct MockState {
    pub pages: Vec<MockPageData>,
    pub current: usize,
    pub visited: Vec<String>,
    pub clicks: usize,
    pub closes: usize,
}

/// 複数ページの一覧を再生するページ
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    state: Arc<Mutex<MockState>>,
}

impl MockPage {
    pub fn new(pages: Vec<MockPageData>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                pages,
                ..MockState::default()
            })),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn clicks(&self) -> usize {
        self.state().clicks
    }

    pub fn closes(&self) -> usize {
        self.state().closes
    }

    fn current(&self) -> MockPageData {
        let state = self.state();
        state.pages[state.current].clone()
    }
}

#[async_trait]
impl ListingPage for MockPage {
    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        let mut state = self.state();
        state.visited.push(url.to_string());
        state.current = 0;
        Ok(())
    }

    async fn wait_for_listing(&self, _timeout: Duration) -> Result<(), ScraperError> {
        if self.current().hang {
            futures::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn is_missing_profile(&self) -> Result<bool, ScraperError> {
        Ok(self.current().missing_profile)
    }

    async fn listing_entries(&self) -> Result<Vec<ListingEntry>, ScraperError> {
        let page = self.current();
        if page.broken_listing {
            return Err(ScraperError::ElementNotFound("#content .poster-list".into()));
        }
        Ok(page.entries)
    }

    async fn has_pagination(&self) -> Result<bool, ScraperError> {
        Ok(self.current().pagination)
    }

    async fn pagination_controls(&self) -> Result<Vec<NavControl>, ScraperError> {
        Ok(self.current().controls)
    }

    async fn click_next(&self) -> Result<(), ScraperError> {
        let mut state = self.state();
        state.clicks += 1;
        // 「次へ」が有効な限り同じページへ戻り続けるページも表現できるよう、末尾で止める
        if state.current + 1 < state.pages.len() {
            state.current += 1;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        self.state().closes += 1;
        Ok(())
    }
}

/// 同じ MockPage を返すランチャー
#[derive(Debug, Clone, Default)]
pub struct MockLauncher {
    pub page: MockPage,
    pub fail: bool,
}

impl MockLauncher {
    pub fn new(pages: Vec<MockPageData>) -> Self {
        Self {
            page: MockPage::new(pages),
            fail: false,
        }
    }
}

#[async_trait]
impl Launcher for MockLauncher {
    type Session = MockPage;

    async fn launch(&self, _config: &ScraperConfig) -> Result<MockPage, ScraperError> {
        if self.fail {
            return Err(ScraperError::BrowserInit("mock launch failure".into()));
        }
        Ok(self.page.clone())
    }
}
