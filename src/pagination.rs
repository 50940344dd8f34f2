//! ページネーション制御
//!
//! 最終ページでは「次へ」要素が削除されず `paginate-disabled` が付くため、
//! 要素の有無ではなく disabled マーカーを終了条件とする。

use tracing::{debug, info};

use crate::error::ScraperError;
use crate::traits::ListingPage;
use crate::types::{NavControl, DOM};

/// ナビゲーション要素の向き
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Previous,
    Next { enabled: bool },
}

/// 1ページ処理後の判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStep {
    /// 次ページがある（`advance` では遷移済み）
    Continue,
    /// 最終ページ
    Done,
    /// 「次へ」要素がない（この判定だけではループを終了しない）
    NoNext,
}

pub fn classify(control: &NavControl) -> NavDirection {
    if control.has_next {
        NavDirection::Next {
            enabled: !control.has_class(DOM.disabled_class),
        }
    } else {
        NavDirection::Previous
    }
}

/// ページネーションを確認する（クリックはしない）
pub async fn inspect<P: ListingPage + ?Sized>(page: &P) -> Result<PageStep, ScraperError> {
    if !page.has_pagination().await? {
        info!("No pagination on page, treating as single-page listing");
        return Ok(PageStep::Done);
    }

    let controls = page.pagination_controls().await?;
    debug!("Pagination controls: {:?}", controls);

    for control in &controls {
        match classify(control) {
            NavDirection::Previous => continue,
            NavDirection::Next { enabled: false } => {
                info!("Next page control is disabled, last page reached");
                return Ok(PageStep::Done);
            }
            NavDirection::Next { enabled: true } => return Ok(PageStep::Continue),
        }
    }

    Ok(PageStep::NoNext)
}

/// ページネーションを確認し、続きがあれば「次へ」をクリックする
pub async fn advance<P: ListingPage + ?Sized>(page: &P) -> Result<PageStep, ScraperError> {
    let step = inspect(page).await?;
    if step == PageStep::Continue {
        page.click_next().await?;
        debug!("Clicked next page control");
    }
    Ok(step)
}
