//! 一覧ページからの評価レコード抽出

use tracing::debug;

use crate::error::ScraperError;
use crate::rating::Rating;
use crate::record::RatingRecord;
use crate::traits::ListingPage;
use crate::types::{ListingEntry, DOM};

/// 現在のページの項目を文書順にレコード化する
pub async fn extract_page<P: ListingPage + ?Sized>(
    page: &P,
) -> Result<Vec<RatingRecord>, ScraperError> {
    let entries = page.listing_entries().await?;
    debug!("Found {} listing entries", entries.len());

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| to_record(index, entry))
        .collect()
}

fn to_record(index: usize, entry: ListingEntry) -> Result<RatingRecord, ScraperError> {
    let title = entry.title.ok_or_else(|| {
        ScraperError::ElementNotFound(format!("{} [{}] (item {})", DOM.film_poster, DOM.title_attr, index))
    })?;

    let rating_text = entry.rating_text.ok_or_else(|| {
        ScraperError::ElementNotFound(format!("{} (item {}: {})", DOM.rating, index, title))
    })?;

    let rating = Rating::from_glyphs(&rating_text)?;

    // 公開年のない作品もある
    let year = entry.year.unwrap_or_default();

    Ok(RatingRecord {
        title,
        year,
        rating,
    })
}
