//! 評価レコードと CSV フィールドのエスケープ

use std::borrow::Cow;

use serde::Serialize;

use crate::rating::Rating;

/// CSV のフィールド区切り文字
pub const FIELD_DELIMITER: char = ',';

/// 1作品分の評価レコード
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingRecord {
    pub title: String,
    pub year: String,
    #[serde(serialize_with = "serialize_rating")]
    pub rating: Rating,
}

impl RatingRecord {
    pub fn new(title: impl Into<String>, year: impl Into<String>, rating: Rating) -> Self {
        Self {
            title: title.into(),
            year: year.into(),
            rating,
        }
    }
}

fn serialize_rating<S: serde::Serializer>(rating: &Rating, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f32(rating.value())
}

/// タイトルに区切り文字が含まれる場合のみダブルクォートで囲む
///
/// タイトル内の既存の `"` はエスケープしない。
pub fn escape_title(title: &str) -> Cow<'_, str> {
    if title.contains(FIELD_DELIMITER) {
        Cow::Owned(format!("\"{}\"", title))
    } else {
        Cow::Borrowed(title)
    }
}
