//! 星グリフ表記 → 数値評価の変換

use std::fmt;

use crate::error::ScraperError;

/// 0.5〜5.0 (0.5刻み) の評価。内部では半星の数 (1..=10) で保持する
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

/// 既知のグリフ表記と半星数の対応
const GLYPHS: [(&str, u8); 10] = [
    ("½", 1),
    ("★", 2),
    ("★½", 3),
    ("★★", 4),
    ("★★½", 5),
    ("★★★", 6),
    ("★★★½", 7),
    ("★★★★", 8),
    ("★★★★½", 9),
    ("★★★★★", 10),
];

impl Rating {
    pub const MIN: Rating = Rating(1);
    pub const MAX: Rating = Rating(10);

    /// グリフ表記を評価に変換する
    ///
    /// 未知の表記はエラーとする（最大評価への暗黙のフォールバックはしない）。
    pub fn from_glyphs(glyphs: &str) -> Result<Self, ScraperError> {
        let trimmed = glyphs.trim();
        GLYPHS
            .iter()
            .find(|(g, _)| *g == trimmed)
            .map(|&(_, halves)| Rating(halves))
            .ok_or_else(|| ScraperError::UnknownRating(glyphs.to_string()))
    }

    /// 半星数から作成（範囲外は None）
    pub fn from_half_stars(halves: u8) -> Option<Self> {
        (1..=10).contains(&halves).then_some(Rating(halves))
    }

    pub fn value(self) -> f32 {
        f32::from(self.0) / 2.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}
