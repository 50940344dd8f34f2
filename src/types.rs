//! ページから読み取る生データの型定義

use serde::{Deserialize, Serialize};

/// 一覧の1項目（変換前）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingEntry {
    /// `data-film-name`
    pub title: Option<String>,
    /// `data-film-release-year`
    pub year: Option<String>,
    /// 評価のグリフ表記（例: "★★★½"）
    pub rating_text: Option<String>,
}

impl ListingEntry {
    pub fn new(title: &str, year: &str, rating_text: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            year: Some(year.to_string()),
            rating_text: Some(rating_text.to_string()),
        }
    }
}

/// ページネーション領域内の `paginate-nextprev` 要素
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavControl {
    /// class 属性（空白区切りを分解したもの）
    pub classes: Vec<String>,
    /// 内部に `next` 要素を含むか
    pub has_next: bool,
}

impl NavControl {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// スクレイピング対象サイトの DOM 構造
///
/// サイト側で変更されると抽出は黙って壊れる。
#[derive(Debug, Clone, Copy)]
pub struct DomSelectors {
    pub content: &'static str,
    pub poster_list: &'static str,
    pub list_item: &'static str,
    pub film_poster: &'static str,
    pub title_attr: &'static str,
    pub year_attr: &'static str,
    pub rating: &'static str,
    pub pagination: &'static str,
    pub nextprev: &'static str,
    pub next: &'static str,
    pub disabled_class: &'static str,
    pub missing_profile: &'static str,
}

pub const DOM: DomSelectors = DomSelectors {
    content: "#content",
    poster_list: ".poster-list",
    list_item: "li",
    film_poster: ".film-poster",
    title_attr: "data-film-name",
    year_attr: "data-film-release-year",
    rating: ".poster-viewingdata .rating",
    pagination: ".pagination",
    nextprev: ".paginate-nextprev",
    next: ".next",
    disabled_class: "paginate-disabled",
    missing_profile: "body.error.message-dark",
};

impl DomSelectors {
    /// 一覧コンテナのセレクタ
    pub fn listing(&self) -> String {
        format!("{} {}", self.content, self.poster_list)
    }
}
