//! プロフィールURLの正規化
//!
//! プロフィール配下の任意のURLを `scheme://host/username` に揃え、ユーザー名を取り出す。

use std::sync::OnceLock;

use regex::Regex;

use crate::csv::ratings_file_name;
use crate::error::ScraperError;

/// 評価済み作品一覧（日付順）のパス
pub const RATED_BY_DATE_PATH: &str = "/films/rated/.5-5/by/date/";

/// 先頭一致でプロフィールルートを取り出す（以降のパス・クエリは捨てる）
fn profile_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(https?://[^/?#]+/[A-Za-z0-9_]+)(?:[/?#].*)?$")
            .expect("profile pattern is valid")
    })
}

fn username_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https?://[^/?#]+/([^/?#]+)").expect("username pattern is valid")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUrl {
    /// 正規化後のURL（ルートを取り出せない形はそのまま）
    pub root: String,
    pub username: String,
}

impl ProfileUrl {
    pub fn parse(url: &str) -> Result<Self, ScraperError> {
        let url = url.trim();

        let root = match profile_pattern().captures(url) {
            Some(caps) => caps[1].to_string(),
            None => url.to_string(),
        };

        let username = username_pattern()
            .captures(&root)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| ScraperError::InvalidProfileUrl(url.to_string()))?;

        Ok(Self { root, username })
    }

    /// スクレイピング開始URL
    pub fn ratings_url(&self) -> String {
        format!("{}{}", self.root, RATED_BY_DATE_PATH)
    }

    pub fn csv_file_name(&self) -> String {
        ratings_file_name(&self.username)
    }
}
