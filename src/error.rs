use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("JavaScript実行エラー: {0}")]
    JavaScript(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("要素が見つかりません: {0}")]
    ElementNotFound(String),

    #[error("ページネーションエラー: {0}")]
    Pagination(String),

    #[error("不明な評価表記: {0:?}")]
    UnknownRating(String),

    #[error("プロフィールURLが不正です: {0}")]
    InvalidProfileUrl(String),

    #[error("プロフィールが存在しません: {0}")]
    ProfileNotFound(String),

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),
}
