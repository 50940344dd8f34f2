//! HTTP エンドポイント
//!
//! - `GET /scrape_ratings?url=<profile-url>`: スクレイピングして CSV を添付ファイルで返す
//! - `GET /get_csv/{file_name}`: 生成済み CSV を返す

use std::path::{Component, Path};

use axum::{
    extract::{Path as UrlPath, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::service::{ScrapeRequest, ScraperService};
use crate::traits::Launcher;

#[derive(Debug, Clone)]
pub struct AppState<L> {
    pub service: ScraperService<L>,
}

impl<L> AppState<L> {
    pub fn new(service: ScraperService<L>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScrapeQuery {
    pub url: Option<String>,
}

/// エラー応答
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    fn csv_failed() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Failed to generate CSV",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn csv_attachment(file_name: &str, content: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        content,
    )
        .into_response()
}

async fn scrape_ratings<L>(
    State(state): State<AppState<L>>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Response, ApiError>
where
    L: Launcher + Clone + 'static,
{
    let Some(url) = query.url.filter(|u| !u.trim().is_empty()) else {
        warn!("scrape_ratings called without url");
        return Err(ApiError::csv_failed());
    };

    match state.service.clone().oneshot(ScrapeRequest::new(url.clone())).await {
        Ok(result) => {
            info!("Returning {} ({} ratings)", result.file_name(), result.record_count);
            Ok(csv_attachment(&result.file_name(), result.csv_content))
        }
        Err(e) => {
            error!("Failed to generate CSV for {}: {}", url, e);
            Err(ApiError::csv_failed())
        }
    }
}

/// 出力ディレクトリ直下のファイル名のみ許可
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

async fn get_csv<L>(
    State(state): State<AppState<L>>,
    UrlPath(file_name): UrlPath<String>,
) -> Result<Response, ApiError>
where
    L: Launcher + Clone + 'static,
{
    if !is_plain_file_name(&file_name) {
        warn!("Rejected file name: {:?}", file_name);
        return Err(ApiError {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid file name",
        });
    }

    let path = state.service.config().output_dir.join(&file_name);
    match tokio::fs::read(&path).await {
        Ok(content) => Ok(csv_attachment(&file_name, content)),
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            Err(ApiError {
                status: StatusCode::NOT_FOUND,
                message: "File not found",
            })
        }
    }
}

pub fn router<L>(state: AppState<L>) -> Router
where
    L: Launcher + Clone + 'static,
{
    Router::new()
        .route("/scrape_ratings", get(scrape_ratings::<L>))
        .route("/get_csv/{file_name}", get(get_csv::<L>))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;

    use super::*;
    use crate::config::ScraperConfig;
    use crate::testing::{MockLauncher, MockPageData};
    use crate::types::ListingEntry;

    fn app(launcher: MockLauncher, name: &str) -> (Router, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("ratings_server_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let config = ScraperConfig::default().with_output_dir(&dir);
        let state = AppState::new(ScraperService::with_launcher(config, launcher));
        (router(state), dir)
    }

    async fn send(app: Router, uri: &str) -> (StatusCode, Vec<(String, String)>, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[tokio::test]
    async fn test_scrape_ratings_returns_attachment() {
        let launcher = MockLauncher::new(vec![
            MockPageData::middle(vec![
                ListingEntry::new("Alphaville", "1965", "★★★★"),
                ListingEntry::new("Contempt", "1963", "★★★★★"),
            ]),
            MockPageData::last(vec![ListingEntry::new("Band of Outsiders", "1964", "★★★½")]),
        ]);
        let (app, dir) = app(launcher, "ok");

        let (status, headers, body) = send(
            app,
            "/scrape_ratings?url=https%3A%2F%2Fsite%2Falice%2Ffilms%2F",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            header(&headers, "content-disposition"),
            Some("attachment; filename=\"alice_ratings.csv\"")
        );
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "Title,Year,Rating\nAlphaville,1965,4\nContempt,1963,5\nBand of Outsiders,1964,3.5\n"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_scrape_failure_is_client_error() {
        let launcher = MockLauncher::new(vec![MockPageData {
            broken_listing: true,
            ..MockPageData::last(vec![])
        }]);
        let (app, _dir) = app(launcher.clone(), "fail");

        let (status, _, body) = send(app, "/scrape_ratings?url=https://site/alice").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "error": "Failed to generate CSV" }));
        assert_eq!(launcher.page.closes(), 1);
    }

    #[tokio::test]
    async fn test_missing_url_is_client_error() {
        let (app, _dir) = app(MockLauncher::default(), "nourl");

        let (status, _, body) = send(app, "/scrape_ratings").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Failed to generate CSV");
    }

    #[tokio::test]
    async fn test_get_csv_serves_generated_file() {
        let (app, dir) = app(MockLauncher::default(), "get");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("carol_ratings.csv"), "Title,Year,Rating\n").unwrap();

        let (status, headers, body) = send(app, "/get_csv/carol_ratings.csv").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            header(&headers, "content-type"),
            Some("text/csv; charset=utf-8")
        );
        assert_eq!(body, b"Title,Year,Rating\n");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_get_csv_missing_file() {
        let (app, _dir) = app(MockLauncher::default(), "missing");

        let (status, _, _) = send(app, "/get_csv/nobody_ratings.csv").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_csv_rejects_traversal() {
        let (app, _dir) = app(MockLauncher::default(), "traversal");

        let (status, _, _) = send(app, "/get_csv/..").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (app, _dir) = self::app(MockLauncher::default(), "traversal2");
        let (status, _, _) = send(app, "/get_csv/..%2Fsecret.csv").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_is_plain_file_name() {
        assert!(is_plain_file_name("alice_ratings.csv"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("../x.csv"));
        assert!(!is_plain_file_name("a/b.csv"));
        assert!(!is_plain_file_name("a\\b.csv"));
        assert!(!is_plain_file_name(""));
    }
}
