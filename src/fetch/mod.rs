//! Raw shift record sources.
//!
//! The live source is a single JSON POST to the comparative-scores API with no
//! retry or caching. A failed call is reported to the caller and the previous
//! data stays in use. A file source reads the same payload from disk for
//! offline runs and tests.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::config::SourceConfig;
use crate::models::RawShiftRecord;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Upstream reported failure: {0}")]
    Upstream(String),
}

/// Anything that can produce the current set of raw shift records.
#[async_trait]
pub trait ShiftSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Fetch every shift's raw aggregate record.
    async fn fetch_records(&self) -> Result<Vec<RawShiftRecord>, FetchError>;
}

/// Request body expected by the comparative-scores endpoint.
#[derive(Debug, Clone, Serialize)]
struct ScoresRequest<'a> {
    #[serde(rename = "userResponseKeyUrl")]
    user_response_key_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ScoresEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<ScoresData>,
}

#[derive(Debug, Deserialize)]
struct ScoresData {
    #[serde(rename = "comparativeScores", default)]
    comparative_scores: Vec<RawShiftRecord>,
}

/// Either a bare array of records or the API envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScoresDocument {
    Records(Vec<RawShiftRecord>),
    Envelope(ScoresEnvelope),
}

/// Parse a comparative-scores payload.
///
/// Accepts the API envelope (`{ success, data: { comparativeScores } }`) or a
/// bare JSON array of records. An envelope with `success: false` is an error.
pub fn parse_scores(body: &str) -> Result<Vec<RawShiftRecord>, FetchError> {
    match serde_json::from_str::<ScoresDocument>(body)? {
        ScoresDocument::Records(records) => Ok(records),
        ScoresDocument::Envelope(envelope) if envelope.success => Ok(envelope
            .data
            .map(|d| d.comparative_scores)
            .unwrap_or_default()),
        ScoresDocument::Envelope(envelope) => Err(FetchError::Upstream(
            envelope
                .message
                .unwrap_or_else(|| "API responded with success:false".to_string()),
        )),
    }
}

/// Live source backed by the comparative-scores API.
pub struct HttpSource {
    client: Client,
    url: Url,
    response_key_url: String,
    bearer_token: Option<String>,
}

impl HttpSource {
    /// Create a new HTTP source from configuration.
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let url = Url::parse(&config.api_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.api_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("shift-analytics")),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            url,
            response_key_url: config.response_key_url.clone(),
            bearer_token: config.bearer_token(),
        })
    }
}

#[async_trait]
impl ShiftSource for HttpSource {
    fn name(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_records(&self) -> Result<Vec<RawShiftRecord>, FetchError> {
        info!("Fetching shift scores from {}", self.url);

        let mut request = self.client.post(self.url.clone()).json(&ScoresRequest {
            user_response_key_url: &self.response_key_url,
        });
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        } else {
            debug!("No bearer token configured for {}", self.url);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        debug!("Received {} bytes from {}", body.len(), self.url);

        let records = parse_scores(&body)?;
        info!("Fetched {} shift records", records.len());
        Ok(records)
    }
}

/// Offline source reading a saved payload from disk.
pub struct FileSource {
    path: PathBuf,
    label: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        Self { path, label }
    }
}

#[async_trait]
impl ShiftSource for FileSource {
    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch_records(&self) -> Result<Vec<RawShiftRecord>, FetchError> {
        debug!("Reading shift scores from {}", self.label);
        let body = tokio::fs::read_to_string(&self.path).await?;
        parse_scores(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::io::Write;

    const ENVELOPE: &str = r#"{
        "success": true,
        "data": {
            "comparativeScores": [
                {
                    "_id": "22 Jan S1",
                    "avgProvisionalPhysicsMarks": 30.1,
                    "avgProvisionalChemistryMarks": 35.2,
                    "avgProvisionalMathematicsMarks": 25.3,
                    "segments": { "0-25": { "provisionalCount": 4 } }
                }
            ]
        }
    }"#;

    #[test]
    fn test_parse_envelope() {
        let records = parse_scores(ENVELOPE).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "22 Jan S1");
        assert_eq!(records[0].avg_maths, Some(25.3));
    }

    #[test]
    fn test_parse_bare_array() {
        let records = parse_scores(r#"[{ "id": "x", "segments": {} }]"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "x");
    }

    #[test]
    fn test_parse_failure_envelope() {
        let err = parse_scores(r#"{ "success": false, "message": "token expired" }"#).unwrap_err();
        assert!(matches!(err, FetchError::Upstream(ref m) if m == "token expired"));
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_scores("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_success_without_data() {
        assert!(parse_scores(r#"{ "success": true }"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_scores("<html>").unwrap_err(),
            FetchError::Json(_)
        ));
    }

    #[test]
    fn test_http_source_rejects_bad_url() {
        let config = SourceConfig {
            api_url: "::nope::".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpSource::new(&config),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", ENVELOPE).unwrap();

        let source = FileSource::new(file.path());
        let records = source.fetch_records().await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let source = FileSource::new("/definitely/not/here.json");
        assert!(matches!(
            source.fetch_records().await.unwrap_err(),
            FetchError::Io(_)
        ));
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/score", addr)
    }

    #[tokio::test]
    async fn test_http_source_posts_response_key() {
        let app = Router::new().route(
            "/score",
            post(|Json(body): Json<serde_json::Value>| async move {
                let key = body["userResponseKeyUrl"].as_str().unwrap_or_default().to_string();
                Json(serde_json::json!({
                    "success": true,
                    "data": { "comparativeScores": [ { "_id": key, "segments": {} } ] }
                }))
            }),
        );
        let url = serve(app).await;

        let source = HttpSource::new(&SourceConfig {
            api_url: url,
            response_key_url: "https://example.com/key".to_string(),
            ..Default::default()
        })
        .unwrap();

        let records = source.fetch_records().await.unwrap();
        assert_eq!(records[0].id, "https://example.com/key");
    }

    #[tokio::test]
    async fn test_http_source_sends_bearer_token() {
        let app = Router::new().route(
            "/score",
            post(|headers: axum::http::HeaderMap| async move {
                let auth = headers
                    .get(axum::http::header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if auth != "Bearer secret-token" {
                    return (axum::http::StatusCode::UNAUTHORIZED, Json(serde_json::json!({})));
                }
                (
                    axum::http::StatusCode::OK,
                    Json(serde_json::json!({
                        "success": true,
                        "data": { "comparativeScores": [ { "_id": auth, "segments": {} } ] }
                    })),
                )
            }),
        );
        let url = serve(app).await;

        let source = HttpSource::new(&SourceConfig {
            api_url: url,
            bearer_token: Some("secret-token".to_string()),
            ..Default::default()
        })
        .unwrap();

        let records = source.fetch_records().await.unwrap();
        assert_eq!(records[0].id, "Bearer secret-token");
    }

    #[tokio::test]
    async fn test_http_source_status_error() {
        let app = Router::new().route(
            "/score",
            post(|| async { (axum::http::StatusCode::UNAUTHORIZED, "no") }),
        );
        let url = serve(app).await;

        let source = HttpSource::new(&SourceConfig {
            api_url: url,
            ..Default::default()
        })
        .unwrap();

        assert!(matches!(
            source.fetch_records().await.unwrap_err(),
            FetchError::HttpStatus { status: 401, .. }
        ));
    }
}
