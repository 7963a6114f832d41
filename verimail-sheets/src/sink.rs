use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::json;
use verimail_core::{RecordingSink, SinkError};

use crate::{ServiceAccountCredentials, auth::ServiceAccountAuth};

/// Base URL of the Sheets REST API
pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

/// Appends each confirmed address as a row of a spreadsheet
pub struct SheetsRecordingSink {
    http: reqwest::Client,
    auth: ServiceAccountAuth,
    api_base: Url,
    sheet_id: String,
    range: String,
}

impl SheetsRecordingSink {
    pub fn new(
        credentials: ServiceAccountCredentials,
        sheet_id: impl Into<String>,
        range: impl Into<String>,
    ) -> Result<Self, SinkError> {
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| SinkError::Unavailable(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            auth: ServiceAccountAuth::new(&credentials)?,
            api_base: parse_base(DEFAULT_API_BASE)?,
            sheet_id: sheet_id.into(),
            range: range.into(),
        })
    }

    /// Point the sink at a different Sheets API host
    pub fn with_api_base(mut self, api_base: &str) -> Result<Self, SinkError> {
        self.api_base = parse_base(api_base)?;
        Ok(self)
    }

    /// Override the token endpoint from the key file
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.auth = self.auth.with_token_uri(token_uri);
        self
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    pub fn range(&self) -> &str {
        &self.range
    }

    fn append_url(&self) -> Result<Url, SinkError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| SinkError::Unavailable("API base cannot carry a path".to_string()))?
            .pop_if_empty()
            .push("v4")
            .push("spreadsheets")
            .push(&self.sheet_id)
            .push("values")
            .push(&format!("{}:append", self.range));
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        Ok(url)
    }
}

fn parse_base(url: &str) -> Result<Url, SinkError> {
    Url::parse(url).map_err(|e| SinkError::Unavailable(format!("Invalid API base `{url}`: {e}")))
}

#[async_trait]
impl RecordingSink for SheetsRecordingSink {
    async fn record(&self, email: &str) -> Result<(), SinkError> {
        let token = self.auth.access_token(&self.http).await?;

        let response = self
            .http
            .post(self.append_url()?)
            .bearer_auth(token)
            .json(&json!({ "values": [[email]] }))
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(sheet_id = %self.sheet_id, "Appended row");
            return Ok(());
        }

        if status == StatusCode::UNAUTHORIZED {
            self.auth.invalidate().await;
        }

        let body = response.text().await.unwrap_or_default();
        Err(SinkError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_keys::PRIVATE_KEY;
    use axum::{
        Form, Json, Router,
        extract::{Path, Query, State},
        http::HeaderMap,
        response::IntoResponse,
        routing::post,
    };
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicU16, AtomicUsize, Ordering},
    };

    #[derive(Debug, Clone)]
    struct Append {
        sheet_id: String,
        range: String,
        query: HashMap<String, String>,
        authorization: Option<String>,
        body: Value,
    }

    struct MockSheets {
        token_calls: AtomicUsize,
        token_status: AtomicU16,
        append_status: AtomicU16,
        appends: Mutex<Vec<Append>>,
    }

    impl MockSheets {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                token_calls: AtomicUsize::new(0),
                token_status: AtomicU16::new(200),
                append_status: AtomicU16::new(200),
                appends: Mutex::new(Vec::new()),
            })
        }
    }

    async fn token(
        State(mock): State<Arc<MockSheets>>,
        Form(form): Form<HashMap<String, String>>,
    ) -> impl IntoResponse {
        let status = StatusCode::from_u16(mock.token_status.load(Ordering::SeqCst)).unwrap();
        if !status.is_success() {
            return (status, Json(json!({ "error": "invalid_grant" })));
        }

        assert_eq!(
            form.get("grant_type").map(String::as_str),
            Some("urn:ietf:params:oauth:grant-type:jwt-bearer")
        );
        assert!(form.contains_key("assertion"));

        let n = mock.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
        (
            StatusCode::OK,
            Json(json!({
                "access_token": format!("token-{n}"),
                "expires_in": 3600,
                "token_type": "Bearer",
            })),
        )
    }

    async fn append(
        State(mock): State<Arc<MockSheets>>,
        Path((sheet_id, range)): Path<(String, String)>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        mock.appends.lock().unwrap().push(Append {
            sheet_id,
            range,
            query,
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });

        let status = StatusCode::from_u16(mock.append_status.load(Ordering::SeqCst)).unwrap();
        (status, Json(json!({})))
    }

    async fn serve(mock: Arc<MockSheets>) -> String {
        let app = Router::new()
            .route("/token", post(token))
            .route("/v4/spreadsheets/{sheet_id}/values/{range}", post(append))
            .with_state(mock);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn sink(base: &str) -> SheetsRecordingSink {
        let credentials = ServiceAccountCredentials {
            client_email: "sheets@cdl-help.iam.gserviceaccount.com".to_string(),
            private_key: String::from_utf8(PRIVATE_KEY.to_vec()).unwrap(),
            token_uri: format!("{base}/token"),
        };
        SheetsRecordingSink::new(credentials, "sheet-123", "Sheet1!A1")
            .unwrap()
            .with_api_base(base)
            .unwrap()
    }

    #[test]
    fn test_append_url() {
        let sink = sink("https://sheets.googleapis.com");
        assert_eq!(
            sink.append_url().unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/Sheet1!A1:append?valueInputOption=RAW"
        );
    }

    #[tokio::test]
    async fn test_record_appends_row() {
        let mock = MockSheets::new();
        let base = serve(mock.clone()).await;

        sink(&base).record("driver@example.com").await.unwrap();

        let appends = mock.appends.lock().unwrap();
        assert_eq!(appends.len(), 1);
        let append = &appends[0];
        assert_eq!(append.sheet_id, "sheet-123");
        assert_eq!(append.range, "Sheet1!A1:append");
        assert_eq!(
            append.query.get("valueInputOption").map(String::as_str),
            Some("RAW")
        );
        assert_eq!(append.authorization.as_deref(), Some("Bearer token-1"));
        assert_eq!(append.body, json!({ "values": [["driver@example.com"]] }));
    }

    #[tokio::test]
    async fn test_token_is_reused() {
        let mock = MockSheets::new();
        let base = serve(mock.clone()).await;
        let sink = sink(&base);

        sink.record("a@b.com").await.unwrap();
        sink.record("c@d.com").await.unwrap();

        assert_eq!(mock.token_calls.load(Ordering::SeqCst), 1);
        assert_eq!(mock.appends.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_append() {
        let mock = MockSheets::new();
        mock.append_status.store(403, Ordering::SeqCst);
        let base = serve(mock.clone()).await;

        let result = sink(&base).record("a@b.com").await;
        assert!(matches!(
            result,
            Err(SinkError::Rejected { status: 403, .. })
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_append_refreshes_token() {
        let mock = MockSheets::new();
        mock.append_status.store(401, Ordering::SeqCst);
        let base = serve(mock.clone()).await;
        let sink = sink(&base);

        assert!(sink.record("a@b.com").await.is_err());

        mock.append_status.store(200, Ordering::SeqCst);
        sink.record("a@b.com").await.unwrap();

        assert_eq!(mock.token_calls.load(Ordering::SeqCst), 2);
        let appends = mock.appends.lock().unwrap();
        assert_eq!(appends[1].authorization.as_deref(), Some("Bearer token-2"));
    }

    #[tokio::test]
    async fn test_token_exchange_failure() {
        let mock = MockSheets::new();
        mock.token_status.store(400, Ordering::SeqCst);
        let base = serve(mock.clone()).await;

        let result = sink(&base).record("a@b.com").await;
        assert!(matches!(result, Err(SinkError::Auth(_))));
        assert!(mock.appends.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = sink(&format!("http://{addr}")).record("a@b.com").await;
        assert!(matches!(result, Err(SinkError::Transport(_))));
    }
}
