//! Test helpers for songlib-api integration tests
//!
//! - `EnrichmentStub`: local axum server standing in for the lookup service
//! - `TestApp`: router over an in-memory SQLite store wired to a stub
//! - request/response helpers for `oneshot`

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Request, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde_json::Value;
use songlib_api::{build_router, AppState, EnrichmentClient};
use songlib_common::config::{DatabaseConfig, EnrichmentConfig};
use songlib_common::db::{connect, run_migrations, Dialect, SongStore};
use tower::util::ServiceExt;

pub const DETAIL_BODY: &str =
    r#"{"releaseDate": "2006-01-01", "text": "la la", "link": "http://x"}"#;

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: &'static str,
    hits: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

async fn stub_info(
    State(stub): State<StubState>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    stub.queries.lock().unwrap().push(query);
    (stub.status, [(header::CONTENT_TYPE, "application/json")], stub.body)
}

/// Stand-in enrichment service answering every `/info` with a fixed reply
pub struct EnrichmentStub {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl EnrichmentStub {
    pub async fn spawn(status: StatusCode, body: &'static str) -> Self {
        let state = StubState {
            status,
            body,
            hits: Arc::new(AtomicUsize::new(0)),
            queries: Arc::new(Mutex::new(Vec::new())),
        };
        let hits = state.hits.clone();
        let queries = state.queries.clone();

        let app = Router::new().route("/info", get(stub_info)).with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            hits,
            queries,
        }
    }

    pub async fn ok() -> Self {
        Self::spawn(StatusCode::OK, DETAIL_BODY).await
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<HashMap<String, String>> {
        self.queries.lock().unwrap().last().cloned()
    }
}

/// Router plus direct store access for assertions
pub struct TestApp {
    pub router: Router,
    pub store: SongStore,
}

impl TestApp {
    pub async fn new(enrichment_base_url: &str) -> Self {
        let pool = connect(&DatabaseConfig::from_url("sqlite::memory:"))
            .await
            .expect("Should open in-memory database");
        run_migrations(&pool, Dialect::Sqlite)
            .await
            .expect("Migrations should apply");
        let store = SongStore::new(pool);

        let enrichment = EnrichmentClient::new(&EnrichmentConfig {
            base_url: enrichment_base_url.to_string(),
            timeout: Duration::from_secs(2),
        })
        .expect("Should build enrichment client");

        let router = build_router(AppState::new(store.clone(), enrichment));
        Self { router, store }
    }

    /// Send one request; returns status and JSON body (`Null` when empty)
    pub async fn send(&self, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Should parse JSON")
        };

        (status, value)
    }

    /// Remove the songs table so every store statement fails
    pub async fn drop_songs_table(&self) {
        sqlx::query("DROP TABLE songs")
            .execute(self.store.pool())
            .await
            .expect("Should drop songs table");
    }

    /// Create a song through the API, panicking on failure
    pub async fn create(&self, group: &str, song: &str) -> Value {
        let body = serde_json::json!({"group": group, "song": song}).to_string();
        let (status, value) = self.send("POST", "/songs", Some(&body)).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", value);
        value
    }
}
