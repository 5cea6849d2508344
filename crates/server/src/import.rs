//! Import workflow endpoint.
//!
//! `POST /api/import` pulls the sample customer feed, upserts each record by
//! email, and reports `{ "imported": n, "skipped": m }`. The feed itself is
//! sample data: a malformed entry is dropped with a warning rather than
//! failing the batch.

use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use rolodex_core::config::ImportConfig;
use rolodex_core::domain::customer::NewCustomer;
use rolodex_db::repositories::{RepositoryError, SqlCustomerRepository};
use rolodex_db::DbPool;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct ImportState {
    db_pool: DbPool,
    client: reqwest::Client,
    source_url: String,
    api_key: Option<SecretString>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: u64,
    pub skipped: u64,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

pub fn router(db_pool: DbPool, config: &ImportConfig) -> Router {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build feed HTTP client with timeout, using default");
            reqwest::Client::new()
        });

    Router::new().route("/api/import", post(import_customers)).with_state(ImportState {
        db_pool,
        client,
        source_url: config.source_url.clone(),
        api_key: config.api_key.clone(),
    })
}

/// Run one import pass over the sample feed.
async fn import_customers(
    State(state): State<ImportState>,
) -> Result<Json<ImportReport>, (StatusCode, Json<ApiError>)> {
    let records = fetch_feed_records(&state).await.map_err(|reason| {
        warn!(event_name = "import.feed.failed", error = %reason, "sample feed fetch failed");
        (StatusCode::BAD_GATEWAY, Json(ApiError { error: reason }))
    })?;

    let repository = SqlCustomerRepository::new(state.db_pool.clone());
    let outcome = repository.import_batch(&records).await.map_err(db_error)?;

    info!(
        event_name = "import.completed",
        imported = outcome.imported,
        skipped = outcome.skipped,
        "customer import finished"
    );

    Ok(Json(ImportReport { imported: outcome.imported, skipped: outcome.skipped }))
}

/// Fetch and map the upstream feed. Returns a human-readable reason on
/// failure; the caller decides the HTTP status.
async fn fetch_feed_records(state: &ImportState) -> Result<Vec<NewCustomer>, String> {
    let mut request = state.client.get(&state.source_url);
    if let Some(api_key) = &state.api_key {
        request = request.bearer_auth(api_key.expose_secret());
    }

    let response =
        request.send().await.map_err(|e| format!("sample feed unreachable: {e}"))?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("sample feed responded with status {status}"));
    }

    let entries: Vec<Value> =
        response.json().await.map_err(|e| format!("sample feed returned invalid JSON: {e}"))?;

    let mut records = Vec::with_capacity(entries.len());
    for entry in &entries {
        match map_feed_entry(entry) {
            Some(record) => records.push(record),
            None => {
                warn!(
                    event_name = "import.feed.malformed_entry",
                    entry = %entry,
                    "skipping feed entry without usable name and email"
                );
            }
        }
    }

    Ok(records)
}

/// Map one feed entry to the insert shape. The full entry is carried in
/// `raw`; only name, email, and phone are lifted out.
fn map_feed_entry(entry: &Value) -> Option<NewCustomer> {
    let name = entry.get("name")?.as_str()?.trim();
    let email = entry.get("email")?.as_str()?.trim();
    if name.is_empty() || email.is_empty() {
        return None;
    }

    let phone = entry
        .get("phone")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|phone| !phone.is_empty())
        .map(ToString::to_string);

    Some(NewCustomer {
        name: name.to_string(),
        email: email.to_string(),
        phone,
        raw: entry.clone(),
    })
}

fn db_error(error: RepositoryError) -> (StatusCode, Json<ApiError>) {
    error!(event_name = "import.db.failed", error = %error, "import database error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError { error: "an internal error occurred".to_string() }),
    )
}

#[cfg(test)]
mod tests {
    use axum::routing::get;
    use axum::{extract::State, http::StatusCode, Json, Router};
    use rolodex_db::repositories::SqlCustomerRepository;
    use rolodex_db::{connect_with_settings, migrations, DbPool};
    use serde_json::json;

    use super::{import_customers, map_feed_entry, ImportState};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    async fn spawn_feed(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind feed stub");
        let address = listener.local_addr().expect("feed stub address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{address}/users")
    }

    fn state(pool: DbPool, source_url: String) -> State<ImportState> {
        State(ImportState {
            db_pool: pool,
            client: reqwest::Client::new(),
            source_url,
            api_key: None,
        })
    }

    fn sample_feed() -> serde_json::Value {
        json!([
            { "id": 1, "name": "Leanne Graham", "email": "leanne@example.test", "phone": "1-770-736-8031" },
            { "id": 2, "name": "Ervin Howell", "email": "ervin@example.test" },
            { "id": 3, "name": "Clementine Bauch", "email": "clementine@example.test", "phone": "1-463-123-4447" }
        ])
    }

    #[tokio::test]
    async fn first_import_inserts_and_second_import_skips() {
        let pool = setup_pool().await;
        let url = spawn_feed(Router::new().route(
            "/users",
            get(|| async { Json(sample_feed()) }),
        ))
        .await;

        let Json(first) = import_customers(state(pool.clone(), url.clone()))
            .await
            .expect("first import succeeds");
        assert_eq!(first.imported, 3);
        assert_eq!(first.skipped, 0);

        let Json(second) =
            import_customers(state(pool.clone(), url)).await.expect("second import succeeds");
        assert_eq!(second.imported, 0);
        assert_eq!(second.skipped, 3);

        let repository = SqlCustomerRepository::new(pool);
        assert_eq!(repository.count().await.expect("count"), 3);
    }

    #[tokio::test]
    async fn malformed_feed_entries_are_dropped_not_fatal() {
        let pool = setup_pool().await;
        let url = spawn_feed(Router::new().route(
            "/users",
            get(|| async {
                Json(json!([
                    { "name": "Valid Person", "email": "valid@example.test" },
                    { "name": "No Email Here" },
                    { "email": "nameless@example.test" },
                    { "name": "  ", "email": "blank-name@example.test" }
                ]))
            }),
        ))
        .await;

        let Json(report) =
            import_customers(state(pool.clone(), url)).await.expect("import succeeds");
        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped, 0);
    }

    #[tokio::test]
    async fn feed_error_status_maps_to_bad_gateway() {
        let pool = setup_pool().await;
        let url = spawn_feed(Router::new().route(
            "/users",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "feed exploded") }),
        ))
        .await;

        let result = import_customers(state(pool, url)).await;

        let (status, Json(body)) = result.err().expect("import should fail");
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.error.contains("500"));
    }

    #[tokio::test]
    async fn unreachable_feed_maps_to_bad_gateway() {
        let pool = setup_pool().await;

        // Bind and immediately drop a listener so the port is closed.
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("bind throwaway listener");
        let address = listener.local_addr().expect("throwaway address");
        drop(listener);

        let result = import_customers(state(pool, format!("http://{address}/users"))).await;

        let (status, Json(body)) = result.err().expect("import should fail");
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.error.contains("unreachable"));
    }

    #[tokio::test]
    async fn invalid_feed_payload_maps_to_bad_gateway() {
        let pool = setup_pool().await;
        let url =
            spawn_feed(Router::new().route("/users", get(|| async { "not json at all" }))).await;

        let result = import_customers(state(pool, url)).await;

        let (status, Json(body)) = result.err().expect("import should fail");
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.error.contains("invalid JSON"));
    }

    #[test]
    fn map_feed_entry_normalizes_blank_phone_to_none() {
        let record = map_feed_entry(&json!({
            "name": "Ada Lovelace",
            "email": "ada@example.test",
            "phone": "   "
        }))
        .expect("usable entry");

        assert_eq!(record.phone, None);
    }

    #[test]
    fn map_feed_entry_preserves_the_full_raw_payload() {
        let entry = json!({
            "name": "Ada Lovelace",
            "email": "ada@example.test",
            "company": { "name": "Analytical Engines Ltd" }
        });

        let record = map_feed_entry(&entry).expect("usable entry");

        assert_eq!(record.raw, entry);
        assert_eq!(record.raw["company"]["name"], "Analytical Engines Ltd");
    }
}
