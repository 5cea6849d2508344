//! Customer list pages.
//!
//! Endpoints:
//! - `GET /`              — server-rendered customer list (HTML)
//! - `GET /api/customers` — the same projection as JSON, used by the import
//!   trigger to re-fetch the list after a successful import

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::get,
    Json, Router,
};
use rolodex_core::domain::customer::Customer;
use rolodex_db::repositories::SqlCustomerRepository;
use rolodex_db::DbPool;
use tera::{Context, Tera};
use tracing::warn;

#[derive(Clone)]
pub struct PageState {
    db_pool: DbPool,
    templates: Arc<Tera>,
}

/// Initialize the Tera engine with the page templates.
fn init_templates() -> Arc<Tera> {
    let mut tera = match Tera::new("templates/**/*.html") {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "Failed to load templates from filesystem, using empty Tera instance");
            Tera::default()
        }
    };

    // Embedded fallback in case filesystem templates are not available
    tera.add_raw_template("customers.html", include_str!("../../../templates/customers.html"))
        .ok();

    Arc::new(tera)
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new()
        .route("/", get(customers_page))
        .route("/api/customers", get(customers_index))
        .with_state(PageState { db_pool, templates: init_templates() })
}

/// Render the customer list page: a table when records exist, the empty-state
/// placeholder otherwise. Every request re-issues the query.
async fn customers_page(
    State(state): State<PageState>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let repository = SqlCustomerRepository::new(state.db_pool.clone());
    let customers = repository.list_all().await.map_err(|e| {
        (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("<h1>Database Error</h1><p>{}</p>", e)))
    })?;

    let rows: Vec<serde_json::Value> = customers
        .iter()
        .map(|customer| {
            serde_json::json!({
                "name": customer.name,
                "email": customer.email,
                "phone": customer.phone_display(),
            })
        })
        .collect();

    let mut context = Context::new();
    context.insert("customers", &rows);

    let html = state.templates.render("customers.html", &context).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!("<h1>Template Error</h1><pre>{:?}</pre>", e)),
        )
    })?;

    Ok(Html(html))
}

/// The list projection as JSON. `raw` never appears here: the projection type
/// has no such field.
async fn customers_index(
    State(state): State<PageState>,
) -> Result<Json<Vec<Customer>>, (StatusCode, Json<serde_json::Value>)> {
    let repository = SqlCustomerRepository::new(state.db_pool.clone());
    let customers = repository.list_all().await.map_err(|e| {
        warn!(event_name = "pages.list.failed", error = %e, "customer list query failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "an internal error occurred" })),
        )
    })?;

    Ok(Json(customers))
}
