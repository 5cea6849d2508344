//! The import trigger control.
//!
//! This is the terminal-side counterpart of the page's import button: one
//! POST to the import endpoint, a status message for the outcome, and an
//! explicit re-fetch of the customer list when new records arrived. The
//! control is `idle` or `loading`; activating it while loading is blocked,
//! not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rolodex_core::domain::customer::Customer;
use serde::Deserialize;
use serde_json::Value;

pub const ALREADY_SYNCED_MESSAGE: &str = "Already synced. No new customers to import.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Import failed. Please try again.";
pub const REQUEST_ERROR_PREFIX: &str = "Request error: ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    fn info(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Info, text: text.into() }
    }

    fn success(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Success, text: text.into() }
    }

    fn error(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Error, text: text.into() }
    }
}

#[derive(Debug, PartialEq)]
pub enum TriggerOutcome {
    /// A prior activation is still in flight; this one was blocked.
    Busy,
    /// The request ran to completion (successfully or not). `refreshed`
    /// carries the re-fetched list when new records were imported.
    Completed { message: StatusMessage, refreshed: Option<Vec<Customer>> },
}

/// Re-fetches the customer list after a successful import. This replaces the
/// original page's full reload with a contract that returns the updated rows.
#[async_trait]
pub trait ListRefresher: Send + Sync {
    async fn refresh(&self) -> anyhow::Result<Vec<Customer>>;
}

/// Production refresher: `GET {list_url}` returning the JSON projection.
pub struct HttpListRefresher {
    client: reqwest::Client,
    list_url: String,
}

impl HttpListRefresher {
    pub fn new(list_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), list_url: list_url.into() }
    }
}

#[async_trait]
impl ListRefresher for HttpListRefresher {
    async fn refresh(&self) -> anyhow::Result<Vec<Customer>> {
        let response = self.client.get(&self.list_url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

/// The import endpoint also reports a `skipped` count; only `imported`
/// drives the control's behavior, so the rest of the body is ignored.
#[derive(Debug, Deserialize)]
struct ImportReport {
    imported: u64,
}

pub struct ImportTrigger<R> {
    client: reqwest::Client,
    import_url: String,
    refresher: R,
    loading: AtomicBool,
    status: Mutex<Option<StatusMessage>>,
}

impl<R: ListRefresher> ImportTrigger<R> {
    pub fn new(import_url: impl Into<String>, refresher: R) -> Self {
        Self {
            client: reqwest::Client::new(),
            import_url: import_url.into(),
            refresher,
            loading: AtomicBool::new(false),
            status: Mutex::new(None),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// The message left by the last completed activation, if any.
    pub fn status(&self) -> Option<StatusMessage> {
        self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Run one import: POST the endpoint, translate the response into a
    /// status message, and re-fetch the list when records were imported.
    ///
    /// Re-entrant activations are blocked while a request is pending. The
    /// loading flag is cleared on every exit path, message construction
    /// included (drop guard).
    pub async fn trigger(&self) -> TriggerOutcome {
        if self.loading.swap(true, Ordering::SeqCst) {
            return TriggerOutcome::Busy;
        }
        let _reset = LoadingReset(&self.loading);

        // Previous terminal state clears on the next interaction.
        self.set_status(None);

        let (message, refreshed) = self.run_import().await;
        self.set_status(Some(message.clone()));

        TriggerOutcome::Completed { message, refreshed }
    }

    async fn run_import(&self) -> (StatusMessage, Option<Vec<Customer>>) {
        let response = match self.client.post(&self.import_url).send().await {
            Ok(response) => response,
            Err(error) => {
                return (StatusMessage::error(format!("{REQUEST_ERROR_PREFIX}{error}")), None)
            }
        };

        if !response.status().is_success() {
            return (StatusMessage::error(failure_reason(response).await), None);
        }

        let report: ImportReport = match response.json().await {
            Ok(report) => report,
            Err(error) => {
                return (StatusMessage::error(format!("{REQUEST_ERROR_PREFIX}{error}")), None)
            }
        };

        if report.imported == 0 {
            return (StatusMessage::info(ALREADY_SYNCED_MESSAGE), None);
        }

        let message = StatusMessage::success(success_text(report.imported));
        // Refresh is best effort, like the reload it replaces; the import
        // itself already succeeded.
        let refreshed = self.refresher.refresh().await.ok();
        (message, refreshed)
    }

    fn set_status(&self, message: Option<StatusMessage>) {
        let mut guard = self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = message;
    }
}

struct LoadingReset<'a>(&'a AtomicBool);

impl Drop for LoadingReset<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn success_text(imported: u64) -> String {
    if imported == 1 {
        "1 customer imported!".to_string()
    } else {
        format!("{imported} customers imported!")
    }
}

/// Extract the server-provided reason from a non-success response: the
/// `error` field of a JSON body, else the body text, else a generic fallback.
async fn failure_reason(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return GENERIC_FAILURE_MESSAGE.to_string();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => value
            .get("error")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .unwrap_or_else(|| trimmed.to_string()),
        Err(_) => trimmed.to_string(),
    }
}
