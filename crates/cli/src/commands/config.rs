use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rolodex_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let mut push = |field: &str, value: &str, env_var: Option<&str>| {
        lines.push(render_line(
            field,
            value,
            field_source(field, env_var, config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    };

    push("database.url", &config.database.url, Some("ROLODEX_DATABASE_URL"));
    push(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        Some("ROLODEX_DATABASE_MAX_CONNECTIONS"),
    );
    push(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        Some("ROLODEX_DATABASE_TIMEOUT_SECS"),
    );

    push("server.bind_address", &config.server.bind_address, Some("ROLODEX_SERVER_BIND_ADDRESS"));
    push("server.port", &config.server.port.to_string(), Some("ROLODEX_SERVER_PORT"));
    push(
        "server.health_check_port",
        &config.server.health_check_port.to_string(),
        Some("ROLODEX_SERVER_HEALTH_CHECK_PORT"),
    );
    push(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        Some("ROLODEX_SERVER_GRACEFUL_SHUTDOWN_SECS"),
    );

    push("import.source_url", &config.import.source_url, Some("ROLODEX_IMPORT_SOURCE_URL"));
    push(
        "import.request_timeout_secs",
        &config.import.request_timeout_secs.to_string(),
        Some("ROLODEX_IMPORT_REQUEST_TIMEOUT_SECS"),
    );
    let api_key = config
        .import
        .api_key
        .as_ref()
        .map(|key| redact_secret(key.expose_secret()))
        .unwrap_or_else(|| "(unset)".to_string());
    push("import.api_key", &api_key, Some("ROLODEX_IMPORT_API_KEY"));

    push("logging.level", &config.logging.level, Some("ROLODEX_LOGGING_LEVEL"));
    push("logging.format", &format!("{:?}", config.logging.format), Some("ROLODEX_LOGGING_FORMAT"));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("rolodex.toml"), PathBuf::from("config/rolodex.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &str,
    env_var: Option<&str>,
    doc: Option<&Value>,
    path: Option<&Path>,
) -> String {
    if let Some(var) = env_var {
        if env::var(var).ok().filter(|value| !value.trim().is_empty()).is_some() {
            return format!("env:{var}");
        }
    }

    if let (Some(doc), Some(path)) = (doc, path) {
        if toml_has_field(doc, field) {
            return format!("file:{}", path.display());
        }
    }

    "default".to_string()
}

fn toml_has_field(doc: &Value, dotted_field: &str) -> bool {
    let mut current = doc;
    for segment in dotted_field.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

fn render_line(field: &str, value: &str, source: String) -> String {
    format!("  {field} = {value} ({source})")
}

fn redact_secret(value: &str) -> String {
    if value.len() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", &value[..4])
    }
}
