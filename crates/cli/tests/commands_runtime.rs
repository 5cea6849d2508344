use std::env;
use std::sync::{Mutex, OnceLock};

use rolodex_cli::commands::{config, doctor, migrate, seed};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("ROLODEX_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_with_invalid_feed_url() {
    with_env(
        &[
            ("ROLODEX_DATABASE_URL", "sqlite::memory:"),
            ("ROLODEX_IMPORT_SOURCE_URL", "ftp://feed.example.test/users"),
        ],
        || {
            let result = migrate::run();
            assert_eq!(result.exit_code, 2, "expected config validation failure code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "migrate");
            assert_eq!(payload["status"], "error");
            assert_eq!(payload["error_class"], "config_validation");
        },
    );
}

#[test]
fn seed_returns_success_with_valid_env() {
    with_env(&[("ROLODEX_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected successful seed run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn seed_returns_deterministic_customer_summary() {
    with_env(&[("ROLODEX_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected deterministic seed success");

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().unwrap_or("");

        assert!(message.contains("Seeded 5 demo customers"));
        assert!(message.contains("  - seed-cust-001: Amos Burton <amos.burton@example.test>"));
        assert!(message
            .contains("  - seed-cust-003: Chrisjen Avasarala <chrisjen.avasarala@example.test>"));
        assert!(message.contains("  - seed-cust-005: Naomi Nagata <naomi.nagata@example.test>"));
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_env(&[("ROLODEX_DATABASE_URL", "sqlite::memory:")], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["status"], "ok");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);
        assert_eq!(second_payload["status"], "ok");

        assert_eq!(first_payload["message"], second_payload["message"]);
    });
}

#[test]
fn config_lists_effective_values_with_source_attribution() {
    with_env(&[("ROLODEX_DATABASE_URL", "sqlite::memory:")], || {
        let output = config::run();

        assert!(output.contains("effective config"));
        assert!(output.contains("database.url = sqlite::memory: (env:ROLODEX_DATABASE_URL)"));
        assert!(output.contains("import.source_url"));
        assert!(output.contains("import.api_key = (unset)"));
    });
}

#[test]
fn config_redacts_the_import_api_key() {
    with_env(
        &[
            ("ROLODEX_DATABASE_URL", "sqlite::memory:"),
            ("ROLODEX_IMPORT_API_KEY", "feed-secret-value"),
        ],
        || {
            let output = config::run();

            assert!(!output.contains("feed-secret-value"), "api key must be redacted");
            assert!(output.contains("import.api_key = feed**** (env:ROLODEX_IMPORT_API_KEY)"));
        },
    );
}

#[test]
fn doctor_json_reports_pass_with_valid_env() {
    with_env(&[("ROLODEX_DATABASE_URL", "sqlite::memory:")], || {
        let output = doctor::run(true);
        let payload: Value = serde_json::from_str(&output).expect("doctor JSON should parse");

        assert_eq!(payload["overall_status"], "pass");
        let checks = payload["checks"].as_array().expect("checks array");
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|check| check["status"] == "pass"));
    });
}

#[test]
fn doctor_json_reports_fail_when_config_is_invalid() {
    with_env(&[("ROLODEX_IMPORT_SOURCE_URL", "ftp://feed.example.test/users")], || {
        let output = doctor::run(true);
        let payload: Value = serde_json::from_str(&output).expect("doctor JSON should parse");

        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["name"], "config_validation");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][2]["status"], "skipped");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "ROLODEX_DATABASE_URL",
        "ROLODEX_DATABASE_MAX_CONNECTIONS",
        "ROLODEX_DATABASE_TIMEOUT_SECS",
        "ROLODEX_SERVER_BIND_ADDRESS",
        "ROLODEX_SERVER_PORT",
        "ROLODEX_SERVER_HEALTH_CHECK_PORT",
        "ROLODEX_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "ROLODEX_IMPORT_SOURCE_URL",
        "ROLODEX_IMPORT_REQUEST_TIMEOUT_SECS",
        "ROLODEX_IMPORT_API_KEY",
        "ROLODEX_LOGGING_LEVEL",
        "ROLODEX_LOGGING_FORMAT",
        "ROLODEX_LOG_LEVEL",
        "ROLODEX_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
