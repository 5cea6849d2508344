use rolodex_core::config::{AppConfig, ConfigError, LoadOptions};
use rolodex_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    Ok(Application { config, db_pool })
}

#[cfg(test)]
mod tests {
    use rolodex_core::config::{ConfigOverrides, LoadOptions};
    use rolodex_core::domain::customer::NewCustomer;
    use rolodex_db::repositories::SqlCustomerRepository;

    use crate::bootstrap::bootstrap;

    fn options(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_import_source() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                import_source_url: Some("ftp://feed.example.test/users".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("import.source_url"));
    }

    #[tokio::test]
    async fn bootstrap_prepares_schema_and_data_path() {
        let app = bootstrap(options("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'customer'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected customer table to be available after bootstrap");
        assert_eq!(table_count, 1, "bootstrap should expose the customer table");

        let repository = SqlCustomerRepository::new(app.db_pool.clone());
        let inserted = repository
            .insert_if_absent(&NewCustomer {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.test".to_string(),
                phone: None,
                raw: serde_json::json!({ "source": "bootstrap-test" }),
            })
            .await
            .expect("insert through freshly bootstrapped pool");
        assert!(inserted);

        let customers = repository.list_all().await.expect("list through bootstrapped pool");
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].name, "Ada Lovelace");

        app.db_pool.close().await;
    }
}
