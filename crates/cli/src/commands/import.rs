use crate::commands::CommandResult;
use crate::trigger::{HttpListRefresher, ImportTrigger, StatusKind, TriggerOutcome};
use rolodex_core::config::{AppConfig, LoadOptions};

pub fn run(server_url: Option<String>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "import",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let base_url = server_url
        .unwrap_or_else(|| {
            format!("http://{}:{}", config.server.bind_address, config.server.port)
        })
        .trim_end_matches('/')
        .to_string();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "import",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let trigger = ImportTrigger::new(
        format!("{base_url}/api/import"),
        HttpListRefresher::new(format!("{base_url}/api/customers")),
    );

    match runtime.block_on(trigger.trigger()) {
        TriggerOutcome::Busy => CommandResult::failure(
            "import",
            "trigger_busy",
            "an import is already in progress",
            4,
        ),
        TriggerOutcome::Completed { message, refreshed } => {
            let mut output = message.text.clone();
            if let Some(customers) = refreshed {
                output.push_str(&format!("\nCustomer list ({} total):", customers.len()));
                for customer in &customers {
                    output.push_str(&format!(
                        "\n  - {} <{}> {}",
                        customer.name,
                        customer.email,
                        customer.phone_display()
                    ));
                }
            }

            match message.kind {
                StatusKind::Error => CommandResult::failure("import", "import_failed", output, 4),
                StatusKind::Info | StatusKind::Success => CommandResult::success("import", output),
            }
        }
    }
}
