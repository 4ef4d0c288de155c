//! # Structured Logging Module
//!
//! Environment-aware structured logging to the console and, when a log
//! directory can be created, to a JSON file for post-hoc inspection of
//! activation cycles.

use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::ledger::RegistrationIntent;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    init_structured_logging_with_level(None);
}

/// Initialize structured logging, optionally overriding the environment's level
pub fn init_structured_logging_with_level(level_override: Option<&str>) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = level_override
            .map(str::to_string)
            .unwrap_or_else(|| get_log_level(&environment));

        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_ansi(true)
            .with_filter(EnvFilter::new(log_level.clone()));

        let log_dir = PathBuf::from("log");
        let file_layer = match fs::create_dir_all(&log_dir) {
            Ok(()) => {
                let log_filename = format!(
                    "{}.{}.{}.log",
                    environment,
                    process::id(),
                    Utc::now().format("%Y%m%d_%H%M%S")
                );
                let file_appender = tracing_appender::rolling::never(&log_dir, &log_filename);
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                // Keep the writer alive for the life of the process
                std::mem::forget(guard);
                Some(
                    fmt::layer()
                        .with_writer(file_writer)
                        .with_target(true)
                        .with_level(true)
                        .with_ansi(false)
                        .json()
                        .with_filter(EnvFilter::new(log_level.clone())),
                )
            }
            Err(_) => None,
        };

        let file_enabled = file_layer.is_some();
        let subscriber = tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer);

        if subscriber.try_init().is_err() {
            // The host (or a test harness) already installed a subscriber
            tracing::debug!("Global tracing subscriber already initialized");
        }

        tracing::info!(
            pid = process::id(),
            environment = %environment,
            level = %log_level,
            file_output = file_enabled,
            "Structured logging initialized"
        );
    });
}

/// Current environment name
pub fn get_environment() -> String {
    std::env::var("LIFECYCLE_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log a state machine operation
pub fn log_lifecycle_operation(
    operation: &str,
    workspace: Option<&str>,
    from_state: &str,
    to_state: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        workspace = workspace,
        from_state = %from_state,
        to_state = %to_state,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "LIFECYCLE_OPERATION"
    );
}

/// Log a registration handed to (or withheld from) the host container
pub fn log_registration_operation(
    operation: &str,
    intent: &RegistrationIntent,
    status: &str,
    details: Option<&str>,
) {
    tracing::debug!(
        operation = %operation,
        kind = %intent.kind,
        id = %intent.id,
        status = %status,
        details = details,
        "REGISTRATION_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "LIFECYCLE_ERROR"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("unknown"), "debug");
    }

    #[test]
    fn test_logging_helpers_do_not_panic_without_subscriber() {
        let intent = RegistrationIntent::new("capability", "tools");
        log_lifecycle_operation("activate", Some("/ws"), "inactive", "activating", None);
        log_registration_operation("safe_push", &intent, "pushed", None);
        log_error("test", "noop", "nothing happened", Some("unit test"));
    }
}
