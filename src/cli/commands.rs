//! CLI command implementations
//!
//! Boot sequence for commands that need installed apps:
//! 1. Configuration load
//! 2. Manifest load (settings snapshot)
//! 3. Script module compilation
//! 4. Item store open
//!
//! Request failures are written to stdout as an error envelope and then
//! surfaced as `RequestFailed` so the process exits non-zero.

use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::apps::{AppError, AppResult, AppService};
use crate::config::Config;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::schema::{AppManifestLoader, SchemaError, Settings};
use crate::scripting::WasmtimeRuntime;
use crate::store::FileItemStore;

use super::args::{Command, ItemTarget, ItemsAction};
use super::errors::{CliError, CliResult};
use super::io::{read_optional_request, read_required_from, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check { settings } => check(&settings),
        Command::Info { config, app } => {
            let service = boot_service(&config)?;
            log_command("info", &app);
            respond(service.info(&app).and_then(|s| to_json(&s)))
        }
        Command::Items { target, action } => {
            let service = boot_service(&target.config)?;
            log_command("items", &target.app);
            respond(items_from_input(&service, &target, &action, &mut io::stdin().lock()))
        }
        Command::Action {
            config,
            wallet,
            app,
            name,
        } => {
            let service = boot_service(&config)?;
            log_command("action", &app);
            respond(
                read_optional_request()
                    .and_then(|params| service.run_action(&wallet, &app, &name, params.unwrap_or(Value::Null))),
            )
        }
    }
}

/// Validate a settings document without booting anything
pub fn check(settings_path: &Path) -> CliResult<()> {
    let content = fs::read_to_string(settings_path)
        .map_err(|e| CliError::io_error(format!("Failed to read settings: {}", e)))?;

    respond(check_settings(&content))
}

/// Parse and validate settings JSON, reporting the declared models
pub fn check_settings(content: &str) -> AppResult<Value> {
    let settings: Settings = serde_json::from_str(content).map_err(|e| {
        AppError::Configuration(SchemaError::invalid_settings(format!("invalid settings JSON: {}", e)))
    })?;
    settings.validate().map_err(AppError::Configuration)?;

    let models: Vec<&str> = settings.models.iter().map(|m| m.name.as_str()).collect();
    let actions: Vec<&str> = settings.actions.keys().map(String::as_str).collect();
    Ok(json!({"valid": true, "models": models, "actions": actions}))
}

/// Run one item command against `service`
pub fn items(
    service: &AppService,
    target: &ItemTarget,
    action: &ItemsAction,
    body: Option<Value>,
) -> AppResult<Value> {
    let (wallet, app, model) = (&target.wallet, &target.app, &target.model);

    match action {
        ItemsAction::List => to_json(&service.list_items(wallet, app, model)?),
        ItemsAction::Get { key } => Ok(Value::Object(service.get_item(wallet, app, model, key)?)),
        ItemsAction::Set { key } => {
            service.set_item(wallet, app, model, key, body.unwrap_or(Value::Null))?;
            Ok(json!({"key": key}))
        }
        ItemsAction::Add => {
            let key = service.add_item(wallet, app, model, body.unwrap_or(Value::Null))?;
            Ok(json!({"key": key}))
        }
        ItemsAction::Delete { key } => {
            service.delete_item(wallet, app, model, key)?;
            Ok(json!({"deleted": key}))
        }
    }
}

/// Run one item command, reading its body from `input` when it takes one.
///
/// Set and add require a body; a missing or undecodable one is a validation error.
pub fn items_from_input<R: BufRead>(
    service: &AppService,
    target: &ItemTarget,
    action: &ItemsAction,
    input: &mut R,
) -> AppResult<Value> {
    let body = if action.reads_body() {
        Some(read_required_from(input)?)
    } else {
        None
    };

    items(service, target, action, body)
}

/// Build an `AppService` from a configuration file
pub fn boot_service(config_path: &Path) -> CliResult<AppService> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity()?);
    log_event_with_fields(Event::ConfigLoaded, &[("data_dir", &config.data_dir)]);

    boot_from_config(&config)
}

/// Boot from an already loaded configuration
pub fn boot_from_config(config: &Config) -> CliResult<AppService> {
    let loader = Arc::new(AppManifestLoader::new(config.apps_path()));
    loader
        .load_all()
        .map_err(|e| CliError::boot_failed(format!("Failed to load app manifests: {}", e)))?;

    let runtime = WasmtimeRuntime::new(config.runtime_config())
        .map_err(|e| CliError::boot_failed(e.to_string()))?;
    for manifest in loader.manifests() {
        if let Some(module) = &manifest.module {
            runtime
                .register_file(&manifest.url, module)
                .map_err(|e| CliError::boot_failed(e.to_string()))?;
        }
    }

    let store = FileItemStore::open(config.items_path())
        .map_err(|e| CliError::boot_failed(format!("Failed to open item store: {}", e)))?;

    Ok(AppService::new(loader, Arc::new(store), Arc::new(runtime)))
}

fn to_json<T: serde::Serialize>(value: &T) -> AppResult<Value> {
    // Settings and items hold only JSON-representable data
    serde_json::to_value(value).map_err(|e| AppError::Store(e.into()))
}

fn log_command(command: &str, app: &str) {
    log_event_with_fields(Event::CliCommand, &[("command", command), ("app", app)]);
}

fn respond(result: AppResult<Value>) -> CliResult<()> {
    match result {
        Ok(data) => write_response(data),
        Err(e) => {
            let envelope = e.envelope();
            write_error(&envelope)?;
            Err(CliError::request_failed(envelope.status))
        }
    }
}
