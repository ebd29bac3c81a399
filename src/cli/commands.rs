//! CLI command implementations
//!
//! `init` lays out the data directory. `serve` and `exec` open the stores,
//! then answer requests on stdin/stdout.

use std::fs;
use std::path::Path;

use serde_json::json;

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::handler::RequestHandler;
use super::io::{read_request, read_requests, write_error, write_json, write_response};
use super::response::Response;
use crate::finalization::FinalizationEngine;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::source::{FactDataset, InMemoryFactSource};
use crate::store::FileRecordStore;

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
        Command::Init { config } => init(&config),
        Command::Serve { config } => serve(&config),
        Command::Exec { config } => exec(&config),
    }
}

/// Create the data directory layout.
///
/// Writes an empty facts dataset if none exists yet.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let data_dir = config.data_path();

    if is_initialized(data_dir) {
        return Err(CliError::AlreadyInitialized);
    }

    let quarters = data_dir.join("quarters");
    fs::create_dir_all(&quarters).map_err(|e| {
        CliError::Config(format!("Failed to create directory {:?}: {}", quarters, e))
    })?;

    let facts = config.facts_file();
    if !facts.exists() {
        let empty = serde_json::to_string_pretty(&FactDataset::default())?;
        fs::write(&facts, empty).map_err(|e| {
            CliError::Config(format!("Failed to write {:?}: {}", facts, e))
        })?;
    }

    write_response(json!({
        "initialized": true,
        "data_dir": config.data_dir,
        "facts_path": facts.display().to_string()
    }))?;

    Ok(())
}

/// Answer requests line by line until EOF
pub fn serve(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let handler = open_handler(&config)?;

    log_event_with_fields(Event::Serving, &[("data_dir", &config.data_dir)]);

    for request_result in read_requests() {
        match request_result {
            Ok(request) => {
                let response = handler.handle(request);
                write_json(&response.to_json())?;
            }
            Err(e) if e.is_request_scoped() => {
                write_json(&Response::from(&e).to_json())?;
            }
            Err(e) => {
                // stdin is gone
                write_error(e.code(), &e.to_string(), serde_json::Value::Null)?;
                break;
            }
        }
    }

    log_event_with_fields(Event::ShutdownComplete, &[("data_dir", &config.data_dir)]);
    Ok(())
}

/// Answer a single request and exit
pub fn exec(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let handler = open_handler(&config)?;

    let request = read_request()?;
    let response = handler.handle(request);
    write_json(&response.to_json())?;

    Ok(())
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.min_severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("config", &config_path.display().to_string())],
    );
    Ok(config)
}

/// Open the fact source and record store behind a request handler
pub fn open_handler(config: &Config) -> CliResult<RequestHandler<FileRecordStore>> {
    let data_dir = config.data_path();
    if !is_initialized(data_dir) {
        return Err(CliError::NotInitialized);
    }

    let facts_path = config.facts_file();
    let source = InMemoryFactSource::load(&facts_path)
        .map_err(|e| CliError::Boot(format!("Failed to load facts: {}", e)))?;
    let store = FileRecordStore::open(data_dir)
        .map_err(|e| CliError::Boot(format!("Failed to open record store: {}", e)))?;

    log_event_with_fields(
        Event::EngineOpened,
        &[
            ("data_dir", &config.data_dir),
            ("facts_path", &facts_path.display().to_string()),
        ],
    );

    Ok(RequestHandler::new(FinalizationEngine::new(source, store)).with_facts_path(facts_path))
}

fn is_initialized(data_dir: &Path) -> bool {
    data_dir.join("quarters").is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir) -> std::path::PathBuf {
        let config_path = dir.path().join("quarterclose.json");
        let data_dir = dir.path().join("data");
        fs::write(
            &config_path,
            json!({ "data_dir": data_dir.display().to_string() }).to_string(),
        )
        .unwrap();
        config_path
    }

    #[test]
    fn test_open_before_init_fails() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&write_config(&dir)).unwrap();
        let err = open_handler(&config).err().unwrap();
        assert_eq!(err.code(), "QC_CLI_NOT_INITIALIZED");
    }

    #[test]
    fn test_init_then_open() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir);
        init(&config_path).unwrap();

        let config = Config::load(&config_path).unwrap();
        assert!(config.facts_file().exists());
        assert!(open_handler(&config).is_ok());

        let err = init(&config_path).unwrap_err();
        assert_eq!(err.code(), "QC_CLI_ALREADY_INITIALIZED");
    }
}
