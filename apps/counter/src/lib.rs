//! # Kirana Counter Library
//!
//! The billing counter shell: state, commands, renderers and the JSON
//! command loop that drives them.
//!
//! ## Module Organization
//! ```text
//! kirana_counter/
//! ├── lib.rs          ◄─── You are here (startup & command loop)
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState
//! │   ├── db.rs       ◄─── Injected store traits
//! │   ├── draft.rs    ◄─── Bill under edit
//! │   └── config.rs   ◄─── config.toml + KIRANA_* overrides
//! ├── commands/       ◄─── One function per screen action
//! ├── render/
//! │   ├── mod.rs      ◄─── Renderer / PrintSpooler traits, RenderJob
//! │   ├── html.rs     ◄─── A4 print layout
//! │   ├── csv.rs      ◄─── Spreadsheet export
//! │   └── text.rs     ◄─── Thermal receipt
//! └── error.rs        ◄─── ApiError returned to the caller
//! ```
//!
//! ## Wire Protocol
//! One request per line on stdin, one response per line on stdout:
//! ```text
//! → {"command":"add_line_item","args":{"item":{"description":"Fan","quantity":1,"unitPrice":"2500"}}}
//! ← {"ok":true,"data":{"draft":{...},"totals":{...}}}
//! → {"command":"save_invoice","args":{"action":{"kind":"print"}}}
//! ← {"ok":true,"data":{"invoice":{...},"spooled":{...},"renderError":null,...}}
//! → {"command":"nope"}
//! ← {"ok":false,"error":{"code":"NOT_FOUND","message":"Command not found: nope"}}
//! ```
//! Logs go to stderr so stdout carries responses only.

pub mod commands;
pub mod error;
pub mod render;
pub mod state;

use std::path::Path;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use commands::{dispatch, Request, Response};
use error::ApiError;
use kirana_db::{Database, DbConfig, DbError};
use state::{AppState, ConfigError, ConfigState, DbState};

/// Startup and I/O failures of the command runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the counter against stdin/stdout until stdin closes.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Counter Startup                                   │
/// │                                                                         │
/// │  1. Load configuration ───────────────────────────────────────────────► │
/// │     • config.toml (explicit path, KIRANA_CONFIG, or platform dir)       │
/// │     • KIRANA_* environment overrides, then validation                   │
/// │                                                                         │
/// │  2. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode                                              │
/// │     • Run pending migrations                                            │
/// │                                                                         │
/// │  3. Build AppState ───────────────────────────────────────────────────► │
/// │     • SQLite stores behind the store traits                             │
/// │     • Empty draft at the configured tax rate                            │
/// │     • Directory spoolers for print and export                           │
/// │                                                                         │
/// │  4. Serve requests until EOF, then close the pool ────────────────────► │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(config_path: Option<&Path>) -> Result<(), RunError> {
    let config = ConfigState::load(config_path)?;
    info!(company = %config.company.name, "Starting Kirana counter");

    if let Some(dir) = config.db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    let db = Database::new(DbConfig::new(&config.db_path)).await?;
    info!(db_path = %config.db_path.display(), "Database connected and migrations applied");

    let app = AppState::new(config, DbState::from_database(&db));

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    let served = serve(stdin, stdout, &app).await;

    db.close().await;
    served?;
    info!("Counter stopped");
    Ok(())
}

/// Reads requests line by line and writes one response line for each.
///
/// Blank lines are skipped. A line that is not a valid request gets a
/// `VALIDATION_ERROR` response; the loop carries on.
pub async fn serve<R, W>(reader: R, mut writer: W, app: &AppState) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0usize;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => dispatch(app, request).await,
            Err(e) => Response::error(ApiError::validation(format!("Malformed request: {}", e))),
        };

        let mut encoded = serde_json::to_string(&response)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        encoded.push('\n');

        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
        handled += 1;
    }

    debug!(requests = handled, "Input closed");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=kirana=trace` - Show trace for kirana crates only
/// - Default: `info,kirana=debug,sqlx=warn`
///
/// Writes to stderr; stdout is the response channel.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kirana=debug,sqlx=warn"));

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use kirana_db::InMemoryStore;
    use serde_json::Value;

    fn app() -> AppState {
        AppState::new(ConfigState::default(), DbState::in_memory(InMemoryStore::new()))
    }

    async fn run_lines(app: &AppState, input: &str) -> Vec<Value> {
        let mut output = Vec::new();
        serve(input.as_bytes(), &mut output, app).await.unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_one_response_per_request() {
        let app = app();
        let input = concat!(
            r#"{"command":"get_draft"}"#,
            "\n\n",
            r#"{"command":"set_tax_rate","args":{"taxRate":"12"}}"#,
            "\n",
        );

        let responses = run_lines(&app, input).await;

        assert_eq!(responses.len(), 2);
        assert!(responses.iter().all(|r| r["ok"] == true));
        assert_eq!(responses[1]["data"]["draft"]["taxRate"], "12");
    }

    #[tokio::test]
    async fn test_malformed_line_does_not_stop_the_loop() {
        let app = app();
        let input = "not json\n{\"command\":\"get_config\"}\n";

        let responses = run_lines(&app, input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["ok"], false);
        assert_eq!(responses[0]["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(responses[1]["ok"], true);
    }

    #[tokio::test]
    async fn test_price_beyond_decimal_range_is_rejected() {
        let app = app();
        let input = concat!(
            r#"{"command":"add_line_item","args":{"item":{"description":"Gold","quantity":2,"unitPrice":"79228162514264337593543950335"}}}"#,
            "\n",
            r#"{"command":"get_config"}"#,
            "\n",
        );

        let responses = run_lines(&app, input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["ok"], false);
        assert_eq!(responses[0]["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(responses[1]["ok"], true);

        let draft = app.draft.snapshot();
        assert!(draft.items.is_empty());
    }
}
