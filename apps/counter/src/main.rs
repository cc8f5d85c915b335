//! # Kirana Counter Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kirana Counter                                   │
//! │                                                                         │
//! │  Billing screen / script                                               │
//! │        │  JSON request lines (stdin)                                   │
//! │        ▼                                                                │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    Rust Backend (this crate)                     │  │
//! │  │                                                                  │  │
//! │  │  main.rs ────► Parses flags, sets up logging                    │  │
//! │  │  lib.rs ─────► Config, database, command loop                   │  │
//! │  │  commands/ ──► add_line_item, save_invoice, reprint_invoice ... │  │
//! │  │  render/ ────► HTML print, CSV export, text receipt             │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │        │                         │                                      │
//! │        ▼                         ▼                                      │
//! │  SQLite (kirana.db, WAL)   spool / export directories                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```text
//! kirana-counter [--config <path>]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    kirana_counter::init_tracing();

    let mut config_path: Option<PathBuf> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => match args.next() {
                Some(path) => config_path = Some(PathBuf::from(path)),
                None => {
                    eprintln!("--config needs a path");
                    return ExitCode::from(2);
                }
            },
            "--help" | "-h" => {
                println!("Usage: kirana-counter [--config <path>]");
                println!();
                println!("Reads one JSON command per line from stdin and writes one JSON");
                println!("response per line to stdout. Logs go to stderr (RUST_LOG).");
                return ExitCode::SUCCESS;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                return ExitCode::from(2);
            }
        }
    }

    match kirana_counter::run(config_path.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
