//! # State Module
//!
//! Application state shared by every command.
//!
//! ## Why Multiple State Types?
//! Instead of one struct holding everything behind one lock, each concern
//! gets its own type. Commands declare what they touch, tests can swap a
//! single piece, and independent state never blocks each other.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │   DbState    │  │  DraftState  │  │   ConfigState    │              │
//! │  │              │  │              │  │                  │              │
//! │  │ Arc<dyn      │  │  Arc<Mutex<  │  │  company         │              │
//! │  │  *Store>     │  │    Draft     │  │  tax / page size │              │
//! │  │              │  │  >>          │  │  fallback, dirs  │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  ┌─────────────────────────┐  ┌─────────────────────────┐              │
//! │  │ printer: PrintSpooler   │  │ exporter: PrintSpooler  │              │
//! │  │ (spool_dir)             │  │ (export_dir)            │              │
//! │  └─────────────────────────┘  └─────────────────────────┘              │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: stores are Send + Sync                                     │
//! │  • DraftState: Arc<Mutex<T>>, never locked across .await              │
//! │  • ConfigState: read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod draft;

use std::sync::Arc;

pub use config::{env, ConfigError, ConfigState, NumberingFallback};
pub use db::DbState;
pub use draft::{CheckedDraft, Draft, DraftState, LineItemInput, LineItemUpdate};

use crate::render::{DirectorySpooler, PrintSpooler};

/// Everything a command can reach.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub draft: DraftState,
    pub config: Arc<ConfigState>,
    /// Receives print jobs from the save and reprint paths.
    pub printer: Arc<dyn PrintSpooler>,
    /// Receives exported files.
    pub exporter: Arc<dyn PrintSpooler>,
}

impl AppState {
    /// Directory spoolers at the configured locations.
    pub fn new(config: ConfigState, db: DbState) -> Self {
        let printer = Arc::new(DirectorySpooler::new(config.spool_dir.clone()));
        let exporter = Arc::new(DirectorySpooler::new(config.export_dir.clone()));
        AppState::with_spoolers(config, db, printer, exporter)
    }

    pub fn with_spoolers(
        config: ConfigState,
        db: DbState,
        printer: Arc<dyn PrintSpooler>,
        exporter: Arc<dyn PrintSpooler>,
    ) -> Self {
        AppState {
            db,
            draft: DraftState::new(config.default_tax_rate),
            config: Arc::new(config),
            printer,
            exporter,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("db", &self.db)
            .field("draft", &self.draft)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
