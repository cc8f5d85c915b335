//! # Configuration Commands
//!
//! Exposes configuration to the screen (company letterhead, tax default,
//! page size). Read-only: the file and environment are the only sources.

use crate::error::ApiError;
use crate::state::{AppState, ConfigState};

/// Returns the active configuration.
pub fn get_config(app: &AppState) -> Result<ConfigState, ApiError> {
    Ok(app.config.as_ref().clone())
}
