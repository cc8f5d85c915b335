//! # Configuration State
//!
//! Application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`KIRANA_*`)
//! 2. Config file (`config.toml`)
//! 3. Defaults (this file)
//!
//! ## config.toml
//! ```toml
//! [company]
//! name = "VK Info Tech"
//! address = "Shop 4, Main Bazaar"
//! mobile = "98765 43210"
//! gstin = "29ABCDE1234F1Z5"
//!
//! [billing]
//! default_tax_rate = "18"
//! page_size = 10
//!
//! [numbering]
//! fallback = "reject"     # or "provisional"
//!
//! [storage]
//! db_path = "/var/lib/kirana/kirana.db"
//!
//! [print]
//! spool_dir = "/var/spool/kirana"
//! export_dir = "/home/shop/exports"
//! receipt_width = 42
//! ```
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use kirana_core::paginate::default_page_size;
use kirana_core::validation::validate_tax_rate;
use kirana_core::{CompanyDetails, TaxRate, MAX_LINE_ITEMS};

use crate::render::text::{DEFAULT_RECEIPT_WIDTH, MIN_RECEIPT_WIDTH};

/// Names of the environment overrides.
pub mod env {
    pub const CONFIG_PATH: &str = "KIRANA_CONFIG";
    pub const DB_PATH: &str = "KIRANA_DB_PATH";
    pub const COMPANY_NAME: &str = "KIRANA_COMPANY_NAME";
    pub const TAX_RATE: &str = "KIRANA_TAX_RATE";
    pub const PAGE_SIZE: &str = "KIRANA_PAGE_SIZE";
    pub const NUMBERING_FALLBACK: &str = "KIRANA_NUMBERING_FALLBACK";
    pub const SPOOL_DIR: &str = "KIRANA_SPOOL_DIR";
    pub const EXPORT_DIR: &str = "KIRANA_EXPORT_DIR";
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// What to do when existing invoice numbers cannot be read at save time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberingFallback {
    /// Fail the save with a persistence error.
    #[default]
    Reject,
    /// Issue an `INV<millis>` provisional number and carry on.
    Provisional,
}

impl FromStr for NumberingFallback {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(NumberingFallback::Reject),
            "provisional" => Ok(NumberingFallback::Provisional),
            other => Err(ConfigError::invalid(
                "numbering fallback",
                format!("expected 'reject' or 'provisional', got '{}'", other),
            )),
        }
    }
}

// =============================================================================
// Config File Shape
// =============================================================================

/// `config.toml` as written by the shop owner. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    company: CompanySection,
    billing: BillingSection,
    numbering: NumberingSection,
    storage: StorageSection,
    print: PrintSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CompanySection {
    name: Option<String>,
    tagline: Option<String>,
    address: Option<String>,
    mobile: Option<String>,
    email: Option<String>,
    gstin: Option<String>,
    bank_name: Option<String>,
    bank_holder: Option<String>,
    account_number: Option<String>,
    ifsc: Option<String>,
    upi_id: Option<String>,
    terms: Option<String>,
}

impl CompanySection {
    fn apply_to(self, company: &mut CompanyDetails) {
        let fields = [
            (self.name, &mut company.name),
            (self.tagline, &mut company.tagline),
            (self.address, &mut company.address),
            (self.mobile, &mut company.mobile),
            (self.email, &mut company.email),
            (self.gstin, &mut company.gstin),
            (self.bank_name, &mut company.bank_name),
            (self.bank_holder, &mut company.bank_holder),
            (self.account_number, &mut company.account_number),
            (self.ifsc, &mut company.ifsc),
            (self.upi_id, &mut company.upi_id),
            (self.terms, &mut company.terms),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct BillingSection {
    default_tax_rate: Option<Decimal>,
    page_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct NumberingSection {
    fallback: Option<NumberingFallback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StorageSection {
    db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PrintSection {
    spool_dir: Option<PathBuf>,
    export_dir: Option<PathBuf>,
    receipt_width: Option<usize>,
}

// =============================================================================
// Config State
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Letterhead, bank and terms printed on every invoice
    pub company: CompanyDetails,

    /// GST rate a new draft starts with
    pub default_tax_rate: TaxRate,

    /// Line items per printed page
    pub page_size: NonZeroUsize,

    pub numbering_fallback: NumberingFallback,

    pub db_path: PathBuf,

    /// Print jobs are written here for the print daemon
    pub spool_dir: PathBuf,

    /// Exported CSV/HTML/text files land here
    pub export_dir: PathBuf,

    /// Thermal paper width in characters (typically 32, 42 or 48)
    pub receipt_width: usize,
}

impl Default for ConfigState {
    /// Development defaults; paths are relative to the working directory.
    fn default() -> Self {
        ConfigState::with_data_dir(Path::new("."))
    }
}

impl ConfigState {
    /// Defaults with storage, spool and exports under `data_dir`.
    pub fn with_data_dir(data_dir: &Path) -> Self {
        ConfigState {
            company: CompanyDetails::default(),
            default_tax_rate: TaxRate::from_percent_u32(18),
            page_size: default_page_size(),
            numbering_fallback: NumberingFallback::Reject,
            db_path: data_dir.join("kirana.db"),
            spool_dir: data_dir.join("spool"),
            export_dir: data_dir.join("exports"),
            receipt_width: DEFAULT_RECEIPT_WIDTH,
        }
    }

    /// Loads configuration from the file and the process environment.
    ///
    /// ## File Location
    /// 1. `explicit` when given
    /// 2. `KIRANA_CONFIG`
    /// 3. Platform config directory:
    ///    - **macOS**: `~/Library/Application Support/in.kirana.billing/config.toml`
    ///    - **Windows**: `%APPDATA%\kirana\billing\config\config.toml`
    ///    - **Linux**: `~/.config/kirana-billing/config.toml`
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("in", "kirana", "billing");

        let config_path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(env::CONFIG_PATH).map(PathBuf::from))
            .or_else(|| dirs.as_ref().map(|d| d.config_dir().join("config.toml")));

        let data_dir = dirs
            .as_ref()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = ConfigState::with_data_dir(&data_dir);

        if let Some(path) = config_path.filter(|p| p.exists()) {
            info!(path = %path.display(), "Loading config file");
            config.apply_file(&path)?;
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        debug!(
            db_path = %config.db_path.display(),
            tax_rate = %config.default_tax_rate,
            page_size = config.page_size.get(),
            fallback = ?config.numbering_fallback,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Overlays values from a TOML file.
    pub fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.apply_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    fn apply_toml(&mut self, text: &str) -> Result<(), toml::de::Error> {
        let file: ConfigFile = toml::from_str(text)?;

        file.company.apply_to(&mut self.company);
        if let Some(rate) = file.billing.default_tax_rate {
            self.default_tax_rate = TaxRate::from_percent(rate);
        }
        if let Some(size) = file.billing.page_size.and_then(NonZeroUsize::new) {
            self.page_size = size;
        }
        if let Some(fallback) = file.numbering.fallback {
            self.numbering_fallback = fallback;
        }
        if let Some(path) = file.storage.db_path {
            self.db_path = path;
        }
        if let Some(dir) = file.print.spool_dir {
            self.spool_dir = dir;
        }
        if let Some(dir) = file.print.export_dir {
            self.export_dir = dir;
        }
        if let Some(width) = file.print.receipt_width {
            self.receipt_width = width;
        }
        Ok(())
    }

    /// Applies `KIRANA_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(env::DB_PATH) {
            self.db_path = PathBuf::from(path);
        }

        if let Some(name) = lookup(env::COMPANY_NAME) {
            self.company.name = name;
        }

        if let Some(rate) = lookup(env::TAX_RATE) {
            let rate = Decimal::from_str(rate.trim())
                .map_err(|e| ConfigError::invalid(env::TAX_RATE, e.to_string()))?;
            self.default_tax_rate = TaxRate::from_percent(rate);
        }

        if let Some(size) = lookup(env::PAGE_SIZE) {
            self.page_size = size
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|e| ConfigError::invalid(env::PAGE_SIZE, e.to_string()))?;
        }

        if let Some(fallback) = lookup(env::NUMBERING_FALLBACK) {
            self.numbering_fallback = fallback.parse()?;
        }

        if let Some(dir) = lookup(env::SPOOL_DIR) {
            self.spool_dir = PathBuf::from(dir);
        }

        if let Some(dir) = lookup(env::EXPORT_DIR) {
            self.export_dir = PathBuf::from(dir);
        }

        Ok(())
    }

    /// Rejects settings the counter cannot bill with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.company.name.trim().is_empty() {
            return Err(ConfigError::invalid("company name", "must not be empty"));
        }

        validate_tax_rate(self.default_tax_rate)
            .map_err(|e| ConfigError::invalid("default tax rate", e.to_string()))?;

        if self.page_size.get() > MAX_LINE_ITEMS {
            return Err(ConfigError::invalid(
                "page size",
                format!("must be at most {}", MAX_LINE_ITEMS),
            ));
        }

        if self.receipt_width < MIN_RECEIPT_WIDTH {
            return Err(ConfigError::invalid(
                "receipt width",
                format!("must be at least {}", MIN_RECEIPT_WIDTH),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ConfigState::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.page_size.get(), 10);
        assert_eq!(config.numbering_fallback, NumberingFallback::Reject);
        assert_eq!(config.default_tax_rate, TaxRate::from_percent_u32(18));
    }

    #[test]
    fn test_toml_overlays_defaults() {
        let mut config = ConfigState::default();
        config
            .apply_toml(
                r#"
                [company]
                name = "VK Info Tech"
                upi_id = "vk@upi"

                [billing]
                default_tax_rate = "12"
                page_size = 8

                [numbering]
                fallback = "provisional"

                [print]
                receipt_width = 48
                "#,
            )
            .unwrap();

        assert_eq!(config.company.name, "VK Info Tech");
        assert_eq!(config.company.upi_id, "vk@upi");
        assert_eq!(config.company.tagline, CompanyDetails::default().tagline);
        assert_eq!(config.default_tax_rate, TaxRate::from_percent_u32(12));
        assert_eq!(config.page_size.get(), 8);
        assert_eq!(config.numbering_fallback, NumberingFallback::Provisional);
        assert_eq!(config.receipt_width, 48);
        // Untouched keys keep their defaults.
        assert_eq!(config.db_path, PathBuf::from("./kirana.db"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let mut config = ConfigState::default();
        assert!(config.apply_toml("[billing]\ntax = 18\n").is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = ConfigState::default();
        config
            .apply_env(lookup(&[
                (env::DB_PATH, "/tmp/shop.db"),
                (env::COMPANY_NAME, "Sharma Electronics"),
                (env::TAX_RATE, "0"),
                (env::PAGE_SIZE, "5"),
                (env::NUMBERING_FALLBACK, "Provisional"),
                (env::SPOOL_DIR, "/tmp/spool"),
            ]))
            .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.company.name, "Sharma Electronics");
        assert!(config.default_tax_rate.is_zero());
        assert_eq!(config.page_size.get(), 5);
        assert_eq!(config.numbering_fallback, NumberingFallback::Provisional);
        assert_eq!(config.spool_dir, PathBuf::from("/tmp/spool"));
    }

    #[test]
    fn test_bad_env_values_are_errors() {
        let mut config = ConfigState::default();
        assert!(config.apply_env(lookup(&[(env::PAGE_SIZE, "0")])).is_err());
        assert!(config.apply_env(lookup(&[(env::TAX_RATE, "lots")])).is_err());
        assert!(config
            .apply_env(lookup(&[(env::NUMBERING_FALLBACK, "guess")]))
            .is_err());
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = ConfigState::default();
        config.default_tax_rate = TaxRate::from_percent(Decimal::from(-5));
        assert!(config.validate().is_err());

        let mut config = ConfigState::default();
        config.company.name = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = ConfigState::default();
        config.receipt_width = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\ndb_path = \"/data/kirana.db\"\n").unwrap();

        let mut config = ConfigState::default();
        config.apply_file(&path).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/kirana.db"));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            config.apply_file(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
