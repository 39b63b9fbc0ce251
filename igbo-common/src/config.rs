//! Configuration loading and setting resolution
//!
//! Every setting follows the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: the services start on defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Default HTTP bind address for the uploader
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5740";

/// Remote dataset that submissions are appended to
pub const DEFAULT_DATASET_ID: &str = "kosinebolisa/enudalabs_igbo_tts_dataset";

/// Hugging Face Hub endpoint
pub const DEFAULT_HUB_ENDPOINT: &str = "https://huggingface.co";

/// Publish attempts before a compare-and-swap conflict is reported
pub const DEFAULT_MAX_PUBLISH_ATTEMPTS: u32 = 3;

/// Largest accepted upload body (50 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Configuration directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "igbo-tts";

/// Which dataset store backs the uploader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreKind {
    /// Hugging Face Hub dataset repository
    #[default]
    Hub,
    /// Process-local store (offline runs, nothing leaves the machine)
    Memory,
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hub" => Ok(StoreKind::Hub),
            "memory" => Ok(StoreKind::Memory),
            other => Err(Error::Config(format!(
                "Unknown store '{}' (expected 'hub' or 'memory')",
                other
            ))),
        }
    }
}

/// What to do when fetching the existing dataset fails for a reason
/// other than the dataset not existing yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchFailurePolicy {
    /// Report the failure and continue with an empty base dataset
    #[default]
    TreatAsEmpty,
    /// Report the failure and abandon the submission
    Abort,
}

impl FromStr for FetchFailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "treat-as-empty" | "treat_as_empty" => Ok(FetchFailurePolicy::TreatAsEmpty),
            "abort" => Ok(FetchFailurePolicy::Abort),
            other => Err(Error::Config(format!(
                "Unknown fetch failure policy '{}' (expected 'treat-as-empty' or 'abort')",
                other
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration loaded from the TOML file
///
/// All fields are optional; unset fields fall through to compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub bind_address: Option<String>,

    #[serde(default)]
    pub dataset_id: Option<String>,

    #[serde(default)]
    pub hub_endpoint: Option<String>,

    /// Hub access token. Prefer the environment for secrets.
    #[serde(default)]
    pub hub_token: Option<String>,

    #[serde(default)]
    pub store: Option<StoreKind>,

    #[serde(default)]
    pub fetch_failure: Option<FetchFailurePolicy>,

    #[serde(default)]
    pub max_publish_attempts: Option<u32>,

    #[serde(default)]
    pub max_upload_bytes: Option<usize>,

    /// Resample transcoded uploads to this rate (Hz). Unset keeps the source rate.
    #[serde(default)]
    pub target_sample_rate: Option<u32>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load the config file for a module
    ///
    /// An explicit path must exist and parse. Without one, the platform
    /// default location is tried and a missing file yields defaults.
    pub fn load_for_module(module_name: &str, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match default_config_path(module_name) {
            Some(path) if path.exists() => {
                debug!("Loading config from {}", path.display());
                Self::load(&path)
            }
            Some(path) => {
                debug!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Platform config file path for a module,
/// e.g. `~/.config/igbo-tts/igbo-upload.toml` on Linux
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(format!("{}.toml", module_name)))
}

/// Resolve one setting: CLI → ENV → TOML → default
///
/// An environment value that does not parse is logged and skipped.
pub fn resolve_setting<T>(cli: Option<T>, env_var: &str, toml: Option<T>, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = cli {
        return value;
    }

    if let Ok(raw) = std::env::var(env_var) {
        match raw.parse::<T>() {
            Ok(value) => return value,
            Err(e) => warn!("Ignoring {}={:?}: {}", env_var, raw, e),
        }
    }

    toml.unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_kind_parse() {
        assert_eq!("hub".parse::<StoreKind>().unwrap(), StoreKind::Hub);
        assert_eq!(" Memory ".parse::<StoreKind>().unwrap(), StoreKind::Memory);
        assert!("s3".parse::<StoreKind>().is_err());
    }

    #[test]
    fn test_fetch_failure_policy_parse() {
        assert_eq!(
            "treat-as-empty".parse::<FetchFailurePolicy>().unwrap(),
            FetchFailurePolicy::TreatAsEmpty
        );
        assert_eq!("ABORT".parse::<FetchFailurePolicy>().unwrap(), FetchFailurePolicy::Abort);
        assert!("retry".parse::<FetchFailurePolicy>().is_err());
    }

    #[test]
    fn test_default_config_path_names_module() {
        if let Some(path) = default_config_path("igbo-upload") {
            assert!(path.ends_with("igbo-tts/igbo-upload.toml"));
        }
    }
}
