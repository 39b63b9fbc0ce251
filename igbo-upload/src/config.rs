//! Configuration resolution for igbo-upload
//!
//! Settings resolve CLI → ENV → TOML → default (see `igbo_common::config`).
//! The Hub token is resolved separately since it never comes from the CLI.

use clap::Parser;
use igbo_common::config::{
    resolve_setting, FetchFailurePolicy, StoreKind, TomlConfig, DEFAULT_BIND_ADDRESS,
    DEFAULT_DATASET_ID, DEFAULT_HUB_ENDPOINT, DEFAULT_MAX_PUBLISH_ATTEMPTS,
    DEFAULT_MAX_UPLOAD_BYTES,
};
use igbo_common::{Error, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};

/// Environment variables checked for the Hub token, in priority order
pub const TOKEN_ENV_VARS: &[&str] = &["IGBO_LLM_KEY", "HF_TOKEN"];

/// Command-line arguments for igbo-upload
///
/// Only explicitly passed flags are `Some`; environment and TOML fallbacks
/// are applied by [`UploaderConfig::resolve`].
#[derive(Parser, Debug, Default)]
#[command(name = "igbo-upload")]
#[command(about = "Contribute Igbo speech clips and transcripts to a TTS dataset")]
#[command(version)]
pub struct Cli {
    /// TOML config file (default: ~/.config/igbo-tts/igbo-upload.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Dataset repository id (owner/name)
    #[arg(short, long)]
    pub dataset: Option<String>,

    /// Hugging Face Hub endpoint
    #[arg(long)]
    pub hub_endpoint: Option<String>,

    /// Dataset store: hub or memory
    #[arg(long)]
    pub store: Option<StoreKind>,

    /// Behaviour when the existing dataset cannot be fetched: treat-as-empty or abort
    #[arg(long)]
    pub fetch_failure: Option<FetchFailurePolicy>,

    /// Publish attempts before giving up on a changing dataset
    #[arg(long)]
    pub max_publish_attempts: Option<u32>,

    /// Largest accepted upload in bytes
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Resample transcoded uploads to this rate (Hz)
    #[arg(long)]
    pub target_sample_rate: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Fully resolved uploader settings
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub bind_address: SocketAddr,
    pub dataset_id: String,
    pub hub_endpoint: String,
    pub store: StoreKind,
    pub fetch_failure: FetchFailurePolicy,
    pub max_publish_attempts: u32,
    pub max_upload_bytes: usize,
    pub target_sample_rate: Option<u32>,
}

impl UploaderConfig {
    pub fn resolve(cli: &Cli, toml: &TomlConfig) -> Result<Self> {
        let bind = resolve_setting(
            cli.bind.clone(),
            "IGBO_BIND_ADDRESS",
            toml.bind_address.clone(),
            DEFAULT_BIND_ADDRESS.to_string(),
        );
        let bind_address = bind
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("Invalid bind address '{}': {}", bind, e)))?;

        let dataset_id = resolve_setting(
            cli.dataset.clone(),
            "IGBO_DATASET_ID",
            toml.dataset_id.clone(),
            DEFAULT_DATASET_ID.to_string(),
        );
        if !is_valid_dataset_id(&dataset_id) {
            return Err(Error::Config(format!(
                "Invalid dataset id '{}' (expected owner/name)",
                dataset_id
            )));
        }

        let hub_endpoint = resolve_setting(
            cli.hub_endpoint.clone(),
            "IGBO_HUB_ENDPOINT",
            toml.hub_endpoint.clone(),
            DEFAULT_HUB_ENDPOINT.to_string(),
        )
        .trim_end_matches('/')
        .to_string();

        let max_publish_attempts = resolve_setting(
            cli.max_publish_attempts,
            "IGBO_MAX_PUBLISH_ATTEMPTS",
            toml.max_publish_attempts,
            DEFAULT_MAX_PUBLISH_ATTEMPTS,
        );
        if max_publish_attempts == 0 {
            return Err(Error::Config(
                "max_publish_attempts must be at least 1".to_string(),
            ));
        }

        let target_sample_rate = cli
            .target_sample_rate
            .or_else(|| env_parse("IGBO_TARGET_SAMPLE_RATE"))
            .or(toml.target_sample_rate);
        if target_sample_rate == Some(0) {
            return Err(Error::Config("target_sample_rate must be positive".to_string()));
        }

        Ok(Self {
            bind_address,
            dataset_id,
            hub_endpoint,
            store: resolve_setting(cli.store, "IGBO_STORE", toml.store, StoreKind::default()),
            fetch_failure: resolve_setting(
                cli.fetch_failure,
                "IGBO_FETCH_FAILURE",
                toml.fetch_failure,
                FetchFailurePolicy::default(),
            ),
            max_publish_attempts,
            max_upload_bytes: resolve_setting(
                cli.max_upload_bytes,
                "IGBO_MAX_UPLOAD_BYTES",
                toml.max_upload_bytes,
                DEFAULT_MAX_UPLOAD_BYTES,
            ),
            target_sample_rate,
        })
    }
}

/// Log level for the tracing filter
///
/// Resolved ahead of [`UploaderConfig::resolve`] so its warnings are logged.
pub fn resolve_log_level(cli: &Cli, toml: &TomlConfig) -> String {
    resolve_setting(
        cli.log_level.clone(),
        "IGBO_LOG_LEVEL",
        Some(toml.logging.level.clone()),
        "info".to_string(),
    )
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    let raw = std::env::var(var).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", var, raw);
            None
        }
    }
}

fn is_valid_dataset_id(id: &str) -> bool {
    matches!(id.split_once('/'), Some((owner, name))
        if !owner.is_empty() && !name.is_empty() && !name.contains('/'))
}

/// Resolve the Hub access token
///
/// **Priority:** `IGBO_LLM_KEY` → `HF_TOKEN` → TOML `hub_token`
pub fn resolve_hub_token(toml_config: &TomlConfig) -> Result<String> {
    let mut candidates: Vec<(&str, String)> = TOKEN_ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok().map(|v| (*var, v)))
        .collect();
    if let Some(token) = &toml_config.hub_token {
        candidates.push(("TOML", token.clone()));
    }
    candidates.retain(|(_, token)| is_valid_token(token));

    if candidates.len() > 1 {
        let sources: Vec<&str> = candidates.iter().map(|(source, _)| *source).collect();
        warn!(
            "Hub token found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    match candidates.into_iter().next() {
        Some((source, token)) => {
            info!("Hub token loaded from {}", source);
            Ok(token.trim().to_string())
        }
        None => Err(Error::Config(
            "Hub token not configured. Please configure using one of:\n\
             1. Environment: IGBO_LLM_KEY=hf_... (or HF_TOKEN)\n\
             2. TOML config: ~/.config/igbo-tts/igbo-upload.toml (hub_token = \"hf_...\")\n\
             \n\
             Or run offline with --store memory."
                .to_string(),
        )),
    }
}

/// Non-empty, non-whitespace
pub fn is_valid_token(token: &str) -> bool {
    !token.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_VARS: &[&str] = &[
        "IGBO_LLM_KEY",
        "HF_TOKEN",
        "IGBO_BIND_ADDRESS",
        "IGBO_DATASET_ID",
        "IGBO_HUB_ENDPOINT",
        "IGBO_STORE",
        "IGBO_FETCH_FAILURE",
        "IGBO_MAX_PUBLISH_ATTEMPTS",
        "IGBO_MAX_UPLOAD_BYTES",
        "IGBO_TARGET_SAMPLE_RATE",
        "IGBO_LOG_LEVEL",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = UploaderConfig::resolve(&Cli::default(), &TomlConfig::default()).unwrap();

        assert_eq!(config.bind_address.to_string(), DEFAULT_BIND_ADDRESS);
        assert_eq!(config.dataset_id, DEFAULT_DATASET_ID);
        assert_eq!(config.hub_endpoint, DEFAULT_HUB_ENDPOINT);
        assert_eq!(config.store, StoreKind::Hub);
        assert_eq!(config.fetch_failure, FetchFailurePolicy::TreatAsEmpty);
        assert_eq!(config.max_publish_attempts, 3);
        assert_eq!(config.target_sample_rate, None);
        assert_eq!(resolve_log_level(&Cli::default(), &TomlConfig::default()), "info");
    }

    #[test]
    #[serial]
    fn test_cli_beats_env_beats_toml() {
        clear_env();
        let toml = TomlConfig {
            dataset_id: Some("toml/dataset".to_string()),
            store: Some(StoreKind::Memory),
            max_publish_attempts: Some(7),
            ..Default::default()
        };
        std::env::set_var("IGBO_DATASET_ID", "env/dataset");
        std::env::set_var("IGBO_MAX_PUBLISH_ATTEMPTS", "5");

        let cli = Cli {
            dataset: Some("cli/dataset".to_string()),
            ..Default::default()
        };
        let config = UploaderConfig::resolve(&cli, &toml).unwrap();
        assert_eq!(config.dataset_id, "cli/dataset");
        assert_eq!(config.max_publish_attempts, 5);
        assert_eq!(config.store, StoreKind::Memory);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_log_level_priority() {
        clear_env();
        let mut toml = TomlConfig::default();
        toml.logging.level = "warn".to_string();
        assert_eq!(resolve_log_level(&Cli::default(), &toml), "warn");

        std::env::set_var("IGBO_LOG_LEVEL", "debug");
        assert_eq!(resolve_log_level(&Cli::default(), &toml), "debug");

        let cli = Cli {
            log_level: Some("trace".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_log_level(&cli, &toml), "trace");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_rejected() {
        clear_env();
        let bad_bind = Cli {
            bind: Some("not-an-address".to_string()),
            ..Default::default()
        };
        assert!(UploaderConfig::resolve(&bad_bind, &TomlConfig::default()).is_err());

        let bad_dataset = Cli {
            dataset: Some("no-owner".to_string()),
            ..Default::default()
        };
        assert!(UploaderConfig::resolve(&bad_dataset, &TomlConfig::default()).is_err());

        let zero_attempts = Cli {
            max_publish_attempts: Some(0),
            ..Default::default()
        };
        assert!(UploaderConfig::resolve(&zero_attempts, &TomlConfig::default()).is_err());
    }

    #[test]
    #[serial]
    fn test_endpoint_trailing_slash_trimmed() {
        clear_env();
        let cli = Cli {
            hub_endpoint: Some("http://127.0.0.1:9000/".to_string()),
            ..Default::default()
        };
        let config = UploaderConfig::resolve(&cli, &TomlConfig::default()).unwrap();
        assert_eq!(config.hub_endpoint, "http://127.0.0.1:9000");
    }

    #[test]
    #[serial]
    fn test_token_priority() {
        clear_env();
        let toml = TomlConfig {
            hub_token: Some("hf_toml".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_hub_token(&toml).unwrap(), "hf_toml");

        std::env::set_var("HF_TOKEN", "hf_env");
        assert_eq!(resolve_hub_token(&toml).unwrap(), "hf_env");

        std::env::set_var("IGBO_LLM_KEY", "hf_igbo");
        assert_eq!(resolve_hub_token(&toml).unwrap(), "hf_igbo");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_blank_token_skipped() {
        clear_env();
        std::env::set_var("IGBO_LLM_KEY", "   ");
        let toml = TomlConfig {
            hub_token: Some("hf_toml".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_hub_token(&toml).unwrap(), "hf_toml");

        assert!(resolve_hub_token(&TomlConfig::default()).is_err());
        clear_env();
    }
}
