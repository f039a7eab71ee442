use crate::error::WranglerError;
use crate::wrangler::run::DEFAULT_ALT_SUFFIX;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

include!(concat!(env!("OUT_DIR"), "/jw_env_allowlist.rs"));

pub const DEFAULT_TITLE_LOOKUP: &str = "data/title_code_lookup.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WranglerConfig {
    #[serde(default = "default_alt_suffix")]
    pub alt_filename_suffix: String,
    #[serde(default = "default_title_lookup")]
    pub title_lookup_file: PathBuf,
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
    #[serde(default = "default_progress")]
    pub progress: bool,
}

fn default_alt_suffix() -> String {
    DEFAULT_ALT_SUFFIX.to_string()
}

fn default_title_lookup() -> PathBuf {
    PathBuf::from(DEFAULT_TITLE_LOOKUP)
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_progress() -> bool {
    true
}

impl Default for WranglerConfig {
    fn default() -> Self {
        Self {
            alt_filename_suffix: default_alt_suffix(),
            title_lookup_file: default_title_lookup(),
            working_dir: default_working_dir(),
            progress: default_progress(),
        }
    }
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

fn validate(cfg: &WranglerConfig) -> Result<()> {
    let suffix = &cfg.alt_filename_suffix;
    if suffix.is_empty() {
        return Err(WranglerError::InvalidConfig(
            "alt_filename_suffix cannot be empty".to_string(),
        )
        .into());
    }
    if suffix.contains('/') || suffix.contains('\\') {
        return Err(WranglerError::InvalidConfig(format!(
            "alt_filename_suffix must not contain a path separator: {suffix}"
        ))
        .into());
    }
    if cfg.working_dir.as_os_str().is_empty() {
        return Err(WranglerError::InvalidConfig("working_dir cannot be empty".to_string()).into());
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("JW_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let home = dirs::home_dir()?;
    Some(home.join(".jisc_wrangler").join("jw.toml"))
}

fn merge_file_config(base: &mut WranglerConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)
        .map_err(|err| anyhow!("failed to read config {}: {err}", path.display()))?;
    let parsed: WranglerConfig = toml::from_str(&raw).map_err(|err| {
        WranglerError::InvalidConfig(format!("failed to parse {}: {err}", path.display()))
    })?;
    *base = parsed;
    Ok(())
}

/// `JW_*` variables set in the environment that nothing in the crate reads.
pub fn unknown_env_keys() -> Vec<String> {
    let mut out: Vec<String> = env::vars()
        .map(|(key, _)| key)
        .filter(|key| key.starts_with("JW_"))
        .filter(|key| !GENERATED_JW_ENV_ALLOWLIST.contains(&key.as_str()))
        .collect();
    out.sort();
    out
}

pub fn load_config() -> Result<WranglerConfig> {
    let mut cfg = WranglerConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.alt_filename_suffix = env_or_string("JW_ALT_SUFFIX", &cfg.alt_filename_suffix);
    cfg.title_lookup_file = env_or_path("JW_TITLE_LOOKUP", cfg.title_lookup_file);
    cfg.working_dir = env_or_path("JW_WORKING_DIR", cfg.working_dir);
    cfg.progress = env_or_bool("JW_PROGRESS", cfg.progress);

    validate(&cfg)?;
    Ok(cfg)
}
