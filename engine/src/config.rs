use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

use devlens_types::{EditTrigger, ServiceVariant, ui::UiOptions};

pub const BASE_URL_ENV: &str = "DEVLENS_API_BASE_URL";
pub const VARIANT_ENV: &str = "DEVLENS_VARIANT";
pub const EDIT_TRIGGER_ENV: &str = "DEVLENS_EDIT_TRIGGER";

#[derive(Debug, Default, Deserialize)]
pub struct DevlensConfig {
    pub service: Option<ServiceConfig>,
    pub app: Option<AppConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the analysis service. Supports `${VAR}` expansion.
    pub base_url: Option<String>,
    /// `device` or `meeting`.
    pub variant: Option<String>,
    /// Whole-request timeout. `0` disables it.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// `button` or `direct`.
    pub edit_trigger: Option<String>,
    /// Use ASCII-only glyphs for icons and spinners.
    #[serde(default)]
    pub ascii_only: bool,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
    /// Freeze the progress spinner.
    #[serde(default)]
    pub reduced_motion: bool,
}

/// Expand `${VAR}` references in config values.
///
/// Unset variables expand to the empty string; an unclosed `${` is kept verbatim.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(end_rel) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + end_rel];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 2 + end_rel + 1..];
    }

    out.push_str(rest);
    out
}

impl DevlensConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Load from an explicit path. A missing file is `Ok(None)`.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".devlens").join("config.toml"))
}

/// Effective settings after layering environment over the config file over defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    /// Already normalized: trimmed, one trailing `/` removed. May be empty.
    pub base_url: String,
    pub variant: ServiceVariant,
    pub timeout: Option<Duration>,
    pub edit_trigger: EditTrigger,
    pub ui: UiOptions,
}

impl Settings {
    /// Resolve from the process environment.
    #[must_use]
    pub fn from_environment(config: Option<&DevlensConfig>) -> Self {
        Self::resolve(config, |key| env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    ///
    /// Unrecognized variant or trigger names are logged and fall back to the default.
    pub fn resolve(config: Option<&DevlensConfig>, env_lookup: impl Fn(&str) -> Option<String>) -> Self {
        let service = config.and_then(|c| c.service.as_ref());
        let app = config.and_then(|c| c.app.as_ref());

        let base_url = env_lookup(BASE_URL_ENV)
            .or_else(|| service.and_then(|s| s.base_url.as_deref()).map(expand_env_vars))
            .map(|raw| devlens_service::normalize_base_url(&raw))
            .unwrap_or_default();

        let variant = env_lookup(VARIANT_ENV)
            .or_else(|| service.and_then(|s| s.variant.clone()))
            .map_or_else(ServiceVariant::default, |raw| {
                ServiceVariant::parse(&raw).unwrap_or_else(|| {
                    tracing::warn!(value = %raw, "Unknown service variant, using default");
                    ServiceVariant::default()
                })
            });

        let edit_trigger = env_lookup(EDIT_TRIGGER_ENV)
            .or_else(|| app.and_then(|a| a.edit_trigger.clone()))
            .map_or_else(EditTrigger::default, |raw| {
                EditTrigger::parse(&raw).unwrap_or_else(|| {
                    tracing::warn!(value = %raw, "Unknown edit trigger, using default");
                    EditTrigger::default()
                })
            });

        let timeout = service
            .and_then(|s| s.timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let ui = app.map_or_else(UiOptions::default, |a| UiOptions {
            ascii_only: a.ascii_only,
            high_contrast: a.high_contrast,
            reduced_motion: a.reduced_motion,
        });

        Self {
            base_url,
            variant,
            timeout,
            edit_trigger,
            ui,
        }
    }
}
