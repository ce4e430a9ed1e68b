//! Global labcal configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{LabCalError, LabCalResult};

static DEFAULT_STORE_DIR: &str = "~/calendar";
static DEFAULT_EXPORT_DIR: &str = "~/calendar_exports";
static DEFAULT_CALENDAR_NAME: &str = "Lab Protocols";
const DEFAULT_ACCESS_TIMEOUT: Duration = Duration::from_secs(5);

fn default_store_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_DIR)
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(DEFAULT_EXPORT_DIR)
}

fn default_calendar_name() -> String {
    DEFAULT_CALENDAR_NAME.to_string()
}

fn default_access_timeout() -> Duration {
    DEFAULT_ACCESS_TIMEOUT
}

/// Which calendar backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Native store when available, otherwise .ics export.
    #[default]
    Auto,
    Native,
    Portable,
}

/// Global configuration at ~/.config/labcal/config.toml
///
/// Every key can be overridden with a `LABCAL_`-prefixed environment variable,
/// e.g. `LABCAL_BACKEND=portable`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabCalConfig {
    #[serde(default)]
    pub backend: BackendPreference,

    /// Root of the native calendar store.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Where .ics exports are written.
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Calendar that holds protocol events in the native store.
    #[serde(default = "default_calendar_name")]
    pub calendar_name: String,

    /// How long to wait for the native store to answer an access request.
    #[serde(
        default = "default_access_timeout",
        serialize_with = "serialize_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub access_timeout: Duration,
}

impl Default for LabCalConfig {
    fn default() -> Self {
        LabCalConfig {
            backend: BackendPreference::default(),
            store_dir: default_store_dir(),
            export_dir: default_export_dir(),
            calendar_name: default_calendar_name(),
            access_timeout: default_access_timeout(),
        }
    }
}

fn serialize_duration<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

impl LabCalConfig {
    pub fn config_path() -> LabCalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| LabCalError::Config("Could not determine config directory".into()))?
            .join("labcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load ~/.config/labcal/config.toml, writing a commented-out default
    /// first if there is none.
    pub fn load() -> LabCalResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from an explicit file (missing is fine) plus the environment.
    pub fn load_from(path: &Path) -> LabCalResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("LABCAL"))
            .build()
            .map_err(|e| LabCalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| LabCalError::Config(e.to_string()))
    }

    /// Native store root with `~` expanded.
    pub fn store_path(&self) -> PathBuf {
        expand(&self.store_dir)
    }

    /// Export directory with `~` expanded.
    pub fn export_path(&self) -> PathBuf {
        expand(&self.export_dir)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> LabCalResult<()> {
        let contents = format!(
            "\
# labcal configuration

# Calendar backend: \"auto\", \"native\" or \"portable\"
# backend = \"auto\"

# Native calendar store:
# store_dir = \"{}\"

# Where .ics exports are written:
# export_dir = \"{}\"

# Calendar that holds protocol events:
# calendar_name = \"{}\"

# How long to wait for calendar access:
# access_timeout = \"5s\"
",
            DEFAULT_STORE_DIR, DEFAULT_EXPORT_DIR, DEFAULT_CALENDAR_NAME
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LabCalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| LabCalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
