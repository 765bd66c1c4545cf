use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::execution::runner::RunMode;
use crate::utils::error::Result;

pub const DEFAULT_CONFIG_FILE: &str = "migrate.toml";
pub const ENV_PREFIX: &str = "ZMIGRATE";

/// Endpoints and administrator credentials of one installation.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    /// Admin SOAP endpoint, e.g. `https://mail.example.com:7071/service/admin/soap`.
    pub admin_url: String,
    /// Mailbox SOAP endpoint, e.g. `https://mail.example.com/service/soap`.
    pub mail_url: String,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSettings {
    #[serde(default)]
    pub mode: RunMode,
    /// Bound on accounts in flight in parallel mode; unbounded when absent.
    #[serde(default)]
    pub parallelism: Option<usize>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PathSettings {
    #[serde(default = "default_snapshot")]
    pub snapshot: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
}

fn default_snapshot() -> PathBuf {
    PathBuf::from("accounts.json")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_true() -> bool {
    true
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            snapshot: default_snapshot(),
            log_dir: default_log_dir(),
            report_dir: default_report_dir(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub source: Option<ServerSpec>,
    #[serde(default)]
    pub target: Option<ServerSpec>,
    /// Admin endpoints commonly run with self-signed certificates.
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
    #[serde(default)]
    pub run: RunSettings,
    #[serde(default)]
    pub paths: PathSettings,
}

impl Settings {
    /// Loads `file` (required when given explicitly, optional otherwise) layered
    /// under `ZMIGRATE_*` environment variables.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::from_sources(file, Self::environment())
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    pub fn from_sources(file: Option<&Path>, env: config::Environment) -> Result<Self> {
        let (path, required) = match file {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(required))
            .add_source(env)
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
