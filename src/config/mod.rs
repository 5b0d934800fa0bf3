//! Process configuration, read from the environment (and `.env`) with `envy`.

pub mod args;
pub mod conversions;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::common::DEFAULT_RESPONSIVE_WIDTHS;

pub const CONFIG_PREFIX: &str = "REGEN_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueConnection {
    /// Every conversion runs inline.
    #[default]
    Sync,
    /// Queued conversions are handed to the background worker.
    Background,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegenConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,
    #[serde(default = "default_conversions_path")]
    pub conversions_path: PathBuf,
    #[serde(default)]
    pub queue_connection: QueueConnection,
    /// Wall-clock limit for the whole process, in seconds.
    #[serde(default)]
    pub time_limit_secs: Option<u64>,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default = "default_responsive_widths")]
    pub responsive_widths: Vec<u32>,
    /// Where to write the JSON report, if anywhere.
    #[serde(default)]
    pub report_path: Option<PathBuf>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./db/media.redb")
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./object")
}

fn default_conversions_path() -> PathBuf {
    PathBuf::from("./conversions.json")
}

fn default_app_env() -> String {
    "local".to_string()
}

fn default_responsive_widths() -> Vec<u32> {
    DEFAULT_RESPONSIVE_WIDTHS.to_vec()
}

impl RegenConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(CONFIG_PREFIX)
            .from_iter(vars)
            .context("Failed to read REGEN_* configuration")
    }

    pub fn is_synchronous(&self) -> bool {
        self.queue_connection == QueueConnection::Sync
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}
