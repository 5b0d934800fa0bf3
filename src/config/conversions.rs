use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A named resize recipe, read from the conversions file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionDefinition {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Queued conversions go through the background queue when one is configured.
    #[serde(default = "default_queued")]
    pub queued: bool,
    /// Collections this conversion applies to; empty means all of them.
    #[serde(default)]
    pub collections: Vec<String>,
}

fn default_queued() -> bool {
    true
}

impl ConversionDefinition {
    pub fn applies_to(&self, collection_name: &str) -> bool {
        self.collections.is_empty() || self.collections.iter().any(|c| c == collection_name)
    }
}

/// A missing file means "no conversions", not an error.
pub fn load_conversions(path: impl AsRef<Path>) -> Result<Vec<ConversionDefinition>> {
    let path = path.as_ref();
    if !path.exists() {
        warn!("No conversions file at {:?}; nothing will be generated", path);
        return Ok(Vec::new());
    }
    let file = File::open(path).context(format!("failed to open {:?}", path))?;
    serde_json::from_reader(BufReader::new(file))
        .context(format!("failed to parse conversions from {:?}", path))
}
