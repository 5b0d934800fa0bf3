use bitcode::{Decode, Encode};
use redb::TableDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// Key: MediaId -> Value: MediaRecord (bitcode)
pub const MEDIA_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("media");

// Key: (ModelType, MediaId) -> ()
pub const MEDIA_BY_MODEL_TYPE_TABLE: TableDefinition<(&str, u64), ()> =
    TableDefinition::new("media_by_model_type");

/// A stored media item and the derivatives generated from it so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: u64,
    pub model_type: String,
    pub model_id: String,
    pub collection_name: String,
    pub file_name: String,
    pub generated_conversions: BTreeSet<String>,
}

impl MediaRecord {
    pub fn new(
        id: u64,
        model_type: impl Into<String>,
        model_id: impl Into<String>,
        collection_name: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            model_type: model_type.into(),
            model_id: model_id.into(),
            collection_name: collection_name.into(),
            file_name: file_name.into(),
            generated_conversions: BTreeSet::new(),
        }
    }

    pub fn has_generated_conversion(&self, name: &str) -> bool {
        self.generated_conversions.contains(name)
    }

    /// File name without its extension, used to name derivatives.
    pub fn file_stem(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.file_name,
        }
    }
}
