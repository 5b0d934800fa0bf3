pub mod resize;

use std::path::{Path, PathBuf};

use crate::common::ORIGINAL_COLLECTION;
use crate::database::schema::media::MediaRecord;

/// On-disk layout of originals and their derivatives under one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn original_path(&self, media: &MediaRecord) -> PathBuf {
        self.root
            .join("originals")
            .join(media.id.to_string())
            .join(&media.file_name)
    }

    pub fn conversion_path(&self, media: &MediaRecord, conversion: &str) -> PathBuf {
        self.root
            .join("conversions")
            .join(media.id.to_string())
            .join(format!("{}-{}.jpg", media.file_stem(), conversion))
    }

    pub fn responsive_path(&self, media: &MediaRecord, width: u32, height: u32) -> PathBuf {
        self.root
            .join("responsive")
            .join(media.id.to_string())
            .join(format!(
                "{}___{}_{}_{}.jpg",
                media.file_stem(),
                ORIGINAL_COLLECTION,
                width,
                height
            ))
    }
}
