use image::{DynamicImage, GenericImageView, ImageFormat};
use log::{debug, info};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::background::queue::ConversionJob;
use crate::common::WORKER_RAYON_POOL;
use crate::common::errors::GenerationError;
use crate::config::conversions::ConversionDefinition;
use crate::database::ops::tree::Tree;
use crate::database::schema::media::MediaRecord;
use crate::utils::MediaStorage;
use crate::utils::resize::{fit_within, height_for_width};

/// Writes derivatives to storage and records them on the media record.
/// Shared by inline generation and the background worker.
#[derive(Clone)]
pub struct ConversionPerformer {
    tree: Arc<Tree>,
    storage: MediaStorage,
    conversions: Arc<[ConversionDefinition]>,
    responsive_widths: Arc<[u32]>,
}

impl ConversionPerformer {
    pub fn new(
        tree: Arc<Tree>,
        storage: MediaStorage,
        conversions: Vec<ConversionDefinition>,
        responsive_widths: Vec<u32>,
    ) -> Self {
        Self {
            tree,
            storage,
            conversions: conversions.into(),
            responsive_widths: responsive_widths.into(),
        }
    }

    pub fn storage(&self) -> &MediaStorage {
        &self.storage
    }

    /// Conversions registered for the record's collection.
    pub fn conversions_for<'a>(
        &'a self,
        media: &'a MediaRecord,
    ) -> impl Iterator<Item = &'a ConversionDefinition> + 'a {
        self.conversions
            .iter()
            .filter(move |conversion| conversion.applies_to(&media.collection_name))
    }

    /// Generated before and still present on disk.
    pub fn is_generated(&self, media: &MediaRecord, conversion: &ConversionDefinition) -> bool {
        media.has_generated_conversion(&conversion.name)
            && self
                .storage
                .conversion_path(media, &conversion.name)
                .exists()
    }

    pub fn perform(
        &self,
        media: &MediaRecord,
        conversions: &[&ConversionDefinition],
        responsive: bool,
    ) -> Result<(), GenerationError> {
        let start_time = Instant::now();
        let original = self.open_original(media)?;

        let results: Vec<(&ConversionDefinition, Result<(), GenerationError>)> =
            WORKER_RAYON_POOL.install(|| {
                conversions
                    .par_iter()
                    .map(|conversion| {
                        (*conversion, self.write_conversion(media, &original, conversion))
                    })
                    .collect()
            });

        // Files already written are recorded even when a sibling failed.
        let mut written = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (conversion, result) in results {
            match result {
                Ok(()) => written.push(conversion.name.clone()),
                Err(error) => {
                    first_error.get_or_insert(error);
                }
            }
        }

        if !written.is_empty() {
            self.tree
                .mark_generated(media.id, written)
                .map_err(|error| GenerationError::Storage(format!("{:#}", error)))?;
        }
        if let Some(error) = first_error {
            return Err(error);
        }

        if responsive {
            self.write_responsive_images(media, &original)?;
        }

        debug!(
            duration = &*format!("{:?}", start_time.elapsed());
            "Generated {} conversions for media {}",
            conversions.len(),
            media.id
        );
        Ok(())
    }

    /// Run a queued job against the current state of its record.
    pub fn perform_job(&self, job: &ConversionJob) -> Result<(), GenerationError> {
        let media = self
            .tree
            .load_media(job.media_id)
            .map_err(|error| GenerationError::Storage(format!("{:#}", error)))?
            .ok_or(GenerationError::UnknownMedia(job.media_id))?;

        let conversions: Vec<&ConversionDefinition> = self
            .conversions_for(&media)
            .filter(|conversion| job.conversions.contains(&conversion.name))
            .collect();

        self.perform(&media, &conversions, job.responsive)?;
        info!("Finished queued job {} for media {}", job.id, job.media_id);
        Ok(())
    }

    fn open_original(&self, media: &MediaRecord) -> Result<DynamicImage, GenerationError> {
        let path = self.storage.original_path(media);
        if !path.exists() {
            return Err(GenerationError::MissingOriginal(path));
        }
        image::open(&path).map_err(|error| GenerationError::UndecodableOriginal {
            path,
            message: error.to_string(),
        })
    }

    fn write_conversion(
        &self,
        media: &MediaRecord,
        original: &DynamicImage,
        conversion: &ConversionDefinition,
    ) -> Result<(), GenerationError> {
        let (width, height) = original.dimensions();
        let (target_width, target_height) =
            fit_within(width, height, conversion.width, conversion.height);
        let path = self.storage.conversion_path(media, &conversion.name);

        save_jpeg(original, target_width, target_height, &path).map_err(|message| {
            GenerationError::Conversion {
                conversion: conversion.name.clone(),
                message,
            }
        })
    }

    fn write_responsive_images(
        &self,
        media: &MediaRecord,
        original: &DynamicImage,
    ) -> Result<(), GenerationError> {
        let (width, height) = original.dimensions();
        for &target_width in self.responsive_widths.iter().filter(|w| **w < width) {
            let target_height = height_for_width(width, height, target_width);
            let path = self
                .storage
                .responsive_path(media, target_width, target_height);
            save_jpeg(original, target_width, target_height, &path).map_err(|message| {
                GenerationError::Conversion {
                    conversion: format!("responsive {}w", target_width),
                    message,
                }
            })?;
        }
        Ok(())
    }
}

fn save_jpeg(original: &DynamicImage, width: u32, height: u32, path: &Path) -> Result<(), String> {
    let parent = path
        .parent()
        .ok_or_else(|| format!("failed to determine parent directory of {:?}", path))?;
    std::fs::create_dir_all(parent)
        .map_err(|error| format!("failed to create directory tree {:?}: {}", parent, error))?;

    original
        .thumbnail_exact(width, height)
        .to_rgb8()
        .save_with_format(path, ImageFormat::Jpeg)
        .map_err(|error| format!("failed to save JPEG to {:?}: {}", path, error))
}
