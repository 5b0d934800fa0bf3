use crate::background::processors::conversion::ConversionPerformer;
use crate::background::queue::{ConversionJob, ConversionQueue};
use crate::common::errors::GenerationError;
use crate::config::conversions::ConversionDefinition;
use crate::database::schema::media::MediaRecord;
use crate::regenerate::GenerationOptions;

/// Produces (or queues) the derived files of one media record.
pub trait DerivativeGenerator {
    fn create_derived_files(
        &self,
        media: &MediaRecord,
        options: &GenerationOptions,
    ) -> Result<(), GenerationError>;
}

/// Generates conversions from the original file in storage.
pub struct FileDerivativeGenerator {
    performer: ConversionPerformer,
    queue: ConversionQueue,
}

impl FileDerivativeGenerator {
    pub fn new(performer: ConversionPerformer, queue: ConversionQueue) -> Self {
        Self { performer, queue }
    }
}

impl DerivativeGenerator for FileDerivativeGenerator {
    fn create_derived_files(
        &self,
        media: &MediaRecord,
        options: &GenerationOptions,
    ) -> Result<(), GenerationError> {
        let selected = self
            .performer
            .conversions_for(media)
            .filter(|conversion| options.wants_conversion(&conversion.name))
            .filter(|conversion| {
                !(options.only_missing && self.performer.is_generated(media, conversion))
            });

        let (queued, inline): (Vec<&ConversionDefinition>, Vec<&ConversionDefinition>) =
            selected.partition(|conversion| options.force_queue_all || conversion.queued);

        let queue_responsive = options.with_responsive_images && options.force_queue_all;
        let inline_responsive = options.with_responsive_images && !queue_responsive;

        if !inline.is_empty() || inline_responsive {
            self.performer.perform(media, &inline, inline_responsive)?;
        }

        if !queued.is_empty() || queue_responsive {
            let names = queued.iter().map(|conversion| conversion.name.clone()).collect();
            self.queue
                .dispatch(ConversionJob::new(media.id, names, queue_responsive))?;
        }

        Ok(())
    }
}
