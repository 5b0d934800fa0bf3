//! Regeneration orchestrator - drives derivative generation over a lazy selection
//!
//! Records are processed strictly one at a time, in stream order. Every
//! record gets its own failure boundary and exactly one progress tick.

pub mod progress;
pub mod report;

use anyhow::Result;
use log::{info, warn};
use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crate::background::generator::DerivativeGenerator;
use crate::common::errors::GenerationError;
use crate::common::time_limit::TimeLimit;
use crate::database::schema::media::MediaRecord;
pub use progress::ProgressSink;
pub use report::RegenerationReport;

/// What to regenerate for every selected record. Immutable for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Empty means every applicable conversion.
    pub only_conversions: BTreeSet<String>,
    pub only_missing: bool,
    pub with_responsive_images: bool,
    pub force_queue_all: bool,
}

impl GenerationOptions {
    pub fn wants_conversion(&self, name: &str) -> bool {
        self.only_conversions.is_empty() || self.only_conversions.contains(name)
    }
}

pub struct Regenerator<'a, G: DerivativeGenerator + ?Sized> {
    generator: &'a G,
    synchronous: bool,
    time_limit: Option<&'a TimeLimit>,
}

impl<'a, G: DerivativeGenerator + ?Sized> Regenerator<'a, G> {
    /// `synchronous` is true when no background queue is configured and
    /// every conversion runs inline.
    pub fn new(generator: &'a G, synchronous: bool) -> Self {
        Self {
            generator,
            synchronous,
            time_limit: None,
        }
    }

    pub fn with_time_limit(mut self, time_limit: &'a TimeLimit) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    /// Regenerate every record of `selection`.
    ///
    /// Generation failures never abort the run; they are folded into the
    /// report. A failure to read the selection itself ends the run with an
    /// error after finishing the progress sink.
    pub fn run<I, P>(
        &self,
        selection: I,
        options: &GenerationOptions,
        progress: &P,
    ) -> Result<RegenerationReport>
    where
        I: IntoIterator<Item = Result<MediaRecord>>,
        P: ProgressSink + ?Sized,
    {
        if self.synchronous {
            if let Some(time_limit) = self.time_limit {
                time_limit.lift();
            }
        }

        let start_time = Instant::now();
        let mut report = RegenerationReport::default();

        for item in selection {
            let media = match item {
                Ok(media) => media,
                Err(error) => {
                    progress.finish();
                    return Err(error.context(format!(
                        "Failed to read media after {} records",
                        report.processed()
                    )));
                }
            };

            match self.regenerate_one(&media, options) {
                Ok(()) => report.record_success(media.id),
                Err(error) => {
                    warn!("Failed to regenerate media {}: {}", media.id, error);
                    report.record_failure(media.id, error.to_string());
                }
            }
            progress.advance();
        }

        progress.finish();

        info!(
            duration = &*format!("{:?}", start_time.elapsed());
            "Regenerated {} media, {} failed",
            report.processed(),
            report.errors().len()
        );
        Ok(report)
    }

    fn regenerate_one(
        &self,
        media: &MediaRecord,
        options: &GenerationOptions,
    ) -> Result<(), GenerationError> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            self.generator.create_derived_files(media, options)
        }))
        .unwrap_or_else(|payload| Err(GenerationError::Panicked(panic_message(payload))))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
