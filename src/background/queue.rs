use log::{error, info};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::task::{JoinHandle, spawn_blocking};
use uuid::Uuid;

use crate::background::processors::conversion::ConversionPerformer;
use crate::common::errors::GenerationError;

/// Deferred conversions for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub id: Uuid,
    pub media_id: u64,
    pub conversions: Vec<String>,
    pub responsive: bool,
}

impl ConversionJob {
    pub fn new(media_id: u64, conversions: Vec<String>, responsive: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            media_id,
            conversions,
            responsive,
        }
    }
}

/// Where queued conversions go.
#[derive(Clone)]
pub enum ConversionQueue {
    /// No background worker: jobs run inline on dispatch.
    Sync(ConversionPerformer),
    /// Jobs are handed to the background worker.
    Background(UnboundedSender<ConversionJob>),
}

impl ConversionQueue {
    /// Only failures of the dispatch itself are returned; a background job
    /// that fails later is logged by the worker.
    pub fn dispatch(&self, job: ConversionJob) -> Result<(), GenerationError> {
        match self {
            ConversionQueue::Sync(performer) => performer.perform_job(&job),
            ConversionQueue::Background(sender) => {
                let media_id = job.media_id;
                sender
                    .send(job)
                    .map_err(|_| GenerationError::QueueClosed(media_id))
            }
        }
    }
}

/// Start the background worker. It drains jobs one at a time until every
/// queue handle has been dropped.
pub fn spawn_worker(
    runtime: &Runtime,
    performer: ConversionPerformer,
) -> (ConversionQueue, JoinHandle<()>) {
    let (tx, mut rx) = unbounded_channel::<ConversionJob>();

    let handle = runtime.spawn(async move {
        let mut failed = 0usize;
        while let Some(job) = rx.recv().await {
            let performer = performer.clone();
            let (job_id, media_id) = (job.id, job.media_id);
            match spawn_blocking(move || performer.perform_job(&job)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failed += 1;
                    error!("Queued job {} for media {} failed: {}", job_id, media_id, e);
                }
                Err(e) => {
                    failed += 1;
                    error!("Queued job {} for media {} panicked: {}", job_id, media_id, e);
                }
            }
        }
        info!("Conversion queue drained, {} job(s) failed", failed);
    });

    (ConversionQueue::Background(tx), handle)
}
