use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of one regeneration run. Only synchronous failures appear here;
/// queued work that fails later is reported by the queue worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationReport {
    errors: BTreeMap<u64, String>,
    processed: u64,
    last_processed_id: Option<u64>,
}

impl RegenerationReport {
    pub fn record_success(&mut self, media_id: u64) {
        self.mark_processed(media_id);
    }

    /// A second failure under the same id replaces the first.
    pub fn record_failure(&mut self, media_id: u64, message: impl Into<String>) {
        self.errors.insert(media_id, message.into());
        self.mark_processed(media_id);
    }

    fn mark_processed(&mut self, media_id: u64) {
        self.processed += 1;
        self.last_processed_id = Some(media_id);
    }

    pub fn errors(&self) -> &BTreeMap<u64, String> {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn last_processed_id(&self) -> Option<u64> {
        self.last_processed_id
    }

    /// Operator-facing lines, one per failed record.
    pub fn error_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.errors
            .iter()
            .map(|(media_id, message)| format!("Media id {media_id}: `{message}`"))
    }
}
