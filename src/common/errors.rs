use log::error;
use std::path::PathBuf;
use thiserror::Error;

/// Malformed command inputs. Option combinations never raise this: the
/// selection precedence degrades every combination to one criterion.
#[derive(Debug, Error)]
pub enum SelectionInputError {
    #[error("invalid regenerate option: {0}")]
    Malformed(String),
}

/// A synchronous failure while generating the derivatives of one record.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("media {0} no longer exists")]
    UnknownMedia(u64),

    #[error("original file not found at {0:?}")]
    MissingOriginal(PathBuf),

    #[error("failed to decode original {path:?}: {message}")]
    UndecodableOriginal { path: PathBuf, message: String },

    #[error("conversion `{conversion}` failed: {message}")]
    Conversion { conversion: String, message: String },

    #[error("failed to queue conversions for media {0}: background queue is closed")]
    QueueClosed(u64),

    #[error("failed to record generated conversions: {0}")]
    Storage(String),

    #[error("generation panicked: {0}")]
    Panicked(String),
}

/// Fatal to the whole run; surfaced before any selection happens.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("refusing to regenerate media in `{0}` without force")]
    ConfirmationDeclined(String),
}

/// Log the whole error chain and hand the error back to the caller.
pub fn handle_error(error: anyhow::Error) -> anyhow::Error {
    error!("{:?}", error);
    error
}
