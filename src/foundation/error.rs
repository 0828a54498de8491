use std::ops::Range;

/// Convenience result type used across gifbeat.
pub type GifbeatResult<T> = Result<T, GifbeatError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Every variant is fatal for the export it occurs in. Cancellation is not an error and is
/// reported through [`ExportOutcome`](crate::ExportOutcome) instead.
#[derive(thiserror::Error, Debug)]
pub enum GifbeatError {
    /// Invalid playback parameters, canvas or settings.
    #[error("validation error: {0}")]
    Validation(String),

    /// A decoded source frame is internally inconsistent.
    #[error("malformed input: source frame {index}: {reason}")]
    MalformedFrame {
        /// Index of the offending source frame.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// The source frame list is empty.
    #[error("malformed input: source has no frames")]
    EmptySource,

    /// A patch placement would write outside the canvas.
    #[error(
        "bounds violation: source frame {} writes x {}..{}, y {}..{} outside the canvas",
        display_frame(.frame), .x.start, .x.end, .y.start, .y.end
    )]
    BoundsViolation {
        /// Source frame index, when known at the failure site.
        frame: Option<usize>,
        /// Destination column range the patch would cover.
        x: Range<u64>,
        /// Destination row range the patch would cover.
        y: Range<u64>,
    },

    /// The encoding collaborator failed to accept a sample.
    #[error("encoder rejected sample: {0}")]
    EncoderRejected(String),

    /// Internal invariant violation.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// Errors when serializing or deserializing settings.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GifbeatError {
    /// Build a [`GifbeatError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`GifbeatError::MalformedFrame`] value.
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedFrame {
            index,
            reason: reason.into(),
        }
    }

    /// Build a [`GifbeatError::EncoderRejected`] value.
    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::EncoderRejected(msg.into())
    }

    /// Build a [`GifbeatError::Invariant`] value.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Build a [`GifbeatError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Attach a source frame index to a [`GifbeatError::BoundsViolation`] that lacks one.
    pub(crate) fn with_frame(self, index: usize) -> Self {
        match self {
            Self::BoundsViolation { frame: None, x, y } => Self::BoundsViolation {
                frame: Some(index),
                x,
                y,
            },
            other => other,
        }
    }
}

fn display_frame(frame: &Option<usize>) -> String {
    frame.map_or_else(|| "?".to_owned(), |i| i.to_string())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
