use obra_core::ObraError;
use thiserror::Error;

use crate::types::SlotId;

/// Result type for media staging operations
pub type MediaResult<T> = Result<T, MediaError>;

/// Why a file never made it into the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Content type outside the channel's category (`image/*`, `video/*`)
    WrongCategory { content_type: String },
    /// Extension not on the channel's list
    Extension { extension: Option<String> },
    TooLarge { size: u64, max: u64 },
    Empty,
    /// Single-slot channel already received a file in this batch
    ChannelFull,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::WrongCategory { content_type } => {
                write!(f, "content type '{}' is not accepted here", content_type)
            }
            RejectReason::Extension { extension: Some(ext) } => {
                write!(f, "extension '.{}' is not accepted here", ext)
            }
            RejectReason::Extension { extension: None } => write!(f, "file has no extension"),
            RejectReason::TooLarge { size, max } => {
                write!(f, "file is {} bytes, the limit is {}", size, max)
            }
            RejectReason::Empty => write!(f, "file is empty"),
            RejectReason::ChannelFull => write!(f, "only one file can be attached here"),
        }
    }
}

/// Errors that can occur while staging media
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("File rejected: {filename}: {reason}")]
    Rejected { filename: String, reason: RejectReason },

    #[error("Media in '{channel}' cannot be deleted, only replaced")]
    DeleteNotAllowed { channel: String },

    #[error("Unknown media slot: {slot}")]
    UnknownSlot { slot: SlotId },
}

impl MediaError {
    pub fn rejected<S: Into<String>>(filename: S, reason: RejectReason) -> Self {
        Self::Rejected {
            filename: filename.into(),
            reason,
        }
    }

    pub fn delete_not_allowed<S: Into<String>>(channel: S) -> Self {
        Self::DeleteNotAllowed {
            channel: channel.into(),
        }
    }

    pub fn unknown_slot(slot: SlotId) -> Self {
        Self::UnknownSlot { slot }
    }
}

impl From<MediaError> for ObraError {
    fn from(err: MediaError) -> Self {
        let message = err.to_string();
        match &err {
            MediaError::Rejected {
                reason: RejectReason::TooLarge { .. },
                ..
            } => ObraError::payload_too_large(message),
            MediaError::Rejected { .. } => ObraError::unsupported_media_type(message),
            MediaError::DeleteNotAllowed { .. } => ObraError::forbidden(message),
            MediaError::UnknownSlot { .. } => ObraError::not_found(message),
        }
    }
}
