use obra_core::LocalFile;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::preview::PreviewLease;

/// Category of media a channel holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// MIME prefix every accepted file must carry
    pub fn mime_prefix(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/",
            MediaKind::Video => "video/",
        }
    }

    pub fn default_extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => &["jpg", "jpeg", "png", "webp"],
            MediaKind::Video => &["mp4", "mov", "avi", "mkv"],
        }
    }
}

/// Server-side identifier of an attachment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(pub String);

impl MediaId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for MediaId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MediaId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for MediaId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An attachment as the server knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedMedia {
    pub id: MediaId,
    pub url: String,
}

impl PersistedMedia {
    pub fn new<I: Into<MediaId>, U: Into<String>>(id: I, url: U) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Local handle for a slot. Stable for the life of an edit session and
/// never sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(Uuid);

impl SlotId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot_{}", self.0.simple())
    }
}

/// A local file held by the ledger together with its preview lease.
///
/// Dropping a `StagedFile` releases its preview URL.
#[derive(Debug)]
pub struct StagedFile {
    pub file: LocalFile,
    lease: PreviewLease,
}

impl StagedFile {
    pub(crate) fn new(file: LocalFile, lease: PreviewLease) -> Self {
        Self { file, lease }
    }

    pub fn preview_url(&self) -> &str {
        self.lease.url()
    }
}

impl PartialEq for StagedFile {
    fn eq(&self, other: &Self) -> bool {
        self.file == other.file
    }
}

/// Lifecycle of one attachment inside an edit session.
///
/// The variants carry exactly what each state needs, so a slot can never be
/// in two states at once and a slot that started on the server always keeps
/// its original id until the session ends.
#[derive(Debug, PartialEq)]
pub enum SlotState {
    Persisted(PersistedMedia),
    PendingAdd(StagedFile),
    PendingReplace {
        original: PersistedMedia,
        staged: StagedFile,
    },
    PendingDelete(PersistedMedia),
}

impl SlotState {
    pub fn name(&self) -> &'static str {
        match self {
            SlotState::Persisted(_) => "persisted",
            SlotState::PendingAdd(_) => "pending_add",
            SlotState::PendingReplace { .. } => "pending_replace",
            SlotState::PendingDelete(_) => "pending_delete",
        }
    }

    /// Server record this slot started from, if any.
    pub fn original(&self) -> Option<&PersistedMedia> {
        match self {
            SlotState::Persisted(media) | SlotState::PendingDelete(media) => Some(media),
            SlotState::PendingReplace { original, .. } => Some(original),
            SlotState::PendingAdd(_) => None,
        }
    }

    pub fn staged(&self) -> Option<&StagedFile> {
        match self {
            SlotState::PendingAdd(staged) | SlotState::PendingReplace { staged, .. } => Some(staged),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        !matches!(self, SlotState::Persisted(_))
    }
}

#[derive(Debug, PartialEq)]
pub struct MediaSlot {
    pub id: SlotId,
    pub state: SlotState,
}

impl MediaSlot {
    pub(crate) fn new(state: SlotState) -> Self {
        Self {
            id: SlotId::new(),
            state,
        }
    }
}

/// Where a preview URL comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSource {
    Server,
    Staged,
}

/// One displayable entry for a non-deleted slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewItem {
    pub slot: SlotId,
    pub url: String,
    pub source: PreviewSource,
}
