//! # obra-media: staged attachments for edit forms
//!
//! Everything an edit form does to images and videos before the user
//! presses save:
//!
//! - **Channels** (`ChannelConfig`) describe one media field of an entity:
//!   which files it accepts, the multipart field uploads go under and how a
//!   deletion is spelled for the server.
//! - **Ledger** (`MediaLedger`) tracks each attachment as `Persisted`,
//!   `PendingAdd`, `PendingReplace` or `PendingDelete`. Pure bookkeeping, no
//!   network.
//! - **Previews** (`PreviewRegistry`, `PreviewLease`) hand out ephemeral URLs
//!   for staged files and take them back when the staged file goes away.
//!
//! ```rust
//! use obra_core::LocalFile;
//! use obra_media::prelude::*;
//!
//! let previews = PreviewRegistry::new();
//! let mut ledger = MediaLedger::seed(
//!     ChannelConfig::project_images(),
//!     vec![PersistedMedia::new(4u64, "/media/projects/a.jpg")],
//!     previews.clone(),
//! );
//!
//! let a = ledger.slots()[0].id;
//! ledger.mark_delete(a).unwrap();
//! ledger.add_files(vec![LocalFile::new("b.jpg", "image/jpeg", vec![1u8, 2, 3])]);
//!
//! let changes = ledger.changes();
//! assert_eq!(changes.deleted.len(), 1);
//! assert_eq!(changes.uploads.len(), 1);
//!
//! ledger.discard();
//! assert_eq!(previews.stats().live, 0);
//! ```

mod config;
mod error;
pub mod ledger;
pub mod preview;
mod types;

pub use config::{AcceptRules, ChannelConfig, DeletionEncoding, DEFAULT_MAX_FILE_BYTES};
pub use error::{MediaError, MediaResult, RejectReason};
pub use ledger::{AddReport, LedgerChanges, MediaLedger};
pub use preview::{PreviewLease, PreviewRegistry, PreviewStats};
pub use types::{
    MediaId, MediaKind, MediaSlot, PersistedMedia, PreviewItem, PreviewSource, SlotId, SlotState,
    StagedFile,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ChannelConfig, DeletionEncoding, MediaError, MediaId, MediaKind, MediaLedger, MediaResult,
        PersistedMedia, PreviewRegistry, SlotId, SlotState,
    };
}
