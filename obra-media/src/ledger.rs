//! # Media staging ledger
//!
//! One `MediaLedger` per media channel of an entity form. It records what the
//! user did to each attachment without touching the server:
//!
//! ```text
//!   Persisted ──replace──▶ PendingReplace ──remove──▶ Persisted
//!       │                        │
//!   mark_delete              mark_delete
//!       ▼                        ▼
//!   PendingDelete ◀─────────────┘      PendingAdd ──remove / mark_delete──▶ (gone)
//!       │
//!    restore ──▶ Persisted
//! ```
//!
//! Every operation is synchronous and idempotent with respect to the final
//! state. Staged files hold a preview lease, so replacing, removing or
//! dropping a staged file releases its preview URL.

use obra_core::LocalFile;
use tracing::{debug, warn};

use crate::config::ChannelConfig;
use crate::error::{MediaError, MediaResult, RejectReason};
use crate::preview::PreviewRegistry;
use crate::types::{
    MediaId, MediaSlot, PersistedMedia, PreviewItem, PreviewSource, SlotId, SlotState, StagedFile,
};

/// Outcome of `add_files`.
#[derive(Debug, Default)]
pub struct AddReport {
    pub added: Vec<SlotId>,
    pub rejected: Vec<MediaError>,
}

impl AddReport {
    pub fn all_accepted(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// What a submit has to tell the server about this channel.
#[derive(Debug, Default, PartialEq)]
pub struct LedgerChanges<'a> {
    /// Files to upload, `PendingAdd` and `PendingReplace` alike, in slot order
    pub uploads: Vec<&'a LocalFile>,
    /// Ids of `PendingDelete` slots
    pub deleted: Vec<&'a MediaId>,
    /// Original ids of `PendingReplace` slots
    pub replaced: Vec<&'a MediaId>,
}

impl LedgerChanges<'_> {
    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty() && self.deleted.is_empty() && self.replaced.is_empty()
    }
}

#[derive(Debug)]
pub struct MediaLedger {
    channel: ChannelConfig,
    slots: Vec<MediaSlot>,
    previews: PreviewRegistry,
}

impl MediaLedger {
    /// Ledger for an existing record, one `Persisted` slot per attachment.
    pub fn seed(channel: ChannelConfig, persisted: Vec<PersistedMedia>, previews: PreviewRegistry) -> Self {
        let slots = persisted
            .into_iter()
            .map(|media| MediaSlot::new(SlotState::Persisted(media)))
            .collect();
        Self {
            channel,
            slots,
            previews,
        }
    }

    /// Ledger for a record that does not exist yet.
    pub fn empty(channel: ChannelConfig, previews: PreviewRegistry) -> Self {
        Self::seed(channel, Vec::new(), previews)
    }

    pub fn channel(&self) -> &ChannelConfig {
        &self.channel
    }

    pub fn slots(&self) -> &[MediaSlot] {
        &self.slots
    }

    pub fn get(&self, slot: SlotId) -> Option<&MediaSlot> {
        self.slots.iter().find(|s| s.id == slot)
    }

    /// Slot holding a given server id, whatever its current state.
    pub fn find_by_media_id(&self, id: &MediaId) -> Option<SlotId> {
        self.slots
            .iter()
            .find(|s| s.state.original().map(|m| &m.id == id).unwrap_or(false))
            .map(|s| s.id)
    }

    fn position(&self, slot: SlotId) -> Option<usize> {
        self.slots.iter().position(|s| s.id == slot)
    }

    fn stage(&self, file: LocalFile) -> StagedFile {
        let lease = self.previews.acquire(&file);
        StagedFile::new(file, lease)
    }

    fn accept(&self, file: &LocalFile) -> MediaResult<()> {
        self.channel.accept.check(file).map_err(|reason| {
            warn!(
                channel = %self.channel.name,
                filename = %file.filename,
                reason = %reason,
                "file rejected before staging"
            );
            MediaError::rejected(file.filename.clone(), reason)
        })
    }

    /// Stage new files. Rejected files are reported and never added.
    ///
    /// On a single-slot channel the first accepted file replaces whatever
    /// the slot holds; further files in the same batch are rejected.
    pub fn add_files<I>(&mut self, files: I) -> AddReport
    where
        I: IntoIterator<Item = LocalFile>,
    {
        let mut report = AddReport::default();

        for file in files {
            if let Err(err) = self.accept(&file) {
                report.rejected.push(err);
                continue;
            }

            if self.channel.is_single() {
                if !report.added.is_empty() {
                    report
                        .rejected
                        .push(MediaError::rejected(file.filename, RejectReason::ChannelFull));
                    continue;
                }
                if let Some(slot) = self.slots.first().map(|s| s.id) {
                    let staged = self.stage(file);
                    self.restage(0, staged);
                    report.added.push(slot);
                    continue;
                }
            } else if let Some(cap) = self.channel.capacity {
                if self.active_count() >= cap {
                    report
                        .rejected
                        .push(MediaError::rejected(file.filename, RejectReason::ChannelFull));
                    continue;
                }
            }

            let staged = self.stage(file);
            let slot = MediaSlot::new(SlotState::PendingAdd(staged));
            debug!(channel = %self.channel.name, slot = %slot.id, "staged add");
            report.added.push(slot.id);
            self.slots.push(slot);
        }

        report
    }

    /// Swap the content of a slot for `file`. A slot that started on the
    /// server keeps its original id and becomes `PendingReplace`.
    pub fn replace(&mut self, slot: SlotId, file: LocalFile) -> MediaResult<()> {
        self.accept(&file)?;
        let idx = self.position(slot).ok_or_else(|| MediaError::unknown_slot(slot))?;
        let staged = self.stage(file);
        self.restage(idx, staged);
        Ok(())
    }

    fn restage(&mut self, idx: usize, staged: StagedFile) {
        let slot = &mut self.slots[idx];
        let next = match &slot.state {
            SlotState::Persisted(media) | SlotState::PendingDelete(media) => SlotState::PendingReplace {
                original: media.clone(),
                staged,
            },
            SlotState::PendingReplace { original, .. } => SlotState::PendingReplace {
                original: original.clone(),
                staged,
            },
            SlotState::PendingAdd(_) => SlotState::PendingAdd(staged),
        };
        debug!(
            channel = %self.channel.name,
            slot = %slot.id,
            from = slot.state.name(),
            to = next.name(),
            "staged replace"
        );
        slot.state = next;
    }

    /// Mark a slot for deletion. A staged add is dropped outright, a staged
    /// replace is discarded. Unknown or already deleted slots are left alone.
    pub fn mark_delete(&mut self, slot: SlotId) -> MediaResult<()> {
        let Some(idx) = self.position(slot) else {
            return Ok(());
        };

        let next = match &self.slots[idx].state {
            SlotState::PendingDelete(_) => return Ok(()),
            SlotState::PendingAdd(_) => {
                self.slots.remove(idx);
                debug!(channel = %self.channel.name, slot = %slot, "dropped staged add");
                return Ok(());
            }
            SlotState::Persisted(media) | SlotState::PendingReplace { original: media, .. } => {
                if !self.channel.can_delete() {
                    return Err(MediaError::delete_not_allowed(self.channel.name.clone()));
                }
                SlotState::PendingDelete(media.clone())
            }
        };

        debug!(channel = %self.channel.name, slot = %slot, "marked for deletion");
        self.slots[idx].state = next;
        Ok(())
    }

    /// Undo `mark_delete`. Returns whether anything changed.
    pub fn restore(&mut self, slot: SlotId) -> bool {
        let Some(idx) = self.position(slot) else {
            return false;
        };
        match &self.slots[idx].state {
            SlotState::PendingDelete(media) => {
                let media = media.clone();
                self.slots[idx].state = SlotState::Persisted(media);
                debug!(channel = %self.channel.name, slot = %slot, "restored");
                true
            }
            _ => false,
        }
    }

    /// Drop whatever was staged on a slot. A staged add disappears, a staged
    /// replace falls back to the server copy. Returns whether anything changed.
    pub fn remove(&mut self, slot: SlotId) -> bool {
        let Some(idx) = self.position(slot) else {
            return false;
        };
        match &self.slots[idx].state {
            SlotState::PendingAdd(_) => {
                self.slots.remove(idx);
            }
            SlotState::PendingReplace { original, .. } => {
                let original = original.clone();
                self.slots[idx].state = SlotState::Persisted(original);
            }
            _ => return false,
        }
        debug!(channel = %self.channel.name, slot = %slot, "unstaged");
        true
    }

    pub fn is_dirty(&self) -> bool {
        self.slots.iter().any(|s| s.state.is_pending())
    }

    /// Slots that will still exist after a submit.
    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| !matches!(s.state, SlotState::PendingDelete(_)))
            .count()
    }

    pub fn changes(&self) -> LedgerChanges<'_> {
        let mut changes = LedgerChanges::default();
        for slot in &self.slots {
            match &slot.state {
                SlotState::Persisted(_) => {}
                SlotState::PendingAdd(staged) => changes.uploads.push(&staged.file),
                SlotState::PendingReplace { original, staged } => {
                    changes.uploads.push(&staged.file);
                    changes.replaced.push(&original.id);
                }
                SlotState::PendingDelete(media) => changes.deleted.push(&media.id),
            }
        }
        changes
    }

    /// One entry per slot that is not marked for deletion.
    pub fn previews(&self) -> Vec<PreviewItem> {
        self.slots
            .iter()
            .filter_map(|slot| match &slot.state {
                SlotState::Persisted(media) => Some(PreviewItem {
                    slot: slot.id,
                    url: media.url.clone(),
                    source: PreviewSource::Server,
                }),
                SlotState::PendingAdd(staged) | SlotState::PendingReplace { staged, .. } => Some(PreviewItem {
                    slot: slot.id,
                    url: staged.preview_url().to_string(),
                    source: PreviewSource::Staged,
                }),
                SlotState::PendingDelete(_) => None,
            })
            .collect()
    }

    pub fn preview_registry(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// End of session: every staged file and its preview go away.
    pub fn discard(self) {
        debug!(channel = %self.channel.name, slots = self.slots.len(), "ledger discarded");
    }
}
