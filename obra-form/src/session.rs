use obra_core::{FieldErrors, LocalFile, RequestBody};
use obra_media::{
    AddReport, ChannelConfig, MediaLedger, PersistedMedia, PreviewItem, PreviewRegistry, SlotId,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{FormError, FormResult};
use crate::field::FieldRegistry;
use crate::form::FormState;
use crate::translate::{translate, SubmitPayload};

/// One staged edit of one entity: scalar fields plus every media channel.
///
/// The session owns its ledgers. Finishing, cancelling or dropping it
/// releases every preview URL it handed out.
#[derive(Debug)]
pub struct EditSession {
    key: Option<String>,
    form: FormState,
    ledgers: Vec<MediaLedger>,
    required_media: Vec<(String, String)>,
    previews: PreviewRegistry,
}

impl EditSession {
    /// Session over an existing record.
    pub fn open(
        registry: FieldRegistry,
        record: &Value,
        channels: Vec<(ChannelConfig, Vec<PersistedMedia>)>,
    ) -> Self {
        Self::open_with(registry, record, channels, PreviewRegistry::new())
    }

    pub fn open_with(
        registry: FieldRegistry,
        record: &Value,
        channels: Vec<(ChannelConfig, Vec<PersistedMedia>)>,
        previews: PreviewRegistry,
    ) -> Self {
        let ledgers: Vec<MediaLedger> = channels
            .into_iter()
            .map(|(config, persisted)| MediaLedger::seed(config, persisted, previews.clone()))
            .collect();
        info!(channels = ledgers.len(), "edit session opened");
        Self {
            key: None,
            form: FormState::seed(registry, record),
            ledgers,
            required_media: Vec::new(),
            previews,
        }
    }

    /// Session for a record that does not exist yet.
    pub fn create(registry: FieldRegistry, channels: Vec<ChannelConfig>) -> Self {
        let channels = channels.into_iter().map(|c| (c, Vec::new())).collect();
        Self::open(registry, &Value::Null, channels)
    }

    /// Record key (slug or id) the submit goes to.
    pub fn with_key<S: Into<String>>(mut self, key: S) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Refuse to submit while `channel` has no file, with `message` shown
    /// under its upload field.
    pub fn require_media<C: Into<String>, M: Into<String>>(mut self, channel: C, message: M) -> Self {
        self.required_media.push((channel.into(), message.into()));
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn is_new(&self) -> bool {
        self.key.is_none()
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> FormResult<()> {
        self.form.set(field, value)
    }

    pub fn set_input(&mut self, field: &str, raw: &str) -> FormResult<()> {
        self.form.set_input(field, raw)
    }

    pub fn clear(&mut self, field: &str) -> FormResult<()> {
        self.form.clear(field)
    }

    pub fn ledgers(&self) -> &[MediaLedger] {
        &self.ledgers
    }

    pub fn ledger(&self, channel: &str) -> Option<&MediaLedger> {
        self.ledgers.iter().find(|l| l.channel().name == channel)
    }

    pub fn ledger_mut(&mut self, channel: &str) -> FormResult<&mut MediaLedger> {
        self.ledgers
            .iter_mut()
            .find(|l| l.channel().name == channel)
            .ok_or_else(|| FormError::unknown_channel(channel))
    }

    pub fn add_files<I>(&mut self, channel: &str, files: I) -> FormResult<AddReport>
    where
        I: IntoIterator<Item = LocalFile>,
    {
        Ok(self.ledger_mut(channel)?.add_files(files))
    }

    pub fn replace(&mut self, channel: &str, slot: SlotId, file: LocalFile) -> FormResult<()> {
        Ok(self.ledger_mut(channel)?.replace(slot, file)?)
    }

    pub fn mark_delete(&mut self, channel: &str, slot: SlotId) -> FormResult<()> {
        Ok(self.ledger_mut(channel)?.mark_delete(slot)?)
    }

    pub fn restore(&mut self, channel: &str, slot: SlotId) -> FormResult<bool> {
        Ok(self.ledger_mut(channel)?.restore(slot))
    }

    pub fn remove(&mut self, channel: &str, slot: SlotId) -> FormResult<bool> {
        Ok(self.ledger_mut(channel)?.remove(slot))
    }

    pub fn previews(&self, channel: &str) -> Vec<PreviewItem> {
        self.ledger(channel).map(MediaLedger::previews).unwrap_or_default()
    }

    pub fn preview_registry(&self) -> &PreviewRegistry {
        &self.previews
    }

    pub fn is_dirty(&self) -> bool {
        self.form.is_dirty() || self.ledgers.iter().any(MediaLedger::is_dirty)
    }

    /// Client-side checks: field rules plus required media.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = self.form.validate();
        for (channel, message) in &self.required_media {
            if let Some(ledger) = self.ledger(channel) {
                if ledger.active_count() == 0 {
                    errors.push_field(&ledger.channel().upload_field, message.clone());
                }
            }
        }
        errors
    }

    /// Multipart body for the current state. Pure; call as often as needed.
    pub fn payload(&self) -> SubmitPayload {
        translate(&self.form, &self.ledgers)
    }

    /// Body to send: multipart when the entity has media channels, JSON
    /// otherwise.
    pub fn body(&self) -> RequestBody {
        if self.ledgers.is_empty() {
            RequestBody::Json(self.form.json_body())
        } else {
            RequestBody::Multipart(self.payload())
        }
    }

    /// Validate, then build the body. On failure the errors are stored on
    /// the form and returned.
    pub fn prepare(&mut self) -> Result<RequestBody, FieldErrors> {
        let errors = self.validate();
        if !errors.is_empty() {
            debug!(fields = errors.len(), "submit blocked by client-side validation");
            self.form.apply_server_errors(errors.clone());
            return Err(errors);
        }
        self.form.clear_errors();
        Ok(self.body())
    }

    /// The server refused the submit. Errors go onto the form; staged media
    /// stays exactly as it was.
    pub fn on_rejected(&mut self, errors: FieldErrors) {
        info!(fields = errors.len(), "submit rejected, keeping staged media");
        self.form.apply_server_errors(errors);
    }

    /// Submit succeeded; local state is dropped.
    pub fn finish(self) {
        info!(key = ?self.key, "edit session finished");
        self.teardown();
    }

    pub fn cancel(self) {
        info!(key = ?self.key, "edit session cancelled");
        self.teardown();
    }

    fn teardown(self) {
        for ledger in self.ledgers {
            ledger.discard();
        }
    }
}
