//! Submit translation: form fields plus media ledgers into one multipart
//! body.
//!
//! Part order is fixed: scalar fields in registry order, then for each
//! channel its new files followed by its deletion instructions. Building the
//! payload never changes the form or the ledgers, so a rejected submit can be
//! corrected and sent again.

use obra_core::MultipartPayload;
use obra_media::{DeletionEncoding, MediaLedger};

use crate::form::FormState;

pub type SubmitPayload = MultipartPayload;

pub fn translate(form: &FormState, ledgers: &[MediaLedger]) -> SubmitPayload {
    let mut payload = MultipartPayload::new();
    form.push_scalar_parts(&mut payload);
    for ledger in ledgers {
        push_channel(&mut payload, ledger);
    }
    payload
}

fn push_channel(payload: &mut MultipartPayload, ledger: &MediaLedger) {
    let channel = ledger.channel();
    let changes = ledger.changes();

    for file in &changes.uploads {
        payload.push_file(channel.upload_field.clone(), (*file).clone());
    }

    match &channel.deletion {
        DeletionEncoding::ById(field) => {
            for id in changes.deleted.iter().chain(changes.replaced.iter()) {
                payload.push_text(field.clone(), id.to_string());
            }
        }
        DeletionEncoding::Flag(field) => {
            if !changes.deleted.is_empty() {
                payload.push_text(field.clone(), "true");
            }
        }
        DeletionEncoding::ClearField(field) => {
            if !changes.deleted.is_empty() && changes.uploads.is_empty() {
                payload.push_text(field.clone(), "");
            }
        }
        DeletionEncoding::Forbidden => {}
    }
}
