//! Where an edit session meets the network.
//!
//! `submit_session` never returns an error: every failure is classified and
//! turned into an `ActionOutcome`, and the session is handed back whenever
//! the user can keep editing.

use obra_auth::SESSION_EXPIRED_MESSAGE;
use obra_core::{
    ClientEvent, ErrorClass, EventHub, FieldErrors, LocalFile, Notice, ObraError, ObraResource, ResourceMethod,
};
use obra_form::{EditSession, FormResult};
use obra_media::{AddReport, MediaError, MediaKind, RejectReason};
use tracing::{info, warn};

pub const INVALID_FORM_MESSAGE: &str = "Por favor completa los campos requeridos.";
pub const SAVE_FAILED_MESSAGE: &str = "Error al guardar";
pub const UNEXPECTED_MESSAGE: &str = "Ocurrió un error inesperado";
pub const UPDATED_MESSAGE: &str = "Actualizado";
pub const CREATED_MESSAGE: &str = "Creado correctamente";

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome<T> {
    /// The server accepted the submit; the session is finished.
    Saved(T),
    /// Client or server validation failed; errors are on the session form.
    Invalid(FieldErrors),
    /// The session expired while submitting.
    LoggedOut,
    /// Anything else, already reported through the event hub.
    Failed(Notice),
}

impl<T> ActionOutcome<T> {
    pub fn is_saved(&self) -> bool {
        matches!(self, ActionOutcome::Saved(_))
    }
}

/// Outcome plus the session when it is still editable.
#[derive(Debug)]
pub struct Submission<T> {
    pub outcome: ActionOutcome<T>,
    pub session: Option<EditSession>,
}

/// Stage files dropped on `channel`. Accepted files become pending adds;
/// every refused file is announced on the hub right away and never reaches
/// the network.
pub fn stage_files<I>(session: &mut EditSession, channel: &str, files: I, events: &EventHub) -> FormResult<AddReport>
where
    I: IntoIterator<Item = LocalFile>,
{
    let kind = session.ledger_mut(channel)?.channel().accept.kind;
    let report = session.add_files(channel, files)?;
    for err in &report.rejected {
        warn!(channel, error = %err, "file refused");
        events.notify(Notice::error(rejection_message(err, kind)));
    }
    Ok(report)
}

fn rejection_message(err: &MediaError, kind: MediaKind) -> String {
    match err {
        MediaError::Rejected {
            filename,
            reason: RejectReason::WrongCategory { .. },
        } => {
            let label = match kind {
                MediaKind::Image => "imagen",
                MediaKind::Video => "video",
            };
            format!("{filename}: solo puedes subir archivos de {label}")
        }
        other => other.to_string(),
    }
}

/// Validate, encode and send one edit session.
///
/// New records are created; existing ones (the session has a key) are
/// patched. Singleton endpoints that cannot create are patched without a key.
pub async fn submit_session<R>(
    target: &dyn ObraResource<R>,
    mut session: EditSession,
    events: &EventHub,
) -> Submission<R>
where
    R: Send + 'static,
{
    let body = match session.prepare() {
        Ok(body) => body,
        Err(errors) => {
            events.notify(Notice::error(INVALID_FORM_MESSAGE));
            return Submission {
                outcome: ActionOutcome::Invalid(errors),
                session: Some(session),
            };
        }
    };

    let creating = session.is_new() && target.capabilities().allows(&ResourceMethod::Create);
    let result = if creating {
        target.create(body).await
    } else {
        target.patch(session.key(), body).await
    };

    match result {
        Ok(record) => {
            info!(path = target.path(), creating, "submit accepted");
            session.finish();
            events.emit(&ClientEvent::Saved {
                resource: target.path().to_string(),
            });
            events.notify(Notice::success(if creating { CREATED_MESSAGE } else { UPDATED_MESSAGE }));
            Submission {
                outcome: ActionOutcome::Saved(record),
                session: None,
            }
        }
        Err(err) => {
            let err = ObraError::normalize(err);
            warn!(path = target.path(), kind = err.name(), message = %err.message, "submit refused");
            classify(err, session, events)
        }
    }
}

fn classify<R>(err: ObraError, mut session: EditSession, events: &EventHub) -> Submission<R> {
    match err.class() {
        ErrorClass::Validation => {
            let errors = err.field_errors().cloned().unwrap_or_default();
            session.on_rejected(errors.clone());
            events.notify(Notice::error(SAVE_FAILED_MESSAGE));
            Submission {
                outcome: ActionOutcome::Invalid(errors),
                session: Some(session),
            }
        }
        ErrorClass::Authentication => {
            // an expired session was already announced by the client
            if err.message != SESSION_EXPIRED_MESSAGE {
                events.notify(Notice::error(err.message));
            }
            session.cancel();
            Submission {
                outcome: ActionOutcome::LoggedOut,
                session: None,
            }
        }
        ErrorClass::FileRejected | ErrorClass::Network => {
            let notice = Notice::error(err.message);
            events.notify(notice.clone());
            Submission {
                outcome: ActionOutcome::Failed(notice),
                session: Some(session),
            }
        }
        ErrorClass::Unexpected => {
            let notice = Notice::error(UNEXPECTED_MESSAGE);
            events.notify(notice.clone());
            Submission {
                outcome: ActionOutcome::Failed(notice),
                session: Some(session),
            }
        }
    }
}
