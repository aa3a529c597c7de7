mod auth;
mod catalog;
mod messages;
mod projects;

use anyhow::{bail, Result};
use obra_core::{ObraError, Page};
use obra_form::EntityForm;
use obra_rest::{ActionOutcome, Submission};
use serde::Serialize;
use serde_json::Value;

use crate::cli::Command;
use crate::output::{print_field_errors, print_json, Summary};
use crate::App;

pub async fn dispatch(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => auth::login(app, email, password).await,
        Command::Logout => auth::logout(app),
        Command::Whoami => auth::whoami(app).await,
        Command::Projects(cmd) => projects::run(app, cmd).await,
        Command::Categories(cmd) => catalog::categories(app, cmd).await,
        Command::Services(cmd) => catalog::services(app, cmd).await,
        Command::Clients(cmd) => catalog::clients(app, cmd).await,
        Command::Messages(cmd) => messages::run(app, cmd).await,
        Command::About(_) => catalog::about(app).await,
        Command::Info(_) => catalog::company_info(app).await,
    }
}

/// Entity form with the configured upload limit applied.
fn form(app: &App, form: EntityForm) -> EntityForm {
    match app.max_file_bytes() {
        Some(bytes) => form.with_max_file_bytes(bytes),
        None => form,
    }
}

/// Print a saved record, or turn any other outcome into an error. Notices
/// have already gone to stderr through the event hub.
fn finish<T: Serialize + Summary>(app: &App, submission: Submission<T>) -> Result<()> {
    if let Some(session) = submission.session {
        session.cancel();
    }
    match submission.outcome {
        ActionOutcome::Saved(record) if app.json => print_json(&record),
        ActionOutcome::Saved(record) => {
            println!("{}", record.summary());
            Ok(())
        }
        ActionOutcome::Invalid(errors) => {
            print_field_errors(&errors);
            bail!("cambios no guardados")
        }
        ActionOutcome::LoggedOut => bail!("inicia sesión con `obra login`"),
        ActionOutcome::Failed(_) => bail!("cambios no guardados"),
    }
}

/// Field errors from a failed call, if the server sent any.
fn report_field_errors(err: &anyhow::Error) {
    if let Some(errors) = ObraError::from_anyhow(err).and_then(ObraError::field_errors) {
        print_field_errors(errors);
    }
}

/// `key: value` lines for the scalar fields of a record.
fn print_record<T: Serialize>(record: &T, json: bool) -> Result<()> {
    if json {
        return print_json(record);
    }
    if let Value::Object(map) = serde_json::to_value(record)? {
        for (key, value) in map {
            match value {
                Value::String(s) if s.is_empty() => {}
                Value::String(s) => println!("{key}: {s}"),
                Value::Null | Value::Array(_) | Value::Object(_) => {}
                other => println!("{key}: {other}"),
            }
        }
    }
    Ok(())
}

fn print_page<T: Serialize + Summary>(app: &App, page: &Page<T>) -> Result<()> {
    crate::output::print_page(page, app.json)
}
