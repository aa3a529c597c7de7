//! Bridge between the `validator` crate and `FieldErrors`.

use obra_core::{FieldErrors, ObraError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

fn friendly_message(code: &str) -> Option<&'static str> {
    match code {
        "required" => Some("Este campo es obligatorio."),
        "email" => Some("Formato de correo inválido."),
        "length" => Some("Longitud inválida."),
        "range" => Some("Valor fuera de rango."),
        "url" => Some("Debe ser una URL válida."),
        _ => None,
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn push_validation_errors(out: &mut FieldErrors, prefix: &str, errs: &validator::ValidationErrors) {
    for (field, kind) in errs.errors() {
        match kind {
            validator::ValidationErrorsKind::Field(field_errors) => {
                let key = join_path(prefix, field);
                for e in field_errors {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .or_else(|| friendly_message(&e.code).map(|m| m.to_string()))
                        .unwrap_or_else(|| e.code.to_string());
                    out.push_field(&key, msg);
                }
            }
            validator::ValidationErrorsKind::Struct(nested) => {
                push_validation_errors(out, &join_path(prefix, field), nested.as_ref());
            }
            validator::ValidationErrorsKind::List(list) => {
                let base = join_path(prefix, field);
                for (idx, nested) in list {
                    push_validation_errors(out, &format!("{base}[{idx}]"), nested.as_ref());
                }
            }
        }
    }
}

pub fn field_errors_from(errs: &validator::ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    push_validation_errors(&mut out, "", errs);
    out
}

/// Run a struct's `validator` rules, failing with an unprocessable
/// `ObraError` that carries the field messages.
pub fn validate_struct<T: Validate>(value: &T, error_message: &str) -> anyhow::Result<()> {
    value.validate().map_err(|e| {
        ObraError::unprocessable(error_message)
            .with_errors(field_errors_from(&e))
            .into_anyhow()
    })
}

/// Deserialize and validate in one step.
pub fn validate<T>(data: &Value, error_message: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(data.clone()).map_err(|e| {
        let mut errors = FieldErrors::new();
        errors.push_schema(e.to_string());
        ObraError::unprocessable(error_message).with_errors(errors).into_anyhow()
    })?;
    validate_struct(&parsed, error_message)?;
    Ok(parsed)
}

#[derive(Validate)]
struct EmailCheck {
    #[validate(email)]
    value: String,
}

#[derive(Validate)]
struct UrlCheck {
    #[validate(url)]
    value: String,
}

pub(crate) fn is_email(value: &str) -> bool {
    EmailCheck {
        value: value.to_string(),
    }
    .validate()
    .is_ok()
}

pub(crate) fn is_url(value: &str) -> bool {
    UrlCheck {
        value: value.to_string(),
    }
    .validate()
    .is_ok()
}
