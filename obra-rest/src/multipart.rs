//! `MultipartPayload` → `reqwest::multipart::Form`, preserving part order.

use obra_core::{MultipartPayload, ObraError, PartValue};
use reqwest::multipart::{Form, Part};

pub fn to_form(payload: MultipartPayload) -> Result<Form, ObraError> {
    let mut form = Form::new();
    for part in payload.into_parts() {
        form = match part.value {
            PartValue::Text(text) => form.text(part.name, text),
            PartValue::File(file) => {
                let content_type = file.content_type.clone();
                let body = Part::bytes(file.bytes.to_vec())
                    .file_name(file.filename)
                    .mime_str(&content_type)
                    .map_err(|e| {
                        ObraError::unsupported_media_type(format!("Tipo de archivo inválido: {content_type}"))
                            .with_source(e.into())
                    })?;
                form.part(part.name, body)
            }
        };
    }
    Ok(form)
}
