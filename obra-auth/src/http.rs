//! reqwest plumbing shared by the auth client and the REST client.

use obra_core::{error_from_body, ObraError};
use reqwest::{Response, StatusCode};
use tracing::warn;

/// Join a base URL and a relative API path with exactly one slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Map a failure that never produced a response.
pub fn transport_error(err: reqwest::Error) -> ObraError {
    let message = if err.is_timeout() {
        "La solicitud tardó demasiado en responder"
    } else if err.is_connect() {
        "No se pudo conectar con el servidor"
    } else if err.is_decode() {
        "Respuesta inválida del servidor"
    } else {
        "Error de red"
    };
    let base = if err.is_timeout() {
        ObraError::timeout(message)
    } else if err.is_decode() {
        ObraError::bad_gateway(message)
    } else {
        ObraError::unavailable(message)
    };
    base.with_source(err.into())
}

/// Turn a non-success response into an `ObraError` carrying the server's
/// field errors.
pub async fn error_from_response(response: Response) -> ObraError {
    let status = response.status();
    let url = response.url().path().to_string();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return transport_error(e),
    };
    let err = error_from_body(status.as_u16(), &body);
    warn!(status = status.as_u16(), path = %url, message = %err.message, "request failed");
    err
}

/// Pass successful responses through, convert the rest.
pub async fn check(response: Response) -> Result<Response, ObraError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from_response(response).await)
    }
}

pub fn is_unauthorized(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_normalises_slashes() {
        assert_eq!(join_url("http://h/api/", "/projects/"), "http://h/api/projects/");
        assert_eq!(join_url("http://h/api", "projects/"), "http://h/api/projects/");
    }
}
