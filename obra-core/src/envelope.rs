//! Response envelopes.
//!
//! The API answers in three shapes depending on the endpoint:
//!
//! - the envelope `{status, code, message, data, meta}`
//! - a paginated list `{count, next, previous, results}`
//! - a bare object or array
//!
//! `ApiResponse::parse` tells them apart once, at the boundary, and
//! `normalize` turns all three into a single `Normalized<T>`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ErrorKind, ObraError};
use crate::field_errors::FieldErrors;

/// Pagination metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

impl PageMeta {
    pub fn has_next(&self) -> bool {
        match (self.page, self.total_pages) {
            (Some(page), Some(total)) => page < total,
            _ => self.next.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    pub data: T,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedList<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: T,
}

/// One of the three response shapes, decided by inspecting the body.
#[derive(Debug, Clone)]
pub enum ApiResponse<T> {
    Enveloped(Envelope<T>),
    Paginated(PaginatedList<T>),
    Bare(T),
}

/// What the rest of the client sees, whatever the server sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub data: T,
    pub meta: Option<PageMeta>,
    pub message: Option<String>,
}

impl<T> Normalized<T> {
    pub fn bare(data: T) -> Self {
        Self {
            data,
            meta: None,
            message: None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Normalized<U> {
        Normalized {
            data: f(self.data),
            meta: self.meta,
            message: self.message,
        }
    }
}

impl<T: DeserializeOwned> ApiResponse<T> {
    pub fn parse(value: Value) -> Result<Self, serde_json::Error> {
        if let Value::Object(map) = &value {
            if map.contains_key("status") && map.contains_key("data") {
                return serde_json::from_value(value).map(ApiResponse::Enveloped);
            }
            if map.contains_key("results") && map.contains_key("count") {
                return serde_json::from_value(value).map(ApiResponse::Paginated);
            }
        }
        serde_json::from_value(value).map(ApiResponse::Bare)
    }
}

impl<T> ApiResponse<T> {
    pub fn normalize(self) -> Normalized<T> {
        match self {
            ApiResponse::Enveloped(env) => Normalized {
                data: env.data,
                meta: env.meta,
                message: Some(env.message).filter(|m| !m.is_empty()),
            },
            ApiResponse::Paginated(list) => Normalized {
                data: list.results,
                meta: Some(PageMeta {
                    page: None,
                    total_pages: None,
                    total_records: list.count,
                    next: list.next,
                    previous: list.previous,
                }),
                message: None,
            },
            ApiResponse::Bare(data) => Normalized::bare(data),
        }
    }
}

/// Parse and normalize a JSON body in one go.
pub fn normalize_value<T: DeserializeOwned>(value: Value) -> Result<Normalized<T>, serde_json::Error> {
    ApiResponse::parse(value).map(ApiResponse::normalize)
}

/// Build an `ObraError` from a failed response.
///
/// Understands `{status: "error", code, message, errors}` as well as a
/// plain field map (`{"name": ["Required"]}`) or plain text.
pub fn error_from_body(status: u16, body: &str) -> ObraError {
    let kind = ErrorKind::from_status(status);
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    match parsed {
        Some(Value::Object(map)) if map.contains_key("errors") || map.contains_key("message") => {
            let message = map
                .get("message")
                .and_then(|m| m.as_str())
                .map(String::from)
                .unwrap_or_else(|| kind.name().to_string());
            let errors = map.get("errors").map(FieldErrors::from_server).unwrap_or_default();
            let mut err = ObraError::new(kind, message);
            if !errors.is_empty() {
                err = err.with_errors(errors);
            }
            err
        }
        Some(value @ Value::Object(_)) => {
            let errors = FieldErrors::from_server(&value);
            let message = errors
                .first(crate::field_errors::SCHEMA_KEY)
                .map(String::from)
                .unwrap_or_else(|| kind.name().to_string());
            ObraError::new(kind, message).with_errors(errors)
        }
        _ => {
            let text = body.trim();
            let message = if text.is_empty() {
                kind.name().to_string()
            } else {
                text.chars().take(200).collect()
            };
            ObraError::new(kind, message)
        }
    }
}
