//! # Errors
//!
//! Obra uses one structured error for everything that crosses the API
//! boundary. Core goals:
//! - consistent status codes + class names (what the server speaks)
//! - can be carried through `anyhow::Error`
//! - field-keyed validation messages travel with the error so a form can
//!   re-display them
//!
//! `ObraError::class()` folds any error into the handful of categories a
//! caller actually branches on (validation, authentication, network,
//! unexpected, rejected file).

use std::fmt;

use anyhow::Error as AnyError;
use serde_json::Value;

use crate::field_errors::FieldErrors;

/// A convenience result type for Obra core APIs.
pub type ObraResult<T> = std::result::Result<T, AnyError>;

/// Error names + status codes, mirroring what the REST API returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,           // 400
    NotAuthenticated,     // 401
    Forbidden,            // 403
    NotFound,             // 404
    MethodNotAllowed,     // 405
    Timeout,              // 408
    Conflict,             // 409
    PayloadTooLarge,      // 413
    UnsupportedMediaType, // 415
    Unprocessable,        // 422
    TooManyRequests,      // 429
    GeneralError,         // 500
    NotImplemented,       // 501
    BadGateway,           // 502
    Unavailable,          // 503
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotAuthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::Timeout => 408,
            ErrorKind::Conflict => 409,
            ErrorKind::PayloadTooLarge => 413,
            ErrorKind::UnsupportedMediaType => 415,
            ErrorKind::Unprocessable => 422,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::GeneralError => 500,
            ErrorKind::NotImplemented => 501,
            ErrorKind::BadGateway => 502,
            ErrorKind::Unavailable => 503,
        }
    }

    /// Map an HTTP status back to a kind. Unknown 4xx collapse to
    /// `BadRequest`, everything else to `GeneralError`.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::BadRequest,
            401 => ErrorKind::NotAuthenticated,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            405 => ErrorKind::MethodNotAllowed,
            408 => ErrorKind::Timeout,
            409 => ErrorKind::Conflict,
            413 => ErrorKind::PayloadTooLarge,
            415 => ErrorKind::UnsupportedMediaType,
            422 => ErrorKind::Unprocessable,
            429 => ErrorKind::TooManyRequests,
            501 => ErrorKind::NotImplemented,
            502 => ErrorKind::BadGateway,
            503 | 504 => ErrorKind::Unavailable,
            400..=499 => ErrorKind::BadRequest,
            _ => ErrorKind::GeneralError,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::PayloadTooLarge => "PayloadTooLarge",
            ErrorKind::UnsupportedMediaType => "UnsupportedMediaType",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::TooManyRequests => "TooManyRequests",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::NotImplemented => "NotImplemented",
            ErrorKind::BadGateway => "BadGateway",
            ErrorKind::Unavailable => "Unavailable",
        }
    }

    /// Kebab-cased class name.
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotAuthenticated => "not-authenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not-found",
            ErrorKind::MethodNotAllowed => "method-not-allowed",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Conflict => "conflict",
            ErrorKind::PayloadTooLarge => "payload-too-large",
            ErrorKind::UnsupportedMediaType => "unsupported-media-type",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::TooManyRequests => "too-many-requests",
            ErrorKind::GeneralError => "general-error",
            ErrorKind::NotImplemented => "not-implemented",
            ErrorKind::BadGateway => "bad-gateway",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

/// How a caller should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Field-keyed problems; the form stays editable.
    Validation,
    /// Expired or invalid token; forces a logout.
    Authentication,
    /// The server could not be reached or did not answer in time.
    Network,
    /// Anything else; surfaced as a generic notification.
    Unexpected,
    /// A file was refused before it was ever staged.
    FileRejected,
}

/// A structured Obra error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct ObraError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<Value>,
    pub errors: Option<FieldErrors>,
    pub source: Option<AnyError>,
}

impl ObraError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            errors: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Field errors, if the server (or a local validator) attached any.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        self.errors.as_ref().filter(|e| !e.is_empty())
    }

    pub fn class(&self) -> ErrorClass {
        match self.kind {
            ErrorKind::NotAuthenticated => ErrorClass::Authentication,
            ErrorKind::UnsupportedMediaType | ErrorKind::PayloadTooLarge => ErrorClass::FileRejected,
            ErrorKind::Timeout | ErrorKind::Unavailable | ErrorKind::BadGateway => {
                ErrorClass::Network
            }
            ErrorKind::BadRequest | ErrorKind::Unprocessable if self.field_errors().is_some() => {
                ErrorClass::Validation
            }
            _ => ErrorClass::Unexpected,
        }
    }

    /// Convert into `anyhow::Error`.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` to an `ObraError` if possible.
    pub fn from_anyhow(err: &AnyError) -> Option<&ObraError> {
        err.chain().find_map(|e| e.downcast_ref::<ObraError>())
    }

    /// Turn any error into an ObraError:
    /// - if it's already an ObraError, keep it (lossless)
    /// - otherwise wrap as GeneralError
    pub fn normalize(err: AnyError) -> ObraError {
        match err.downcast::<ObraError>() {
            Ok(obra) => obra,
            Err(other) => ObraError::new(ErrorKind::GeneralError, other.to_string()).with_source(other),
        }
    }

    // ---- Constructors ----

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, msg)
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, msg)
    }
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::PayloadTooLarge, msg)
    }
    pub fn unsupported_media_type(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedMediaType, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn too_many_requests(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::TooManyRequests, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotImplemented, msg)
    }
    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadGateway, msg)
    }
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, msg)
    }
}

impl fmt::Display for ObraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for ObraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl ObraError {
    /// JSON shape matching the server's error body.
    pub fn to_json(&self) -> Value {
        use serde_json::json;

        let mut base = json!({
            "status": "error",
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(d) = &self.data {
            base["data"] = d.clone();
        }
        if let Some(e) = &self.errors {
            base["errors"] = e.to_json();
        }
        base
    }
}

/// Convenience helper for "bail with ObraError".
#[macro_export]
macro_rules! bail_obra {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::ObraError::$ctor($msg).into_anyhow());
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::ObraError::$ctor(format!($fmt, $($arg)*)).into_anyhow());
    };
}
