use obra_core::ObraError;
use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Malformed token: {reason}")]
    InvalidToken { reason: String },

    #[error("No active session")]
    NotAuthenticated,

    #[error("Token storage error: {source}")]
    Storage {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl SessionError {
    pub fn invalid_token<S: Into<String>>(reason: S) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }
}

impl From<SessionError> for ObraError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidToken { .. } | SessionError::NotAuthenticated => {
                ObraError::not_authenticated(err.to_string())
            }
            other => {
                let message = other.to_string();
                ObraError::general_error(message).with_source(other.into())
            }
        }
    }
}
