use obra_core::ObraError;
use obra_media::MediaError;
use thiserror::Error;

pub type FormResult<T> = Result<T, FormError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Unknown field: {name}")]
    UnknownField { name: String },

    #[error("Unknown media channel: {name}")]
    UnknownChannel { name: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error(transparent)]
    Media(#[from] MediaError),
}

impl FormError {
    pub fn unknown_field<S: Into<String>>(name: S) -> Self {
        Self::UnknownField { name: name.into() }
    }

    pub fn unknown_channel<S: Into<String>>(name: S) -> Self {
        Self::UnknownChannel { name: name.into() }
    }

    pub fn invalid_input<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<FormError> for ObraError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Media(media) => media.into(),
            FormError::InvalidInput { field, message } => {
                let mut errors = obra_core::FieldErrors::new();
                errors.push_field(&field, message.clone());
                ObraError::bad_request(format!("Invalid value for {}: {}", field, message)).with_errors(errors)
            }
            other => ObraError::bad_request(other.to_string()),
        }
    }
}
