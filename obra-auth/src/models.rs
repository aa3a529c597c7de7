use serde::{Deserialize, Serialize};
use validator::Validate;

/// Profile returned by `auth/users/me/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            self.email.clone()
        } else {
            full
        }
    }
}

/// Credentials posted to the login endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        length(min = 1, message = "El correo electrónico es obligatorio"),
        email(message = "Formato de correo inválido")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "La contraseña es obligatoria"))]
    pub password: String,
}

impl LoginRequest {
    pub fn new<E: Into<String>, P: Into<String>>(email: E, password: P) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }
}
