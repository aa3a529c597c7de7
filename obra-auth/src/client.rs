use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use obra_core::{ClientEvent, EventHub, ObraError, ObraResult};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::http::{check, is_unauthorized, join_url, transport_error};
use crate::models::{LoginRequest, User};
use crate::options::AuthOptions;
use crate::session::SessionStore;
use crate::token::{RefreshedToken, TokenPair};

pub const SESSION_EXPIRED_MESSAGE: &str = "Tu sesión ha expirado. Ingresa nuevamente.";

/// Talks to the token endpoints and keeps the `SessionStore` in step.
#[derive(Clone, Debug)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    options: AuthOptions,
    session: Arc<SessionStore>,
    events: Arc<EventHub>,
}

impl AuthClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        options: AuthOptions,
        session: Arc<SessionStore>,
        events: Arc<EventHub>,
    ) -> ObraResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| transport_error(e).into_anyhow())?;
        Ok(Self::with_client(http, base_url, options, session, events))
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        options: AuthOptions,
        session: Arc<SessionStore>,
        events: Arc<EventHub>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            options,
            session,
            events,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn options(&self) -> &AuthOptions {
        &self.options
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Validate credentials locally, exchange them for a token pair, then
    /// load the profile.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> ObraResult<User> {
        obra_form::validate_struct(&request, "Datos de acceso inválidos")?;

        let response = self
            .http
            .post(self.url(&self.options.endpoints.login))
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e).into_anyhow())?;
        let tokens: TokenPair = check(response)
            .await
            .map_err(ObraError::into_anyhow)?
            .json()
            .await
            .map_err(|e| transport_error(e).into_anyhow())?;

        self.session.acquire_on_login(tokens, None).map_err(|e| ObraError::from(e).into_anyhow())?;
        let user = match self.me().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "profile fetch failed after login");
                let _ = self.session.clear_on_logout();
                return Err(e);
            }
        };

        info!(user_id = user.id, "logged in");
        self.events.emit(&ClientEvent::LoggedIn {
            email: Some(user.email.clone()),
        });
        Ok(user)
    }

    /// Ask the server whether the current access token is still good.
    #[instrument(skip_all)]
    pub async fn verify(&self) -> ObraResult<bool> {
        let Some(token) = self.session.access_token() else {
            return Ok(false);
        };
        let response = self
            .http
            .post(self.url(&self.options.endpoints.verify))
            .json(&json!({ "token": token }))
            .send()
            .await
            .map_err(|e| transport_error(e).into_anyhow())?;

        if is_unauthorized(response.status()) {
            return Ok(false);
        }
        check(response).await.map_err(ObraError::into_anyhow)?;
        Ok(true)
    }

    /// Trade the refresh token for a new access token. A rejected refresh
    /// ends the session.
    #[instrument(skip_all)]
    pub async fn refresh(&self) -> ObraResult<()> {
        let Some(refresh) = self.session.refresh_token() else {
            return Err(ObraError::not_authenticated("No hay sesión activa").into_anyhow());
        };
        let response = self
            .http
            .post(self.url(&self.options.endpoints.refresh))
            .json(&json!({ "refresh": refresh }))
            .send()
            .await
            .map_err(|e| transport_error(e).into_anyhow())?;

        if is_unauthorized(response.status()) {
            self.expire();
            return Err(ObraError::not_authenticated(SESSION_EXPIRED_MESSAGE).into_anyhow());
        }
        let refreshed: RefreshedToken = check(response)
            .await
            .map_err(ObraError::into_anyhow)?
            .json()
            .await
            .map_err(|e| transport_error(e).into_anyhow())?;
        self.session
            .refresh_on_expiry(refreshed)
            .map_err(|e| ObraError::from(e).into_anyhow())
    }

    /// Refresh first if the access token is about to lapse.
    pub async fn ensure_fresh(&self) -> ObraResult<()> {
        if self.session.needs_refresh(Utc::now()) {
            debug!("access token inside expiry window");
            self.refresh().await?;
        }
        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn me(&self) -> ObraResult<User> {
        let Some(token) = self.session.access_token() else {
            return Err(ObraError::not_authenticated("No hay sesión activa").into_anyhow());
        };
        let response = self
            .http
            .get(self.url(&self.options.endpoints.me))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| transport_error(e).into_anyhow())?;

        if is_unauthorized(response.status()) {
            self.expire();
            return Err(ObraError::not_authenticated(SESSION_EXPIRED_MESSAGE).into_anyhow());
        }
        let user: User = check(response)
            .await
            .map_err(ObraError::into_anyhow)?
            .json()
            .await
            .map_err(|e| transport_error(e).into_anyhow())?;
        self.session
            .set_user(user.clone())
            .map_err(|e| ObraError::from(e).into_anyhow())?;
        Ok(user)
    }

    pub fn logout(&self) -> ObraResult<()> {
        self.session
            .clear_on_logout()
            .map_err(|e| ObraError::from(e).into_anyhow())?;
        self.events.emit(&ClientEvent::LoggedOut);
        Ok(())
    }

    /// Forced logout after the server refused the session.
    pub fn expire(&self) {
        if let Err(e) = self.session.clear_on_logout() {
            warn!(error = %e, "could not clear stored session");
        }
        warn!("session expired");
        self.events.emit(&ClientEvent::SessionExpired);
        self.events.notify(obra_core::Notice::error(SESSION_EXPIRED_MESSAGE));
    }
}
