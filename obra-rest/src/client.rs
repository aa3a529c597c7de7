use std::sync::Arc;
use std::time::Duration;

use obra_auth::http::{error_from_response, is_unauthorized, join_url, transport_error};
use obra_auth::{AuthClient, AuthOptions, SessionStore, SESSION_EXPIRED_MESSAGE};
use obra_core::config::{API_BASE_URL, API_TIMEOUT};
use obra_core::{
    normalize_value, EventHub, ListQuery, Normalized, ObraConfigSnapshot, ObraError, ObraResult, RequestBody,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::multipart::to_form;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin typed layer over reqwest.
///
/// Adds the bearer token, turns error bodies into `ObraError`s and, when the
/// server answers 401 anywhere but the token endpoints, ends the session and
/// tells the `EventHub`. Nothing is retried.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: AuthClient,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        options: AuthOptions,
        session: Arc<SessionStore>,
        events: Arc<EventHub>,
    ) -> ObraResult<Self> {
        let base_url = base_url.into();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| transport_error(e).into_anyhow())?;
        let auth = AuthClient::with_client(http.clone(), base_url.clone(), options, session, events);
        Ok(Self { http, base_url, auth })
    }

    pub fn from_config(
        config: &ObraConfigSnapshot,
        session: Arc<SessionStore>,
        events: Arc<EventHub>,
    ) -> ObraResult<Self> {
        let base_url = config
            .get_string(API_BASE_URL)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout = config.get_duration(API_TIMEOUT).unwrap_or(DEFAULT_TIMEOUT);
        Self::new(base_url, timeout, AuthOptions::from_config(config), session, events)
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.auth.session()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and return the raw JSON body (`None` for empty
    /// responses such as 204).
    #[instrument(skip(self, method, query, body), fields(method = %method))]
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<RequestBody>,
    ) -> ObraResult<Option<Value>> {
        let is_token_endpoint = self.auth.options().endpoints.is_token_endpoint(path);
        if !is_token_endpoint {
            self.auth.ensure_fresh().await?;
        }

        let mut request = self.http.request(method, join_url(&self.base_url, path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.auth.session().access_token() {
            request = request.bearer_auth(token);
        }
        request = match body {
            Some(RequestBody::Json(value)) => request.json(&value),
            Some(RequestBody::Multipart(payload)) => {
                debug!(parts = payload.len(), "multipart body");
                request.multipart(to_form(payload).map_err(ObraError::into_anyhow)?)
            }
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e).into_anyhow())?;
        let status = response.status();
        debug!(status = status.as_u16(), "response");

        if is_unauthorized(status) && !is_token_endpoint {
            if self.auth.session().is_authenticated() {
                self.auth.expire();
                return Err(ObraError::not_authenticated(SESSION_EXPIRED_MESSAGE).into_anyhow());
            }
            return Err(error_from_response(response).await.into_anyhow());
        }
        if !status.is_success() {
            return Err(error_from_response(response).await.into_anyhow());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(e).into_anyhow())?;
        if bytes.is_empty() {
            return Ok(None);
        }
        let value = serde_json::from_slice(&bytes)
            .map_err(|e| ObraError::bad_gateway("Respuesta inválida del servidor").with_source(e.into()).into_anyhow())?;
        Ok(Some(value))
    }

    /// Send and normalize whatever envelope shape comes back into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<RequestBody>,
    ) -> ObraResult<Normalized<T>> {
        let value = self.send(method, path, query, body).await?.unwrap_or(Value::Null);
        normalize_value(value).map_err(|e| {
            ObraError::bad_gateway(format!("Respuesta inesperada de {path}"))
                .with_source(e.into())
                .into_anyhow()
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ObraResult<T> {
        Ok(self.request(Method::GET, path, &[], None).await?.data)
    }

    pub async fn list<T: DeserializeOwned>(&self, path: &str, query: &ListQuery) -> ObraResult<Normalized<Vec<T>>> {
        self.request(Method::GET, path, &query.to_pairs(), None).await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: RequestBody) -> ObraResult<T> {
        Ok(self.request(Method::POST, path, &[], Some(body)).await?.data)
    }

    pub async fn patch<T: DeserializeOwned>(&self, path: &str, body: RequestBody) -> ObraResult<T> {
        Ok(self.request(Method::PATCH, path, &[], Some(body)).await?.data)
    }

    pub async fn delete(&self, path: &str) -> ObraResult<()> {
        self.send(Method::DELETE, path, &[], None).await?;
        Ok(())
    }
}
