use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use obra_auth::{AuthClient, AuthOptions, FileTokenStorage, LoginRequest, MemoryTokenStorage, SessionStore};
use obra_core::{ClientEvent, ErrorKind, EventHub, ObraError};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Default)]
struct MockState {
    refresh_calls: AtomicUsize,
    revoked: std::sync::atomic::AtomicBool,
}

fn jwt(exp: i64, token_type: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&json!({"token_type": token_type, "exp": exp, "user_id": 7})).unwrap(),
    );
    format!("{header}.{payload}.sig")
}

async fn create_token(Json(body): Json<Value>) -> Response {
    if body["email"] == "admin@obra.pe" && body["password"] == "secreto" {
        // already inside the refresh window
        let soon = chrono::Utc::now().timestamp() + 5;
        Json(json!({"access": jwt(soon, "access"), "refresh": jwt(soon + 86_400, "refresh")})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        )
            .into_response()
    }
}

async fn refresh_token(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if state.revoked.load(Ordering::SeqCst) || body["refresh"].as_str().is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Token is invalid or expired"}))).into_response();
    }
    let later = chrono::Utc::now().timestamp() + 3600;
    Json(json!({"access": jwt(later, "access")})).into_response()
}

async fn verify_token(Json(body): Json<Value>) -> Response {
    let token = body["token"].as_str().unwrap_or_default();
    if token.split('.').count() == 3 {
        Json(json!({})).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Token is invalid"}))).into_response()
    }
}

async fn me(headers: HeaderMap) -> Response {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("Bearer ") && v.len() > "Bearer ".len())
        .unwrap_or(false);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Authentication credentials were not provided."})))
            .into_response();
    }
    Json(json!({
        "id": 7,
        "email": "admin@obra.pe",
        "first_name": "Lucía",
        "last_name": "Quispe",
        "is_staff": true,
        "is_superuser": false
    }))
    .into_response()
}

async fn spawn_api() -> (String, Arc<MockState>) {
    let state = Arc::new(MockState::default());
    let router = Router::new()
        .route("/api/auth/jwt/create/", post(create_token))
        .route("/api/auth/jwt/refresh/", post(refresh_token))
        .route("/api/auth/jwt/verify/", post(verify_token))
        .route("/api/auth/users/me/", get(me))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}/api/"), state)
}

fn client(base: &str, session: Arc<SessionStore>, events: Arc<EventHub>) -> AuthClient {
    AuthClient::new(base, Duration::from_secs(5), AuthOptions::default(), session, events).unwrap()
}

fn memory_session() -> Arc<SessionStore> {
    Arc::new(SessionStore::new(Arc::new(MemoryTokenStorage::new()), Duration::from_secs(30)))
}

#[tokio::test]
async fn login_stores_tokens_and_profile() {
    let (base, _) = spawn_api().await;
    let events = Arc::new(EventHub::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    events.on(Arc::new(move |e: &ClientEvent| sink.lock().unwrap().push(e.clone())));

    let auth = client(&base, memory_session(), events);
    let user = auth.login(LoginRequest::new("admin@obra.pe", "secreto")).await.unwrap();

    assert_eq!(user.display_name(), "Lucía Quispe");
    assert!(auth.session().is_authenticated());
    assert_eq!(auth.session().user(), Some(user));
    assert!(auth.verify().await.unwrap());
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[ClientEvent::LoggedIn {
            email: Some("admin@obra.pe".into())
        }]
    );
}

#[tokio::test]
async fn bad_credentials_do_not_log_out_or_expire() {
    let (base, _) = spawn_api().await;
    let events = Arc::new(EventHub::new());
    let expired = Arc::new(AtomicUsize::new(0));
    let counter = expired.clone();
    events.on(Arc::new(move |e: &ClientEvent| {
        if *e == ClientEvent::SessionExpired {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }));

    let auth = client(&base, memory_session(), events);
    let err = auth.login(LoginRequest::new("admin@obra.pe", "mala")).await.unwrap_err();
    let obra = ObraError::from_anyhow(&err).unwrap();

    assert_eq!(obra.kind, ErrorKind::NotAuthenticated);
    assert_eq!(obra.message, "No active account found with the given credentials");
    assert_eq!(expired.load(Ordering::SeqCst), 0);
    assert!(!auth.session().is_authenticated());
}

#[tokio::test]
async fn invalid_credentials_never_reach_the_server() {
    // nothing listens here; validation must fail first
    let auth = client("http://127.0.0.1:9/api/", memory_session(), Arc::new(EventHub::new()));
    let err = auth.login(LoginRequest::new("", "")).await.unwrap_err();
    let obra = ObraError::from_anyhow(&err).unwrap();
    assert_eq!(obra.kind, ErrorKind::Unprocessable);
    assert_eq!(obra.field_errors().unwrap().first("password"), Some("La contraseña es obligatoria"));
}

#[tokio::test]
async fn expiring_token_is_refreshed_once() {
    let (base, state) = spawn_api().await;
    let auth = client(&base, memory_session(), Arc::new(EventHub::new()));
    auth.login(LoginRequest::new("admin@obra.pe", "secreto")).await.unwrap();
    let before = auth.session().access_token();

    auth.ensure_fresh().await.unwrap();
    auth.ensure_fresh().await.unwrap();

    assert_eq!(state.refresh_calls.load(Ordering::SeqCst), 1);
    assert_ne!(auth.session().access_token(), before);
}

#[tokio::test]
async fn rejected_refresh_expires_the_session() {
    let (base, state) = spawn_api().await;
    let events = Arc::new(EventHub::new());
    let notices = Arc::new(Mutex::new(Vec::new()));
    let sink = notices.clone();
    events.on(Arc::new(move |e: &ClientEvent| {
        if let ClientEvent::Notice(n) = e {
            sink.lock().unwrap().push(n.message.clone());
        }
    }));

    let auth = client(&base, memory_session(), events);
    auth.login(LoginRequest::new("admin@obra.pe", "secreto")).await.unwrap();
    state.revoked.store(true, Ordering::SeqCst);

    let err = auth.refresh().await.unwrap_err();
    assert_eq!(ObraError::from_anyhow(&err).unwrap().kind, ErrorKind::NotAuthenticated);
    assert!(!auth.session().is_authenticated());
    assert_eq!(
        notices.lock().unwrap().as_slice(),
        &["Tu sesión ha expirado. Ingresa nuevamente.".to_string()]
    );
}

#[tokio::test]
async fn file_backed_session_survives_restart() {
    let (base, _) = spawn_api().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    {
        let storage = Arc::new(FileTokenStorage::new(&path));
        let session = Arc::new(SessionStore::restore(storage, Duration::from_secs(30)).unwrap());
        client(&base, session, Arc::new(EventHub::new()))
            .login(LoginRequest::new("admin@obra.pe", "secreto"))
            .await
            .unwrap();
    }

    let storage = Arc::new(FileTokenStorage::new(&path));
    let session = Arc::new(SessionStore::restore(storage, Duration::from_secs(30)).unwrap());
    assert!(session.is_authenticated());
    assert_eq!(session.user().map(|u| u.id), Some(7));

    let auth = client(&base, session, Arc::new(EventHub::new()));
    auth.logout().unwrap();
    assert!(!path.exists());
}
