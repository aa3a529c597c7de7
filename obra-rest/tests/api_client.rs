use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use obra_auth::{AuthOptions, MemoryTokenStorage, SessionStore, TokenPair};
use obra_core::{ClientEvent, ErrorKind, EventHub, ListQuery, LocalFile, NoticeLevel, ObraError, ObraResource};
use obra_form::EntityForm;
use obra_media::{MediaId, SlotState};
use obra_rest::models::ProjectStatus;
use obra_rest::{submit_session, ActionOutcome, ApiClient};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Debug, Clone, PartialEq)]
struct RecordedPart {
    name: String,
    filename: Option<String>,
    body: Vec<u8>,
}

#[derive(Default)]
struct Mock {
    parts: Mutex<Vec<RecordedPart>>,
    queries: Mutex<Vec<String>>,
    bearer: Mutex<Option<String>>,
    json_bodies: Mutex<Vec<Value>>,
}

type Shared = State<Arc<Mock>>;

fn project_record(slug: &str) -> Value {
    json!({
        "id": 31,
        "slug": slug,
        "name": "Residencial Los Olivos",
        "description": "Edificio multifamiliar de 8 pisos",
        "category": 2,
        "category_name": "Vivienda",
        "year": 2022,
        "location": "Los Olivos, Lima",
        "service_type": "Construcción",
        "levels": "8",
        "area": "1200 m2",
        "status": "entregado",
        "extra_info": {"Ascensores": "2"},
        "is_featured": false,
        "images": [
            {"id": 101, "image": "/media/projects/101.jpg"},
            {"id": 102, "image": "/media/projects/102.jpg"}
        ],
        "videos": [],
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-02T10:00:00Z"
    })
}

fn envelope(data: Value) -> Json<Value> {
    Json(json!({"status": "success", "code": 200, "message": "OK", "data": data}))
}

async fn record_multipart(mock: &Mock, mut multipart: Multipart) {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(String::from);
        let body = field.bytes().await.unwrap().to_vec();
        mock.parts.lock().unwrap().push(RecordedPart { name, filename, body });
    }
}

fn remember_bearer(mock: &Mock, headers: &HeaderMap) {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    *mock.bearer.lock().unwrap() = bearer;
}

async fn list_projects(State(mock): Shared, headers: HeaderMap, RawQuery(query): RawQuery) -> Json<Value> {
    remember_bearer(&mock, &headers);
    mock.queries.lock().unwrap().push(query.unwrap_or_default());
    Json(json!({
        "status": "success",
        "code": 200,
        "message": "Proyectos",
        "data": [project_record("residencial-los-olivos")],
        "meta": {"page": 1, "total_pages": 3, "total_records": 21, "next": "?page=2", "previous": null}
    }))
}

async fn get_project(Path(slug): Path<String>) -> Response {
    if slug == "no-existe" {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "No encontrado."}))).into_response();
    }
    envelope(project_record(&slug)).into_response()
}

async fn patch_project(State(mock): Shared, Path(slug): Path<String>, multipart: Multipart) -> Response {
    record_multipart(&mock, multipart).await;
    match slug.as_str() {
        "invalido" => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "status": "error",
                "code": 400,
                "message": "Datos inválidos",
                "errors": {"name": ["Required"]}
            })),
        )
            .into_response(),
        "expirado" => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Given token not valid for any token type"})),
        )
            .into_response(),
        "roto" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => envelope(project_record(&slug)).into_response(),
    }
}

async fn patch_message(State(mock): Shared, Path(id): Path<u64>, Json(body): Json<Value>) -> Json<Value> {
    mock.json_bodies.lock().unwrap().push(body.clone());
    Json(json!({
        "id": id,
        "first_name": "Ana",
        "last_name": "Torres",
        "email": "ana@correo.pe",
        "message": "Quisiera una cotización",
        "is_read": body["is_read"],
        "created_at": "2024-05-01T09:00:00Z"
    }))
}

async fn patch_image(State(mock): Shared, Path(id): Path<u64>, multipart: Multipart) -> Json<Value> {
    record_multipart(&mock, multipart).await;
    Json(json!({"id": id, "image": format!("/media/projects/{id}-v2.jpg")}))
}

async fn delete_image(Path(_id): Path<u64>) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn patch_about(State(mock): Shared, multipart: Multipart) -> Json<Value> {
    record_multipart(&mock, multipart).await;
    envelope(json!({"id": 1, "description": "Somos", "mission": "Construir", "vision": "", "image": null}))
}

async fn get_about() -> Json<Value> {
    envelope(json!({"id": 1, "description": "Somos", "mission": "Construir", "vision": "Liderar", "image": "/media/about.jpg"}))
}

async fn spawn_api() -> (String, Arc<Mock>) {
    let mock = Arc::new(Mock::default());
    let router = Router::new()
        .route("/api/projects/", get(list_projects))
        .route("/api/projects/{slug}/", get(get_project).patch(patch_project))
        .route("/api/contact/messages/{id}/", patch(patch_message))
        .route("/api/project-images/{id}/", patch(patch_image).delete(delete_image))
        .route("/api/company/about/", get(get_about).patch(patch_about))
        .with_state(mock.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}/api/"), mock)
}

fn logged_in_client(base: &str, events: Arc<EventHub>) -> ApiClient {
    let session = Arc::new(SessionStore::new(Arc::new(MemoryTokenStorage::new()), Duration::from_secs(30)));
    session
        .acquire_on_login(
            TokenPair {
                access: "access-token".into(),
                refresh: "refresh-token".into(),
            },
            None,
        )
        .unwrap();
    ApiClient::new(base, Duration::from_secs(5), AuthOptions::default(), session, events).unwrap()
}

fn jpg(name: &str) -> LocalFile {
    LocalFile::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
}

fn collect_events(events: &EventHub) -> Arc<Mutex<Vec<ClientEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    events.on(Arc::new(move |e: &ClientEvent| sink.lock().unwrap().push(e.clone())));
    seen
}

#[tokio::test]
async fn list_sends_filters_bearer_and_normalizes_meta() {
    let (base, mock) = spawn_api().await;
    let api = logged_in_client(&base, Arc::new(EventHub::new()));

    let page = api
        .projects()
        .find_filtered(ListQuery::new().page(2), Some(2), Some(ProjectStatus::Entregado), None)
        .await
        .unwrap();

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].slug, "residencial-los-olivos");
    let meta = page.meta.unwrap();
    assert_eq!(meta.total_records, 21);
    assert!(meta.has_next());
    assert_eq!(page.message.as_deref(), Some("Proyectos"));

    let query = mock.queries.lock().unwrap()[0].clone();
    assert_eq!(query, "page=2&page_size=10&category=2&status=entregado");
    assert_eq!(mock.bearer.lock().unwrap().as_deref(), Some("Bearer access-token"));
}

#[tokio::test]
async fn get_by_slug_unwraps_the_envelope_and_maps_not_found() {
    let (base, _) = spawn_api().await;
    let api = logged_in_client(&base, Arc::new(EventHub::new()));

    let project = api.projects().get("casa-miraflores").await.unwrap();
    assert_eq!(project.slug, "casa-miraflores");
    assert_eq!(project.images.len(), 2);

    let err = api.projects().get("no-existe").await.unwrap_err();
    let obra = ObraError::from_anyhow(&err).unwrap();
    assert_eq!(obra.kind, ErrorKind::NotFound);
    assert_eq!(obra.message, "No encontrado.");
}

#[tokio::test]
async fn staged_edit_goes_out_as_one_ordered_multipart_request() {
    let (base, mock) = spawn_api().await;
    let events = Arc::new(EventHub::new());
    let seen = collect_events(&events);
    let api = logged_in_client(&base, events.clone());

    let record = project_record("residencial-los-olivos");
    let mut session = EntityForm::project().open(&record).with_key("residencial-los-olivos");
    let first = session.ledger("images").unwrap().slots()[0].id;
    session.set("name", "Residencial Los Olivos II").unwrap();
    session.mark_delete("images", first).unwrap();
    session.add_files("images", vec![jpg("fachada.jpg")]).unwrap();
    let previews = session.preview_registry().clone();

    let submission = submit_session(&api.projects(), session, &events).await;

    assert!(submission.outcome.is_saved());
    assert!(submission.session.is_none());
    assert_eq!(previews.stats().live, 0);

    let parts = mock.parts.lock().unwrap().clone();
    let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["name", "uploaded_images", "delete_images"]);
    assert_eq!(parts[0].body, b"Residencial Los Olivos II");
    assert_eq!(parts[1].filename.as_deref(), Some("fachada.jpg"));
    assert_eq!(parts[1].body, vec![0xFF, 0xD8, 0xFF, 0xE0]);
    assert_eq!(parts[2].body, b"101");

    let seen = seen.lock().unwrap();
    assert!(seen.contains(&ClientEvent::Saved {
        resource: "projects/".into()
    }));
}

#[tokio::test]
async fn server_field_errors_come_back_on_the_session() {
    let (base, _) = spawn_api().await;
    let events = Arc::new(EventHub::new());
    let api = logged_in_client(&base, events.clone());

    let mut session = EntityForm::project()
        .open(&project_record("invalido"))
        .with_key("invalido");
    let second = session.ledger("images").unwrap().slots()[1].id;
    session.replace("images", second, jpg("nuevo.jpg")).unwrap();
    let before = session.payload();

    let submission = submit_session(&api.projects(), session, &events).await;

    let ActionOutcome::Invalid(errors) = submission.outcome else {
        panic!("expected field errors");
    };
    assert_eq!(errors.first("name"), Some("Required"));
    let session = submission.session.unwrap();
    assert_eq!(session.form().error("name"), Some("Required"));
    assert_eq!(session.payload(), before);
    assert!(matches!(
        session.ledger("images").unwrap().get(second).unwrap().state,
        SlotState::PendingReplace { .. }
    ));
    session.cancel();
}

#[tokio::test]
async fn unauthorized_submit_logs_out_and_announces_expiry() {
    let (base, _) = spawn_api().await;
    let events = Arc::new(EventHub::new());
    let seen = collect_events(&events);
    let api = logged_in_client(&base, events.clone());

    let mut session = EntityForm::project()
        .open(&project_record("expirado"))
        .with_key("expirado");
    session.set("levels", "9").unwrap();

    let submission = submit_session(&api.projects(), session, &events).await;

    assert_eq!(submission.outcome, ActionOutcome::LoggedOut);
    assert!(submission.session.is_none());
    assert!(!api.session().is_authenticated());
    let seen = seen.lock().unwrap();
    assert!(seen.contains(&ClientEvent::SessionExpired));
    assert!(seen.iter().any(|e| matches!(
        e,
        ClientEvent::Notice(n) if n.message == "Tu sesión ha expirado. Ingresa nuevamente."
    )));
}

#[tokio::test]
async fn expiry_is_announced_once() {
    let (base, _) = spawn_api().await;
    let events = Arc::new(EventHub::new());
    let seen = collect_events(&events);
    let api = logged_in_client(&base, events.clone());

    let mut session = EntityForm::project()
        .open(&project_record("expirado"))
        .with_key("expirado");
    session.set("levels", "9").unwrap();
    submit_session(&api.projects(), session, &events).await;

    let notices = seen
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, ClientEvent::Notice(_)))
        .count();
    assert_eq!(notices, 1);
}

#[tokio::test]
async fn anonymous_unauthorized_submit_is_not_silent() {
    let (base, _) = spawn_api().await;
    let events = Arc::new(EventHub::new());
    let seen = collect_events(&events);
    let session = Arc::new(SessionStore::new(Arc::new(MemoryTokenStorage::new()), Duration::from_secs(30)));
    let api = ApiClient::new(&base, Duration::from_secs(5), AuthOptions::default(), session, events.clone()).unwrap();

    let mut session = EntityForm::project()
        .open(&project_record("expirado"))
        .with_key("expirado");
    session.set("levels", "9").unwrap();
    let submission = submit_session(&api.projects(), session, &events).await;

    assert_eq!(submission.outcome, ActionOutcome::LoggedOut);
    let seen = seen.lock().unwrap();
    assert!(!seen.contains(&ClientEvent::SessionExpired));
    assert!(seen.iter().any(|e| matches!(
        e,
        ClientEvent::Notice(n) if n.level == NoticeLevel::Error && !n.message.is_empty()
    )));
}

#[tokio::test]
async fn unexpected_and_network_failures_keep_the_session() {
    let (base, _) = spawn_api().await;
    let events = Arc::new(EventHub::new());
    let api = logged_in_client(&base, events.clone());

    let mut session = EntityForm::project().open(&project_record("roto")).with_key("roto");
    session.set("area", "1300 m2").unwrap();
    let submission = submit_session(&api.projects(), session, &events).await;
    let ActionOutcome::Failed(notice) = submission.outcome else {
        panic!("expected a failure notice");
    };
    assert_eq!(notice.message, "Ocurrió un error inesperado");
    let session = submission.session.unwrap();
    assert!(session.is_dirty());

    // nothing listens on the discard port
    let offline = logged_in_client("http://127.0.0.1:9/api/", events.clone());
    let submission = submit_session(&offline.projects(), session, &events).await;
    assert!(matches!(submission.outcome, ActionOutcome::Failed(_)));
    assert!(submission.session.is_some());
    assert!(offline.session().is_authenticated());
}

#[tokio::test]
async fn client_side_validation_never_hits_the_network() {
    let events = Arc::new(EventHub::new());
    let seen = collect_events(&events);
    let offline = logged_in_client("http://127.0.0.1:9/api/", events.clone());

    let mut session = EntityForm::client().create();
    session.set("name", "Cementos del Sur").unwrap();
    let submission = submit_session(&offline.clients(), session, &events).await;

    let ActionOutcome::Invalid(errors) = submission.outcome else {
        panic!("expected local validation errors");
    };
    assert_eq!(errors.first("image"), Some("La imagen es obligatoria para nuevos clientes"));
    assert!(seen.lock().unwrap().iter().any(|e| matches!(
        e,
        ClientEvent::Notice(n) if n.message == "Por favor completa los campos requeridos."
    )));
}

#[tokio::test]
async fn about_loads_from_company_about() {
    let (base, _mock) = spawn_api().await;
    let api = logged_in_client(&base, Arc::new(EventHub::new()));

    let about = api.about().load().await.unwrap();
    assert_eq!(about.vision, "Liderar");
    assert_eq!(about.image.as_deref(), Some("/media/about.jpg"));
}

#[tokio::test]
async fn singleton_about_patch_sends_the_delete_flag() {
    let (base, mock) = spawn_api().await;
    let events = Arc::new(EventHub::new());
    let api = logged_in_client(&base, events.clone());

    let record = json!({"id": 1, "description": "Somos", "mission": "", "vision": "", "image": "/media/about.jpg"});
    let mut session = EntityForm::about().open(&record);
    let slot = session.ledger("image").unwrap().slots()[0].id;
    session.mark_delete("image", slot).unwrap();
    session.set("mission", "Construir").unwrap();

    let submission = submit_session(&api.about(), session, &events).await;
    let ActionOutcome::Saved(about) = submission.outcome else {
        panic!("about update should succeed");
    };
    assert_eq!(about.image, None);

    let parts = mock.parts.lock().unwrap().clone();
    let pairs: Vec<(&str, &[u8])> = parts.iter().map(|p| (p.name.as_str(), p.body.as_slice())).collect();
    assert_eq!(pairs, vec![("mission", b"Construir".as_slice()), ("delete_image", b"true".as_slice())]);
}

#[tokio::test]
async fn messages_only_patch_is_read_and_cannot_be_deleted() {
    let (base, mock) = spawn_api().await;
    let api = logged_in_client(&base, Arc::new(EventHub::new()));
    let messages = api.messages();

    let message = messages.mark_read(12, true).await.unwrap();
    assert!(message.is_read);
    assert_eq!(mock.json_bodies.lock().unwrap()[0], json!({"is_read": true}));

    let err = messages.remove("12").await.unwrap_err();
    assert_eq!(ObraError::from_anyhow(&err).unwrap().kind, ErrorKind::MethodNotAllowed);

    let err = messages
        .patch(Some("12"), json!({"message": "editado"}).into())
        .await
        .unwrap_err();
    assert_eq!(ObraError::from_anyhow(&err).unwrap().kind, ErrorKind::BadRequest);
}

#[tokio::test]
async fn eager_media_actions_hit_the_sub_resources() {
    let (base, mock) = spawn_api().await;
    let api = logged_in_client(&base, Arc::new(EventHub::new()));
    let images = api.project_images();

    let media = images.replace_now(&MediaId::from(101u64), jpg("nueva.jpg")).await.unwrap();
    assert_eq!(media.id.as_str(), "101");
    assert_eq!(media.url, "/media/projects/101-v2.jpg");
    let parts = mock.parts.lock().unwrap().clone();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].name, "image");

    images.delete_now(&MediaId::from(102u64)).await.unwrap();

    let err = images
        .replace_now(
            &MediaId::from(101u64),
            LocalFile::new("recorrido.mp4", "video/mp4", vec![0u8; 4]),
        )
        .await
        .unwrap_err();
    assert_eq!(
        ObraError::from_anyhow(&err).unwrap().class(),
        obra_core::ErrorClass::FileRejected
    );
}
