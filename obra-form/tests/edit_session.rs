use obra_core::{error_from_body, FieldErrors, LocalFile, RequestBody};
use obra_form::{EntityForm, FieldStatus};
use obra_media::{PreviewRegistry, SlotState};
use serde_json::{json, Value};

fn project_record() -> Value {
    json!({
        "id": 31,
        "slug": "residencial-los-olivos",
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

fn jpg(name: &str) -> LocalFile {
    LocalFile::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
}

#[test]
fn unmodified_persisted_media_never_reaches_the_payload() {
    let mut session = EntityForm::project().open(&project_record());
    session.set("name", "Residencial Los Olivos II").unwrap();

    let payload = session.payload();
    assert!(payload.named("uploaded_images").next().is_none());
    assert!(payload.named("delete_images").next().is_none());
    assert!(payload.named("uploaded_videos").next().is_none());
    assert!(payload.named("delete_videos").next().is_none());
    for part in payload.parts() {
        if let Some(text) = part.as_text() {
            assert!(!text.contains("/media/projects/"));
        }
    }
    assert_eq!(payload.len(), 1);
}

#[test]
fn delete_one_add_one_yields_exactly_two_media_parts() {
    let mut session = EntityForm::project().open(&project_record());
    let a = session.ledger("images").unwrap().slots()[0].id;

    session.mark_delete("images", a).unwrap();
    let report = session.add_files("images", vec![jpg("fachada-nueva.jpg")]).unwrap();
    assert!(report.all_accepted());

    let payload = session.payload();
    assert_eq!(payload.texts("delete_images"), vec!["101"]);
    let uploads = payload.files("uploaded_images");
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].filename, "fachada-nueva.jpg");
    assert_eq!(uploads[0].bytes.as_ref(), &[0xFF, 0xD8, 0xFF, 0xE0]);

    // image 102 was never mentioned
    assert!(payload.parts().iter().all(|p| p.as_text() != Some("102")));
    assert_eq!(payload.len(), 2);
}

#[test]
fn untouched_field_is_omitted_and_cleared_field_is_sent_empty() {
    let mut session = EntityForm::project().open(&project_record());
    session.clear("service_type").unwrap();
    session.set("levels", "8").unwrap();

    let payload = session.payload();
    assert!(payload.named("location").next().is_none());
    assert_eq!(payload.texts("service_type"), vec![""]);
    assert_eq!(payload.texts("levels"), vec!["8"]);
    assert_eq!(session.form().status("location"), FieldStatus::Untouched);
}

#[test]
fn server_field_errors_surface_and_staged_media_survives() {
    let previews = PreviewRegistry::new();
    let form = EntityForm::project();
    let channels = form
        .channels
        .iter()
        .map(|b| (b.config.clone(), (b.seed)(&project_record())))
        .collect();
    let mut session = obra_form::EditSession::open_with(
        form.registry.clone(),
        &project_record(),
        channels,
        previews.clone(),
    );

    let b = session.ledger("images").unwrap().slots()[1].id;
    session.replace("images", b, jpg("reemplazo.jpg")).unwrap();
    session.add_files("images", vec![jpg("nueva.jpg")]).unwrap();
    session.set("name", "").unwrap();
    let before = session.payload();
    let live_before = previews.stats().live;

    let err = error_from_body(400, r#"{"name": ["Required"]}"#);
    session.on_rejected(err.field_errors().cloned().unwrap_or_default());

    assert_eq!(session.form().error("name"), Some("Required"));
    assert_eq!(session.payload(), before);
    assert_eq!(previews.stats().live, live_before);
    assert!(matches!(
        session.ledger("images").unwrap().get(b).unwrap().state,
        SlotState::PendingReplace { .. }
    ));

    session.cancel();
    assert_eq!(previews.stats().live, 0);
    assert_eq!(previews.stats().created, previews.stats().released);
}

#[test]
fn client_side_validation_blocks_submit_and_keeps_errors() {
    let mut session = EntityForm::project().create();
    session.set("name", "Oficinas San Isidro").unwrap();

    let errors = session.prepare().unwrap_err();
    assert_eq!(errors.first("category"), Some("Debes seleccionar una categoría."));
    assert_eq!(errors.first("location"), Some("La ubicación es requerida."));
    assert_eq!(session.form().error("status"), Some("Debes seleccionar el estado del proyecto."));

    session.set_input("category", "3").unwrap();
    session.set("location", "San Isidro").unwrap();
    session.set("status", "en_proceso").unwrap();
    let body = session.prepare().unwrap();
    let RequestBody::Multipart(payload) = body else {
        panic!("project bodies are multipart");
    };
    assert_eq!(payload.texts("category"), vec!["3"]);
    assert!(session.form().errors().is_empty());
}

#[test]
fn entities_without_media_submit_json() {
    let mut session = EntityForm::category().open(&json!({"id": 4, "name": "Comercial"}));
    session.set("name", "Comercial e Industrial").unwrap();
    match session.prepare().unwrap() {
        RequestBody::Json(body) => assert_eq!(body, json!({"name": "Comercial e Industrial"})),
        RequestBody::Multipart(_) => panic!("categories are JSON"),
    }
}

#[test]
fn rejected_files_are_reported_not_staged() {
    let mut session = EntityForm::project().open(&project_record());
    let report = session
        .add_files(
            "videos",
            vec![
                jpg("foto.jpg"),
                LocalFile::new("recorrido.mp4", "video/mp4", vec![0u8; 16]),
            ],
        )
        .unwrap();

    assert_eq!(report.added.len(), 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(session.payload().files("uploaded_videos").len(), 1);
    assert!(session.add_files("planos", Vec::<LocalFile>::new()).is_err());
}

#[test]
fn about_image_delete_is_a_flag() {
    let record = json!({"id": 1, "description": "Somos", "mission": "", "vision": "", "image": "/media/about.jpg"});
    let mut session = EntityForm::about().open(&record);
    let slot = session.ledger("image").unwrap().slots()[0].id;
    session.mark_delete("image", slot).unwrap();
    session.set("mission", "Construir con calidad").unwrap();

    let payload = session.payload();
    let names: Vec<&str> = payload.parts().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["mission", "delete_image"]);
}

#[test]
fn server_errors_round_trip_through_field_errors() {
    let mut session = EntityForm::service().open(&json!({"id": 2, "name": "Diseño", "description": "x", "image": null}));
    let mut errors = FieldErrors::new();
    errors.push_field("image", "Formato no soportado");
    session.on_rejected(errors);
    assert_eq!(session.form().error("image"), Some("Formato no soportado"));
}
