//! Eager per-attachment endpoints (`project-images/{id}/`,
//! `project-videos/{id}/`).
//!
//! These act on the server immediately and bypass any open edit session.
//! Staged edits go through `submit_session` instead.

use anyhow::Result;
use obra_core::{LocalFile, MultipartPayload, ObraError, RequestBody};
use obra_media::{MediaId, MediaKind, PersistedMedia};
use serde_json::Value;
use tracing::{info, instrument};

use crate::client::ApiClient;

#[derive(Clone, Debug)]
pub struct MediaItems {
    client: ApiClient,
    kind: MediaKind,
    path: &'static str,
    field: &'static str,
}

impl MediaItems {
    pub fn new(client: ApiClient, kind: MediaKind) -> Self {
        let (path, field) = match kind {
            MediaKind::Image => ("project-images/", "image"),
            MediaKind::Video => ("project-videos/", "video"),
        };
        Self {
            client,
            kind,
            path,
            field,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    fn item_path(&self, id: &MediaId) -> String {
        format!("{}{}/", self.path, id)
    }

    /// Upload `file` in place of attachment `id`, keeping the id.
    #[instrument(skip(self, id, file), fields(path = self.path, id = %id))]
    pub async fn replace_now(&self, id: &MediaId, file: LocalFile) -> Result<PersistedMedia> {
        if !file.content_type.starts_with(self.kind.mime_prefix()) {
            return Err(ObraError::unsupported_media_type(format!(
                "{} no es un archivo de tipo {}",
                file.filename,
                self.kind.mime_prefix().trim_end_matches('/')
            ))
            .into_anyhow());
        }

        let mut payload = MultipartPayload::new();
        payload.push_file(self.field, file);
        let record: Value = self
            .client
            .patch(&self.item_path(id), RequestBody::Multipart(payload))
            .await?;
        let media = self.parse(&record).unwrap_or_else(|| PersistedMedia::new(id.clone(), String::new()));
        info!(id = %media.id, "attachment replaced");
        Ok(media)
    }

    #[instrument(skip(self, id), fields(path = self.path, id = %id))]
    pub async fn delete_now(&self, id: &MediaId) -> Result<()> {
        self.client.delete(&self.item_path(id)).await?;
        info!("attachment deleted");
        Ok(())
    }

    fn parse(&self, record: &Value) -> Option<PersistedMedia> {
        let id = match record.get("id")? {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            _ => return None,
        };
        let url = record.get(self.field)?.as_str()?.to_string();
        Some(PersistedMedia::new(id, url))
    }
}

impl ApiClient {
    pub fn project_images(&self) -> MediaItems {
        MediaItems::new(self.clone(), MediaKind::Image)
    }

    pub fn project_videos(&self) -> MediaItems {
        MediaItems::new(self.clone(), MediaKind::Video)
    }
}
