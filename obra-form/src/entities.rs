//! Field registries and media channels for each CMS entity form.

use obra_media::{ChannelConfig, PersistedMedia};
use serde_json::Value;

use crate::field::{FieldRegistry, FieldSpec};
use crate::session::EditSession;

pub const PROJECT_STATUSES: &[&str] = &["en_proceso", "entregado"];

pub fn project_fields() -> FieldRegistry {
    FieldRegistry::new()
        .field(
            FieldSpec::text("name")
                .required_with("El nombre del proyecto es obligatorio.")
                .max_length(200),
        )
        .field(FieldSpec::integer("category").required_with("Debes seleccionar una categoría."))
        .field(FieldSpec::text("location").required_with("La ubicación es requerida."))
        .field(
            FieldSpec::choice("status", PROJECT_STATUSES)
                .required_with("Debes seleccionar el estado del proyecto."),
        )
        .field(FieldSpec::boolean("is_featured"))
        .field(FieldSpec::text("description"))
        .field(FieldSpec::text("service_type"))
        .field(FieldSpec::text("levels"))
        .field(FieldSpec::text("area"))
        .field(FieldSpec::integer("year").range(1900, 2100))
        .field(FieldSpec::json("extra_info"))
}

pub fn service_fields() -> FieldRegistry {
    FieldRegistry::new()
        .field(FieldSpec::text("name").required_with("Nombre y descripción requeridos"))
        .field(FieldSpec::text("description").required_with("Nombre y descripción requeridos"))
}

pub fn client_fields() -> FieldRegistry {
    FieldRegistry::new().field(FieldSpec::text("name").required_with("El nombre es obligatorio"))
}

pub fn about_fields() -> FieldRegistry {
    FieldRegistry::new()
        .field(FieldSpec::text("description"))
        .field(FieldSpec::text("mission"))
        .field(FieldSpec::text("vision"))
}

pub fn category_fields() -> FieldRegistry {
    FieldRegistry::new().field(
        FieldSpec::text("name")
            .required_with("El nombre es obligatorio")
            .max_length(100),
    )
}

pub fn company_info_fields() -> FieldRegistry {
    FieldRegistry::new()
        .field(FieldSpec::text("phone"))
        .field(FieldSpec::text("email").email())
        .field(FieldSpec::text("address"))
        .field(FieldSpec::text("google_maps_url").url())
        .field(FieldSpec::text("google_maps_link").url())
        .field(FieldSpec::text("opening_hours"))
        .field(FieldSpec::text("facebook").url())
        .field(FieldSpec::text("instagram").url())
        .field(FieldSpec::text("linkedin").url())
        .field(FieldSpec::text("tiktok").url())
        .field(FieldSpec::text("whatsapp"))
}

/// Attachments listed under `key` as `[{id, <url_key>}]`.
fn media_list(record: &Value, key: &str, url_key: &str) -> Vec<PersistedMedia> {
    record
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let id = match item.get("id")? {
                        Value::Number(n) => n.to_string(),
                        Value::String(s) => s.clone(),
                        _ => return None,
                    };
                    let url = item.get(url_key)?.as_str()?;
                    Some(PersistedMedia::new(id, url))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// A single file stored as a URL under `key`. The slot id is the field name.
fn single_media(record: &Value, key: &str) -> Vec<PersistedMedia> {
    match record.get(key).and_then(Value::as_str) {
        Some(url) if !url.is_empty() => vec![PersistedMedia::new(key, url)],
        _ => Vec::new(),
    }
}

/// One media channel of an entity form plus how to read its attachments off
/// a server record.
#[derive(Debug, Clone)]
pub struct ChannelBinding {
    pub config: ChannelConfig,
    pub seed: fn(&Value) -> Vec<PersistedMedia>,
    pub required_on_create: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct EntityForm {
    pub name: &'static str,
    pub registry: FieldRegistry,
    pub channels: Vec<ChannelBinding>,
}

impl EntityForm {
    pub fn project() -> Self {
        Self {
            name: "project",
            registry: project_fields(),
            channels: vec![
                ChannelBinding {
                    config: ChannelConfig::project_images(),
                    seed: |r| media_list(r, "images", "image"),
                    required_on_create: None,
                },
                ChannelBinding {
                    config: ChannelConfig::project_videos(),
                    seed: |r| media_list(r, "videos", "video"),
                    required_on_create: None,
                },
            ],
        }
    }

    pub fn service() -> Self {
        Self {
            name: "service",
            registry: service_fields(),
            channels: vec![ChannelBinding {
                config: ChannelConfig::service_image(),
                seed: |r| single_media(r, "image"),
                required_on_create: None,
            }],
        }
    }

    pub fn client() -> Self {
        Self {
            name: "client",
            registry: client_fields(),
            channels: vec![ChannelBinding {
                config: ChannelConfig::client_logo(),
                seed: |r| single_media(r, "image"),
                required_on_create: Some("La imagen es obligatoria para nuevos clientes"),
            }],
        }
    }

    pub fn about() -> Self {
        Self {
            name: "about",
            registry: about_fields(),
            channels: vec![ChannelBinding {
                config: ChannelConfig::about_image(),
                seed: |r| single_media(r, "image"),
                required_on_create: None,
            }],
        }
    }

    pub fn category() -> Self {
        Self {
            name: "category",
            registry: category_fields(),
            channels: Vec::new(),
        }
    }

    pub fn company_info() -> Self {
        Self {
            name: "company_info",
            registry: company_info_fields(),
            channels: Vec::new(),
        }
    }

    /// Apply a per-file size limit to every channel.
    pub fn with_max_file_bytes(mut self, bytes: u64) -> Self {
        for binding in &mut self.channels {
            binding.config.accept.max_file_bytes = bytes;
        }
        self
    }

    /// Edit session over an existing record.
    pub fn open(&self, record: &Value) -> EditSession {
        let channels = self
            .channels
            .iter()
            .map(|b| (b.config.clone(), (b.seed)(record)))
            .collect();
        EditSession::open(self.registry.clone(), record, channels)
    }

    /// Edit session for a new record.
    pub fn create(&self) -> EditSession {
        let mut session = EditSession::create(
            self.registry.clone(),
            self.channels.iter().map(|b| b.config.clone()).collect(),
        );
        for binding in &self.channels {
            if let Some(message) = binding.required_on_create {
                session = session.require_media(binding.config.name.clone(), message);
            }
        }
        session
    }
}
