use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use obra_media::PersistedMedia;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    EnProceso,
    Entregado,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::EnProceso => "en_proceso",
            ProjectStatus::Entregado => "entregado",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::EnProceso => "En proceso",
            ProjectStatus::Entregado => "Entregado",
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en_proceso" => Ok(ProjectStatus::EnProceso),
            "entregado" => Ok(ProjectStatus::Entregado),
            other => Err(format!("unknown project status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectImage {
    pub id: u64,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectVideo {
    pub id: u64,
    pub video: String,
}

impl From<&ProjectImage> for PersistedMedia {
    fn from(image: &ProjectImage) -> Self {
        PersistedMedia::new(image.id, image.image.clone())
    }
}

impl From<&ProjectVideo> for PersistedMedia {
    fn from(video: &ProjectVideo) -> Self {
        PersistedMedia::new(video.id, video.video.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: u64,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    pub location: String,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub levels: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    pub status: ProjectStatus,
    #[serde(default)]
    pub extra_info: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub images: Vec<ProjectImage>,
    #[serde(default)]
    pub videos: Vec<ProjectVideo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Filter values accepted by `projects/`.
    pub fn filters(category: Option<u64>, status: Option<ProjectStatus>, featured: Option<bool>) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(category) = category {
            out.push(("category", category.to_string()));
        }
        if let Some(status) = status {
            out.push(("status", status.as_str().to_string()));
        }
        if let Some(true) = featured {
            out.push(("is_featured", "true".to_string()));
        }
        out
    }
}
