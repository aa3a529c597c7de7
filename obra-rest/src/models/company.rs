use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A client company shown in the logo marquee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientLogo {
    pub id: u64,
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub order: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AboutUs {
    pub id: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mission: String,
    #[serde(default)]
    pub vision: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyInfo {
    pub id: u64,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub google_maps_url: String,
    pub google_maps_link: String,
    pub opening_hours: String,
    pub facebook: String,
    pub instagram: String,
    pub linkedin: String,
    pub tiktok: String,
    pub whatsapp: String,
}

impl CompanyInfo {
    /// Social links that are actually set, as `(network, url)`.
    pub fn social_links(&self) -> Vec<(&'static str, &str)> {
        [
            ("facebook", self.facebook.as_str()),
            ("instagram", self.instagram.as_str()),
            ("linkedin", self.linkedin.as_str()),
            ("tiktok", self.tiktok.as_str()),
            ("whatsapp", self.whatsapp.as_str()),
        ]
        .into_iter()
        .filter(|(_, url)| !url.trim().is_empty())
        .collect()
    }
}
