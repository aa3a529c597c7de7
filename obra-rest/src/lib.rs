//! # obra-rest
//!
//! reqwest client for the Obra CMS API. `ApiClient` carries the base URL,
//! timeout and the shared `SessionStore`; typed handles (`projects()`,
//! `services()`, `company_info()`, ...) implement `ObraResource` on top of
//! it, and `submit_session` sends a staged `EditSession` as one request.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use obra_auth::{AuthOptions, MemoryTokenStorage, SessionStore};
//! use obra_core::{EventHub, ListQuery, ObraResource};
//! use obra_rest::ApiClient;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let session = Arc::new(SessionStore::new(Arc::new(MemoryTokenStorage::new()), Duration::from_secs(30)));
//! let api = ApiClient::new(
//!     "http://127.0.0.1:8000/api/",
//!     Duration::from_secs(10),
//!     AuthOptions::default(),
//!     session,
//!     Arc::new(EventHub::new()),
//! )?;
//! let page = api.projects().find(&ListQuery::new().filter("status", "entregado")).await?;
//! println!("{} proyectos", page.data.len());
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod client;
pub mod media;
pub mod models;
pub mod multipart;
pub mod resources;

pub use action::{stage_files, submit_session, ActionOutcome, Submission};
pub use client::ApiClient;
pub use media::MediaItems;
pub use resources::{Collection, Singleton};
