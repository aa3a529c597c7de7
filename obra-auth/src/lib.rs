//! # obra-auth
//!
//! Token pair handling for the Obra CMS client: login, verify, refresh and
//! profile calls against the JWT endpoints, a `SessionStore` that mirrors the
//! session into a `TokenStorage`, and unverified claim inspection so the
//! client can refresh before the server bounces a request.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use obra_auth::{MemoryTokenStorage, SessionStore, TokenPair};
//!
//! let store = SessionStore::new(Arc::new(MemoryTokenStorage::new()), Duration::from_secs(30));
//! store
//!     .acquire_on_login(TokenPair { access: "a".into(), refresh: "r".into() }, None)
//!     .unwrap();
//! assert!(store.is_authenticated());
//! store.clear_on_logout().unwrap();
//! assert!(!store.is_authenticated());
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod models;
pub mod options;
pub mod session;
pub mod storage;
pub mod token;

pub use client::{AuthClient, SESSION_EXPIRED_MESSAGE};
pub use error::{SessionError, SessionResult};
pub use models::{LoginRequest, User};
pub use options::{AuthEndpoints, AuthOptions, AuthOptionsBuilder};
pub use session::SessionStore;
pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};
pub use token::{Claims, RefreshedToken, TokenPair};
