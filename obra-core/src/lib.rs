//! obra-core: shared vocabulary for the Obra CMS client stack.
//!
//! Errors, field errors, configuration, response envelopes, list queries,
//! multipart payloads, the resource trait every endpoint implements and the
//! event hub the client reports through.

pub mod config;
pub mod envelope;
pub mod errors;
pub mod events;
pub mod field_errors;
pub mod payload;
pub mod query;
pub mod resource;

pub use config::{ObraConfig, ObraConfigSnapshot};
pub use envelope::{error_from_body, normalize_value, ApiResponse, Envelope, Normalized, PageMeta, PaginatedList};
pub use errors::{ErrorClass, ErrorKind, ObraError, ObraResult};
pub use events::{ClientEvent, EventHub, EventListener, ListenerId, Notice, NoticeLevel};
pub use field_errors::FieldErrors;
pub use payload::{LocalFile, MultipartPayload, Part, PartValue, RequestBody};
pub use query::ListQuery;
pub use resource::{ObraResource, Page, ResourceCapabilities, ResourceMethod};
