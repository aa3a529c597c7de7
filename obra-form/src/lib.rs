//! # obra-form: staged edit sessions
//!
//! An `EditSession` holds one entity's scalar fields (`FormState`, driven by
//! a typed `FieldRegistry`) together with a `MediaLedger` per media channel.
//! Nothing reaches the server until `payload()`/`body()` is sent; a rejected
//! submit puts the server's field errors back on the form and leaves every
//! staged file in place.
//!
//! ```rust
//! use obra_core::LocalFile;
//! use obra_form::EntityForm;
//! use serde_json::json;
//!
//! let record = json!({
//!     "slug": "casa-miraflores",
//!     "name": "Casa Miraflores",
//!     "location": "Lima",
//!     "images": [{"id": 4, "image": "/media/4.jpg"}, {"id": 9, "image": "/media/9.jpg"}],
//! });
//!
//! let mut session = EntityForm::project().open(&record).with_key("casa-miraflores");
//! let first = session.ledger("images").unwrap().slots()[0].id;
//! session.mark_delete("images", first).unwrap();
//! session
//!     .add_files("images", vec![LocalFile::new("nueva.jpg", "image/jpeg", vec![1u8, 2, 3])])
//!     .unwrap();
//!
//! let payload = session.payload();
//! assert_eq!(payload.texts("delete_images"), vec!["4"]);
//! assert_eq!(payload.files("uploaded_images").len(), 1);
//! assert!(payload.named("location").next().is_none());
//! ```

pub mod entities;
mod error;
pub mod field;
pub mod form;
pub mod session;
pub mod translate;
pub mod validate;

pub use entities::{ChannelBinding, EntityForm};
pub use error::{FormError, FormResult};
pub use field::{ClearPolicy, FieldKind, FieldRegistry, FieldRule, FieldSpec, Transform};
pub use form::{FieldStatus, FormState};
pub use session::EditSession;
pub use translate::{translate, SubmitPayload};
pub use validate::{field_errors_from, validate, validate_struct};
