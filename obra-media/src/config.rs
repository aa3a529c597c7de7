use obra_core::LocalFile;

use crate::error::RejectReason;
use crate::types::MediaKind;

/// Default per-file limit (50 MiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// How the server is told that a persisted attachment should go away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionEncoding {
    /// One text part per id under this field (`delete_images=4`)
    ById(String),
    /// A boolean flag (`delete_image=true`)
    Flag(String),
    /// The file field itself sent empty (`image=`)
    ClearField(String),
    /// The server offers no way to drop the file; it can only be replaced
    Forbidden,
}

/// Which files a channel accepts
#[derive(Debug, Clone)]
pub struct AcceptRules {
    pub kind: MediaKind,

    /// Lower-case extensions without the dot. Empty means any.
    pub extensions: Vec<String>,

    /// Absolute max size for a single file
    pub max_file_bytes: u64,
}

impl AcceptRules {
    pub fn for_kind(kind: MediaKind) -> Self {
        Self {
            kind,
            extensions: kind.default_extensions().iter().map(|e| e.to_string()).collect(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    pub fn with_max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = bytes;
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Check a file against the rules. The MIME category is checked first
    /// since that is what a user most often gets wrong.
    pub fn check(&self, file: &LocalFile) -> Result<(), RejectReason> {
        let content_type = file.content_type.to_ascii_lowercase();
        if !content_type.starts_with(self.kind.mime_prefix()) {
            return Err(RejectReason::WrongCategory {
                content_type: file.content_type.clone(),
            });
        }
        if !self.extensions.is_empty() {
            let ext = file.extension();
            let allowed = ext
                .as_deref()
                .map(|e| self.extensions.iter().any(|a| a == e))
                .unwrap_or(false);
            if !allowed {
                return Err(RejectReason::Extension { extension: ext });
            }
        }
        if file.size() == 0 {
            return Err(RejectReason::Empty);
        }
        if file.size() > self.max_file_bytes {
            return Err(RejectReason::TooLarge {
                size: file.size(),
                max: self.max_file_bytes,
            });
        }
        Ok(())
    }
}

/// Configuration for one media channel of an entity form
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Stable name, also used as the error key for rejected files
    pub name: String,

    /// Multipart field new files are sent under
    pub upload_field: String,

    pub deletion: DeletionEncoding,

    /// `Some(1)` for single-file fields such as a cover image
    pub capacity: Option<usize>,

    pub accept: AcceptRules,
}

impl ChannelConfig {
    pub fn new<N: Into<String>, U: Into<String>>(name: N, kind: MediaKind, upload_field: U) -> Self {
        Self {
            name: name.into(),
            upload_field: upload_field.into(),
            deletion: DeletionEncoding::Forbidden,
            capacity: None,
            accept: AcceptRules::for_kind(kind),
        }
    }

    pub fn with_deletion(mut self, deletion: DeletionEncoding) -> Self {
        self.deletion = deletion;
        self
    }

    pub fn single(mut self) -> Self {
        self.capacity = Some(1);
        self
    }

    pub fn with_accept(mut self, accept: AcceptRules) -> Self {
        self.accept = accept;
        self
    }

    pub fn with_max_file_bytes(mut self, bytes: u64) -> Self {
        self.accept.max_file_bytes = bytes;
        self
    }

    pub fn kind(&self) -> MediaKind {
        self.accept.kind
    }

    pub fn is_single(&self) -> bool {
        self.capacity == Some(1)
    }

    pub fn can_delete(&self) -> bool {
        self.deletion != DeletionEncoding::Forbidden
    }

    // ---- Channels the CMS forms use ----

    pub fn project_images() -> Self {
        Self::new("images", MediaKind::Image, "uploaded_images")
            .with_deletion(DeletionEncoding::ById("delete_images".into()))
    }

    pub fn project_videos() -> Self {
        Self::new("videos", MediaKind::Video, "uploaded_videos")
            .with_deletion(DeletionEncoding::ById("delete_videos".into()))
    }

    pub fn service_image() -> Self {
        Self::new("image", MediaKind::Image, "image")
            .with_deletion(DeletionEncoding::ClearField("image".into()))
            .single()
    }

    pub fn about_image() -> Self {
        Self::new("image", MediaKind::Image, "image")
            .with_deletion(DeletionEncoding::Flag("delete_image".into()))
            .single()
    }

    /// Client logos can be swapped but never left empty.
    pub fn client_logo() -> Self {
        Self::new("image", MediaKind::Image, "image").single()
    }
}
