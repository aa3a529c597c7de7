use bytes::Bytes;
use serde_json::Value;

/// A file picked on the client, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl LocalFile {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lower-cased extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.filename.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    File(LocalFile),
}

/// One named multipart part. Names repeat for list fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub value: PartValue,
}

impl Part {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PartValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, file: LocalFile) -> Self {
        Self {
            name: name.into(),
            value: PartValue::File(file),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            PartValue::Text(s) => Some(s),
            PartValue::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&LocalFile> {
        match &self.value {
            PartValue::File(f) => Some(f),
            PartValue::Text(_) => None,
        }
    }
}

/// A transport-agnostic multipart body, in send order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartPayload {
    parts: Vec<Part>,
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, part: Part) {
        self.parts.push(part);
    }

    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.push(Part::text(name, value));
    }

    pub fn push_file(&mut self, name: impl Into<String>, file: LocalFile) {
        self.push(Part::file(name, file));
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Part> + 'a {
        self.parts.iter().filter(move |p| p.name == name)
    }

    pub fn texts<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        self.named(name).filter_map(Part::as_text).collect()
    }

    pub fn files<'a>(&'a self, name: &'a str) -> Vec<&'a LocalFile> {
        self.named(name).filter_map(Part::as_file).collect()
    }

    pub fn has_files(&self) -> bool {
        self.parts.iter().any(|p| p.as_file().is_some())
    }
}

/// Body of a create/patch call.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Multipart(MultipartPayload),
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<MultipartPayload> for RequestBody {
    fn from(payload: MultipartPayload) -> Self {
        RequestBody::Multipart(payload)
    }
}
