//! Turn `--set/--clear/--add-image/...` flags into staged session edits.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use obra_core::{EventHub, LocalFile};
use obra_form::EditSession;
use obra_media::{MediaError, MediaId};
use obra_rest::stage_files;
use tracing::debug;

use crate::cli::EditArgs;

/// Content type from the file extension; the server checks the bytes.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

pub fn read_local_file(path: &Path) -> Result<LocalFile> {
    let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("{} has no file name", path.display()))?;
    Ok(LocalFile::new(filename, content_type_for(path), bytes))
}

fn split_pair<'a>(raw: &'a str, flag: &str) -> Result<(&'a str, &'a str)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => bail!("--{flag} expects KEY=VALUE, got '{raw}'"),
    }
}

/// Validated form of `EditArgs`.
#[derive(Debug, Default, PartialEq)]
pub struct EditPlan {
    pub set: Vec<(String, String)>,
    pub clear: Vec<String>,
    pub add_images: Vec<PathBuf>,
    pub add_videos: Vec<PathBuf>,
    pub delete_images: Vec<MediaId>,
    pub delete_videos: Vec<MediaId>,
    pub replace_images: Vec<(MediaId, PathBuf)>,
}

impl EditPlan {
    pub fn parse(args: &EditArgs) -> Result<Self> {
        let set = args
            .set
            .iter()
            .map(|raw| split_pair(raw, "set").map(|(k, v)| (k.to_string(), v.to_string())))
            .collect::<Result<Vec<_>>>()?;
        let replace_images = args
            .replace_image
            .iter()
            .map(|raw| split_pair(raw, "replace-image").map(|(id, path)| (MediaId::from(id), PathBuf::from(path))))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            set,
            clear: args.clear.clone(),
            add_images: args.add_image.clone(),
            add_videos: args.add_video.clone(),
            delete_images: args.delete_image.iter().map(|id| MediaId::from(id.as_str())).collect(),
            delete_videos: args.delete_video.iter().map(|id| MediaId::from(id.as_str())).collect(),
            replace_images,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Stage every change on `session`. Files are read here; refused files
    /// are announced on `events` and returned without aborting the edit.
    pub fn apply(&self, session: &mut EditSession, events: &EventHub) -> Result<Vec<MediaError>> {
        for (field, value) in &self.set {
            session.set_input(field, value)?;
        }
        for field in &self.clear {
            session.clear(field)?;
        }

        for (channel, ids) in [("images", &self.delete_images), ("videos", &self.delete_videos)] {
            for id in ids {
                let slot = find_slot(session, channel, id)?;
                session.mark_delete(channel, slot)?;
            }
        }
        for (id, path) in &self.replace_images {
            let slot = find_slot(session, "images", id)?;
            session.replace("images", slot, read_local_file(path)?)?;
        }

        let mut rejected = Vec::new();
        for (channel, paths) in [("images", &self.add_images), ("videos", &self.add_videos)] {
            if paths.is_empty() {
                continue;
            }
            let files = paths.iter().map(|p| read_local_file(p)).collect::<Result<Vec<_>>>()?;
            let report = stage_files(session, channel, files, events)?;
            debug!(channel, added = report.added.len(), rejected = report.rejected.len(), "files staged");
            rejected.extend(report.rejected);
        }
        Ok(rejected)
    }
}

fn find_slot(session: &EditSession, channel: &str, id: &MediaId) -> Result<obra_media::SlotId> {
    session
        .ledger(channel)
        .and_then(|ledger| ledger.find_by_media_id(id))
        .ok_or_else(|| anyhow!("{channel}: no attachment with id {id}"))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use obra_core::{ClientEvent, NoticeLevel};
    use obra_form::EntityForm;
    use serde_json::json;

    use super::*;

    fn record() -> serde_json::Value {
        json!({
            "slug": "casa-miraflores",
            "name": "Casa Miraflores",
            "location": "Lima",
            "status": "entregado",
            "images": [{"id": 4, "image": "/media/4.jpg"}, {"id": 9, "image": "/media/9.jpg"}],
            "videos": [{"id": 2, "video": "/media/2.mp4"}]
        })
    }

    #[test]
    fn pairs_must_have_keys() {
        let args = EditArgs {
            set: vec!["=x".into()],
            ..EditArgs::default()
        };
        assert!(EditPlan::parse(&args).is_err());

        let args = EditArgs {
            set: vec!["extra_info={\"a\":\"b=c\"}".into()],
            ..EditArgs::default()
        };
        let plan = EditPlan::parse(&args).unwrap();
        assert_eq!(plan.set[0], ("extra_info".to_string(), "{\"a\":\"b=c\"}".to_string()));
    }

    #[test]
    fn plan_stages_fields_and_media() {
        let dir = tempfile::tempdir().unwrap();
        let fachada = dir.path().join("fachada.JPG");
        let patio = dir.path().join("patio.png");
        let notas = dir.path().join("notas.txt");
        fs::write(&fachada, [0xFF, 0xD8]).unwrap();
        fs::write(&patio, [0x89, 0x50]).unwrap();
        fs::write(&notas, b"hola").unwrap();

        let plan = EditPlan::parse(&EditArgs {
            set: vec!["name=Casa Miraflores II".into(), "year=2021".into()],
            clear: vec!["area".into()],
            add_image: vec![fachada, notas],
            delete_video: vec!["2".into()],
            replace_image: vec![format!("9={}", patio.display())],
            ..EditArgs::default()
        })
        .unwrap();

        let events = EventHub::new();
        let notices = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&notices);
        events.on(Arc::new(move |e: &ClientEvent| {
            if let ClientEvent::Notice(n) = e {
                sink.lock().unwrap().push(n.clone());
            }
        }));

        let mut session = EntityForm::project().open(&record()).with_key("casa-miraflores");
        let rejected = plan.apply(&mut session, &events).unwrap();
        assert_eq!(rejected.len(), 1);
        let notices = notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(notices[0].message.starts_with("notas.txt"));

        let payload = session.payload();
        assert_eq!(payload.texts("name"), vec!["Casa Miraflores II"]);
        assert_eq!(payload.texts("year"), vec!["2021"]);
        assert_eq!(payload.texts("area"), vec![""]);
        let uploads: Vec<&str> = payload
            .files("uploaded_images")
            .iter()
            .map(|f| f.filename.as_str())
            .collect();
        assert_eq!(uploads, vec!["patio.png", "fachada.JPG"]);
        assert_eq!(payload.files("uploaded_images")[1].content_type, "image/jpeg");
        assert_eq!(payload.texts("delete_images"), vec!["9"]);
        assert_eq!(payload.texts("delete_videos"), vec!["2"]);
        session.cancel();
    }

    #[test]
    fn unknown_media_id_is_an_error() {
        let plan = EditPlan::parse(&EditArgs {
            delete_image: vec!["77".into()],
            ..EditArgs::default()
        })
        .unwrap();
        let mut session = EntityForm::project().open(&record());
        let err = plan.apply(&mut session, &EventHub::new()).unwrap_err();
        assert!(err.to_string().contains("77"));
    }
}
