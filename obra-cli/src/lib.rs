//! # obra-cli
//!
//! `obra` command line: the admin side of the CMS from a terminal. Commands
//! share one `App`, built from defaults, `OBRA__*` environment variables and
//! command line flags, in that order of precedence.

pub mod cli;
pub mod commands;
pub mod edit;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use obra_auth::{AuthOptions, FileTokenStorage, SessionStore};
use obra_core::config::{API_BASE_URL, AUTH_STORAGE_PATH, MEDIA_MAX_FILE_BYTES};
use obra_core::{ClientEvent, EventHub, NoticeLevel, ObraConfig, ObraConfigSnapshot};
use obra_rest::ApiClient;
use tracing::debug;

use crate::cli::Cli;

pub const ENV_PREFIX: &str = "OBRA__";

pub struct App {
    pub config: ObraConfigSnapshot,
    pub events: Arc<EventHub>,
    pub api: ApiClient,
    pub json: bool,
}

impl App {
    pub fn max_file_bytes(&self) -> Option<u64> {
        self.config.get_u64(MEDIA_MAX_FILE_BYTES)
    }
}

/// Defaults, then `OBRA__*` variables, then flags.
pub fn load_config(cli: &Cli) -> ObraConfigSnapshot {
    let mut config = ObraConfig::with_defaults();
    let applied = config.load_env(ENV_PREFIX);
    debug!(applied, "environment overrides loaded");

    if let Some(base_url) = &cli.base_url {
        config.set(API_BASE_URL, base_url.clone());
    }
    if let Some(path) = &cli.session_file {
        config.set(AUTH_STORAGE_PATH, path.display().to_string());
    }
    if !config.has(AUTH_STORAGE_PATH) {
        config.set(AUTH_STORAGE_PATH, default_session_path().display().to_string());
    }
    config.snapshot()
}

fn default_session_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".obra").join("session.json"),
        None => PathBuf::from(".obra-session.json"),
    }
}

/// Notices go to stderr so `--json` output stays clean.
fn print_notices(event: &ClientEvent) {
    match event {
        ClientEvent::Notice(notice) => match notice.level {
            NoticeLevel::Error => eprintln!("✗ {}", notice.message),
            NoticeLevel::Success => eprintln!("✓ {}", notice.message),
            NoticeLevel::Info => eprintln!("· {}", notice.message),
        },
        ClientEvent::SessionExpired => eprintln!("· sesión cerrada"),
        _ => {}
    }
}

pub fn build(cli: &Cli) -> Result<App> {
    let config = load_config(cli);
    let options = AuthOptions::from_config(&config);
    options.validate().map_err(anyhow::Error::msg)?;

    let path = options
        .storage_path
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(default_session_path);
    let storage = Arc::new(FileTokenStorage::new(path));
    let session = Arc::new(SessionStore::restore(storage, options.expiry_skew)?);

    let events = Arc::new(EventHub::new());
    events.on(Arc::new(print_notices));

    let api = ApiClient::from_config(&config, session, Arc::clone(&events))?;
    debug!(base_url = api.base_url(), authenticated = api.session().is_authenticated(), "client ready");

    Ok(App {
        config,
        events,
        api,
        json: cli.json,
    })
}

/// Build the app and run one command.
pub async fn run(cli: Cli) -> Result<()> {
    let app = build(&cli)?;
    commands::dispatch(&app, cli.command).await
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn flags_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let session_file = dir.path().join("s.json");
        let cli = Cli::try_parse_from([
            "obra",
            "--base-url",
            "https://cms.example.pe/api/",
            "--session-file",
            session_file.to_str().unwrap(),
            "whoami",
        ])
        .unwrap();

        let app = build(&cli).unwrap();
        assert_eq!(app.api.base_url(), "https://cms.example.pe/api/");
        assert_eq!(
            app.config.get(AUTH_STORAGE_PATH),
            Some(session_file.display().to_string().as_str())
        );
        assert!(!app.api.session().is_authenticated());
        assert_eq!(app.max_file_bytes(), Some(50 * 1024 * 1024));
    }
}
