use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, RwLock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

static LISTENER_ID: AtomicU64 = AtomicU64::new(1);

fn next_listener_id() -> ListenerId {
    ListenerId(LISTENER_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A short, transient, user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Things the client tells whoever renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Notice(Notice),
    LoggedIn { email: Option<String> },
    /// The server refused the token; the session has already been cleared.
    SessionExpired,
    LoggedOut,
    Saved { resource: String },
}

pub type EventListener = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

#[derive(Clone)]
struct ListenerEntry {
    id: ListenerId,
    listener: EventListener,
    once: bool,
}

/// Minimal synchronous event hub.
///
/// Emission snapshots the listener list under a read lock and calls the
/// listeners with no lock held, so a listener may register or remove
/// listeners itself.
#[derive(Default)]
pub struct EventHub {
    listeners: RwLock<Vec<ListenerEntry>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, listener: EventListener) -> ListenerId {
        self.push(listener, false)
    }

    pub fn once(&self, listener: EventListener) -> ListenerId {
        self.push(listener, true)
    }

    fn push(&self, listener: EventListener, once: bool) -> ListenerId {
        let id = next_listener_id();
        let mut guard = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        guard.push(ListenerEntry { id, listener, once });
        id
    }

    pub fn off(&self, id: ListenerId) -> bool {
        let mut guard = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        let before = guard.len();
        guard.retain(|e| e.id != id);
        guard.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn emit(&self, event: &ClientEvent) {
        let snapshot: Vec<ListenerEntry> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let mut fired_once = Vec::new();
        for entry in &snapshot {
            (entry.listener)(event);
            if entry.once {
                fired_once.push(entry.id);
            }
        }

        if !fired_once.is_empty() {
            let mut guard = self.listeners.write().unwrap_or_else(|e| e.into_inner());
            guard.retain(|e| !fired_once.contains(&e.id));
        }
    }

    pub fn notify(&self, notice: Notice) {
        self.emit(&ClientEvent::Notice(notice));
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
