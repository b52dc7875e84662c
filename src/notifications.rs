//! Transient user-facing notifications
//!
//! The presenter holds a view-model: the ordered list of visible notifications
//! plus a stream of [`NotificationEvent`]s the host UI renders from. Timed
//! removal runs as tokio tasks whose abort handles are kept so they can be
//! cancelled on dismissal or shutdown.

use chrono::{DateTime, Utc};
use papaya::HashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::config::DEFAULT_NOTIFICATION_DURATION;

/// Buffered events per subscriber before the slowest one starts lagging
const SURFACE_CAPACITY: usize = 64;

pub type NotificationId = u64;

/// Severity of a notification, which drives its styling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

impl NotificationKind {
    /// Parse a kind name; anything unrecognised is `Info`
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "success" => NotificationKind::Success,
            "error" => NotificationKind::Error,
            "warning" => NotificationKind::Warning,
            _ => NotificationKind::Info,
        }
    }

    /// Background class of the progress bar
    pub fn accent_class(&self) -> &'static str {
        match self {
            NotificationKind::Success => "bg-green-500",
            NotificationKind::Error => "bg-red-500",
            NotificationKind::Warning => "bg-yellow-500",
            NotificationKind::Info => "bg-blue-500",
        }
    }

    pub fn icon_class(&self) -> &'static str {
        match self {
            NotificationKind::Success => "fas fa-check-circle",
            NotificationKind::Error => "fas fa-exclamation-circle",
            NotificationKind::Warning => "fas fa-exclamation-triangle",
            NotificationKind::Info => "fas fa-info-circle",
        }
    }
}

/// One visible notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub kind: NotificationKind,
    /// 0 means the notification stays until dismissed
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_sticky(&self) -> bool {
        self.duration_ms == 0
    }
}

/// Why a notification left the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DismissReason {
    /// Explicit dismissal (close button)
    Manual,
    /// Its duration elapsed
    Expired,
    /// Pushed out by the visible-notification cap
    Evicted,
}

/// Change to the view-model, in the order it happened
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum NotificationEvent {
    Shown(Notification),
    Dismissed {
        id: NotificationId,
        reason: DismissReason,
    },
}

/// Notification presenter
pub struct NotificationCenter {
    entries: Arc<HashMap<NotificationId, Notification>>,
    timers: Arc<HashMap<NotificationId, AbortHandle>>,
    next_id: AtomicU64,
    /// Created on first use
    surface: OnceLock<broadcast::Sender<NotificationEvent>>,
    default_duration: Duration,
    max_visible: Option<usize>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_NOTIFICATION_DURATION, None)
    }

    /// # Arguments
    /// * `default_duration` - Lifetime used by the kind shortcuts (`info`, `error`, ...)
    /// * `max_visible` - When set, showing beyond this many evicts the oldest
    pub fn with_settings(default_duration: Duration, max_visible: Option<usize>) -> Self {
        Self {
            entries: Arc::new(HashMap::new()),
            timers: Arc::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            surface: OnceLock::new(),
            default_duration,
            max_visible,
        }
    }

    /// Show a notification
    ///
    /// A zero `duration` keeps it until [`dismiss`](Self::dismiss) is called.
    /// Timed removal needs a tokio runtime; without one the notification is
    /// kept until dismissed.
    pub fn show(
        &self,
        message: impl Into<String>,
        kind: NotificationKind,
        duration: Duration,
    ) -> NotificationId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let notification = Notification {
            id,
            message: message.into(),
            kind,
            duration_ms,
            created_at: Utc::now(),
        };

        self.entries.pin().insert(id, notification.clone());
        self.emit(NotificationEvent::Shown(notification));
        debug!(id, kind = ?kind, duration_ms, "Notification shown");

        if !duration.is_zero() {
            self.schedule_expiry(id, duration);
        }
        self.enforce_cap();

        id
    }

    pub fn info(&self, message: impl Into<String>) -> NotificationId {
        self.show(message, NotificationKind::Info, self.default_duration)
    }

    pub fn success(&self, message: impl Into<String>) -> NotificationId {
        self.show(message, NotificationKind::Success, self.default_duration)
    }

    pub fn warning(&self, message: impl Into<String>) -> NotificationId {
        self.show(message, NotificationKind::Warning, self.default_duration)
    }

    pub fn error(&self, message: impl Into<String>) -> NotificationId {
        self.show(message, NotificationKind::Error, self.default_duration)
    }

    /// Remove a notification. Returns false if it was already gone.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        self.remove(id, DismissReason::Manual)
    }

    /// Visible notifications, oldest first
    pub fn visible(&self) -> Vec<Notification> {
        let mut visible: Vec<Notification> = self
            .entries
            .pin()
            .iter()
            .map(|(_, n)| n.clone())
            .collect();
        visible.sort_by_key(|n| n.id);
        visible
    }

    pub fn len(&self) -> usize {
        self.entries.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Follow changes to the view-model
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.surface().subscribe()
    }

    /// Whether the display surface has been created yet
    pub fn has_surface(&self) -> bool {
        self.surface.get().is_some()
    }

    /// Cancel every pending removal timer. Visible notifications stay.
    pub fn shutdown(&self) {
        let timers = self.timers.pin();
        let pending = timers.len();
        for (_, handle) in timers.iter() {
            handle.abort();
        }
        timers.clear();
        debug!(pending, "Notification timers cancelled");
    }

    fn surface(&self) -> &broadcast::Sender<NotificationEvent> {
        self.surface.get_or_init(|| {
            debug!("Notification surface created");
            broadcast::channel(SURFACE_CAPACITY).0
        })
    }

    fn emit(&self, event: NotificationEvent) {
        // no subscribers is fine, the view-model is still queryable
        let _ = self.surface().send(event);
    }

    fn remove(&self, id: NotificationId, reason: DismissReason) -> bool {
        if let Some(handle) = self.timers.pin().remove(&id) {
            handle.abort();
        }

        let removed = self.entries.pin().remove(&id).is_some();
        if removed {
            debug!(id, reason = ?reason, "Notification dismissed");
            self.emit(NotificationEvent::Dismissed { id, reason });
        }
        removed
    }

    fn schedule_expiry(&self, id: NotificationId, duration: Duration) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!(id, "No tokio runtime, notification will stay until dismissed");
                return;
            }
        };

        let entries = Arc::clone(&self.entries);
        let timers = Arc::clone(&self.timers);
        let surface = self.surface().clone();

        let task = runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            timers.pin().remove(&id);
            if entries.pin().remove(&id).is_some() {
                debug!(id, "Notification expired");
                let _ = surface.send(NotificationEvent::Dismissed {
                    id,
                    reason: DismissReason::Expired,
                });
            }
        });

        self.timers.pin().insert(id, task.abort_handle());
        // the timer may have fired before its handle was recorded
        if !self.entries.pin().contains_key(&id) {
            self.timers.pin().remove(&id);
        }
    }

    fn enforce_cap(&self) {
        let Some(max) = self.max_visible else {
            return;
        };

        let visible = self.visible();
        if visible.len() <= max {
            return;
        }

        let excess = visible.len() - max;
        for notification in visible.into_iter().take(excess) {
            self.remove(notification.id, DismissReason::Evicted);
        }
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}
