use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::{ERROR_TOAST_TTL, SUCCESS_TOAST_TTL};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    pub fn ttl(self) -> Duration {
        match self {
            ToastKind::Success => SUCCESS_TOAST_TTL,
            ToastKind::Error => ERROR_TOAST_TTL,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// Reports the outcome of a user action.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: ToastKind, message: &str);

    fn success(&self, message: &str) {
        self.notify(ToastKind::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(ToastKind::Error, message);
    }
}

/// Blocking yes/no gate in front of destructive or state-changing actions.
pub trait ConfirmGate: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Transient banners that expire on their own or when dismissed.
/// Newest toast first, like banners prepended to the page.
pub struct ToastCenter {
    clock: Arc<dyn Clock>,
    toasts: Mutex<Vec<Toast>>,
}

impl ToastCenter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, toasts: Mutex::new(Vec::new()) }
    }

    /// Toasts still on screen at the current time. Expired ones are dropped.
    pub fn visible(&self) -> Vec<Toast> {
        let now = self.clock.now();
        let mut toasts = self.toasts.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        toasts.retain(|toast| toast.expires_at > now);
        toasts.clone()
    }

    /// Manual dismissal. Returns false if the toast was already gone.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut toasts = self.toasts.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = toasts.len();
        toasts.retain(|toast| toast.id != id);
        toasts.len() != before
    }
}

impl Notifier for ToastCenter {
    fn notify(&self, kind: ToastKind, message: &str) {
        match kind {
            ToastKind::Success => log::info!("Toast: {}", message),
            ToastKind::Error => log::warn!("Error toast: {}", message),
        }
        let ttl = chrono::Duration::from_std(kind.ttl()).unwrap_or_else(|_| chrono::Duration::seconds(5));
        let toast = Toast {
            id: Uuid::new_v4(),
            kind,
            message: message.to_string(),
            expires_at: self.clock.now() + ttl,
        };
        let mut toasts = self.toasts.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        toasts.insert(0, toast);
    }
}
