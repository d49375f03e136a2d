/// Toast notifications.
///
/// Success toasts expire on their own after a few seconds; error toasts stay
/// until dismissed.
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Lifetime of a success toast.
const SUCCESS_TTL_SECS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Error => "✕",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    fn expired(&self, now: DateTime<Utc>) -> bool {
        self.kind == ToastKind::Success
            && now - self.created_at >= Duration::seconds(SUCCESS_TTL_SECS)
    }
}

/// Ordered toast queue with stable ids.
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    next_id: u64,
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) -> u64 {
        self.push_at(kind, message, Utc::now())
    }

    pub fn push_at(&mut self, kind: ToastKind, message: impl Into<String>, at: DateTime<Utc>) -> u64 {
        self.next_id += 1;
        self.toasts.push(Toast {
            id: self.next_id,
            kind,
            message: message.into(),
            created_at: at,
        });
        self.next_id
    }

    /// Remove a toast by id. Returns whether it existed.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Drop expired success toasts.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.toasts.retain(|t| !t.expired(now));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_toasts_expire_errors_persist() {
        let mut queue = ToastQueue::default();
        let t0 = Utc::now();
        queue.push_at(ToastKind::Success, "sent", t0);
        queue.push_at(ToastKind::Error, "failed", t0);

        queue.prune(t0 + Duration::seconds(2));
        assert_eq!(queue.len(), 2);

        queue.prune(t0 + Duration::seconds(3));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.iter().next().unwrap().kind, ToastKind::Error);

        queue.prune(t0 + Duration::hours(1));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn dismiss_by_id() {
        let mut queue = ToastQueue::default();
        let a = queue.push(ToastKind::Error, "a");
        let b = queue.push(ToastKind::Error, "b");
        assert_ne!(a, b);

        assert!(queue.dismiss(a));
        assert!(!queue.dismiss(a));
        assert_eq!(queue.iter().map(|t| t.id).collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn icons() {
        assert_eq!(ToastKind::Success.icon(), "✓");
        assert_eq!(ToastKind::Error.icon(), "✕");
    }
}
