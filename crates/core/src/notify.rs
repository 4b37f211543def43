//! User-facing notification channel.
//!
//! Action-layer failures never propagate as errors to the UI; they are
//! reported through this side channel (a toast/snackbar in the app).

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// Sink for transient user-visible messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NoticeKind, title: &str, detail: Option<&str>);
}

/// Notifier that drops everything. Useful for headless callers and tests
/// that do not assert on notices.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _kind: NoticeKind, _title: &str, _detail: Option<&str>) {}
}
