//! Upload resilience controller.
//!
//! Wraps an image upload in a reconnect-and-retry loop for flaky links:
//! failed attempts park the upload in a waiting-reconnect state that
//! polls link stability on a fixed 3/6/9 second schedule, and after the
//! automatic budget is spent the user decides whether to keep trying.
//! The controller never gives up on its own; every run ends in a
//! completed upload or an explicit cancellation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::error;
use notewell_core::network::NetworkProbe;
use notewell_core::notify::{NoticeKind, Notifier};
use notewell_core::Result;

/// Automatic reconnection attempts before the user is asked.
pub const UPLOAD_MAX_RETRIES: u32 = 3;

/// Wait before each reconnection attempt; later attempts hold at the
/// last entry.
const RECONNECT_DELAYS: [Duration; 3] = [
    Duration::from_millis(3000),
    Duration::from_millis(6000),
    Duration::from_millis(9000),
];

/// The user's answer once the automatic budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDecision {
    Retry,
    Cancel,
}

/// Blocking user decision point, shown when reconnection attempts are
/// exhausted.
#[async_trait]
pub trait UploadPrompt: Send + Sync {
    async fn on_exhausted(&self) -> UploadDecision;
}

/// Terminal state of one controlled upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Upload succeeded; carries the hosted URL.
    Completed(String),
    /// The user gave up after the budget was spent.
    Cancelled,
}

/// Drives an upload callback through the reconnect-and-retry loop.
pub struct UploadController {
    probe: Arc<dyn NetworkProbe>,
    notifier: Arc<dyn Notifier>,
    prompt: Arc<dyn UploadPrompt>,
}

impl UploadController {
    pub fn new(
        probe: Arc<dyn NetworkProbe>,
        notifier: Arc<dyn Notifier>,
        prompt: Arc<dyn UploadPrompt>,
    ) -> Self {
        Self {
            probe,
            notifier,
            prompt,
        }
    }

    /// Run `upload` until it completes or the user cancels.
    ///
    /// The link is verified before every attempt. Any attempt failure
    /// parks the upload in the waiting-reconnect state rather than
    /// surfacing the error; the loop only exits through success or an
    /// explicit cancel.
    pub async fn upload_with_retry<F, Fut>(&self, mut upload: F) -> UploadOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        loop {
            if self.probe.is_stable().await {
                match upload().await {
                    Ok(url) => return UploadOutcome::Completed(url),
                    Err(err) => {
                        error!("upload failed: {err}");
                        self.notifier.notify(
                            NoticeKind::Error,
                            "Network error",
                            Some("Waiting for reconnection..."),
                        );
                    }
                }
            } else {
                self.notifier.notify(
                    NoticeKind::Error,
                    "Network error",
                    Some("Waiting for reconnection..."),
                );
            }

            if !self.wait_for_reconnect().await {
                return UploadOutcome::Cancelled;
            }
        }
    }

    /// Poll for a stable link on the fixed schedule. Returns `false`
    /// when the user cancels at the exhaustion prompt; a `Retry`
    /// decision resets the attempt counter and keeps polling.
    async fn wait_for_reconnect(&self) -> bool {
        let mut attempts = 0u32;
        loop {
            if self.probe.is_stable().await {
                self.notifier.notify(
                    NoticeKind::Info,
                    "Network restored",
                    Some("Retrying upload..."),
                );
                return true;
            }

            attempts += 1;
            if attempts <= UPLOAD_MAX_RETRIES {
                let delay = RECONNECT_DELAYS
                    [usize::min(attempts as usize - 1, RECONNECT_DELAYS.len() - 1)];
                self.notifier.notify(
                    NoticeKind::Info,
                    "Network error",
                    Some(&format!(
                        "Reconnection attempt {attempts}/{UPLOAD_MAX_RETRIES} in {}s",
                        delay.as_secs()
                    )),
                );
                tokio::time::sleep(delay).await;
            } else {
                match self.prompt.on_exhausted().await {
                    UploadDecision::Retry => attempts = 0,
                    UploadDecision::Cancel => return false,
                }
            }
        }
    }
}
