//! Connectivity seam gating remote operations.

use async_trait::async_trait;

/// Reports current connectivity.
///
/// `is_connected` is the cheap passive signal; `is_stable` performs an
/// active reachability round trip and is the gate used before fetches
/// and upload attempts.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn is_connected(&self) -> bool;

    async fn is_stable(&self) -> bool;
}
