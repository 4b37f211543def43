//! Image hosting seam.

use std::path::Path;

use async_trait::async_trait;

use crate::errors::Result;

/// Uploads a local image file and returns its hosted URL.
///
/// There is no chunking or resume: a retry re-uploads the whole asset.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, local_path: &Path) -> Result<String>;
}
