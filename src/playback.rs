//! Playback seam
//!
//! The audio engine lives outside the archive. Playback is the one archive
//! operation whose failure is returned to the caller as-is: it happens in
//! response to a direct user action.

use async_trait::async_trait;
use std::path::Path;

use crate::error::DynError;

#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Handle to a loaded, playable sound
    type Handle: Send;

    async fn load(&self, file_uri: &Path) -> Result<Self::Handle, DynError>;
}
