//! Image generator trait.

use crate::error::Result;
use crate::image::types::{GenerationRequest, GenerationResult};
use async_trait::async_trait;

/// The external capability that produces a new image from a prompt and a
/// reference image.
///
/// `Ok` with a missing URL is a soft failure; `Err` is a hard failure.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generates an image for the given request.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult>;

    /// Returns the name of this generator for display.
    fn name(&self) -> &str;

    /// Checks if the service is reachable and authenticated.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
