// Generation client traits — the swap-ready abstraction.
//
// The pipeline only ever talks to these traits. GeminiClient is the
// default implementation; tests swap in canned generators, and a future
// vendor change stays contained to a new impl.

use anyhow::Result;
use async_trait::async_trait;

use crate::keys::ApiKey;

/// Trait for text generation. Implementations must be async because
/// providers require HTTP API calls.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a prompt using the given credential.
    ///
    /// A rate-limit/overload failure must be recognizable from the error's
    /// message content (see [`crate::gemini::retry::is_overload_error`]).
    async fn generate(&self, prompt: &str, key: &ApiKey) -> Result<String>;
}

/// Trait for image generation.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image for a prompt. Returns `None` when the call
    /// succeeds but the response carries no image part.
    async fn generate_image(&self, prompt: &str, key: &ApiKey) -> Result<Option<Vec<u8>>>;
}
