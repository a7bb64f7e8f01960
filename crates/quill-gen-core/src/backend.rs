//! Generation backend abstraction

use async_trait::async_trait;

use crate::error::GenerateError;

/// One text-generation call
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Fixed system prompt (persona + output-format constraints)
    pub system: &'static str,
    /// User-derived prompt content
    pub prompt: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling parameter
    pub top_p: f32,
    /// Output token cap
    pub max_output_tokens: u32,
    /// Whether the response must be a JSON array
    pub json_array: bool,
}

/// Text-generation capability behind the pipeline.
///
/// A single blocking-from-the-caller's-perspective call with no internal
/// retry: one failed attempt surfaces immediately as
/// [`GenerateError::Backend`].
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text for the given request
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerateError>;
}
