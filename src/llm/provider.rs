use crate::error::Result;
use async_trait::async_trait;

/// Free text in, free text out.
///
/// The assistant is the only caller; it owns all prompt construction and
/// response parsing, so nothing richer than a single completion is needed
/// at this seam.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
