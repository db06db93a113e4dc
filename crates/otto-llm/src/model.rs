//! The completion model abstraction the reasoning loop talks to.

use std::future::Future;
use std::pin::Pin;

use otto_types::LlmError;

/// A text-in, text-out completion backend.
///
/// The reasoning loop only ever needs one operation: hand the model a
/// prompt, get the raw completion text back. Keeping the trait this
/// narrow makes scripted models trivial to write in tests.
pub trait CompletionModel: Send + Sync {
    /// Model identifier, used for logging only.
    fn name(&self) -> &str;

    /// Complete `prompt` and return the raw response text.
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;
}
