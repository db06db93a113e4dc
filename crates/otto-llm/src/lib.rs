//! LLM completion backends for Otto.
//!
//! The reasoning loop depends only on the [`CompletionModel`] trait;
//! [`HttpCompletionModel`] is the production implementation for any
//! OpenAI-compatible endpoint, with retry and typed error classification.

pub mod http;
pub mod model;
pub mod retry;

pub use http::HttpCompletionModel;
pub use model::CompletionModel;
pub use retry::{RetryConfig, is_retryable};
