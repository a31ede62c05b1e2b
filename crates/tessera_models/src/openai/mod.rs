//! OpenAI-compatible chat-completions provider.

mod client;
mod conversion;
mod dto;

pub use client::{API_KEY_ENV, DEFAULT_BASE_URL, OpenAiCompatibleClient, OpenAiCompatibleClientBuilder};
