//! Sqlsage LLM - LLM Provider Abstraction
//!
//! This crate provides the text-generation layer for sqlsage:
//! - Provider: `LlmProvider` trait and the provider registry
//! - OpenAI: GPT family via async-openai
//! - Ollama: local inference via the Ollama chat API
//!
//! The rest of the workspace only sees `LlmProvider`; which backend answers a
//! completion request is decided once, at startup, by the registry.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod error;
pub mod message;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod util;

pub use completion::{CompletionRequest, CompletionResponse, TokenUsage};
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use ollama::{OllamaConfig, OllamaProvider};
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use provider::{LlmProvider, ProviderRegistry};
