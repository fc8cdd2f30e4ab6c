//! Google Gemini upstream client.
//!
//! This module provides the [`GeminiClient`] which implements the
//! [`ModelClient`](aarini_core::llm::provider::ModelClient) trait for the
//! Generative Language API, including SSE streaming with search grounding.

pub mod client;
pub mod streaming;
pub mod types;

pub use client::GeminiClient;
