//! Relay and conversation logic for Aarini.
//!
//! This crate contains the upstream model client trait, the fallback
//! selector that walks the candidate models, the NDJSON relay record mapping,
//! the incremental decoder for relay responses, and the client-side message
//! lifecycle controller. Concrete HTTP clients live in aarini-infra.

pub mod chat;
pub mod llm;
pub mod relay;
pub mod stream;
