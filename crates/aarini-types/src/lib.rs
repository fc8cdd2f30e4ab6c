//! Shared domain types for Aarini.
//!
//! This crate contains the data shapes used across the relay: upstream
//! generation requests and fragments, the NDJSON relay records, conversation
//! turns, relay configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod relay;
