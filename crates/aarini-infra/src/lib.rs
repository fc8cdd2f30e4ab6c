//! Infrastructure layer for Aarini.
//!
//! Contains the implementations behind the abstractions in `aarini-core`:
//! the Gemini upstream client, configuration and credential loading, and the
//! HTTP client the terminal chat uses to talk to a running relay.

pub mod config;
pub mod llm;
pub mod relay_client;
pub mod secret;
