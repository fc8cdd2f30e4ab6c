//! HTTP layer of the relay.
//!
//! Axum routes for the streaming chat relay, session reset, and liveness,
//! with CORS and optional static site serving.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;
