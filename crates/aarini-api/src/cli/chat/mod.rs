//! Interactive terminal chat against a running relay.
//!
//! This module implements the chat loop: a greeting with starter
//! suggestions, streamed replies printed as they decode, numbered
//! suggestion picking, and slash commands. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod loop_runner;
pub mod renderer;
