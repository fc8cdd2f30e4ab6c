//! Observability setup for Aarini: the tracing subscriber and optional
//! OpenTelemetry span export.

pub mod tracing_setup;
