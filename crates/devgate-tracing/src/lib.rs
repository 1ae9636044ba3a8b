//! Tracing setup shared by the devgate binary: fmt logging plus optional
//! OTLP span export.

pub mod config;
pub mod otlp;
pub mod spans;

pub use config::{OtlpProtocol, TracingConfig};
pub use otlp::{init_tracing, TracingGuard};
