//! Upstream forwarding: per-route clients, raw passthrough, and correlation.

pub mod correlation;
pub mod forward;
