//! Core engine: resolve → collect → reconcile, driven once per cycle.

pub mod collector;
pub mod pipeline;
pub mod reconciler;
pub mod resolver;
pub mod session;

pub use pipeline::{cycle_interval, Monitor};
