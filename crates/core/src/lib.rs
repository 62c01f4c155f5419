#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]

//! Domain types shared by the `pressroom` engine and its frontends.

/// Print job entity and its lifecycle timestamps.
pub mod job;
/// Simulation parameters: defaults, validation ranges, normalization.
pub mod params;

pub use job::Job;
pub use params::{ConfigError, Parameters, ParamsPatch};
