#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]

//! Concurrent print-service simulator core.
//!
//! A producer feeds jobs into a timed FIFO queue; a pool of printer workers
//! drains it, stalling on an empty paper tray until a single refill worker
//! tops it up; an optional autoscaler grows and shrinks the pool from queue
//! pressure. Every state transition updates the statistics accumulator and
//! publishes a structured event through a pluggable [`Emitter`].

pub mod api;
/// Monotonic simulation clock.
pub mod clock;
/// Event sink trait and router.
pub mod emitter;
/// Job queue with interaction-time tracking.
pub mod queue;
/// Statistics accumulators and the derived report.
pub mod stats;

mod autoscale;
mod engine;
mod pool;
mod printer;
mod producer;
mod refill;

pub use api::{SimulationHandle, Status, Stopper, start_simulation};
pub use clock::SimClock;
pub use emitter::{Emitter, EventSink, SinkMode};
pub use printer::PrinterSnapshot;
pub use queue::TimedQueue;
pub use stats::{MAX_PRINTERS, PrinterReport, SimStats, StatsReport};
