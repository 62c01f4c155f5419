use std::sync::Arc;

use pressroom_core::{Job, Parameters};

use crate::printer::PrinterSnapshot;
use crate::queue::TimedQueue;
use crate::stats::{SimStats, StatsReport};

/// Observer of the structured simulation event stream.
///
/// Every method has an empty default body, so a back-end implements only the
/// events it cares about and silently ignores the rest. Methods are called
/// synchronously at the state transition they describe, sometimes while the
/// relevant lock is held; implementations must not block on simulation
/// progress.
#[allow(unused_variables)]
pub trait EventSink: Send + Sync {
    /// The parameters the run was started with.
    fn simulation_parameters(&self, params: &Parameters) {}
    /// The simulation has begun.
    fn simulation_start(&self, stats: &SimStats) {}
    /// The simulation has ended normally.
    fn simulation_end(&self, stats: &SimStats) {}
    /// An external stop request was accepted.
    fn simulation_stopped(&self, stats: &SimStats) {}

    /// A job entered the system.
    fn system_arrival(&self, job: &Job, previous_arrival_us: u64, stats: &SimStats) {}
    /// A job was dropped on admission.
    fn dropped_job(&self, job: &Job, previous_arrival_us: u64, stats: &SimStats) {}
    /// A queued job was removed by the shutdown drain.
    fn removed_job(&self, job: &Job, now_us: u64) {}

    /// A job was admitted to the queue.
    fn queue_arrival(&self, job: &Job, stats: &SimStats, queue: &TimedQueue, last_interaction_us: u64) {}
    /// A job left the queue for service.
    fn queue_departure(&self, job: &Job, stats: &SimStats, queue: &TimedQueue, last_interaction_us: u64) {}
    /// Incremental job state for frontends.
    fn job_update(&self, job: &Job) {}

    /// A job reached a printer.
    fn printer_arrival(&self, job: &Job, printer: &PrinterSnapshot) {}
    /// A job finished service and departed the system.
    fn system_departure(&self, job: &Job, printer: &PrinterSnapshot, stats: &SimStats) {}

    /// A printer found its tray short for the queue head.
    fn paper_empty(&self, printer: &PrinterSnapshot, job_id: u32, now_us: u64) {}
    /// The refiller began refilling a tray.
    fn paper_refill_start(
        &self,
        printer: &PrinterSnapshot,
        papers_needed: u32,
        refill_duration_us: u64,
        now_us: u64,
    ) {
    }
    /// The refiller finished refilling a tray.
    fn paper_refill_end(&self, printer: &PrinterSnapshot, refill_duration_us: u64, now_us: u64) {}

    /// The pool grew by one printer.
    fn scale_up(&self, new_printer_count: usize, queue_length: usize, now_us: u64) {}
    /// The pool shrank by one printer.
    fn scale_down(&self, new_printer_count: usize, queue_length: usize, now_us: u64) {}

    /// A printer became idle.
    fn printer_idle(&self, printer: &PrinterSnapshot) {}
    /// A printer started serving a job.
    fn printer_busy(&self, printer: &PrinterSnapshot, job_id: u32) {}
    /// A printer is blocked awaiting a refill.
    fn printer_waiting_refill(&self, printer: &PrinterSnapshot) {}

    /// A periodic statistics push (currently after each refill).
    fn stats_update(&self, stats: &SimStats, queue_length: usize) {}
    /// The final report.
    fn statistics(&self, report: &StatsReport) {}
}

/// Which registered back-end receives events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    /// Human-readable stdout back-end.
    Terminal,
    /// Machine-readable back-end (JSON frames).
    Server,
}

/// Routes events to at most one active back-end.
///
/// Frontends register their back-ends before the simulation starts and
/// select the active mode; with nothing registered every emit is a no-op.
pub struct Emitter {
    terminal: Option<Arc<dyn EventSink>>,
    server: Option<Arc<dyn EventSink>>,
    mode: SinkMode,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    /// An emitter with no back-ends, defaulting to terminal mode.
    pub fn new() -> Self {
        Self {
            terminal: None,
            server: None,
            mode: SinkMode::Terminal,
        }
    }

    /// Registers the terminal back-end.
    pub fn register_terminal(&mut self, sink: Arc<dyn EventSink>) {
        self.terminal = Some(sink);
    }

    /// Registers the server back-end.
    pub fn register_server(&mut self, sink: Arc<dyn EventSink>) {
        self.server = Some(sink);
    }

    /// Selects which registered back-end is active.
    pub fn select(&mut self, mode: SinkMode) {
        self.mode = mode;
    }

    fn active(&self) -> Option<&Arc<dyn EventSink>> {
        match self.mode {
            SinkMode::Terminal => self.terminal.as_ref(),
            SinkMode::Server => self.server.as_ref(),
        }
    }
}

macro_rules! forward {
    ($(fn $name:ident(&self $(, $arg:ident : $ty:ty)*);)*) => {
        impl Emitter {
            $(
                /// Forwards to the active back-end, if any.
                pub fn $name(&self $(, $arg: $ty)*) {
                    if let Some(sink) = self.active() {
                        sink.$name($($arg),*);
                    }
                }
            )*
        }
    };
}

forward! {
    fn simulation_parameters(&self, params: &Parameters);
    fn simulation_start(&self, stats: &SimStats);
    fn simulation_end(&self, stats: &SimStats);
    fn simulation_stopped(&self, stats: &SimStats);
    fn system_arrival(&self, job: &Job, previous_arrival_us: u64, stats: &SimStats);
    fn dropped_job(&self, job: &Job, previous_arrival_us: u64, stats: &SimStats);
    fn removed_job(&self, job: &Job, now_us: u64);
    fn queue_arrival(&self, job: &Job, stats: &SimStats, queue: &TimedQueue, last_interaction_us: u64);
    fn queue_departure(&self, job: &Job, stats: &SimStats, queue: &TimedQueue, last_interaction_us: u64);
    fn job_update(&self, job: &Job);
    fn printer_arrival(&self, job: &Job, printer: &PrinterSnapshot);
    fn system_departure(&self, job: &Job, printer: &PrinterSnapshot, stats: &SimStats);
    fn paper_empty(&self, printer: &PrinterSnapshot, job_id: u32, now_us: u64);
    fn paper_refill_start(&self, printer: &PrinterSnapshot, papers_needed: u32, refill_duration_us: u64, now_us: u64);
    fn paper_refill_end(&self, printer: &PrinterSnapshot, refill_duration_us: u64, now_us: u64);
    fn scale_up(&self, new_printer_count: usize, queue_length: usize, now_us: u64);
    fn scale_down(&self, new_printer_count: usize, queue_length: usize, now_us: u64);
    fn printer_idle(&self, printer: &PrinterSnapshot);
    fn printer_busy(&self, printer: &PrinterSnapshot, job_id: u32);
    fn printer_waiting_refill(&self, printer: &PrinterSnapshot);
    fn stats_update(&self, stats: &SimStats, queue_length: usize);
    fn statistics(&self, report: &StatsReport);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{Emitter, EventSink, SinkMode};
    use pressroom_core::Job;

    #[derive(Default)]
    struct CountingSink {
        removed: AtomicUsize,
    }

    impl EventSink for CountingSink {
        fn removed_job(&self, _job: &Job, _now_us: u64) {
            self.removed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn events_route_to_the_active_backend_only() {
        let terminal = Arc::new(CountingSink::default());
        let server = Arc::new(CountingSink::default());

        let mut emitter = Emitter::new();
        emitter.register_terminal(terminal.clone());
        emitter.register_server(server.clone());

        let job = Job::new(1, 5, 0);
        emitter.removed_job(&job, 10);
        emitter.select(SinkMode::Server);
        emitter.removed_job(&job, 20);
        emitter.removed_job(&job, 30);

        assert_eq!(terminal.removed.load(Ordering::SeqCst), 1);
        assert_eq!(server.removed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unregistered_backends_are_ignored() {
        let emitter = Emitter::new();
        // No sink registered: every emit is a no-op.
        emitter.removed_job(&Job::new(1, 5, 0), 0);
        emitter.scale_up(3, 12, 0);
    }

    #[test]
    fn unimplemented_events_fall_through_to_defaults() {
        let sink = Arc::new(CountingSink::default());
        let mut emitter = Emitter::new();
        emitter.register_terminal(sink.clone());
        // CountingSink implements only removed_job; the rest are no-ops.
        emitter.scale_down(2, 0, 0);
        emitter.job_update(&Job::new(1, 5, 0));
        assert_eq!(sink.removed.load(Ordering::SeqCst), 0);
    }
}
