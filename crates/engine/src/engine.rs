use std::sync::{Arc, Mutex};

use anyhow::Context as _;
use pressroom_core::Parameters;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::autoscale::run_autoscaler;
use crate::clock::SimClock;
use crate::emitter::Emitter;
use crate::pool::PrinterPool;
use crate::producer::run_producer;
use crate::queue::TimedQueue;
use crate::refill::{RefillBay, run_refiller};
use crate::stats::SimStats;

/// Run-lifetime flags, guarded by the simulation-state lock.
/// `terminate_now` is one-way (false → true).
#[derive(Debug, Default)]
struct RunFlags {
    terminate_now: bool,
    all_jobs_arrived: bool,
    all_jobs_served: bool,
}

/// Shared state of one simulation run.
///
/// Lock order, for the few paths that nest: pool → queue → refill bay →
/// stats → run flags. Guards are never held across an await.
pub(crate) struct SimContext {
    pub(crate) params: Parameters,
    pub(crate) clock: SimClock,
    pub(crate) emitter: Emitter,

    pub(crate) queue: Mutex<TimedQueue>,
    /// Signalled on enqueue and at shutdown.
    pub(crate) queue_wake: Notify,

    pub(crate) bay: Mutex<RefillBay>,
    /// Signalled by printers entering the refill queue and at shutdown.
    pub(crate) supplier_wake: Notify,
    /// Signalled by the refiller after a refill and at shutdown.
    pub(crate) refill_done: Notify,

    pub(crate) stats: Mutex<SimStats>,

    run: Mutex<RunFlags>,
    /// Wakes every cancellable suspension; flags are re-checked on wake.
    cancel: Notify,

    pub(crate) pool: tokio::sync::Mutex<PrinterPool>,
}

impl SimContext {
    pub(crate) fn new(params: Parameters, emitter: Emitter) -> Arc<Self> {
        let clock = SimClock::start();
        let now_us = clock.now_us();
        let paper_capacity = params.printer_paper_capacity;
        let min_count = params.consumer_count as usize;
        Arc::new(Self {
            params,
            clock,
            emitter,
            queue: Mutex::new(TimedQueue::new(now_us)),
            queue_wake: Notify::new(),
            bay: Mutex::new(RefillBay::new(paper_capacity)),
            supplier_wake: Notify::new(),
            refill_done: Notify::new(),
            stats: Mutex::new(SimStats::default()),
            run: Mutex::new(RunFlags::default()),
            cancel: Notify::new(),
            pool: tokio::sync::Mutex::new(PrinterPool::new(min_count)),
        })
    }

    pub(crate) fn terminate_now(&self) -> bool {
        self.run.lock().unwrap().terminate_now
    }

    pub(crate) fn all_jobs_arrived(&self) -> bool {
        self.run.lock().unwrap().all_jobs_arrived
    }

    pub(crate) fn all_jobs_served(&self) -> bool {
        self.run.lock().unwrap().all_jobs_served
    }

    pub(crate) fn set_all_jobs_arrived(&self) {
        self.run.lock().unwrap().all_jobs_arrived = true;
    }

    pub(crate) fn set_all_jobs_served(&self) {
        self.run.lock().unwrap().all_jobs_served = true;
    }

    pub(crate) fn queue_len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Sleeps for `delta_us`, waking early on a stop request.
    /// Returns `false` when the sleep was cancelled.
    pub(crate) async fn sleep_us(&self, delta_us: u64) -> bool {
        self.sleep_until(self.clock.deadline_after_us(delta_us)).await
    }

    /// Sleeps until `deadline`, waking early on a stop request.
    /// Returns `false` when the sleep was cancelled.
    pub(crate) async fn sleep_until(&self, deadline: Instant) -> bool {
        if self.terminate_now() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => !self.terminate_now(),
            _ = self.cancel.notified() => false,
        }
    }

    /// The shutdown protocol. Idempotent: only the first call acts.
    ///
    /// Sets the termination flags, emits `simulation_stopped`, cancels every
    /// cancellable sleep, drains the queue (each removed job is emitted and
    /// counted), and wakes all waiters.
    pub(crate) fn request_stop(&self) -> bool {
        {
            let mut run = self.run.lock().unwrap();
            if run.terminate_now {
                return false;
            }
            run.terminate_now = true;
            run.all_jobs_arrived = true;
        }

        let now_us = self.clock.now_us();
        {
            let mut stats = self.stats.lock().unwrap();
            stats.simulation_duration_us = now_us.saturating_sub(stats.simulation_start_time_us);
            self.emitter.simulation_stopped(&stats);
        }

        self.cancel.notify_waiters();

        {
            let mut queue = self.queue.lock().unwrap();
            let drain_time_us = self.clock.now_us();
            let (removed, area_increment) = queue.clear(drain_time_us);
            let mut stats = self.stats.lock().unwrap();
            stats.record_removed_jobs(removed.len(), area_increment);
            for job in &removed {
                self.emitter.removed_job(job, drain_time_us);
            }
        }

        self.queue_wake.notify_waiters();
        self.supplier_wake.notify_waiters();
        self.refill_done.notify_waiters();
        true
    }
}

/// Orchestrates one run: starts all workers, waits them out in dependency
/// order, then publishes the final report.
pub(crate) async fn run_simulation(ctx: Arc<SimContext>) -> anyhow::Result<()> {
    ctx.emitter.simulation_parameters(&ctx.params);
    {
        let mut stats = ctx.stats.lock().unwrap();
        stats.simulation_start_time_us = ctx.clock.now_us();
        ctx.emitter.simulation_start(&stats);
    }

    let producer = tokio::spawn(run_producer(ctx.clone()));
    let refiller = tokio::spawn(run_refiller(ctx.clone()));

    {
        let mut pool = ctx.pool.lock().await;
        for printer_id in 1..=ctx.params.consumer_count as usize {
            pool.start_printer(&ctx, printer_id);
        }
    }

    let autoscaler = ctx
        .params
        .auto_scaling
        .then(|| tokio::spawn(run_autoscaler(ctx.clone())));

    // The producer finishes first so no new jobs appear while draining.
    producer.await.context("job producer task failed")?;
    ctx.pool.lock().await.join_all().await;
    refiller.await.context("paper refiller task failed")?;
    if let Some(task) = autoscaler {
        task.await.context("autoscaler task failed")?;
    }

    // Latch the terminate flag so a stop request racing normal completion
    // cannot emit after the final report.
    ctx.run.lock().unwrap().terminate_now = true;

    {
        let mut stats = ctx.stats.lock().unwrap();
        stats.simulation_duration_us = ctx
            .clock
            .now_us()
            .saturating_sub(stats.simulation_start_time_us);
        ctx.emitter.simulation_end(&stats);
    }

    let report = ctx.stats.lock().unwrap().report();
    ctx.emitter.statistics(&report);
    Ok(())
}
