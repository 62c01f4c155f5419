use std::sync::Arc;
use std::time::Duration;

use pressroom_core::Job;
use serde::Serialize;

use crate::engine::SimContext;

/// Dynamic state of one printer, guarded by the refill-bay lock.
///
/// The tray count is only decreased by the owning printer and only increased
/// by the refill worker, both under that lock.
#[derive(Debug)]
pub(crate) struct PrinterState {
    pub(crate) id: u32,
    pub(crate) capacity: u32,
    pub(crate) current_paper_count: u32,
    pub(crate) total_papers_used: u64,
    pub(crate) jobs_printed_count: u64,
    pub(crate) last_job_completion_time_us: u64,
    pub(crate) is_idle: bool,
}

impl PrinterState {
    pub(crate) fn new(id: u32, capacity: u32) -> Self {
        Self {
            id,
            capacity,
            current_paper_count: capacity,
            total_papers_used: 0,
            jobs_printed_count: 0,
            last_job_completion_time_us: 0,
            is_idle: true,
        }
    }

    pub(crate) fn snapshot(&self) -> PrinterSnapshot {
        PrinterSnapshot {
            id: self.id,
            current_paper_count: self.current_paper_count,
            capacity: self.capacity,
            total_papers_used: self.total_papers_used,
            jobs_printed_count: self.jobs_printed_count,
            is_idle: self.is_idle,
        }
    }
}

/// Read-only view of a printer, attached to events.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PrinterSnapshot {
    /// Printer identifier (1-based).
    pub id: u32,
    /// Pages currently in the tray.
    pub current_paper_count: u32,
    /// Tray capacity.
    pub capacity: u32,
    /// Pages consumed so far.
    pub total_papers_used: u64,
    /// Jobs completed so far.
    pub jobs_printed_count: u64,
    /// Whether the printer is idle.
    pub is_idle: bool,
}

enum Step {
    /// The head job was dequeued and is ready to serve.
    Serve(Job),
    /// The tray is short for the head job; request a refill and wait.
    AwaitRefill { job_id: u32, papers_required: u32 },
    /// Another printer won the head; go back to waiting.
    Retry,
}

/// Printer worker: idle → serving → idle, detouring through
/// waiting-for-refill when the tray is short for the queue head.
pub(crate) async fn run_printer(ctx: Arc<SimContext>, slot: usize) {
    loop {
        // Idle: wait until there is work, or exit once the producer is done
        // and the queue has drained (or a stop was requested).
        let exited = loop {
            let notified = ctx.queue_wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let terminate = ctx.terminate_now();
            {
                let queue = ctx.queue.lock().unwrap();
                if terminate || (ctx.all_jobs_arrived() && queue.is_empty()) {
                    break true;
                }
                if !queue.is_empty() {
                    break false;
                }
            }
            notified.await;
        };
        if exited {
            break;
        }

        let step = {
            let mut queue = ctx.queue.lock().unwrap();
            match queue.front().map(|head| (head.id, head.papers_required)) {
                None => Step::Retry,
                Some((job_id, papers_required)) => {
                    let enough = {
                        let bay = ctx.bay.lock().unwrap();
                        bay.tray(slot).current_paper_count >= papers_required
                    };
                    if enough {
                        let now = ctx.clock.now_us();
                        let last_interaction = queue.last_interaction_time_us();
                        match queue.pop_front(now) {
                            (Some(mut job), area_inc) => {
                                job.queue_departure_time_us = now;
                                {
                                    let mut stats = ctx.stats.lock().unwrap();
                                    stats.record_queue_departure(area_inc);
                                    ctx.emitter
                                        .queue_departure(&job, &stats, &queue, last_interaction);
                                }
                                Step::Serve(job)
                            }
                            (None, _) => Step::Retry,
                        }
                    } else {
                        Step::AwaitRefill {
                            job_id,
                            papers_required,
                        }
                    }
                }
            }
        };

        match step {
            Step::Retry => continue,
            Step::AwaitRefill {
                job_id,
                papers_required,
            } => {
                if !await_refill(&ctx, slot, job_id, papers_required).await {
                    break;
                }
                // Re-evaluate the head; another printer may have taken it.
            }
            Step::Serve(job) => {
                serve_job(&ctx, slot, job).await;
            }
        }
    }

    // Exit: announce, then wake the refiller and any printer blocked on a
    // refill so they can observe termination.
    ctx.set_all_jobs_served();
    ctx.supplier_wake.notify_waiters();
    ctx.refill_done.notify_waiters();
}

/// Places this printer on the refill queue and blocks until the tray holds
/// at least `papers_required` pages. Returns `false` when the wait was ended
/// by a stop request.
async fn await_refill(ctx: &SimContext, slot: usize, job_id: u32, papers_required: u32) -> bool {
    let request_time_us;
    {
        let mut bay = ctx.bay.lock().unwrap();
        request_time_us = ctx.clock.now_us();
        let snapshot = bay.tray(slot).snapshot();
        ctx.emitter.paper_empty(&snapshot, job_id, request_time_us);
        debug_assert!(
            !bay.pending.contains(&slot),
            "printer {} queued a refill while one is pending",
            slot + 1
        );
        bay.pending.push_back(slot);
        ctx.emitter.printer_waiting_refill(&snapshot);
    }
    ctx.supplier_wake.notify_waiters();

    loop {
        let notified = ctx.refill_done.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if ctx.terminate_now() {
            return false;
        }
        {
            let mut bay = ctx.bay.lock().unwrap();
            if bay.tray(slot).current_paper_count >= papers_required {
                break;
            }
            // The head job this request was for may have been served by
            // another printer, after which the refiller winds down without
            // draining the request. Withdraw it and re-evaluate; the main
            // loop observes the now-empty queue and exits.
            if ctx.all_jobs_served() {
                bay.pending.retain(|&pending| pending != slot);
                return true;
            }
        }
        notified.await;
    }

    let waited_us = ctx.clock.now_us().saturating_sub(request_time_us);
    ctx.stats
        .lock()
        .unwrap()
        .record_paper_empty_wait(slot, waited_us);
    true
}

async fn serve_job(ctx: &SimContext, slot: usize, mut job: Job) {
    job.service_time_requested_ms =
        ((f64::from(job.papers_required) / ctx.params.printing_rate) * 1000.0) as u64;
    job.service_arrival_time_us = ctx.clock.now_us();

    {
        let mut bay = ctx.bay.lock().unwrap();
        let tray = bay.tray_mut(slot);
        tray.is_idle = false;
        let snapshot = tray.snapshot();
        ctx.emitter.printer_arrival(&job, &snapshot);
        ctx.emitter.printer_busy(&snapshot, job.id);
    }

    // The service sleep is deliberately not interrupted by a stop request:
    // an in-flight job completes and is counted as served. Pool scale-down
    // may still abort the task here, losing the job.
    tokio::time::sleep(Duration::from_millis(job.service_time_requested_ms)).await;

    let snapshot = {
        let mut bay = ctx.bay.lock().unwrap();
        let tray = bay.tray_mut(slot);
        debug_assert!(tray.current_paper_count >= job.papers_required);
        tray.current_paper_count -= job.papers_required;
        tray.total_papers_used += u64::from(job.papers_required);
        job.service_departure_time_us = ctx.clock.now_us();
        tray.last_job_completion_time_us = job.service_departure_time_us;
        tray.jobs_printed_count += 1;
        tray.is_idle = true;
        let snapshot = tray.snapshot();
        ctx.emitter.printer_idle(&snapshot);
        snapshot
    };

    {
        let mut stats = ctx.stats.lock().unwrap();
        stats.record_system_departure(&job, slot);
        ctx.emitter.system_departure(&job, &snapshot, &stats);
    }
}
