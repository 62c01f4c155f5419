use std::collections::VecDeque;
use std::sync::Arc;

use crate::engine::SimContext;
use crate::printer::PrinterState;
use crate::stats::MAX_PRINTERS;

/// Refill queue plus every printer's tray state, guarded by one lock.
///
/// Printers place their slot index on `pending` and block; the refill worker
/// drains it FIFO. A printer appears at most once: it only requests a refill
/// while not already waiting for one.
#[derive(Debug)]
pub(crate) struct RefillBay {
    pub(crate) pending: VecDeque<usize>,
    trays: Vec<PrinterState>,
}

impl RefillBay {
    pub(crate) fn new(paper_capacity: u32) -> Self {
        Self {
            pending: VecDeque::new(),
            trays: (1..=MAX_PRINTERS as u32)
                .map(|id| PrinterState::new(id, paper_capacity))
                .collect(),
        }
    }

    pub(crate) fn tray(&self, slot: usize) -> &PrinterState {
        &self.trays[slot]
    }

    pub(crate) fn tray_mut(&mut self, slot: usize) -> &mut PrinterState {
        &mut self.trays[slot]
    }

    pub(crate) fn trays(&self) -> &[PrinterState] {
        &self.trays
    }
}

/// The single refill worker: services refill requests FIFO, always topping
/// the tray up to full capacity.
pub(crate) async fn run_refiller(ctx: Arc<SimContext>) {
    loop {
        // Wait for a pending request, or exit once printing is over.
        let slot = loop {
            let notified = ctx.supplier_wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if ctx.terminate_now() || ctx.all_jobs_served() {
                // Wake any printer still blocked on a refill so it can
                // observe termination.
                ctx.refill_done.notify_waiters();
                return;
            }
            let next = ctx.bay.lock().unwrap().pending.pop_front();
            if let Some(slot) = next {
                break slot;
            }
            notified.await;
        };

        let refill_start_us = ctx.clock.now_us();
        let (papers_needed, snapshot) = {
            let bay = ctx.bay.lock().unwrap();
            let tray = bay.tray(slot);
            (tray.capacity - tray.current_paper_count, tray.snapshot())
        };
        if papers_needed == 0 {
            // Tray already full; nothing to do beyond waking the requester.
            ctx.refill_done.notify_waiters();
            continue;
        }

        let refill_duration_us =
            ((f64::from(papers_needed) / ctx.params.refill_rate) * 1_000_000.0) as u64;
        ctx.emitter
            .paper_refill_start(&snapshot, papers_needed, refill_duration_us, refill_start_us);

        if !ctx.sleep_us(refill_duration_us).await {
            // Stop requested mid-refill; the shutdown protocol has already
            // woken every waiter.
            return;
        }

        let refill_end_us = ctx.clock.now_us();
        let actual_duration_us = refill_end_us.saturating_sub(refill_start_us);
        {
            let mut bay = ctx.bay.lock().unwrap();
            let tray = bay.tray_mut(slot);
            tray.current_paper_count = tray.capacity;
            ctx.emitter
                .paper_refill_end(&tray.snapshot(), actual_duration_us, refill_end_us);
        }

        let queue_length = ctx.queue_len();
        {
            let mut stats = ctx.stats.lock().unwrap();
            stats.record_refill(papers_needed, actual_duration_us);
            ctx.emitter.stats_update(&stats, queue_length);
        }

        ctx.refill_done.notify_waiters();
    }
}
