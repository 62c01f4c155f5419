use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::engine::SimContext;
use crate::printer::run_printer;
use crate::stats::MAX_PRINTERS;

/// Fixed-capacity array of printer slots.
///
/// Active slots always occupy the contiguous low-index prefix
/// `0..active_count`: printers are started in id order and only the
/// highest-indexed slot is ever torn down, so a slot index at or above
/// `active_count` is guaranteed inactive. Scaling timers live here because
/// scale actions are serialized on the pool lock.
#[derive(Debug)]
pub(crate) struct PrinterPool {
    slots: [Option<JoinHandle<()>>; MAX_PRINTERS],
    pub(crate) active_count: usize,
    pub(crate) min_count: usize,
    pub(crate) last_scale_time_us: u64,
    pub(crate) low_queue_start_time_us: u64,
}

impl PrinterPool {
    pub(crate) fn new(min_count: usize) -> Self {
        Self {
            slots: [const { None }; MAX_PRINTERS],
            active_count: 0,
            min_count: min_count.min(MAX_PRINTERS),
            last_scale_time_us: 0,
            low_queue_start_time_us: 0,
        }
    }

    /// Spawns the printer with the given 1-based id into its slot.
    ///
    /// Rejects a full pool and an already-active slot. Also advances the
    /// peak-printer statistic.
    pub(crate) fn start_printer(&mut self, ctx: &Arc<SimContext>, printer_id: usize) -> bool {
        if self.active_count >= MAX_PRINTERS {
            return false;
        }
        let slot = printer_id - 1;
        if slot >= MAX_PRINTERS || self.slots[slot].is_some() {
            return false;
        }

        self.slots[slot] = Some(tokio::spawn(run_printer(ctx.clone(), slot)));
        self.active_count += 1;
        ctx.stats
            .lock()
            .unwrap()
            .record_printers_used(self.active_count);
        true
    }

    /// Aborts and joins the highest-indexed active printer.
    ///
    /// Only the top of the active prefix may be destroyed; callers decide
    /// eligibility. A printer aborted mid-service loses its job.
    pub(crate) async fn stop_top_printer(&mut self) -> bool {
        if self.active_count == 0 {
            return false;
        }
        let slot = self.active_count - 1;
        let Some(handle) = self.slots[slot].take() else {
            return false;
        };
        handle.abort();
        // A JoinError here is the abort we just requested.
        let _ = handle.await;
        self.active_count -= 1;
        true
    }

    /// Joins every active printer task, leaving the pool empty.
    pub(crate) async fn join_all(&mut self) {
        for slot in &mut self.slots {
            if let Some(handle) = slot.take() {
                let _ = handle.await;
            }
        }
        self.active_count = 0;
    }
}
