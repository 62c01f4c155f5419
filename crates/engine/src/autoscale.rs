use std::sync::Arc;

use crate::engine::SimContext;
use crate::pool::PrinterPool;
use crate::stats::MAX_PRINTERS;

/// Sleep between autoscaler evaluations.
pub(crate) const CHECK_INTERVAL_US: u64 = 500_000;
/// Minimum gap between two scale actions, up or down.
pub(crate) const COOLDOWN_US: u64 = 5_000_000;
/// Queue length below which the low-queue window starts accumulating.
pub(crate) const SCALE_DOWN_THRESHOLD: usize = 5;
/// Sustained low-queue duration required before scaling down.
pub(crate) const SCALE_DOWN_WAIT_US: u64 = 5_000_000;
/// Minimum idleness of a printer before it may be torn down.
pub(crate) const IDLE_TIMEOUT_US: u64 = 5_000_000;

/// Idle view of one tray, sampled under the refill-bay lock.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrayIdleView {
    pub(crate) is_idle: bool,
    pub(crate) last_job_completion_time_us: u64,
}

/// Stepped scale-up thresholds. Larger pools demand a longer queue before
/// growing again; at the pool ceiling there is no threshold at all.
pub(crate) fn scale_up_threshold(active_printers: usize) -> Option<usize> {
    match active_printers {
        2 => Some(10),
        3 => Some(15),
        4 => Some(20),
        _ => None,
    }
}

pub(crate) fn should_scale_up(pool: &PrinterPool, queue_length: usize, now_us: u64) -> bool {
    if pool.active_count >= MAX_PRINTERS {
        return false;
    }
    if now_us.saturating_sub(pool.last_scale_time_us) < COOLDOWN_US {
        return false;
    }
    match scale_up_threshold(pool.active_count) {
        Some(threshold) => queue_length >= threshold,
        None => false,
    }
}

/// Scale-down gate: cooldown, a sustained low-queue window, and at least one
/// long-idle printer above the configured minimum. Mutates the low-queue
/// timer as a side effect, so call it once per evaluation.
pub(crate) fn should_scale_down(
    pool: &mut PrinterPool,
    queue_length: usize,
    now_us: u64,
    trays: &[TrayIdleView],
) -> bool {
    if pool.active_count <= pool.min_count {
        return false;
    }
    if now_us.saturating_sub(pool.last_scale_time_us) < COOLDOWN_US {
        return false;
    }
    if queue_length >= SCALE_DOWN_THRESHOLD {
        pool.low_queue_start_time_us = 0;
        return false;
    }
    if pool.low_queue_start_time_us == 0 {
        pool.low_queue_start_time_us = now_us;
        return false;
    }
    if now_us.saturating_sub(pool.low_queue_start_time_us) < SCALE_DOWN_WAIT_US {
        return false;
    }

    (pool.min_count..pool.active_count).rev().any(|slot| {
        let tray = &trays[slot];
        tray.is_idle && now_us.saturating_sub(tray.last_job_completion_time_us) >= IDLE_TIMEOUT_US
    })
}

/// Whether the top of the active prefix can be torn down right now.
///
/// Only the highest-indexed active printer is ever destroyed, keeping active
/// slots contiguous; if it is busy, the action is skipped this round.
pub(crate) fn top_slot_is_idle(pool: &PrinterPool, trays: &[TrayIdleView]) -> bool {
    pool.active_count > pool.min_count && trays[pool.active_count - 1].is_idle
}

/// Monitor loop: observes queue pressure and printer idleness, growing or
/// shrinking the pool one printer per evaluation.
pub(crate) async fn run_autoscaler(ctx: Arc<SimContext>) {
    loop {
        if ctx.terminate_now() || ctx.all_jobs_served() {
            return;
        }

        let queue_length = ctx.queue_len();
        let now_us = ctx.clock.now_us();

        {
            let mut pool = ctx.pool.lock().await;
            let trays: Vec<TrayIdleView> = {
                let bay = ctx.bay.lock().unwrap();
                bay.trays()
                    .iter()
                    .map(|tray| TrayIdleView {
                        is_idle: tray.is_idle,
                        last_job_completion_time_us: tray.last_job_completion_time_us,
                    })
                    .collect()
            };

            if should_scale_up(&pool, queue_length, now_us) {
                let printer_id = pool.active_count + 1;
                if pool.start_printer(&ctx, printer_id) {
                    let now_us = ctx.clock.now_us();
                    pool.last_scale_time_us = now_us;
                    pool.low_queue_start_time_us = 0;
                    let queue_length = ctx.queue_len();
                    ctx.emitter.scale_up(pool.active_count, queue_length, now_us);
                }
            } else if should_scale_down(&mut pool, queue_length, now_us, &trays)
                && top_slot_is_idle(&pool, &trays)
                && pool.stop_top_printer().await
            {
                let now_us = ctx.clock.now_us();
                pool.last_scale_time_us = now_us;
                pool.low_queue_start_time_us = 0;
                let queue_length = ctx.queue_len();
                ctx.emitter
                    .scale_down(pool.active_count, queue_length, now_us);
            }
        }

        if !ctx.sleep_until(ctx.clock.deadline_after_us(CHECK_INTERVAL_US)).await {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        COOLDOWN_US, IDLE_TIMEOUT_US, SCALE_DOWN_WAIT_US, TrayIdleView, scale_up_threshold,
        should_scale_down, should_scale_up, top_slot_is_idle,
    };
    use crate::pool::PrinterPool;
    use crate::stats::MAX_PRINTERS;

    fn pool_with(active: usize, min: usize) -> PrinterPool {
        let mut pool = PrinterPool::new(min);
        pool.active_count = active;
        pool
    }

    fn idle_trays(n: usize) -> Vec<TrayIdleView> {
        vec![
            TrayIdleView {
                is_idle: true,
                last_job_completion_time_us: 0,
            };
            n
        ]
    }

    #[test]
    fn threshold_table_is_stepped() {
        assert_eq!(scale_up_threshold(2), Some(10));
        assert_eq!(scale_up_threshold(3), Some(15));
        assert_eq!(scale_up_threshold(4), Some(20));
        assert_eq!(scale_up_threshold(5), None);
        assert_eq!(scale_up_threshold(1), None);
    }

    #[test]
    fn scale_up_requires_cooldown_and_queue_pressure() {
        let mut pool = pool_with(2, 2);
        // Inside the cooldown window.
        pool.last_scale_time_us = 0;
        assert!(!should_scale_up(&pool, 50, COOLDOWN_US - 1));
        // Past cooldown but the queue is short.
        assert!(!should_scale_up(&pool, 9, COOLDOWN_US));
        // Past cooldown with a long queue.
        assert!(should_scale_up(&pool, 10, COOLDOWN_US));
    }

    #[test]
    fn scale_up_never_exceeds_the_pool_ceiling() {
        let pool = pool_with(MAX_PRINTERS, 2);
        assert!(!should_scale_up(&pool, 1_000, u64::MAX));
    }

    #[test]
    fn scale_down_waits_for_a_sustained_low_queue() {
        let mut pool = pool_with(3, 2);
        let trays = idle_trays(MAX_PRINTERS);
        let t0 = COOLDOWN_US;

        // First low-queue observation only starts the window.
        assert!(!should_scale_down(&mut pool, 0, t0, &trays));
        assert_eq!(pool.low_queue_start_time_us, t0);
        // Still inside the window.
        assert!(!should_scale_down(
            &mut pool,
            0,
            t0 + SCALE_DOWN_WAIT_US - 1,
            &trays
        ));
        // Window satisfied and an idle printer is available.
        assert!(should_scale_down(
            &mut pool,
            0,
            t0 + SCALE_DOWN_WAIT_US + IDLE_TIMEOUT_US,
            &trays
        ));
    }

    #[test]
    fn queue_pressure_resets_the_low_queue_window() {
        let mut pool = pool_with(3, 2);
        let trays = idle_trays(MAX_PRINTERS);
        let t0 = COOLDOWN_US;

        assert!(!should_scale_down(&mut pool, 0, t0, &trays));
        assert_eq!(pool.low_queue_start_time_us, t0);
        assert!(!should_scale_down(&mut pool, 5, t0 + 1, &trays));
        assert_eq!(pool.low_queue_start_time_us, 0);
    }

    #[test]
    fn scale_down_never_drops_below_the_minimum() {
        let mut pool = pool_with(2, 2);
        let trays = idle_trays(MAX_PRINTERS);
        assert!(!should_scale_down(&mut pool, 0, u64::MAX, &trays));
    }

    #[test]
    fn scale_down_requires_a_long_idle_printer() {
        let mut pool = pool_with(3, 2);
        let now = COOLDOWN_US + SCALE_DOWN_WAIT_US + 1;
        pool.low_queue_start_time_us = COOLDOWN_US;

        // The eligible printer finished a job moments ago.
        let busyish = vec![
            TrayIdleView {
                is_idle: true,
                last_job_completion_time_us: now - 1,
            };
            MAX_PRINTERS
        ];
        assert!(!should_scale_down(&mut pool, 0, now, &busyish));
    }

    #[test]
    fn only_the_top_of_the_prefix_is_torn_down() {
        let pool = pool_with(3, 2);
        let mut trays = idle_trays(MAX_PRINTERS);
        assert!(top_slot_is_idle(&pool, &trays));

        trays[2].is_idle = false;
        assert!(!top_slot_is_idle(&pool, &trays));

        let at_minimum = pool_with(2, 2);
        assert!(!top_slot_is_idle(&at_minimum, &idle_trays(MAX_PRINTERS)));
    }
}
