use std::sync::Arc;

use pressroom_core::Job;
use rand::Rng as _;

use crate::engine::SimContext;

fn random_between(lower: u32, upper: u32) -> u32 {
    rand::thread_rng().gen_range(lower..=upper)
}

/// Job producer: generates `num_jobs` jobs at the configured cadence,
/// admits or drops each, then announces that all jobs have arrived.
pub(crate) async fn run_producer(ctx: Arc<SimContext>) {
    let params = &ctx.params;
    let mut previous_arrival_us = ctx
        .stats
        .lock()
        .unwrap()
        .simulation_start_time_us;

    for job_id in 1..=params.num_jobs {
        let papers_required = random_between(
            params.papers_required_lower_bound,
            params.papers_required_upper_bound,
        );
        let inter_arrival_us = if params.fixed_arrival {
            params.job_arrival_time_us
        } else {
            random_between(
                params.min_arrival_time_ms as u32,
                params.max_arrival_time_ms as u32,
            ) as u64
                * 1_000
        };
        let mut job = Job::new(job_id, papers_required, inter_arrival_us);

        if !ctx.sleep_us(inter_arrival_us).await {
            // Stop requested mid-cadence; the job never arrives.
            break;
        }

        job.system_arrival_time_us = ctx.clock.now_us();
        {
            let mut stats = ctx.stats.lock().unwrap();
            stats.record_system_arrival(&job, previous_arrival_us);
            ctx.emitter
                .system_arrival(&job, previous_arrival_us, &stats);
        }

        let arrival_us = job.system_arrival_time_us;
        let mut queue = ctx.queue.lock().unwrap();
        let at_capacity = params
            .queue_bound()
            .is_some_and(|bound| queue.len() >= bound);
        if at_capacity {
            drop(queue);
            let mut stats = ctx.stats.lock().unwrap();
            stats.record_dropped_job();
            ctx.emitter.dropped_job(&job, previous_arrival_us, &stats);
            previous_arrival_us = arrival_us;
            continue;
        }

        let now_us = ctx.clock.now_us();
        job.queue_arrival_time_us = now_us;
        let last_interaction = queue.last_interaction_time_us();
        let area_increment = queue.push_back(job, now_us);
        let queue_length = queue.len();
        {
            let mut stats = ctx.stats.lock().unwrap();
            stats.record_queue_arrival(area_increment, queue_length);
            if let Some(admitted) = queue.back() {
                ctx.emitter
                    .queue_arrival(admitted, &stats, &queue, last_interaction);
                ctx.emitter.job_update(admitted);
            }
        }
        drop(queue);

        ctx.queue_wake.notify_waiters();
        previous_arrival_us = arrival_us;
    }

    ctx.set_all_jobs_arrived();
    // Wake idle printers so they can observe termination.
    ctx.queue_wake.notify_waiters();
}
