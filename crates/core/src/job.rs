use serde::{Deserialize, Serialize};

/// A single print job.
///
/// Identity (`id`, `papers_required`, `inter_arrival_time_us`) is fixed at
/// creation; the lifecycle timestamps are stamped as the job moves through
/// the system and stay `0` for stages it never reached. All timestamps are
/// microseconds relative to simulation start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Job {
    /// Job identifier (1-based, in arrival order).
    pub id: u32,
    /// Number of pages this job prints.
    pub papers_required: u32,
    /// Inter-arrival delay that preceded this job.
    pub inter_arrival_time_us: u64,
    /// Requested service time in milliseconds, set by the printer that
    /// dequeues the job (`papers_required / printing_rate`).
    pub service_time_requested_ms: u64,
    /// When the job entered the system.
    pub system_arrival_time_us: u64,
    /// When the job was admitted to the queue.
    pub queue_arrival_time_us: u64,
    /// When the job left the queue.
    pub queue_departure_time_us: u64,
    /// When service began.
    pub service_arrival_time_us: u64,
    /// When service completed.
    pub service_departure_time_us: u64,
}

impl Job {
    /// Creates a job with identity fields set and all timestamps cleared.
    pub fn new(id: u32, papers_required: u32, inter_arrival_time_us: u64) -> Self {
        Self {
            id,
            papers_required,
            inter_arrival_time_us,
            service_time_requested_ms: 0,
            system_arrival_time_us: 0,
            queue_arrival_time_us: 0,
            queue_departure_time_us: 0,
            service_arrival_time_us: 0,
            service_departure_time_us: 0,
        }
    }

    /// Total time the job spent waiting in the queue, in microseconds.
    pub fn queue_wait_us(&self) -> u64 {
        self.queue_departure_time_us
            .saturating_sub(self.queue_arrival_time_us)
    }

    /// Total time the job spent in the system (wait + service), in
    /// microseconds. Only meaningful once the job has departed.
    pub fn system_time_us(&self) -> u64 {
        self.service_departure_time_us
            .saturating_sub(self.system_arrival_time_us)
    }

    /// Time the job spent in service, in microseconds.
    pub fn service_time_us(&self) -> u64 {
        self.service_departure_time_us
            .saturating_sub(self.service_arrival_time_us)
    }
}

#[cfg(test)]
mod tests {
    use super::Job;

    #[test]
    fn new_job_has_cleared_timestamps() {
        let job = Job::new(7, 12, 500_000);
        assert_eq!(job.id, 7);
        assert_eq!(job.papers_required, 12);
        assert_eq!(job.inter_arrival_time_us, 500_000);
        assert_eq!(job.system_arrival_time_us, 0);
        assert_eq!(job.service_departure_time_us, 0);
    }

    #[test]
    fn durations_are_timestamp_deltas() {
        let mut job = Job::new(1, 5, 0);
        job.system_arrival_time_us = 100;
        job.queue_arrival_time_us = 110;
        job.queue_departure_time_us = 400;
        job.service_arrival_time_us = 410;
        job.service_departure_time_us = 1_410;

        assert_eq!(job.queue_wait_us(), 290);
        assert_eq!(job.service_time_us(), 1_000);
        assert_eq!(job.system_time_us(), 1_310);
    }
}
