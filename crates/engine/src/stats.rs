use pressroom_core::Job;
use serde::Serialize;

/// Hard ceiling on the printer pool size; per-printer statistics arrays are
/// sized by this.
pub const MAX_PRINTERS: usize = 5;

/// Raw statistics accumulators, advanced synchronously at every state
/// transition under the stats lock. Derived metrics live in
/// [`StatsReport`], computed on read.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SimStats {
    /// Simulation start, microseconds (0 on the simulation clock).
    pub simulation_start_time_us: u64,
    /// Total simulation duration, set at end or stop.
    pub simulation_duration_us: u64,
    /// Jobs that entered the system.
    pub total_jobs_arrived: u64,
    /// Jobs that completed service.
    pub total_jobs_served: u64,
    /// Jobs dropped on admission (queue full).
    pub total_jobs_dropped: u64,
    /// Jobs removed from the queue by the shutdown drain.
    pub total_jobs_removed: u64,
    /// Sum of inter-arrival gaps, for the average.
    pub total_inter_arrival_time_us: u64,
    /// Sum over served jobs of departure − system arrival.
    pub total_system_time_us: u64,
    /// Sum of squared system times, for the standard deviation.
    pub sum_of_system_time_squared_us2: f64,
    /// Sum over served jobs of queue departure − queue arrival.
    pub total_queue_wait_time_us: u64,
    /// Time integral of queue length, advanced at every queue mutation.
    pub area_num_in_job_queue_us: u64,
    /// Peak queue length observed after an enqueue.
    pub max_job_queue_length: u32,
    /// Jobs completed, per printer.
    pub jobs_served_by_printer: [u64; MAX_PRINTERS],
    /// Pages consumed, per printer.
    pub printer_paper_used: [u64; MAX_PRINTERS],
    /// Service time, per printer.
    pub total_service_time_printer_us: [u64; MAX_PRINTERS],
    /// Time spent blocked on an empty tray, per printer.
    pub printer_paper_empty_time_us: [u64; MAX_PRINTERS],
    /// Largest number of simultaneously active printers.
    pub max_printers_used: u32,
    /// Completed refill operations.
    pub paper_refill_events: u64,
    /// Total time the refiller spent actively refilling.
    pub total_refill_service_time_us: u64,
    /// Pages supplied across all refills.
    pub papers_refilled: u64,
}

impl SimStats {
    /// Records a job entering the system.
    pub fn record_system_arrival(&mut self, job: &Job, previous_arrival_us: u64) {
        self.total_jobs_arrived += 1;
        self.total_inter_arrival_time_us += job
            .system_arrival_time_us
            .saturating_sub(previous_arrival_us);
    }

    /// Records an admission-control drop.
    pub fn record_dropped_job(&mut self) {
        self.total_jobs_dropped += 1;
    }

    /// Records a successful enqueue: folds the area increment and tracks the
    /// post-enqueue peak length.
    pub fn record_queue_arrival(&mut self, area_increment_us: u64, queue_length: usize) {
        self.area_num_in_job_queue_us += area_increment_us;
        self.max_job_queue_length = self.max_job_queue_length.max(queue_length as u32);
    }

    /// Records a dequeue's area increment.
    pub fn record_queue_departure(&mut self, area_increment_us: u64) {
        self.area_num_in_job_queue_us += area_increment_us;
    }

    /// Records the shutdown drain: `removed` jobs cleared from the queue.
    pub fn record_removed_jobs(&mut self, removed: usize, area_increment_us: u64) {
        self.area_num_in_job_queue_us += area_increment_us;
        self.total_jobs_removed += removed as u64;
    }

    /// Records a served job departing the system through `printer_index`.
    pub fn record_system_departure(&mut self, job: &Job, printer_index: usize) {
        let system_time_us = job.system_time_us();
        self.total_system_time_us += system_time_us;
        self.sum_of_system_time_squared_us2 += (system_time_us as f64) * (system_time_us as f64);
        self.total_queue_wait_time_us += job.queue_wait_us();
        self.total_jobs_served += 1;

        if printer_index < MAX_PRINTERS {
            self.jobs_served_by_printer[printer_index] += 1;
            self.printer_paper_used[printer_index] += u64::from(job.papers_required);
            self.total_service_time_printer_us[printer_index] += job.service_time_us();
        }
    }

    /// Records time a printer spent blocked on an empty tray.
    pub fn record_paper_empty_wait(&mut self, printer_index: usize, duration_us: u64) {
        if printer_index < MAX_PRINTERS {
            self.printer_paper_empty_time_us[printer_index] += duration_us;
        }
    }

    /// Records a completed refill.
    pub fn record_refill(&mut self, papers: u32, duration_us: u64) {
        self.paper_refill_events += 1;
        self.total_refill_service_time_us += duration_us;
        self.papers_refilled += u64::from(papers);
    }

    /// Tracks the peak active-printer count.
    pub fn record_printers_used(&mut self, active_count: usize) {
        self.max_printers_used = self.max_printers_used.max(active_count as u32);
    }

    fn avg_inter_arrival_sec(&self) -> f64 {
        if self.total_jobs_arrived <= 1 {
            return 0.0;
        }
        (self.total_inter_arrival_time_us as f64 / 1e6) / (self.total_jobs_arrived - 1) as f64
    }

    fn avg_system_time_sec(&self) -> f64 {
        if self.total_jobs_served == 0 {
            return 0.0;
        }
        (self.total_system_time_us as f64 / 1e6) / self.total_jobs_served as f64
    }

    fn avg_queue_wait_sec(&self) -> f64 {
        if self.total_jobs_served == 0 {
            return 0.0;
        }
        (self.total_queue_wait_time_us as f64 / 1e6) / self.total_jobs_served as f64
    }

    fn avg_queue_length(&self) -> f64 {
        if self.simulation_duration_us == 0 {
            return 0.0;
        }
        self.area_num_in_job_queue_us as f64 / self.simulation_duration_us as f64
    }

    fn system_time_std_dev_sec(&self) -> f64 {
        if self.total_jobs_served <= 1 {
            return 0.0;
        }
        let mean_us = self.avg_system_time_sec() * 1e6;
        let mean_sq = self.sum_of_system_time_squared_us2 / self.total_jobs_served as f64;
        let variance = mean_sq - mean_us * mean_us;
        variance.max(0.0).sqrt() / 1e6
    }

    fn arrival_rate_per_sec(&self) -> f64 {
        if self.simulation_duration_us == 0 {
            return 0.0;
        }
        self.total_jobs_arrived as f64 / (self.simulation_duration_us as f64 * 1e-6)
    }

    fn drop_probability(&self) -> f64 {
        if self.total_jobs_arrived == 0 {
            return 0.0;
        }
        self.total_jobs_dropped as f64 / self.total_jobs_arrived as f64
    }

    fn avg_service_time_sec(&self, printer_index: usize) -> f64 {
        let served = self.jobs_served_by_printer[printer_index];
        if served == 0 {
            return 0.0;
        }
        (self.total_service_time_printer_us[printer_index] as f64 / 1e6) / served as f64
    }

    fn utilization(&self, printer_index: usize) -> f64 {
        if self.simulation_duration_us == 0 {
            return 0.0;
        }
        self.total_service_time_printer_us[printer_index] as f64
            / self.simulation_duration_us as f64
    }

    /// Computes the derived report from the raw accumulators.
    pub fn report(&self) -> StatsReport {
        let printers_to_report = if self.max_printers_used > 0 {
            self.max_printers_used as usize
        } else {
            2
        };
        let printers = (0..printers_to_report.min(MAX_PRINTERS))
            .map(|i| PrinterReport {
                id: (i + 1) as u32,
                jobs_served: self.jobs_served_by_printer[i],
                paper_used: self.printer_paper_used[i],
                avg_service_time_sec: self.avg_service_time_sec(i),
                utilization: self.utilization(i),
            })
            .collect();

        StatsReport {
            simulation_duration_sec: self.simulation_duration_us as f64 / 1e6,
            total_jobs_arrived: self.total_jobs_arrived,
            total_jobs_served: self.total_jobs_served,
            total_jobs_dropped: self.total_jobs_dropped,
            total_jobs_removed: self.total_jobs_removed,
            job_arrival_rate_per_sec: self.arrival_rate_per_sec(),
            job_drop_probability: self.drop_probability(),
            avg_inter_arrival_time_sec: self.avg_inter_arrival_sec(),
            avg_system_time_sec: self.avg_system_time_sec(),
            system_time_std_dev_sec: self.system_time_std_dev_sec(),
            avg_queue_wait_time_sec: self.avg_queue_wait_sec(),
            avg_queue_length: self.avg_queue_length(),
            max_queue_length: self.max_job_queue_length,
            printers,
            paper_refill_events: self.paper_refill_events,
            total_refill_service_time_sec: self.total_refill_service_time_us as f64 / 1e6,
            papers_refilled: self.papers_refilled,
        }
    }
}

/// Derived metrics, computed at report time from [`SimStats`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatsReport {
    /// Total wall-clock of the run, seconds.
    pub simulation_duration_sec: f64,
    /// Jobs that entered the system.
    pub total_jobs_arrived: u64,
    /// Jobs served to completion.
    pub total_jobs_served: u64,
    /// Jobs dropped on admission.
    pub total_jobs_dropped: u64,
    /// Jobs removed by the shutdown drain.
    pub total_jobs_removed: u64,
    /// Arrival rate λ, jobs per second.
    pub job_arrival_rate_per_sec: f64,
    /// Fraction of arrivals dropped.
    pub job_drop_probability: f64,
    /// Average gap between arrivals, seconds.
    pub avg_inter_arrival_time_sec: f64,
    /// Average time in system (wait + service), seconds.
    pub avg_system_time_sec: f64,
    /// Standard deviation of time in system, seconds.
    pub system_time_std_dev_sec: f64,
    /// Average time waiting in the queue, seconds.
    pub avg_queue_wait_time_sec: f64,
    /// Time-averaged queue length.
    pub avg_queue_length: f64,
    /// Peak queue length.
    pub max_queue_length: u32,
    /// Per-printer breakdown.
    pub printers: Vec<PrinterReport>,
    /// Completed refill operations.
    pub paper_refill_events: u64,
    /// Total active refilling time, seconds.
    pub total_refill_service_time_sec: f64,
    /// Pages supplied across all refills.
    pub papers_refilled: u64,
}

/// Per-printer slice of the final report.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PrinterReport {
    /// Printer identifier (1-based).
    pub id: u32,
    /// Jobs completed by this printer.
    pub jobs_served: u64,
    /// Pages consumed by this printer.
    pub paper_used: u64,
    /// Average service time, seconds.
    pub avg_service_time_sec: f64,
    /// Fraction of the run this printer spent serving.
    pub utilization: f64,
}
