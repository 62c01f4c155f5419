use std::io::Write as _;

use pressroom_core::{Job, Parameters};
use pressroom_engine::{EventSink, PrinterSnapshot, SimStats, StatsReport, TimedQueue};

use crate::format::{
    arrival_line, clock_prefix, fmt_duration, paper_empty_line, printer_arrival_line,
    queue_arrival_line, queue_departure_line, refill_end_line, refill_start_line, removed_line,
    system_departure_line,
};

/// Human-readable stdout back-end.
///
/// Implements the lifecycle and job-flow events plus the final report;
/// scale, printer-status and stats-push events fall through to the trait's
/// no-op defaults.
pub struct TerminalSink;

impl TerminalSink {
    pub fn new() -> Self {
        Self
    }

    fn line(&self, time_us: u64, body: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}{body}", clock_prefix(time_us));
    }
}

impl EventSink for TerminalSink {
    fn simulation_parameters(&self, params: &Parameters) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "================= Simulation parameters =================");
        let _ = writeln!(out, "  Number of jobs: {}", params.num_jobs);
        let _ = writeln!(
            out,
            "  Job arrival time: {} ms",
            params.job_arrival_time_us as f64 / 1_000.0
        );
        let _ = writeln!(out, "  Printing rate: {} pages/sec", params.printing_rate);
        let _ = writeln!(
            out,
            "  Printer paper capacity: {}",
            params.printer_paper_capacity
        );
        let _ = writeln!(out, "  Queue capacity: {}", params.queue_capacity);
        let _ = writeln!(out, "  Refill rate: {} papers/sec", params.refill_rate);
        let _ = writeln!(
            out,
            "  Papers required (lower bound): {}",
            params.papers_required_lower_bound
        );
        let _ = writeln!(
            out,
            "  Papers required (upper bound): {}",
            params.papers_required_upper_bound
        );
    }

    fn simulation_start(&self, stats: &SimStats) {
        self.line(stats.simulation_start_time_us, "simulation begins");
    }

    fn simulation_end(&self, stats: &SimStats) {
        self.line(
            stats.simulation_start_time_us + stats.simulation_duration_us,
            &format!(
                "simulation ends, duration = {}",
                fmt_duration(stats.simulation_duration_us)
            ),
        );
    }

    fn simulation_stopped(&self, stats: &SimStats) {
        self.line(
            stats.simulation_start_time_us + stats.simulation_duration_us,
            &format!(
                "simulation stopped, duration = {}",
                fmt_duration(stats.simulation_duration_us)
            ),
        );
    }

    fn system_arrival(&self, job: &Job, previous_arrival_us: u64, _stats: &SimStats) {
        self.line(
            job.system_arrival_time_us,
            &arrival_line(job, previous_arrival_us, false),
        );
    }

    fn dropped_job(&self, job: &Job, previous_arrival_us: u64, _stats: &SimStats) {
        self.line(
            job.system_arrival_time_us,
            &arrival_line(job, previous_arrival_us, true),
        );
    }

    fn removed_job(&self, job: &Job, now_us: u64) {
        self.line(now_us, &removed_line(job));
    }

    fn queue_arrival(
        &self,
        job: &Job,
        _stats: &SimStats,
        queue: &TimedQueue,
        _last_interaction_us: u64,
    ) {
        self.line(job.queue_arrival_time_us, &queue_arrival_line(job, queue.len()));
    }

    fn queue_departure(
        &self,
        job: &Job,
        _stats: &SimStats,
        queue: &TimedQueue,
        _last_interaction_us: u64,
    ) {
        self.line(
            job.queue_departure_time_us,
            &queue_departure_line(job, queue.len()),
        );
    }

    fn printer_arrival(&self, job: &Job, printer: &PrinterSnapshot) {
        self.line(
            job.service_arrival_time_us,
            &printer_arrival_line(job, printer.id),
        );
    }

    fn system_departure(&self, job: &Job, printer: &PrinterSnapshot, _stats: &SimStats) {
        self.line(
            job.service_departure_time_us,
            &system_departure_line(job, printer.id),
        );
    }

    fn paper_empty(&self, printer: &PrinterSnapshot, job_id: u32, now_us: u64) {
        self.line(now_us, &paper_empty_line(printer.id, job_id));
    }

    fn paper_refill_start(
        &self,
        printer: &PrinterSnapshot,
        papers_needed: u32,
        refill_duration_us: u64,
        now_us: u64,
    ) {
        self.line(
            now_us,
            &refill_start_line(printer.id, papers_needed, refill_duration_us),
        );
    }

    fn paper_refill_end(&self, printer: &PrinterSnapshot, refill_duration_us: u64, now_us: u64) {
        self.line(now_us, &refill_end_line(printer.id, refill_duration_us));
    }

    fn statistics(&self, report: &StatsReport) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out);
        let _ = writeln!(out, "================= SIMULATION STATISTICS =================");
        let _ = writeln!(
            out,
            "Simulation Duration:               {:.3} sec",
            report.simulation_duration_sec
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "--- Job Flow Statistics ---");
        let _ = writeln!(out, "Total Jobs Arrived:                {}", report.total_jobs_arrived);
        let _ = writeln!(out, "Total Jobs Served:                 {}", report.total_jobs_served);
        let _ = writeln!(out, "Total Jobs Dropped:                {}", report.total_jobs_dropped);
        let _ = writeln!(out, "Total Jobs Removed:                {}", report.total_jobs_removed);
        let _ = writeln!(
            out,
            "Job Arrival Rate (λ):              {:.3} jobs/sec",
            report.job_arrival_rate_per_sec
        );
        let _ = writeln!(
            out,
            "Job Drop Probability:              {:.3} ({:.2}%)",
            report.job_drop_probability,
            report.job_drop_probability * 100.0
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "--- Timing Statistics ---");
        let _ = writeln!(
            out,
            "Average Inter-arrival Time:        {:.3} sec",
            report.avg_inter_arrival_time_sec
        );
        let _ = writeln!(
            out,
            "Average System Time:               {:.3} sec",
            report.avg_system_time_sec
        );
        let _ = writeln!(
            out,
            "System Time Standard Deviation:    {:.3} sec",
            report.system_time_std_dev_sec
        );
        let _ = writeln!(
            out,
            "Average Queue Wait Time:           {:.3} sec",
            report.avg_queue_wait_time_sec
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "--- Queue Statistics ---");
        let _ = writeln!(
            out,
            "Average Queue Length:              {:.3} jobs",
            report.avg_queue_length
        );
        let _ = writeln!(
            out,
            "Maximum Queue Length:              {} jobs",
            report.max_queue_length
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "--- Printer Statistics ---");
        for (index, printer) in report.printers.iter().enumerate() {
            let _ = writeln!(
                out,
                "Jobs Served by Printer {}:          {}",
                printer.id, printer.jobs_served
            );
            let _ = writeln!(
                out,
                "Total Paper Used by Printer {}:     {}",
                printer.id, printer.paper_used
            );
            let _ = writeln!(
                out,
                "Avg Service Time (Printer {}):      {:.3} sec",
                printer.id, printer.avg_service_time_sec
            );
            let _ = writeln!(
                out,
                "Utilization (Printer {}):           {:.3}%",
                printer.id,
                printer.utilization * 100.0
            );
            if index + 1 < report.printers.len() {
                let _ = writeln!(out);
            }
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "--- Paper Management ---");
        let _ = writeln!(
            out,
            "Paper Refill Events:               {}",
            report.paper_refill_events
        );
        let _ = writeln!(
            out,
            "Total Refill Service Time:         {:.3} sec",
            report.total_refill_service_time_sec
        );
        let _ = writeln!(out, "Papers Refilled:                   {}", report.papers_refilled);
        let _ = writeln!(out, "=========================================================");
    }
}
