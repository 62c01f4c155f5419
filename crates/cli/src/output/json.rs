use std::io::Write as _;

use pressroom_core::{Job, Parameters};
use pressroom_engine::{EventSink, PrinterSnapshot, SimStats, StatsReport, TimedQueue};
use serde_json::json;

use crate::format::{
    arrival_line, clock_prefix, fmt_duration, paper_empty_line, printer_arrival_line,
    queue_arrival_line, queue_departure_line, refill_end_line, refill_start_line, removed_line,
    system_departure_line,
};

/// Machine-readable back-end: one JSON frame per event on stdout.
///
/// Narrative events become `{"type":"log","message":...}` frames carrying the
/// same text the terminal back-end prints; scaling, printer-status and
/// statistics events get structured frames.
pub struct JsonSink;

impl JsonSink {
    pub fn new() -> Self {
        Self
    }

    fn frame(&self, value: serde_json::Value) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{value}");
    }

    fn log(&self, time_us: u64, message: &str) {
        self.frame(json!({
            "type": "log",
            "message": format!("{}{message}", clock_prefix(time_us)),
        }));
    }

    fn printer_status(&self, printer: &PrinterSnapshot, status: &str) {
        self.frame(json!({
            "type": "printer_status",
            "printer_id": printer.id,
            "status": status,
            "paper": printer.current_paper_count,
            "capacity": printer.capacity,
        }));
    }
}

impl EventSink for JsonSink {
    fn simulation_parameters(&self, params: &Parameters) {
        self.frame(json!({
            "type": "params",
            "params": params,
        }));
    }

    fn simulation_start(&self, stats: &SimStats) {
        self.log(stats.simulation_start_time_us, "simulation begins");
    }

    fn simulation_end(&self, stats: &SimStats) {
        self.log(
            stats.simulation_start_time_us + stats.simulation_duration_us,
            &format!(
                "simulation ends, duration = {}",
                fmt_duration(stats.simulation_duration_us)
            ),
        );
    }

    fn simulation_stopped(&self, stats: &SimStats) {
        self.log(
            stats.simulation_start_time_us + stats.simulation_duration_us,
            &format!(
                "simulation stopped, duration = {}",
                fmt_duration(stats.simulation_duration_us)
            ),
        );
    }

    fn system_arrival(&self, job: &Job, previous_arrival_us: u64, _stats: &SimStats) {
        self.log(
            job.system_arrival_time_us,
            &arrival_line(job, previous_arrival_us, false),
        );
    }

    fn dropped_job(&self, job: &Job, previous_arrival_us: u64, _stats: &SimStats) {
        self.log(
            job.system_arrival_time_us,
            &arrival_line(job, previous_arrival_us, true),
        );
    }

    fn removed_job(&self, job: &Job, now_us: u64) {
        self.log(now_us, &removed_line(job));
    }

    fn queue_arrival(
        &self,
        job: &Job,
        _stats: &SimStats,
        queue: &TimedQueue,
        _last_interaction_us: u64,
    ) {
        self.log(job.queue_arrival_time_us, &queue_arrival_line(job, queue.len()));
    }

    fn queue_departure(
        &self,
        job: &Job,
        _stats: &SimStats,
        queue: &TimedQueue,
        _last_interaction_us: u64,
    ) {
        self.log(
            job.queue_departure_time_us,
            &queue_departure_line(job, queue.len()),
        );
    }

    fn job_update(&self, job: &Job) {
        self.frame(json!({
            "type": "job_update",
            "job_id": job.id,
            "papers_required": job.papers_required,
        }));
    }

    fn printer_arrival(&self, job: &Job, printer: &PrinterSnapshot) {
        self.log(
            job.service_arrival_time_us,
            &printer_arrival_line(job, printer.id),
        );
    }

    fn system_departure(&self, job: &Job, printer: &PrinterSnapshot, _stats: &SimStats) {
        self.log(
            job.service_departure_time_us,
            &system_departure_line(job, printer.id),
        );
    }

    fn paper_empty(&self, printer: &PrinterSnapshot, job_id: u32, now_us: u64) {
        self.log(now_us, &paper_empty_line(printer.id, job_id));
    }

    fn paper_refill_start(
        &self,
        printer: &PrinterSnapshot,
        papers_needed: u32,
        refill_duration_us: u64,
        now_us: u64,
    ) {
        self.log(
            now_us,
            &refill_start_line(printer.id, papers_needed, refill_duration_us),
        );
    }

    fn paper_refill_end(&self, printer: &PrinterSnapshot, refill_duration_us: u64, now_us: u64) {
        self.log(now_us, &refill_end_line(printer.id, refill_duration_us));
    }

    fn scale_up(&self, new_printer_count: usize, queue_length: usize, now_us: u64) {
        self.frame(json!({
            "type": "autoscale",
            "action": "scale_up",
            "time_us": now_us,
            "printer_count": new_printer_count,
            "queue_length": queue_length,
        }));
    }

    fn scale_down(&self, new_printer_count: usize, queue_length: usize, now_us: u64) {
        self.frame(json!({
            "type": "autoscale",
            "action": "scale_down",
            "time_us": now_us,
            "printer_count": new_printer_count,
            "queue_length": queue_length,
        }));
    }

    fn printer_idle(&self, printer: &PrinterSnapshot) {
        self.printer_status(printer, "idle");
    }

    fn printer_busy(&self, printer: &PrinterSnapshot, _job_id: u32) {
        self.printer_status(printer, "busy");
    }

    fn printer_waiting_refill(&self, printer: &PrinterSnapshot) {
        self.printer_status(printer, "waiting_refill");
    }

    fn stats_update(&self, stats: &SimStats, queue_length: usize) {
        self.frame(json!({
            "type": "stats_update",
            "queue_length": queue_length,
            "stats": stats,
        }));
    }

    fn statistics(&self, report: &StatsReport) {
        self.frame(json!({
            "type": "statistics",
            "data": report,
        }));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    #[test]
    fn statistics_frames_use_the_envelope_shape() {
        let report = pressroom_engine::SimStats::default().report();
        let frame = json!({ "type": "statistics", "data": report });
        assert_eq!(frame["type"], "statistics");
        assert!(frame["data"]["printers"].is_array());
        assert_eq!(frame["data"]["total_jobs_served"], 0);
    }
}
