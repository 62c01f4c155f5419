//! Shared text shapes for event lines, used by both output back-ends.

use pressroom_core::Job;

/// `00000251.457ms: ` style timestamp prefix for a microsecond value.
pub fn clock_prefix(time_us: u64) -> String {
    format!("{:08}.{:03}ms: ", time_us / 1_000, time_us % 1_000)
}

/// A microsecond duration as `N.NNNms`.
pub fn fmt_duration(duration_us: u64) -> String {
    format!("{}.{:03}ms", duration_us / 1_000, duration_us % 1_000)
}

pub fn arrival_line(job: &Job, previous_arrival_us: u64, dropped: bool) -> String {
    let gap_us = job.system_arrival_time_us.saturating_sub(previous_arrival_us);
    format!(
        "job{} arrives, needs {} paper{}, inter-arrival time = {}{}",
        job.id,
        job.papers_required,
        if job.papers_required == 1 { "" } else { "s" },
        fmt_duration(gap_us),
        if dropped { ", dropped" } else { "" }
    )
}

pub fn removed_line(job: &Job) -> String {
    format!("job{} removed from system", job.id)
}

pub fn queue_arrival_line(job: &Job, queue_length: usize) -> String {
    format!("job{} enters queue, queue length = {queue_length}", job.id)
}

pub fn queue_departure_line(job: &Job, queue_length: usize) -> String {
    format!(
        "job{} leaves queue, time in queue = {}, queue_length = {queue_length}",
        job.id,
        fmt_duration(job.queue_wait_us())
    )
}

pub fn printer_arrival_line(job: &Job, printer_id: u32) -> String {
    format!(
        "job{} begins service at printer{printer_id}, printing {} pages in about {}ms",
        job.id, job.papers_required, job.service_time_requested_ms
    )
}

pub fn system_departure_line(job: &Job, printer_id: u32) -> String {
    format!(
        "job{} departs from printer{printer_id}, service time = {}",
        job.id,
        fmt_duration(job.service_time_us())
    )
}

pub fn paper_empty_line(printer_id: u32, job_id: u32) -> String {
    format!("printer{printer_id} does not have enough paper for job{job_id} and is requesting refill")
}

pub fn refill_start_line(printer_id: u32, papers_needed: u32, refill_duration_us: u64) -> String {
    format!(
        "printer{printer_id} starts refilling {papers_needed} papers, estimated time = {}",
        fmt_duration(refill_duration_us)
    )
}

pub fn refill_end_line(printer_id: u32, refill_duration_us: u64) -> String {
    format!(
        "printer{printer_id} finishes refilling paper, actual time = {}",
        fmt_duration(refill_duration_us)
    )
}
