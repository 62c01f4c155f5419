//! End-to-end scenarios: full runs against a recording sink, with the
//! runtime clock paused so virtual time makes them fast and repeatable.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pressroom_core::{Job, Parameters};
use pressroom_engine::{
    Emitter, EventSink, PrinterSnapshot, SimStats, SinkMode, StatsReport, TimedQueue,
    start_simulation,
};

#[derive(Debug, Clone)]
enum Ev {
    Started,
    Ended,
    Stopped,
    Arrived(u32),
    Dropped(u32),
    Removed(u32),
    QueueIn { id: u32, len: usize },
    QueueOut { id: u32 },
    Departed { job: Job, printer: u32 },
    PaperEmpty { printer: u32, job: u32 },
    RefillStart { printer: u32, papers: u32 },
    RefillEnd { printer: u32 },
    ScaleUp { count: usize, at_us: u64 },
    ScaleDown { count: usize, at_us: u64 },
    Statistics(StatsReport),
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Ev>>,
}

impl Recorder {
    fn push(&self, ev: Ev) {
        self.events.lock().unwrap().push(ev);
    }

    fn take(&self) -> Vec<Ev> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for Recorder {
    fn simulation_start(&self, _stats: &SimStats) {
        self.push(Ev::Started);
    }
    fn simulation_end(&self, _stats: &SimStats) {
        self.push(Ev::Ended);
    }
    fn simulation_stopped(&self, _stats: &SimStats) {
        self.push(Ev::Stopped);
    }
    fn system_arrival(&self, job: &Job, _previous_arrival_us: u64, _stats: &SimStats) {
        self.push(Ev::Arrived(job.id));
    }
    fn dropped_job(&self, job: &Job, _previous_arrival_us: u64, _stats: &SimStats) {
        self.push(Ev::Dropped(job.id));
    }
    fn removed_job(&self, job: &Job, _now_us: u64) {
        self.push(Ev::Removed(job.id));
    }
    fn queue_arrival(
        &self,
        job: &Job,
        _stats: &SimStats,
        queue: &TimedQueue,
        _last_interaction_us: u64,
    ) {
        self.push(Ev::QueueIn {
            id: job.id,
            len: queue.len(),
        });
    }
    fn queue_departure(
        &self,
        job: &Job,
        _stats: &SimStats,
        _queue: &TimedQueue,
        _last_interaction_us: u64,
    ) {
        self.push(Ev::QueueOut { id: job.id });
    }
    fn system_departure(&self, job: &Job, printer: &PrinterSnapshot, _stats: &SimStats) {
        self.push(Ev::Departed {
            job: job.clone(),
            printer: printer.id,
        });
    }
    fn paper_empty(&self, printer: &PrinterSnapshot, job_id: u32, _now_us: u64) {
        self.push(Ev::PaperEmpty {
            printer: printer.id,
            job: job_id,
        });
    }
    fn paper_refill_start(
        &self,
        printer: &PrinterSnapshot,
        papers_needed: u32,
        _refill_duration_us: u64,
        _now_us: u64,
    ) {
        self.push(Ev::RefillStart {
            printer: printer.id,
            papers: papers_needed,
        });
    }
    fn paper_refill_end(&self, printer: &PrinterSnapshot, _refill_duration_us: u64, _now_us: u64) {
        self.push(Ev::RefillEnd {
            printer: printer.id,
        });
    }
    fn scale_up(&self, new_printer_count: usize, _queue_length: usize, now_us: u64) {
        self.push(Ev::ScaleUp {
            count: new_printer_count,
            at_us: now_us,
        });
    }
    fn scale_down(&self, new_printer_count: usize, _queue_length: usize, now_us: u64) {
        self.push(Ev::ScaleDown {
            count: new_printer_count,
            at_us: now_us,
        });
    }
    fn statistics(&self, report: &StatsReport) {
        self.push(Ev::Statistics(report.clone()));
    }
}

fn recording_emitter() -> (Arc<Recorder>, Emitter) {
    let recorder = Arc::new(Recorder::default());
    let mut emitter = Emitter::new();
    emitter.register_terminal(recorder.clone());
    emitter.select(SinkMode::Terminal);
    (recorder, emitter)
}

async fn run_to_completion(params: Parameters) -> (Vec<Ev>, StatsReport) {
    let (recorder, emitter) = recording_emitter();
    let handle = start_simulation(params, emitter);
    handle.wait().await.expect("simulation failed");
    let events = recorder.take();
    let report = final_report(&events);
    (events, report)
}

fn final_report(events: &[Ev]) -> StatsReport {
    match events.last() {
        Some(Ev::Statistics(report)) => report.clone(),
        other => panic!("expected the statistics event last, got {other:?}"),
    }
}

fn departed_jobs(events: &[Ev]) -> Vec<(Job, u32)> {
    events
        .iter()
        .filter_map(|ev| match ev {
            Ev::Departed { job, printer } => Some((job.clone(), *printer)),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn trivial_run_serves_every_job_on_one_printer() {
    let params = Parameters {
        num_jobs: 3,
        fixed_arrival: true,
        job_arrival_time_us: 100_000,
        papers_required_lower_bound: 1,
        papers_required_upper_bound: 1,
        printing_rate: 1000.0,
        printer_paper_capacity: 100,
        queue_capacity: -1,
        consumer_count: 1,
        auto_scaling: false,
        ..Parameters::default()
    };
    let (events, report) = run_to_completion(params).await;

    assert_eq!(report.total_jobs_arrived, 3);
    assert_eq!(report.total_jobs_served, 3);
    assert_eq!(report.total_jobs_dropped, 0);
    assert_eq!(report.total_jobs_removed, 0);
    assert_eq!(report.paper_refill_events, 0);
    assert_eq!(report.printers[0].jobs_served, 3);

    // Every served job respects the lifecycle timestamp ordering.
    for (job, printer) in departed_jobs(&events) {
        assert_eq!(printer, 1);
        assert!(job.system_arrival_time_us <= job.queue_arrival_time_us);
        assert!(job.queue_arrival_time_us <= job.queue_departure_time_us);
        assert!(job.queue_departure_time_us <= job.service_arrival_time_us);
        assert!(job.service_arrival_time_us <= job.service_departure_time_us);
    }
}

#[tokio::test(start_paused = true)]
async fn bounded_queue_drops_overflow_jobs() {
    let params = Parameters {
        num_jobs: 10,
        fixed_arrival: true,
        job_arrival_time_us: 10_000,
        papers_required_lower_bound: 10,
        papers_required_upper_bound: 10,
        printing_rate: 1.0,
        printer_paper_capacity: 100,
        queue_capacity: 2,
        consumer_count: 1,
        auto_scaling: false,
        ..Parameters::default()
    };
    let (events, report) = run_to_completion(params).await;

    assert_eq!(report.total_jobs_arrived, 10);
    assert!(report.total_jobs_dropped >= 7, "dropped {}", report.total_jobs_dropped);
    assert!(report.total_jobs_served <= 3, "served {}", report.total_jobs_served);
    assert_eq!(report.max_queue_length, 2);
    assert_eq!(
        report.total_jobs_served + report.total_jobs_dropped,
        report.total_jobs_arrived
    );
    assert!(report.job_drop_probability >= 0.7);

    // The queue never reports a length beyond its capacity.
    for ev in &events {
        if let Ev::QueueIn { len, .. } = ev {
            assert!(*len <= 2);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn paper_exhaustion_triggers_refills_to_capacity() {
    let params = Parameters {
        num_jobs: 5,
        fixed_arrival: true,
        job_arrival_time_us: 10_000,
        papers_required_lower_bound: 5,
        papers_required_upper_bound: 5,
        printing_rate: 5.0,
        printer_paper_capacity: 10,
        refill_rate: 25.0,
        queue_capacity: -1,
        consumer_count: 1,
        auto_scaling: false,
        ..Parameters::default()
    };
    let (events, report) = run_to_completion(params).await;

    assert_eq!(report.total_jobs_served, 5);
    assert_eq!(report.paper_refill_events, 2);
    // Each refill tops an empty 10-page tray back up to capacity.
    assert_eq!(report.papers_refilled, 20);
    let refill_sizes: Vec<u32> = events
        .iter()
        .filter_map(|ev| match ev {
            Ev::RefillStart { papers, .. } => Some(*papers),
            _ => None,
        })
        .collect();
    assert_eq!(refill_sizes, vec![10, 10]);
    assert_eq!(
        events
            .iter()
            .filter(|ev| matches!(ev, Ev::RefillEnd { .. }))
            .count(),
        2
    );
    assert!(events.iter().any(|ev| matches!(ev, Ev::PaperEmpty { .. })));

    // Paper conservation: pages used cannot exceed the initial tray plus
    // every refill.
    let capacity = 10;
    assert!(report.printers[0].paper_used <= capacity * (1 + report.paper_refill_events));
}

#[tokio::test(start_paused = true)]
async fn autoscaler_grows_the_pool_under_queue_pressure() {
    let params = Parameters {
        num_jobs: 100,
        fixed_arrival: true,
        job_arrival_time_us: 10_000,
        papers_required_lower_bound: 20,
        papers_required_upper_bound: 20,
        printing_rate: 4.0,
        printer_paper_capacity: 200,
        refill_rate: 25.0,
        queue_capacity: -1,
        consumer_count: 2,
        auto_scaling: true,
        ..Parameters::default()
    };
    let (events, report) = run_to_completion(params).await;

    let scale_ups: Vec<(usize, u64)> = events
        .iter()
        .filter_map(|ev| match ev {
            Ev::ScaleUp { count, at_us } => Some((*count, *at_us)),
            _ => None,
        })
        .collect();
    assert!(!scale_ups.is_empty(), "no scale-up happened");
    // The cooldown keeps the first action away from the start of the run.
    assert!(scale_ups[0].1 >= 5_000_000, "first scale-up at {}", scale_ups[0].1);
    assert!(scale_ups.iter().any(|(count, _)| *count >= 3));
    assert!(scale_ups.iter().all(|(count, _)| *count <= 5));
    assert!(report.max_queue_length >= 10);
    assert_eq!(report.total_jobs_served, 100);
    assert!(report.printers.len() >= 3);
}

#[tokio::test(start_paused = true)]
async fn stop_drains_the_queue_and_still_reports() {
    let params = Parameters {
        num_jobs: 50,
        fixed_arrival: true,
        job_arrival_time_us: 10_000,
        papers_required_lower_bound: 5,
        papers_required_upper_bound: 5,
        printing_rate: 4.0,
        printer_paper_capacity: 150,
        queue_capacity: -1,
        consumer_count: 1,
        auto_scaling: false,
        ..Parameters::default()
    };
    let (recorder, emitter) = recording_emitter();
    let handle = start_simulation(params, emitter);

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.request_stop();
    handle.wait().await.expect("simulation failed");

    let events = recorder.take();
    let report = final_report(&events);

    let stopped = events.iter().filter(|ev| matches!(ev, Ev::Stopped)).count();
    assert_eq!(stopped, 1);

    let removed = events.iter().filter(|ev| matches!(ev, Ev::Removed(_))).count();
    assert_eq!(report.total_jobs_removed, removed as u64);

    // Arrivals split exactly into served, dropped and removed once every
    // worker has wound down.
    assert_eq!(
        report.total_jobs_arrived,
        report.total_jobs_served + report.total_jobs_dropped + report.total_jobs_removed
    );
    assert!(matches!(events.last(), Some(Ev::Statistics(_))));
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent() {
    let params = Parameters {
        num_jobs: 20,
        fixed_arrival: true,
        job_arrival_time_us: 10_000,
        papers_required_lower_bound: 5,
        papers_required_upper_bound: 5,
        printing_rate: 4.0,
        queue_capacity: -1,
        consumer_count: 1,
        auto_scaling: false,
        ..Parameters::default()
    };
    let (recorder, emitter) = recording_emitter();
    let handle = start_simulation(params, emitter);

    tokio::time::sleep(Duration::from_millis(35)).await;
    handle.request_stop();
    handle.request_stop();
    handle.wait().await.expect("simulation failed");

    let events = recorder.take();
    let stopped = events.iter().filter(|ev| matches!(ev, Ev::Stopped)).count();
    assert_eq!(stopped, 1);
    assert!(matches!(events.last(), Some(Ev::Statistics(_))));
}

#[tokio::test(start_paused = true)]
async fn stop_before_the_first_arrival_still_reports() {
    let params = Parameters {
        num_jobs: 10,
        fixed_arrival: true,
        job_arrival_time_us: 500_000,
        consumer_count: 1,
        auto_scaling: false,
        ..Parameters::default()
    };
    let (recorder, emitter) = recording_emitter();
    let handle = start_simulation(params, emitter);

    tokio::time::sleep(Duration::from_millis(1)).await;
    handle.request_stop();
    handle.wait().await.expect("simulation failed");

    let events = recorder.take();
    let report = final_report(&events);
    assert_eq!(report.total_jobs_arrived, 0);
    assert_eq!(report.total_jobs_served, 0);
    assert_eq!(report.total_jobs_removed, 0);
    assert_eq!(events.iter().filter(|ev| matches!(ev, Ev::Stopped)).count(), 1);
    assert!(matches!(events.last(), Some(Ev::Statistics(_))));
}

#[tokio::test(start_paused = true)]
async fn random_arrivals_stay_inside_the_configured_bounds() {
    let params = Parameters {
        num_jobs: 8,
        fixed_arrival: false,
        min_arrival_time_ms: 200,
        max_arrival_time_ms: 500,
        papers_required_lower_bound: 5,
        papers_required_upper_bound: 5,
        printing_rate: 10.0,
        printer_paper_capacity: 200,
        queue_capacity: -1,
        consumer_count: 2,
        auto_scaling: false,
        ..Parameters::default()
    };
    let (events, report) = run_to_completion(params).await;

    assert_eq!(report.total_jobs_arrived, 8);
    assert_eq!(report.total_jobs_served, 8);
    for (job, _) in departed_jobs(&events) {
        assert!(
            (200_000..=500_000).contains(&job.inter_arrival_time_us),
            "job {} had inter-arrival {}us",
            job.id,
            job.inter_arrival_time_us
        );
    }
}

#[tokio::test(start_paused = true)]
async fn zero_jobs_still_runs_the_full_lifecycle() {
    let params = Parameters {
        num_jobs: 0,
        consumer_count: 1,
        auto_scaling: false,
        ..Parameters::default()
    };
    let (events, report) = run_to_completion(params).await;

    assert!(events.iter().any(|ev| matches!(ev, Ev::Started)));
    assert!(events.iter().any(|ev| matches!(ev, Ev::Ended)));
    assert!(matches!(events.last(), Some(Ev::Statistics(_))));
    assert_eq!(report.total_jobs_arrived, 0);
    assert_eq!(report.total_jobs_served, 0);
}

#[tokio::test(start_paused = true)]
async fn unlimited_queue_never_drops_and_stays_fifo() {
    let params = Parameters {
        num_jobs: 20,
        fixed_arrival: true,
        job_arrival_time_us: 10_000,
        papers_required_lower_bound: 5,
        papers_required_upper_bound: 5,
        printing_rate: 4.0,
        printer_paper_capacity: 150,
        queue_capacity: -1,
        consumer_count: 2,
        auto_scaling: false,
        ..Parameters::default()
    };
    let (events, report) = run_to_completion(params).await;

    assert_eq!(report.total_jobs_dropped, 0);
    assert_eq!(report.total_jobs_arrived, 20);
    assert_eq!(report.total_jobs_served, 20);
    assert_eq!(
        report.total_jobs_arrived,
        report.total_jobs_served + report.total_jobs_dropped + report.total_jobs_removed
    );

    // Dequeue order matches enqueue order.
    let ins: Vec<u32> = events
        .iter()
        .filter_map(|ev| match ev {
            Ev::QueueIn { id, .. } => Some(*id),
            _ => None,
        })
        .collect();
    let outs: Vec<u32> = events
        .iter()
        .filter_map(|ev| match ev {
            Ev::QueueOut { id } => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(ins, outs);

    // Both printers took part.
    let printers: std::collections::BTreeSet<u32> =
        departed_jobs(&events).into_iter().map(|(_, p)| p).collect();
    let expected: std::collections::BTreeSet<u32> = [1, 2].into_iter().collect();
    assert_eq!(printers, expected);
}
