use clap::{Parser, ValueEnum};

use pressroom_core::params::{UNLIMITED_QUEUE, ranges};
use pressroom_core::{Parameters, ParamsPatch};

fn parse_queue_capacity(input: &str) -> Result<i32, String> {
    let value: i32 = input
        .parse()
        .map_err(|_| format!("invalid queue capacity: {input:?}"))?;
    if value == UNLIMITED_QUEUE || value >= 1 {
        Ok(value)
    } else {
        Err("queue capacity must be -1 (unlimited) or a positive integer".to_string())
    }
}

fn parse_printing_rate(input: &str) -> Result<f64, String> {
    parse_rate(input, "printing rate", &ranges::PRINTING_RATE)
}

fn parse_refill_rate(input: &str) -> Result<f64, String> {
    parse_rate(input, "refill rate", &ranges::REFILL_RATE)
}

fn parse_rate(
    input: &str,
    name: &str,
    range: &std::ops::RangeInclusive<f64>,
) -> Result<f64, String> {
    let value: f64 = input.parse().map_err(|_| format!("invalid {name}: {input:?}"))?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "{name} must be between {:.2} and {:.2}",
            range.start(),
            range.end()
        ))
    }
}

/// Event output back-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-readable log lines and report on stdout.
    Terminal,
    /// One JSON frame per event on stdout.
    Json,
}

/// Base parameter table the flags override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// The stock defaults (10 jobs every 500 ms, two printers).
    Default,
    /// Faster arrivals, bigger jobs, smaller trays, autoscaling on.
    HighLoad,
}

/// Flags override the chosen preset field by field; anything not given on
/// the command line (or via `PRESSROOM_*` environment variables) keeps the
/// preset's value.
#[derive(Debug, Clone, Parser)]
#[command(name = "pressroom", version, about = "Concurrent print-service simulator")]
pub struct Cli {
    /// Base parameter table to start from.
    #[arg(long, env = "PRESSROOM_PRESET", value_enum, default_value = "default")]
    pub preset: Preset,

    /// Number of jobs to generate.
    #[arg(long = "num-jobs", env = "PRESSROOM_NUM_JOBS",
          value_parser = clap::value_parser!(u32).range(1..))]
    pub num_jobs: Option<u32>,

    /// Queue capacity; -1 means unlimited.
    #[arg(long = "queue-capacity", env = "PRESSROOM_QUEUE_CAPACITY",
          allow_hyphen_values = true, value_parser = parse_queue_capacity)]
    pub queue_capacity: Option<i32>,

    /// Lower bound of the per-job page count (5..=10).
    #[arg(long = "papers-lower", env = "PRESSROOM_PAPERS_LOWER",
          value_parser = clap::value_parser!(u32).range(5..=10))]
    pub papers_lower: Option<u32>,

    /// Upper bound of the per-job page count (15..=30).
    #[arg(long = "papers-upper", env = "PRESSROOM_PAPERS_UPPER",
          value_parser = clap::value_parser!(u32).range(15..=30))]
    pub papers_upper: Option<u32>,

    /// Paper tray capacity of every printer, in pages (50..=200).
    #[arg(long = "paper-capacity", env = "PRESSROOM_PAPER_CAPACITY",
          value_parser = clap::value_parser!(u32).range(50..=200))]
    pub paper_capacity: Option<u32>,

    /// Printing rate in pages per second (4..=10).
    #[arg(long = "printing-rate", env = "PRESSROOM_PRINTING_RATE",
          value_parser = parse_printing_rate)]
    pub printing_rate: Option<f64>,

    /// Refill rate in pages per second (15..=30).
    #[arg(long = "refill-rate", env = "PRESSROOM_REFILL_RATE",
          value_parser = parse_refill_rate)]
    pub refill_rate: Option<f64>,

    /// Minimum number of printers (1..=5).
    #[arg(long = "consumers", env = "PRESSROOM_CONSUMERS",
          value_parser = clap::value_parser!(u32).range(1..=5))]
    pub consumers: Option<u32>,

    /// Enable (or, with an explicit `false`, disable) pool autoscaling.
    #[arg(long = "auto-scale", env = "PRESSROOM_AUTO_SCALE",
          value_parser = clap::value_parser!(bool),
          num_args = 0..=1, default_missing_value = "true")]
    pub auto_scale: Option<bool>,

    /// Fixed vs. random inter-arrival times.
    #[arg(long = "fixed-arrival", env = "PRESSROOM_FIXED_ARRIVAL",
          value_parser = clap::value_parser!(bool),
          num_args = 0..=1, default_missing_value = "true")]
    pub fixed_arrival: Option<bool>,

    /// Fixed inter-arrival time in milliseconds (200..=800).
    #[arg(long = "job-arrival-time", env = "PRESSROOM_JOB_ARRIVAL_TIME",
          value_parser = clap::value_parser!(u64).range(200..=800))]
    pub job_arrival_time_ms: Option<u64>,

    /// Random inter-arrival lower bound, milliseconds (200..=400).
    #[arg(long = "min-arrival", env = "PRESSROOM_MIN_ARRIVAL",
          value_parser = clap::value_parser!(u64).range(200..=400))]
    pub min_arrival_ms: Option<u64>,

    /// Random inter-arrival upper bound, milliseconds (500..=800).
    #[arg(long = "max-arrival", env = "PRESSROOM_MAX_ARRIVAL",
          value_parser = clap::value_parser!(u64).range(500..=800))]
    pub max_arrival_ms: Option<u64>,

    /// Event output back-end.
    #[arg(long, env = "PRESSROOM_OUTPUT", value_enum, default_value = "terminal")]
    pub output: OutputMode,
}

impl Cli {
    fn base(&self) -> Parameters {
        match self.preset {
            Preset::Default => Parameters::default(),
            Preset::HighLoad => Parameters::high_load(),
        }
    }

    fn to_patch(&self) -> ParamsPatch {
        ParamsPatch {
            num_jobs: self.num_jobs,
            job_arrival_time_us: self.job_arrival_time_ms.map(|ms| ms * 1_000),
            papers_required_lower_bound: self.papers_lower,
            papers_required_upper_bound: self.papers_upper,
            queue_capacity: self.queue_capacity,
            printing_rate: self.printing_rate,
            printer_paper_capacity: self.paper_capacity,
            refill_rate: self.refill_rate,
            consumer_count: self.consumers,
            auto_scaling: self.auto_scale,
            fixed_arrival: self.fixed_arrival,
            min_arrival_time_ms: self.min_arrival_ms,
            max_arrival_time_ms: self.max_arrival_ms,
        }
    }

    /// Materializes the effective parameters: preset base plus flag patch.
    pub fn to_parameters(&self) -> Parameters {
        self.to_patch().apply(&self.base())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;

    use super::Cli;
    use pressroom_core::Parameters;

    #[test]
    fn bare_invocation_yields_the_default_table() {
        let cli = Cli::parse_from(["pressroom"]);
        let params = cli.to_parameters();
        assert_eq!(params, Parameters::default());
        assert_eq!(params.validate(), Ok(()));
    }

    #[test]
    fn preset_swaps_the_base_table() {
        let cli = Cli::parse_from(["pressroom", "--preset", "high-load"]);
        assert_eq!(cli.to_parameters(), Parameters::high_load());

        let cli = Cli::parse_from(["pressroom", "--preset", "high-load", "--num-jobs", "5"]);
        let params = cli.to_parameters();
        assert_eq!(params.num_jobs, 5);
        assert!(params.auto_scaling);
        assert_eq!(params.printer_paper_capacity, 90);
    }

    #[test]
    fn queue_capacity_accepts_minus_one() {
        let cli = Cli::parse_from(["pressroom", "--queue-capacity", "-1"]);
        assert_eq!(cli.queue_capacity, Some(-1));
        assert!(Cli::try_parse_from(["pressroom", "--queue-capacity", "0"]).is_err());
        assert!(Cli::try_parse_from(["pressroom", "--queue-capacity", "-2"]).is_err());
    }

    #[test]
    fn out_of_range_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["pressroom", "--printing-rate", "11"]).is_err());
        assert!(Cli::try_parse_from(["pressroom", "--consumers", "6"]).is_err());
        assert!(Cli::try_parse_from(["pressroom", "--num-jobs", "0"]).is_err());
        assert!(Cli::try_parse_from(["pressroom", "--job-arrival-time", "100"]).is_err());
    }

    #[test]
    fn bool_flags_work_bare_and_with_a_value() {
        let cli = Cli::parse_from(["pressroom", "--auto-scale"]);
        assert_eq!(cli.auto_scale, Some(true));
        assert!(cli.to_parameters().auto_scaling);

        let cli = Cli::parse_from(["pressroom", "--fixed-arrival", "false"]);
        assert_eq!(cli.fixed_arrival, Some(false));
        assert!(!cli.to_parameters().fixed_arrival);

        let cli = Cli::parse_from(["pressroom"]);
        assert_eq!(cli.auto_scale, None);
        assert!(cli.to_parameters().fixed_arrival);
    }
}
