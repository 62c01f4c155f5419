use serde::{Deserialize, Serialize};

/// Sentinel for an unbounded job queue.
pub const UNLIMITED_QUEUE: i32 = -1;

/// Validation ranges for user-supplied parameters.
///
/// These bound the CLI surface; the engine itself only normalizes.
pub mod ranges {
    use std::ops::RangeInclusive;

    /// Lower page-count bound.
    pub const PAPERS_LOWER: RangeInclusive<u32> = 5..=10;
    /// Upper page-count bound.
    pub const PAPERS_UPPER: RangeInclusive<u32> = 15..=30;
    /// Printer tray capacity in pages.
    pub const PAPER_CAPACITY: RangeInclusive<u32> = 50..=200;
    /// Printing rate in pages per second.
    pub const PRINTING_RATE: RangeInclusive<f64> = 4.0..=10.0;
    /// Refill rate in pages per second.
    pub const REFILL_RATE: RangeInclusive<f64> = 15.0..=30.0;
    /// Minimum printer count.
    pub const CONSUMER_COUNT: RangeInclusive<u32> = 1..=5;
    /// Fixed inter-arrival time in milliseconds.
    pub const JOB_ARRIVAL_TIME_MS: RangeInclusive<u64> = 200..=800;
    /// Lower bound for random inter-arrival, milliseconds.
    pub const MIN_ARRIVAL_TIME_MS: RangeInclusive<u64> = 200..=400;
    /// Upper bound for random inter-arrival, milliseconds.
    pub const MAX_ARRIVAL_TIME_MS: RangeInclusive<u64> = 500..=800;
}

/// Immutable simulation input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameters {
    /// Number of jobs the producer generates.
    pub num_jobs: u32,
    /// Fixed inter-arrival time in microseconds (used when `fixed_arrival`).
    pub job_arrival_time_us: u64,
    /// Lower bound of the per-job page count.
    pub papers_required_lower_bound: u32,
    /// Upper bound of the per-job page count.
    pub papers_required_upper_bound: u32,
    /// Queue capacity; [`UNLIMITED_QUEUE`] means unbounded.
    pub queue_capacity: i32,
    /// Printing rate in pages per second.
    pub printing_rate: f64,
    /// Paper tray capacity of every printer.
    pub printer_paper_capacity: u32,
    /// Refill rate in pages per second.
    pub refill_rate: f64,
    /// Minimum number of printers.
    pub consumer_count: u32,
    /// Whether the autoscaler runs.
    pub auto_scaling: bool,
    /// Fixed vs. random inter-arrival.
    pub fixed_arrival: bool,
    /// Random inter-arrival lower bound, milliseconds.
    pub min_arrival_time_ms: u64,
    /// Random inter-arrival upper bound, milliseconds.
    pub max_arrival_time_ms: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            num_jobs: 10,
            job_arrival_time_us: 500_000,
            papers_required_lower_bound: 5,
            papers_required_upper_bound: 15,
            queue_capacity: UNLIMITED_QUEUE,
            printing_rate: 5.0,
            printer_paper_capacity: 150,
            refill_rate: 25.0,
            consumer_count: 2,
            auto_scaling: false,
            fixed_arrival: true,
            min_arrival_time_ms: 300,
            max_arrival_time_ms: 600,
        }
    }
}

impl Parameters {
    /// High-load preset: faster arrivals, bigger jobs, a smaller tray and
    /// autoscaling enabled.
    pub fn high_load() -> Self {
        Self {
            num_jobs: 20,
            job_arrival_time_us: 200_000,
            papers_required_lower_bound: 10,
            papers_required_upper_bound: 30,
            queue_capacity: UNLIMITED_QUEUE,
            printing_rate: 5.0,
            printer_paper_capacity: 90,
            refill_rate: 25.0,
            consumer_count: 2,
            auto_scaling: true,
            fixed_arrival: true,
            min_arrival_time_ms: 300,
            max_arrival_time_ms: 600,
        }
    }
}

/// Partial override of [`Parameters`], as carried by a `start` command.
///
/// Unset fields keep the base value; [`ParamsPatch::apply`] materializes the
/// effective parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParamsPatch {
    /// Overrides [`Parameters::num_jobs`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_jobs: Option<u32>,
    /// Overrides [`Parameters::job_arrival_time_us`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_arrival_time_us: Option<u64>,
    /// Overrides [`Parameters::papers_required_lower_bound`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub papers_required_lower_bound: Option<u32>,
    /// Overrides [`Parameters::papers_required_upper_bound`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub papers_required_upper_bound: Option<u32>,
    /// Overrides [`Parameters::queue_capacity`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<i32>,
    /// Overrides [`Parameters::printing_rate`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printing_rate: Option<f64>,
    /// Overrides [`Parameters::printer_paper_capacity`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printer_paper_capacity: Option<u32>,
    /// Overrides [`Parameters::refill_rate`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refill_rate: Option<f64>,
    /// Overrides [`Parameters::consumer_count`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_count: Option<u32>,
    /// Overrides [`Parameters::auto_scaling`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scaling: Option<bool>,
    /// Overrides [`Parameters::fixed_arrival`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_arrival: Option<bool>,
    /// Overrides [`Parameters::min_arrival_time_ms`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_arrival_time_ms: Option<u64>,
    /// Overrides [`Parameters::max_arrival_time_ms`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_arrival_time_ms: Option<u64>,
}

impl ParamsPatch {
    /// Applies the set fields over `base`, returning the effective
    /// parameters.
    pub fn apply(&self, base: &Parameters) -> Parameters {
        Parameters {
            num_jobs: self.num_jobs.unwrap_or(base.num_jobs),
            job_arrival_time_us: self.job_arrival_time_us.unwrap_or(base.job_arrival_time_us),
            papers_required_lower_bound: self
                .papers_required_lower_bound
                .unwrap_or(base.papers_required_lower_bound),
            papers_required_upper_bound: self
                .papers_required_upper_bound
                .unwrap_or(base.papers_required_upper_bound),
            queue_capacity: self.queue_capacity.unwrap_or(base.queue_capacity),
            printing_rate: self.printing_rate.unwrap_or(base.printing_rate),
            printer_paper_capacity: self
                .printer_paper_capacity
                .unwrap_or(base.printer_paper_capacity),
            refill_rate: self.refill_rate.unwrap_or(base.refill_rate),
            consumer_count: self.consumer_count.unwrap_or(base.consumer_count),
            auto_scaling: self.auto_scaling.unwrap_or(base.auto_scaling),
            fixed_arrival: self.fixed_arrival.unwrap_or(base.fixed_arrival),
            min_arrival_time_ms: self.min_arrival_time_ms.unwrap_or(base.min_arrival_time_ms),
            max_arrival_time_ms: self.max_arrival_time_ms.unwrap_or(base.max_arrival_time_ms),
        }
    }

    /// Whether the patch overrides anything at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A parameter rejected at ingestion. The simulation refuses to start.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    /// `num_jobs` must be at least 1.
    #[error("num_jobs must be a positive integer")]
    NumJobs,
    /// `queue_capacity` must be -1 (unlimited) or positive.
    #[error("queue_capacity must be -1 (unlimited) or a positive integer")]
    QueueCapacity,
    /// An integer parameter fell outside its allowed range.
    #[error("{name} must be between {min} and {max}")]
    OutOfRange {
        /// Parameter name as presented to the user.
        name: &'static str,
        /// Inclusive minimum.
        min: u64,
        /// Inclusive maximum.
        max: u64,
    },
    /// A rate parameter fell outside its allowed range.
    #[error("{name} must be between {min:.2} and {max:.2}")]
    RateOutOfRange {
        /// Parameter name as presented to the user.
        name: &'static str,
        /// Inclusive minimum.
        min: f64,
        /// Inclusive maximum.
        max: f64,
    },
}

fn check_u32(
    name: &'static str,
    value: u32,
    range: &std::ops::RangeInclusive<u32>,
) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            min: u64::from(*range.start()),
            max: u64::from(*range.end()),
        })
    }
}

fn check_u64(
    name: &'static str,
    value: u64,
    range: &std::ops::RangeInclusive<u64>,
) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

fn check_rate(
    name: &'static str,
    value: f64,
    range: &std::ops::RangeInclusive<f64>,
) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RateOutOfRange {
            name,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

impl Parameters {
    /// Swaps the page-count bounds if they arrive inverted.
    pub fn normalize(&mut self) {
        if self.papers_required_lower_bound > self.papers_required_upper_bound {
            std::mem::swap(
                &mut self.papers_required_lower_bound,
                &mut self.papers_required_upper_bound,
            );
        }
        if self.min_arrival_time_ms > self.max_arrival_time_ms {
            std::mem::swap(&mut self.min_arrival_time_ms, &mut self.max_arrival_time_ms);
        }
    }

    /// Checks every field against the user-facing ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_jobs == 0 {
            return Err(ConfigError::NumJobs);
        }
        if self.queue_capacity != UNLIMITED_QUEUE && self.queue_capacity <= 0 {
            return Err(ConfigError::QueueCapacity);
        }
        check_u32(
            "papers_required_lower_bound",
            self.papers_required_lower_bound,
            &ranges::PAPERS_LOWER,
        )?;
        check_u32(
            "papers_required_upper_bound",
            self.papers_required_upper_bound,
            &ranges::PAPERS_UPPER,
        )?;
        check_u32(
            "printer_paper_capacity",
            self.printer_paper_capacity,
            &ranges::PAPER_CAPACITY,
        )?;
        check_rate("printing_rate", self.printing_rate, &ranges::PRINTING_RATE)?;
        check_rate("refill_rate", self.refill_rate, &ranges::REFILL_RATE)?;
        check_u32("consumer_count", self.consumer_count, &ranges::CONSUMER_COUNT)?;
        check_u64(
            "job_arrival_time",
            self.job_arrival_time_us / 1_000,
            &ranges::JOB_ARRIVAL_TIME_MS,
        )?;
        check_u64(
            "min_arrival_time",
            self.min_arrival_time_ms,
            &ranges::MIN_ARRIVAL_TIME_MS,
        )?;
        check_u64(
            "max_arrival_time",
            self.max_arrival_time_ms,
            &ranges::MAX_ARRIVAL_TIME_MS,
        )?;
        Ok(())
    }

    /// Queue capacity as an admission bound, `None` when unbounded.
    pub fn queue_bound(&self) -> Option<usize> {
        if self.queue_capacity == UNLIMITED_QUEUE {
            None
        } else {
            Some(self.queue_capacity.max(0) as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, Parameters, ParamsPatch, UNLIMITED_QUEUE};

    #[test]
    fn defaults_validate() {
        assert_eq!(Parameters::default().validate(), Ok(()));
        assert_eq!(Parameters::high_load().validate(), Ok(()));
    }

    #[test]
    fn empty_patch_keeps_the_base() {
        let patch = ParamsPatch::default();
        assert!(patch.is_empty());
        assert_eq!(patch.apply(&Parameters::default()), Parameters::default());
        assert_eq!(patch.apply(&Parameters::high_load()), Parameters::high_load());
    }

    #[test]
    fn patch_overrides_only_its_set_fields() {
        let patch = ParamsPatch {
            num_jobs: Some(42),
            auto_scaling: Some(true),
            ..ParamsPatch::default()
        };
        assert!(!patch.is_empty());
        let params = patch.apply(&Parameters::default());
        assert_eq!(params.num_jobs, 42);
        assert!(params.auto_scaling);
        assert_eq!(params.printing_rate, Parameters::default().printing_rate);
    }

    #[test]
    fn patch_round_trips_through_json_without_unset_fields() {
        let patch = ParamsPatch {
            queue_capacity: Some(4),
            ..ParamsPatch::default()
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"queue_capacity":4}"#);
        let back: ParamsPatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, patch);
    }

    #[test]
    fn normalize_swaps_inverted_bounds() {
        let mut params = Parameters {
            papers_required_lower_bound: 20,
            papers_required_upper_bound: 8,
            min_arrival_time_ms: 700,
            max_arrival_time_ms: 250,
            ..Parameters::default()
        };
        params.normalize();
        assert_eq!(params.papers_required_lower_bound, 8);
        assert_eq!(params.papers_required_upper_bound, 20);
        assert_eq!(params.min_arrival_time_ms, 250);
        assert_eq!(params.max_arrival_time_ms, 700);
    }

    #[test]
    fn zero_jobs_is_rejected() {
        let params = Parameters {
            num_jobs: 0,
            ..Parameters::default()
        };
        assert_eq!(params.validate(), Err(ConfigError::NumJobs));
    }

    #[test]
    fn queue_capacity_accepts_unlimited_only_as_minus_one() {
        let mut params = Parameters {
            queue_capacity: UNLIMITED_QUEUE,
            ..Parameters::default()
        };
        assert_eq!(params.validate(), Ok(()));
        assert_eq!(params.queue_bound(), None);

        params.queue_capacity = 0;
        assert_eq!(params.validate(), Err(ConfigError::QueueCapacity));

        params.queue_capacity = -3;
        assert_eq!(params.validate(), Err(ConfigError::QueueCapacity));

        params.queue_capacity = 4;
        assert_eq!(params.validate(), Ok(()));
        assert_eq!(params.queue_bound(), Some(4));
    }

    #[test]
    fn out_of_range_rate_is_reported_by_name() {
        let params = Parameters {
            printing_rate: 1000.0,
            ..Parameters::default()
        };
        match params.validate() {
            Err(ConfigError::RateOutOfRange { name, .. }) => assert_eq!(name, "printing_rate"),
            other => panic!("unexpected validation result: {other:?}"),
        }
    }
}
