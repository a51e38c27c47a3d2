//! In-memory time series reshaping.
//!
//! Model inputs and historical reference data come at different frequencies
//! (quarter-hourly market data, hourly model steps, annual cost paths). The
//! routines here bring a series to a target frequency and normalise every
//! year to 8760 hours by cutting leap days.
use anyhow::{Context, Result, ensure};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use log::warn;
use serde_string_enum::DeserializeLabeledStringEnum;

/// Timestamp format used in series indices and scenario windows
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Number of leading steps inspected when inferring the frequency
const FREQUENCY_PROBE_STEPS: usize = 5;

/// How to combine the values of one bucket when downsampling
#[derive(Clone, Copy, Debug, Eq, PartialEq, DeserializeLabeledStringEnum)]
pub enum AggregationRule {
    /// Sum the values of each bucket
    #[string = "sum"]
    Sum,
    /// Average the values of each bucket
    #[string = "mean"]
    Mean,
}

/// A time series with a strictly ascending index
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries {
    points: Vec<(NaiveDateTime, f64)>,
}

impl TimeSeries {
    /// Create a time series from timestamped values.
    ///
    /// The index must be strictly ascending. NaN values are permitted; they
    /// are reported with a warning and passed through as data, since gaps in
    /// reference series are for the caller to judge.
    pub fn new(points: Vec<(NaiveDateTime, f64)>) -> Result<Self> {
        ensure!(
            points
                .iter()
                .tuple_windows()
                .all(|(earlier, later)| earlier.0 < later.0),
            "Time series index must be strictly ascending"
        );

        let nan_count = points.iter().filter(|(_, value)| value.is_nan()).count();
        if nan_count > 0 {
            warn!("Time series contains {nan_count} NaN values");
        }

        Ok(Self { points })
    }

    /// Create a time series from string-labelled values
    pub fn from_labelled_values(
        values: impl IntoIterator<Item = (String, f64)>,
    ) -> Result<Self> {
        let points = values
            .into_iter()
            .map(|(label, value)| -> Result<(NaiveDateTime, f64)> {
                let stamp = NaiveDateTime::parse_from_str(&label, TIMESTAMP_FORMAT)
                    .with_context(|| format!("Invalid time stamp `{label}`"))?;
                Ok((stamp, value))
            })
            .try_collect()?;
        Self::new(points)
    }

    /// The timestamped values in index order
    pub fn points(&self) -> &[(NaiveDateTime, f64)] {
        &self.points
    }

    /// Number of entries in the series
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Infer the series frequency from the leading time steps.
    ///
    /// Indices are naive local stamps, so the autumn time-shift hour would
    /// confuse inference over a full year; only the first few steps are
    /// inspected, where no shift occurs.
    pub fn infer_frequency(&self) -> Result<Duration> {
        ensure!(
            self.points.len() >= 2,
            "Cannot detect frequency of a time series with fewer than two entries"
        );

        let step = self.points[1].0 - self.points[0].0;
        ensure!(
            self.points
                .iter()
                .take(FREQUENCY_PROBE_STEPS)
                .tuple_windows()
                .all(|(earlier, later)| later.0 - earlier.0 == step),
            "Cannot detect frequency of time series: leading steps are irregular"
        );

        Ok(step)
    }

    /// Resample the series to the target frequency.
    ///
    /// Downsampling aggregates each bucket with the given rule; upsampling
    /// interpolates linearly between the original points. Leap days are cut
    /// from the result.
    pub fn resample(&self, freq: Duration, rule: AggregationRule) -> Result<TimeSeries> {
        ensure!(freq > Duration::zero(), "Target frequency must be positive");
        let original = self.infer_frequency()?;

        let mut resampled = if freq > original {
            self.downsample(freq, rule)
        } else if freq < original {
            self.upsample(freq)
        } else {
            self.clone()
        };
        resampled.cut_leap_days();

        Ok(resampled)
    }

    /// Aggregate into buckets of the given width, anchored at the first stamp
    fn downsample(&self, freq: Duration, rule: AggregationRule) -> TimeSeries {
        let start = self.points[0].0;
        let mut buckets: Vec<(NaiveDateTime, Vec<f64>)> = Vec::new();
        for &(stamp, value) in &self.points {
            let elapsed = (stamp - start).num_seconds();
            let index = elapsed.div_euclid(freq.num_seconds());
            let bucket_start = start + freq * (index as i32);
            match buckets.last_mut() {
                Some((last_start, values)) if *last_start == bucket_start => values.push(value),
                _ => buckets.push((bucket_start, vec![value])),
            }
        }

        let points = buckets
            .into_iter()
            .map(|(stamp, values)| {
                // NaN entries are gaps, not zeros; aggregate the rest
                let finite = values
                    .iter()
                    .copied()
                    .filter(|value| !value.is_nan())
                    .collect_vec();
                let value = if finite.is_empty() {
                    f64::NAN
                } else {
                    let sum: f64 = finite.iter().sum();
                    match rule {
                        AggregationRule::Sum => sum,
                        AggregationRule::Mean => sum / finite.len() as f64,
                    }
                };
                (stamp, value)
            })
            .collect();

        TimeSeries { points }
    }

    /// Interpolate linearly onto a finer index between first and last stamp
    fn upsample(&self, freq: Duration) -> TimeSeries {
        let start = self.points[0].0;
        let end = self.points[self.points.len() - 1].0;

        let mut points = Vec::new();
        let mut stamp = start;
        let mut segment = 0;
        while stamp <= end {
            while segment + 1 < self.points.len() && self.points[segment + 1].0 <= stamp {
                segment += 1;
            }

            let (left_stamp, left) = self.points[segment];
            let value = if left_stamp == stamp || segment + 1 == self.points.len() {
                left
            } else {
                let (right_stamp, right) = self.points[segment + 1];
                let span = (right_stamp - left_stamp).num_seconds() as f64;
                let offset = (stamp - left_stamp).num_seconds() as f64;
                left + (right - left) * (offset / span)
            };
            points.push((stamp, value));
            stamp += freq;
        }

        TimeSeries { points }
    }

    /// Remove December 31 from leap years so every year spans 8760 hours.
    ///
    /// Indices ignore time shifts and stand for a synthetic year; dropping
    /// the trailing day keeps annual slices aligned across years.
    pub fn cut_leap_days(&mut self) {
        self.points.retain(|(stamp, _)| {
            !(is_leap_year(stamp.year()) && stamp.month() == 12 && stamp.day() == 31)
        });
    }
}

/// Whether the given year is a leap year
pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/// Parse a model frequency string such as `1H`, `4H` or `15min`
pub fn parse_frequency(freq: &str) -> Result<Duration> {
    let freq = freq.trim();
    let parse_count = |s: &str| s.parse::<i64>().ok().filter(|count| *count > 0);

    let duration = if let Some(hours) = freq.strip_suffix('H').or_else(|| freq.strip_suffix('h')) {
        let hours = if hours.is_empty() {
            Some(1)
        } else {
            parse_count(hours)
        };
        hours.map(Duration::hours)
    } else if let Some(minutes) = freq.strip_suffix("min") {
        let minutes = if minutes.is_empty() {
            Some(1)
        } else {
            parse_count(minutes)
        };
        minutes.map(Duration::minutes)
    } else {
        None
    };

    duration.with_context(|| format!("Invalid frequency `{freq}`; expected e.g. `1H`, `4H` or `15min`"))
}
