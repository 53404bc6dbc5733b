//! Decoded channel data model.
//!
//! A [`Channel`] is one instrumentation point of a timer file: its name, one
//! runtime per recorded call and, when the producer measured data sizes, one
//! bandwidth per call. Each value array travels together with its
//! precomputed `(max, min, avg)` sub-record as a [`Series`].

use crate::error::{Error, Result};

/// Precomputed summary statistics of one value array.
///
/// Field order matches the order of the triple on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stats {
    /// Largest value
    pub max: f64,
    /// Smallest value
    pub min: f64,
    /// Arithmetic mean
    pub avg: f64,
}

impl Stats {
    /// Creates a stats record from its three components
    pub const fn new(max: f64, min: f64, avg: f64) -> Self {
        Self { max, min, avg }
    }

    /// Computes max, min and mean of `values`.
    ///
    /// Returns `None` for an empty slice. Decoding never calls this: decoded
    /// stats are taken verbatim from the file.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let (max, min, sum) = values.iter().fold(
            (f64::NEG_INFINITY, f64::INFINITY, 0.0),
            |(max, min, sum), &v| (max.max(v), min.min(v), sum + v),
        );

        Some(Self::new(max, min, sum / values.len() as f64))
    }
}

/// A value array together with its stats sub-record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    /// One value per call, in call order
    pub values: Vec<f64>,
    /// Stats as recorded by the producer
    pub stats: Stats,
}

impl Series {
    /// Creates a series from values and already known stats
    pub fn new(values: Vec<f64>, stats: Stats) -> Self {
        Self { values, stats }
    }

    /// Creates a series and computes its stats from the values.
    ///
    /// An empty series gets all-zero stats.
    pub fn from_values(values: Vec<f64>) -> Self {
        let stats = Stats::from_values(&values).unwrap_or_default();
        Self { values, stats }
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the series holds no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One named instrumentation point and its recorded calls
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    name: String,
    runtimes: Series,
    bandwidths: Option<Series>,
}

impl Channel {
    /// Creates a channel without bandwidth data
    pub fn new(name: impl Into<String>, runtimes: Series) -> Self {
        Self {
            name: name.into(),
            runtimes,
            bandwidths: None,
        }
    }

    /// Attaches a bandwidth series.
    ///
    /// Fails with [`Error::LengthMismatch`] unless the series has exactly one
    /// value per call.
    pub fn with_bandwidths(mut self, bandwidths: Series) -> Result<Self> {
        if bandwidths.len() != self.runtimes.len() {
            return Err(Error::LengthMismatch {
                runtimes: self.runtimes.len(),
                bandwidths: bandwidths.len(),
            });
        }
        self.bandwidths = Some(bandwidths);
        Ok(self)
    }

    /// Channel name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of recorded calls
    pub fn call_count(&self) -> usize {
        self.runtimes.len()
    }

    /// Runtime of each call
    pub fn runtimes(&self) -> &[f64] {
        &self.runtimes.values
    }

    /// Recorded runtime stats
    pub fn runtime_stats(&self) -> &Stats {
        &self.runtimes.stats
    }

    /// Runtime values and stats together
    pub fn runtime_series(&self) -> &Series {
        &self.runtimes
    }

    /// Bandwidth of each call, if recorded
    pub fn bandwidths(&self) -> Option<&[f64]> {
        self.bandwidths.as_ref().map(|s| s.values.as_slice())
    }

    /// Recorded bandwidth stats, if bandwidths were recorded
    pub fn bandwidth_stats(&self) -> Option<&Stats> {
        self.bandwidths.as_ref().map(|s| &s.stats)
    }

    /// Bandwidth values and stats together
    pub fn bandwidth_series(&self) -> Option<&Series> {
        self.bandwidths.as_ref()
    }

    /// Returns true if the channel carries bandwidth data
    pub fn has_bandwidths(&self) -> bool {
        self.bandwidths.is_some()
    }

    /// Sum of all runtimes
    pub fn total_runtime(&self) -> f64 {
        self.runtimes.values.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stats_from_values() {
        let stats = Stats::from_values(&[5.0, 1.0, 3.0]).unwrap();
        assert_eq!(stats, Stats::new(5.0, 1.0, 3.0));
        assert!(Stats::from_values(&[]).is_none());
    }

    #[test]
    fn test_empty_series_has_zero_stats() {
        let series = Series::from_values(Vec::new());
        assert!(series.is_empty());
        assert_eq!(series.stats, Stats::default());
    }

    #[test]
    fn test_channel_accessors() {
        let channel = Channel::new("kernel", Series::from_values(vec![1.0, 2.0, 3.0]))
            .with_bandwidths(Series::from_values(vec![10.0, 20.0, 30.0]))
            .unwrap();

        assert_eq!(channel.name(), "kernel");
        assert_eq!(channel.call_count(), 3);
        assert_eq!(channel.runtimes(), &[1.0, 2.0, 3.0]);
        assert_eq!(channel.runtime_stats().avg, 2.0);
        assert_eq!(channel.bandwidths(), Some(&[10.0, 20.0, 30.0][..]));
        assert_eq!(channel.bandwidth_stats().map(|s| s.max), Some(30.0));
        assert_eq!(channel.total_runtime(), 6.0);
    }

    #[test]
    fn test_bandwidths_absent_by_default() {
        let channel = Channel::new("kernel", Series::from_values(vec![1.0]));
        assert!(!channel.has_bandwidths());
        assert!(channel.bandwidths().is_none());
        assert!(channel.bandwidth_stats().is_none());
    }

    #[test]
    fn test_bandwidth_length_mismatch() {
        let err = Channel::new("kernel", Series::from_values(vec![1.0, 2.0]))
            .with_bandwidths(Series::from_values(vec![1.0]))
            .unwrap_err();

        assert!(matches!(
            err,
            Error::LengthMismatch {
                runtimes: 2,
                bandwidths: 1
            }
        ));
    }
}
