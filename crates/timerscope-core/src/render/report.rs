//! Plain-text channel summary.

use crate::channel::{Channel, Stats};
use crate::error::Result;
use std::fmt::Write as FmtWrite;

use super::{ChannelRenderer, TimeUnit};

/// Bandwidths are stored in bytes/s and printed in binary gigabytes
const GIBI: f64 = 1024.0 * 1024.0 * 1024.0;

/// Configuration for [`ReportRenderer`]
#[derive(Debug, Clone, Default)]
pub struct ReportConfig {
    /// Unit runtimes are printed in
    pub time_unit: TimeUnit,
}

impl ReportConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime display unit
    pub fn time_unit(mut self, unit: TimeUnit) -> Self {
        self.time_unit = unit;
        self
    }
}

/// Writes a labelled summary of a channel's recorded stats
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    config: ReportConfig,
}

impl ReportRenderer {
    /// Creates a renderer with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a renderer with custom configuration
    pub fn with_config(config: ReportConfig) -> Self {
        Self { config }
    }

    fn line(out: &mut String, label: &str, value: impl std::fmt::Display) -> std::fmt::Result {
        writeln!(out, "{:<20}: {}", label, value)
    }

    fn runtime_lines(&self, out: &mut String, stats: &Stats, total: f64) -> std::fmt::Result {
        let unit = self.config.time_unit;
        let fmt = |v: f64| format!("{:<12.5e}{}", unit.scale(v), unit.label());

        Self::line(out, "Maximum Runtime", fmt(stats.max))?;
        Self::line(out, "Minimum Runtime", fmt(stats.min))?;
        Self::line(out, "Average Runtime", fmt(stats.avg))?;
        Self::line(out, "Total Runtime", fmt(total))
    }

    fn bandwidth_lines(out: &mut String, stats: &Stats) -> std::fmt::Result {
        let fmt = |v: f64| format!("{:<11.5e} GBytes/s", v / GIBI);

        Self::line(out, "Maximum Bandwidth", fmt(stats.max))?;
        Self::line(out, "Minimum Bandwidth", fmt(stats.min))?;
        Self::line(out, "Average Bandwidth", fmt(stats.avg))
    }
}

impl ChannelRenderer for ReportRenderer {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, channel: &Channel) -> Result<String> {
        let mut out = String::new();

        Self::line(&mut out, "Function name", channel.name())?;
        Self::line(&mut out, "Number of Calls", channel.call_count())?;
        self.runtime_lines(&mut out, channel.runtime_stats(), channel.total_runtime())?;

        if let Some(stats) = channel.bandwidth_stats() {
            Self::bandwidth_lines(&mut out, stats)?;
        }

        Ok(out)
    }
}
