//! Per-channel artifact rendering.
//!
//! Each decoded [`Channel`] is turned into one self-contained text artifact
//! by a [`ChannelRenderer`]:
//!
//! - [`SvgRenderer`]: a chart of runtimes (and bandwidths, if recorded) with
//!   the recorded average and extremes.
//! - [`ReportRenderer`]: a plain-text summary block.
//!
//! Artifacts are named after the channel; [`artifact_file_name`] makes sure
//! that name stays inside the output directory.

mod report;
mod svg;

use crate::channel::Channel;
use crate::error::{Error, Result};

pub use report::{ReportConfig, ReportRenderer};
pub use svg::{SvgConfig, SvgRenderer};

/// Renders one channel into a text artifact
pub trait ChannelRenderer {
    /// File extension of produced artifacts, without the leading dot
    fn extension(&self) -> &'static str;

    /// Renders the channel
    fn render(&self, channel: &Channel) -> Result<String>;
}

/// Display unit for runtimes.
///
/// Runtimes are recorded in seconds; a unit divides them by its factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    /// Seconds
    #[default]
    Seconds,
    /// Milliseconds
    Milliseconds,
    /// Microseconds
    Microseconds,
    /// Nanoseconds
    Nanoseconds,
}

impl TimeUnit {
    /// Length of one unit in seconds
    pub fn factor(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Milliseconds => 1e-3,
            TimeUnit::Microseconds => 1e-6,
            TimeUnit::Nanoseconds => 1e-9,
        }
    }

    /// Short label printed after values
    pub fn label(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "sec",
            TimeUnit::Milliseconds => "msec",
            TimeUnit::Microseconds => "μsec",
            TimeUnit::Nanoseconds => "nsec",
        }
    }

    /// Converts a value in seconds to this unit
    pub fn scale(&self, seconds: f64) -> f64 {
        seconds / self.factor()
    }
}

/// Builds the artifact file name for a channel.
///
/// Path separators and NUL bytes become `_`. Names that would still resolve
/// to the output directory itself or its parent are rejected.
pub fn artifact_file_name(channel_name: &str, extension: &str) -> Result<String> {
    let stem: String = channel_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    if matches!(stem.trim(), "" | "." | "..") {
        return Err(Error::path_traversal(channel_name));
    }

    Ok(format!("{}.{}", stem, extension))
}

/// Escapes text for use in XML content and attribute values
pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_unit_scale() {
        assert_eq!(TimeUnit::Seconds.scale(2.0), 2.0);
        assert!((TimeUnit::Milliseconds.scale(0.5) - 500.0).abs() < 1e-9);
        assert_eq!(TimeUnit::Nanoseconds.label(), "nsec");
        assert_eq!(TimeUnit::Microseconds.label(), "μsec");
        assert_eq!(TimeUnit::default(), TimeUnit::Seconds);
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(artifact_file_name("kernel", "svg").unwrap(), "kernel.svg");
        assert_eq!(
            artifact_file_name("../etc/passwd", "svg").unwrap(),
            ".._etc_passwd.svg"
        );
        assert_eq!(artifact_file_name("a\\b", "txt").unwrap(), "a_b.txt");
    }

    #[test]
    fn test_artifact_file_name_rejects_traversal() {
        for name in ["", ".", "..", "  "] {
            let err = artifact_file_name(name, "svg").unwrap_err();
            assert!(matches!(err, Error::PathTraversal { .. }), "name {name:?}");
        }
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
        assert_eq!(escape_xml("plain"), "plain");
    }
}
