//! SVG chart rendering.
//!
//! One document per channel. The runtime panel is always present; a second
//! bandwidth panel is stacked below it when the channel recorded
//! bandwidths. Each panel plots one point per call, marks the recorded
//! average with a red horizontal line and lists the recorded extremes in a
//! box to the right of the plot.

use crate::channel::{Channel, Stats};
use crate::error::Result;
use std::fmt::Write as FmtWrite;

use super::{escape_xml, ChannelRenderer, TimeUnit};

const TITLE_HEIGHT: f64 = 40.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_VERTICAL: f64 = 30.0;
/// Share of the width used by the plot area, the rest holds the stats box
const PLOT_SHARE: f64 = 0.74;
const TICK_COUNT: usize = 5;
const LINE_COLOR: &str = "#1f77b4";
const AVERAGE_COLOR: &str = "red";

/// Configuration for [`SvgRenderer`]
#[derive(Debug, Clone)]
pub struct SvgConfig {
    /// Document width in pixels
    pub width: u32,
    /// Height of each panel in pixels
    pub panel_height: u32,
    /// Unit runtimes are plotted in
    pub time_unit: TimeUnit,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            width: 800,
            panel_height: 300,
            time_unit: TimeUnit::default(),
        }
    }
}

impl SvgConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document width
    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Sets the height of each panel
    pub fn panel_height(mut self, height: u32) -> Self {
        self.panel_height = height;
        self
    }

    /// Sets the runtime display unit
    pub fn time_unit(mut self, unit: TimeUnit) -> Self {
        self.time_unit = unit;
        self
    }
}

/// Renders channels as SVG line charts
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    config: SvgConfig,
}

/// One plotted value array
struct Panel {
    label: String,
    values: Vec<f64>,
    stats: Stats,
    annotation: [String; 2],
}

/// Pixel rectangle of a panel's plot area
#[derive(Clone, Copy)]
struct Frame {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl SvgRenderer {
    /// Creates a renderer with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a renderer with custom configuration
    pub fn with_config(config: SvgConfig) -> Self {
        Self { config }
    }

    fn panels(&self, channel: &Channel) -> Vec<Panel> {
        let unit = self.config.time_unit;
        let runtime_stats = channel.runtime_stats();

        let mut panels = vec![Panel {
            label: format!("runtime ({})", unit.label()),
            values: channel.runtimes().iter().map(|&v| unit.scale(v)).collect(),
            stats: Stats::new(
                unit.scale(runtime_stats.max),
                unit.scale(runtime_stats.min),
                unit.scale(runtime_stats.avg),
            ),
            annotation: [
                format!("Maximum runtime: {:.5}", unit.scale(runtime_stats.max)),
                format!("Minimum runtime: {:.5}", unit.scale(runtime_stats.min)),
            ],
        }];

        if let Some(series) = channel.bandwidth_series() {
            panels.push(Panel {
                label: "bandwidth".to_string(),
                values: series.values.clone(),
                stats: series.stats,
                annotation: [
                    format!("Maximum bandwidth: {:.3E}", series.stats.max),
                    format!("Minimum bandwidth: {:.3E}", series.stats.min),
                ],
            });
        }

        panels
    }

    fn write_panel(&self, out: &mut String, panel: &Panel, frame: Frame) -> std::fmt::Result {
        let (lo, hi) = value_range(&panel.values, panel.stats.avg);
        let n = panel.values.len();

        let x_of = |i: usize| {
            if n <= 1 {
                frame.x + frame.width / 2.0
            } else {
                frame.x + frame.width * i as f64 / (n - 1) as f64
            }
        };
        let y_of = |v: f64| {
            let t = (v - lo) / (hi - lo);
            let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
            frame.y + frame.height * (1.0 - t)
        };

        writeln!(out, r#"<g class="panel">"#)?;
        writeln!(
            out,
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="black"/>"#,
            frame.x, frame.y, frame.width, frame.height
        )?;

        // Axis label, rotated along the left edge
        let label_x = frame.x - MARGIN_LEFT + 18.0;
        let label_y = frame.y + frame.height / 2.0;
        writeln!(
            out,
            r#"<text x="{lx:.1}" y="{ly:.1}" transform="rotate(-90 {lx:.1} {ly:.1})" text-anchor="middle" font-size="12">{}</text>"#,
            escape_xml(&panel.label),
            lx = label_x,
            ly = label_y
        )?;

        // Y extremes
        for (v, anchor_y) in [(hi, frame.y), (lo, frame.y + frame.height)] {
            writeln!(
                out,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="10">{:.3e}</text>"#,
                frame.x - 4.0,
                anchor_y + 4.0,
                v
            )?;
        }

        // X ticks every ceil(n / 5) calls
        if n > 0 {
            let step = n.div_ceil(TICK_COUNT).max(1);
            for i in (0..n).step_by(step) {
                let x = x_of(i);
                let bottom = frame.y + frame.height;
                writeln!(
                    out,
                    r#"<line x1="{x:.1}" y1="{bottom:.1}" x2="{x:.1}" y2="{:.1}" stroke="black"/>"#,
                    bottom + 5.0
                )?;
                writeln!(
                    out,
                    r#"<text x="{x:.1}" y="{:.1}" text-anchor="middle" font-size="10">{i}</text>"#,
                    bottom + 17.0
                )?;
            }
        }

        match n {
            0 => {
                writeln!(
                    out,
                    r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12">no calls recorded</text>"#,
                    frame.x + frame.width / 2.0,
                    frame.y + frame.height / 2.0
                )?;
            }
            1 => {
                // A single call is drawn as an "x" marker
                let (x, y) = (x_of(0), y_of(panel.values[0]));
                writeln!(
                    out,
                    r#"<path class="marker" d="M{:.1},{:.1} L{:.1},{:.1} M{:.1},{:.1} L{:.1},{:.1}" stroke="{AVERAGE_COLOR}" stroke-width="1.5"/>"#,
                    x - 5.0,
                    y - 5.0,
                    x + 5.0,
                    y + 5.0,
                    x - 5.0,
                    y + 5.0,
                    x + 5.0,
                    y - 5.0
                )?;
            }
            _ => {
                let points: Vec<String> = panel
                    .values
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| format!("{:.1},{:.1}", x_of(i), y_of(v)))
                    .collect();
                writeln!(
                    out,
                    r#"<polyline class="values" fill="none" stroke="{LINE_COLOR}" stroke-width="1.5" points="{}"/>"#,
                    points.join(" ")
                )?;
            }
        }

        // Recorded average, spanning first to last call
        let (x1, x2) = if n > 1 {
            (x_of(0), x_of(n - 1))
        } else {
            (frame.x, frame.x + frame.width)
        };
        let avg_y = y_of(panel.stats.avg);
        writeln!(
            out,
            r#"<line class="average" x1="{x1:.1}" y1="{avg_y:.1}" x2="{x2:.1}" y2="{avg_y:.1}" stroke="{AVERAGE_COLOR}"/>"#
        )?;

        self.write_annotation(out, panel, frame)?;
        writeln!(out, "</g>")
    }

    fn write_annotation(&self, out: &mut String, panel: &Panel, frame: Frame) -> std::fmt::Result {
        let box_x = frame.x + frame.width + 0.03 * self.config.width as f64;
        let box_y = frame.y + 0.1 * frame.height;
        let box_width = self.config.width as f64 - box_x - 8.0;

        writeln!(out, r#"<g class="stats">"#)?;
        writeln!(
            out,
            r#"<rect x="{box_x:.1}" y="{box_y:.1}" width="{:.1}" height="48" fill="gainsboro" fill-opacity="0.75"/>"#,
            box_width.max(0.0)
        )?;
        for (i, line) in panel.annotation.iter().enumerate() {
            writeln!(
                out,
                r#"<text x="{:.1}" y="{:.1}" font-size="9">{}</text>"#,
                box_x + 6.0,
                box_y + 18.0 + 20.0 * i as f64,
                escape_xml(line)
            )?;
        }
        writeln!(out, "</g>")
    }
}

impl ChannelRenderer for SvgRenderer {
    fn extension(&self) -> &'static str {
        "svg"
    }

    fn render(&self, channel: &Channel) -> Result<String> {
        let panels = self.panels(channel);
        let width = self.config.width as f64;
        let panel_height = self.config.panel_height as f64;
        let height = TITLE_HEIGHT + panel_height * panels.len() as f64;

        let mut out = String::new();
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif">"#
        )?;
        writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
        writeln!(
            out,
            r#"<text class="title" x="{:.1}" y="26" text-anchor="middle" font-size="16">{}</text>"#,
            width / 2.0,
            escape_xml(channel.name())
        )?;

        for (i, panel) in panels.iter().enumerate() {
            let frame = Frame {
                x: MARGIN_LEFT,
                y: TITLE_HEIGHT + panel_height * i as f64 + MARGIN_VERTICAL / 2.0,
                width: (width * PLOT_SHARE - MARGIN_LEFT).max(1.0),
                height: (panel_height - 2.0 * MARGIN_VERTICAL).max(1.0),
            };
            self.write_panel(&mut out, panel, frame)?;
        }

        writeln!(out, "</svg>")?;
        Ok(out)
    }
}

/// Y range covering every finite value and the average.
///
/// Degenerate ranges are widened so the plot never divides by zero.
fn value_range(values: &[f64], avg: f64) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .copied()
        .chain(std::iter::once(avg))
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if lo > hi {
        return (0.0, 1.0);
    }
    if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return (lo - pad, hi + pad);
    }
    (lo, hi)
}
