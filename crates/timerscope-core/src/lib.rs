//! # timerscope-core
//!
//! A library for decoding BS Timer profiling trace files (`.bs.timer`).
//!
//! A timer file records, per named instrumentation point ("channel"), the
//! runtime of every call, optionally the bandwidth of every call, and the
//! producer's precomputed `(max, min, avg)` statistics for both.
//!
//! This crate provides:
//! - A single-pass decoder with byte-exact bounds checking
//! - A writer for the same layout
//! - A channel boundary index for decoding channels independently
//! - Renderers turning a channel into an SVG chart or a text report
//!
//! ## Architecture
//!
//! - [`format`]: wire layout, cursor, decoder, encoder and index
//! - [`channel`]: the decoded data model
//! - [`render`]: per-channel artifact rendering
//! - [`error`]: error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use timerscope_core::{decode, ChannelRenderer, SvgRenderer};
//! use std::fs;
//!
//! let data = fs::read("./results/run.bs.timer")?;
//! let channels = decode(&data)?;
//!
//! let renderer = SvgRenderer::new();
//! for channel in &channels {
//!     println!("{}: {} calls", channel.name(), channel.call_count());
//!     let _svg = renderer.render(channel)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod channel;
pub mod error;
pub mod format;
pub mod render;

// Re-export primary types for convenience
pub use channel::{Channel, Series, Stats};
pub use error::{Error, Result};
pub use format::{
    decode, decode_file, decode_span, encode, encode_to_file, index, ChannelSpan, Cursor,
};
pub use render::{
    artifact_file_name, ChannelRenderer, ReportConfig, ReportRenderer, SvgConfig, SvgRenderer,
    TimeUnit,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File name suffix of timer files
pub const TIMER_FILE_EXTENSION: &str = ".bs.timer";
