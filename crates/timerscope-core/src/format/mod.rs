//! Timer file wire format.
//!
//! A timer file is a flat little-endian stream with no magic number, version
//! tag or checksum. The only structure is the embedded length prefixes:
//!
//! ```text
//! channel_count            u32
//! repeated channel_count times:
//!   name_len               u32
//!   name                   name_len bytes, UTF-8
//!   call_count             u32
//!   runtimes               call_count x f64
//!   runtime_stats          3 x f64 (max, min, avg)
//!   bandwidth_flag         u8, non-zero = present
//!   bandwidths             call_count x f64      (if flag)
//!   bandwidth_stats        3 x f64 (max, min, avg) (if flag)
//! ```
//!
//! Channel N starts exactly where channel N-1 ended, so decoding is a single
//! forward pass through a [`Cursor`]. Bytes after the last declared channel
//! are ignored.
//!
//! [`index`] re-derives channel boundaries without materializing values,
//! which lets callers decode channels independently with [`decode_span`].

mod cursor;
mod encode;
mod index;

use crate::channel::{Channel, Series, Stats};
use crate::error::{Error, Result};
use bytes::Buf;
use std::path::Path;
use tracing::{debug, trace};

pub use cursor::Cursor;
pub use encode::{encode, encode_to_file, encoded_len};
pub use index::{decode_span, index, ChannelSpan};

/// Size of every count and length prefix
pub const COUNT_SIZE: usize = 4;

/// Size of one encoded value
pub const VALUE_SIZE: usize = 8;

/// Size of a `(max, min, avg)` stats sub-record
pub const STATS_SIZE: usize = 3 * VALUE_SIZE;

/// Size of the bandwidth flag
pub const FLAG_SIZE: usize = 1;

/// Smallest possible encoded channel: empty name, no calls, no bandwidths
pub const MIN_CHANNEL_SIZE: usize = COUNT_SIZE + COUNT_SIZE + STATS_SIZE + FLAG_SIZE;

/// Decodes a complete timer file.
///
/// Either every declared channel decodes, in stream order, or the whole
/// call fails with [`Error::TruncatedInput`] or [`Error::InvalidText`].
pub fn decode(bytes: &[u8]) -> Result<Vec<Channel>> {
    let mut cursor = Cursor::new(bytes);
    let channel_count = read_channel_count(&mut cursor)?;

    debug!(
        "Decoding {} channel(s) from {} bytes",
        channel_count,
        bytes.len()
    );

    let mut channels = Vec::with_capacity(channel_count);
    for i in 0..channel_count {
        let start = cursor.position();
        let channel = read_channel(&mut cursor)?;
        trace!(
            "Channel {} '{}': {} call(s), bandwidths {}, bytes {}..{}",
            i,
            channel.name(),
            channel.call_count(),
            if channel.has_bandwidths() { "present" } else { "absent" },
            start,
            cursor.position()
        );
        channels.push(channel);
    }

    if cursor.remaining() > 0 {
        debug!("Ignoring {} trailing byte(s)", cursor.remaining());
    }

    Ok(channels)
}

/// Reads a whole file and decodes it
pub fn decode_file(path: impl AsRef<Path>) -> Result<Vec<Channel>> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    trace!("Read {} bytes from {}", data.len(), path.display());
    decode(&data)
}

/// Reads the top-level channel count.
///
/// A count whose minimal encoding cannot fit in the rest of the buffer is
/// rejected before anything is allocated for it.
fn read_channel_count(cursor: &mut Cursor<'_>) -> Result<usize> {
    let count = cursor.read_u32("channel_count")? as usize;

    let needed = count.saturating_mul(MIN_CHANNEL_SIZE);
    if needed > cursor.remaining() {
        return Err(Error::truncated(
            cursor.position(),
            "channels",
            needed,
            cursor.remaining(),
        ));
    }

    Ok(count)
}

/// Reads one channel record starting at the cursor
fn read_channel(cursor: &mut Cursor<'_>) -> Result<Channel> {
    let name_len = cursor.read_u32("name_len")? as usize;
    let name = cursor.read_str(name_len, "name")?;
    let call_count = cursor.read_u32("call_count")? as usize;

    let runtimes = read_series(cursor, call_count, "runtimes", "runtime_stats")?;
    let channel = Channel::new(name, runtimes);

    if cursor.read_u8("bandwidth_flag")? == 0 {
        return Ok(channel);
    }

    let bandwidths = read_series(cursor, call_count, "bandwidths", "bandwidth_stats")?;
    channel.with_bandwidths(bandwidths)
}

/// Reads a value array followed by its stats sub-record
fn read_series(
    cursor: &mut Cursor<'_>,
    count: usize,
    values_field: &'static str,
    stats_field: &'static str,
) -> Result<Series> {
    let values = cursor.read_f64_array(count, values_field)?;
    let stats = read_stats(cursor, stats_field)?;
    Ok(Series::new(values, stats))
}

/// Reads a `(max, min, avg)` triple
fn read_stats(cursor: &mut Cursor<'_>, field: &'static str) -> Result<Stats> {
    let mut triple = cursor.take(STATS_SIZE, field)?;
    let max = triple.get_f64_le();
    let min = triple.get_f64_le();
    let avg = triple.get_f64_le();
    Ok(Stats::new(max, min, avg))
}
