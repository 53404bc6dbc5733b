//! Channel boundary index.
//!
//! Walks the stream re-deriving every channel's encoded length while
//! skipping over value arrays, so channel byte ranges are known before any
//! value is decoded. Decoding each span with [`decode_span`] gives the same
//! channels as a full [`decode`](super::decode).

use crate::channel::Channel;
use crate::error::{Error, Result};
use std::ops::Range;
use tracing::debug;

use super::cursor::Cursor;
use super::{read_channel, read_channel_count, STATS_SIZE, VALUE_SIZE};

/// Location of one encoded channel within a timer file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpan {
    /// Byte range of the whole channel record
    pub range: Range<usize>,
    /// Number of calls recorded for the channel
    pub call_count: usize,
    /// Whether the bandwidth flag is set
    pub has_bandwidths: bool,
}

impl ChannelSpan {
    /// Encoded size of the channel in bytes
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Returns true if the span covers no bytes
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Locates every channel record in `bytes`.
///
/// Fails on the same inputs as [`decode`](super::decode), with the same errors.
pub fn index(bytes: &[u8]) -> Result<Vec<ChannelSpan>> {
    let mut cursor = Cursor::new(bytes);
    let channel_count = read_channel_count(&mut cursor)?;

    let mut spans = Vec::with_capacity(channel_count);
    for _ in 0..channel_count {
        spans.push(skip_channel(&mut cursor)?);
    }

    debug!("Indexed {} channel(s)", spans.len());
    Ok(spans)
}

/// Decodes the single channel covered by `span`.
///
/// Error offsets are relative to the start of `bytes`, as in a full decode.
pub fn decode_span(bytes: &[u8], span: &ChannelSpan) -> Result<Channel> {
    let end = span.range.end.min(bytes.len());
    if span.range.start > end {
        return Err(Error::truncated(
            end,
            "channel",
            span.len(),
            bytes.len().saturating_sub(span.range.start),
        ));
    }

    let mut cursor = Cursor::starting_at(&bytes[..end], span.range.start);
    read_channel(&mut cursor)
}

fn skip_channel(cursor: &mut Cursor<'_>) -> Result<ChannelSpan> {
    let start = cursor.position();

    let name_len = cursor.read_u32("name_len")? as usize;
    // Names are still validated so indexing fails exactly where decoding does
    cursor.read_str(name_len, "name")?;
    let call_count = cursor.read_u32("call_count")? as usize;

    cursor.take_array(call_count, VALUE_SIZE, "runtimes")?;
    cursor.skip(STATS_SIZE, "runtime_stats")?;

    let has_bandwidths = cursor.read_u8("bandwidth_flag")? != 0;
    if has_bandwidths {
        cursor.take_array(call_count, VALUE_SIZE, "bandwidths")?;
        cursor.skip(STATS_SIZE, "bandwidth_stats")?;
    }

    Ok(ChannelSpan {
        range: start..cursor.position(),
        call_count,
        has_bandwidths,
    })
}
