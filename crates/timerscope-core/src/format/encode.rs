//! Timer file writer.
//!
//! Produces the same layout [`decode`](super::decode) consumes, so that
//! `decode(&encode(channels)?)` returns the original channels.

use crate::channel::{Channel, Series};
use crate::error::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};
use std::path::Path;
use tracing::debug;

use super::{COUNT_SIZE, FLAG_SIZE, STATS_SIZE, VALUE_SIZE};

/// Encodes channels in the given order.
///
/// Fails with [`Error::Encode`] if a count or name length does not fit the
/// format's 32-bit prefixes.
pub fn encode(channels: &[Channel]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(encoded_len(channels));
    buf.put_u32_le(wire_count(channels.len(), "channel count")?);

    for channel in channels {
        encode_channel(&mut buf, channel)?;
    }

    Ok(buf.freeze())
}

/// Encodes channels and writes them to `path`, creating parent directories
pub fn encode_to_file(path: impl AsRef<Path>, channels: &[Channel]) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode(channels)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::directory_create(parent, e))?;
    }

    std::fs::write(path, &bytes).map_err(|e| Error::file_write(path, e))?;
    debug!(
        "Wrote {} channel(s), {} bytes to {}",
        channels.len(),
        bytes.len(),
        path.display()
    );
    Ok(())
}

/// Number of bytes [`encode`] produces for `channels`
pub fn encoded_len(channels: &[Channel]) -> usize {
    COUNT_SIZE + channels.iter().map(channel_len).sum::<usize>()
}

fn channel_len(channel: &Channel) -> usize {
    let series = |s: &Series| s.len() * VALUE_SIZE + STATS_SIZE;

    COUNT_SIZE
        + channel.name().len()
        + COUNT_SIZE
        + series(channel.runtime_series())
        + FLAG_SIZE
        + channel.bandwidth_series().map_or(0, series)
}

fn encode_channel(buf: &mut BytesMut, channel: &Channel) -> Result<()> {
    let name = channel.name().as_bytes();
    buf.put_u32_le(wire_count(name.len(), "name length")?);
    buf.put_slice(name);

    buf.put_u32_le(wire_count(channel.call_count(), "call count")?);
    put_series(buf, channel.runtime_series());

    match channel.bandwidth_series() {
        Some(bandwidths) => {
            buf.put_u8(1);
            put_series(buf, bandwidths);
        }
        None => buf.put_u8(0),
    }

    Ok(())
}

fn put_series(buf: &mut BytesMut, series: &Series) {
    for &value in &series.values {
        buf.put_f64_le(value);
    }
    buf.put_f64_le(series.stats.max);
    buf.put_f64_le(series.stats.min);
    buf.put_f64_le(series.stats.avg);
}

fn wire_count(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::encode(format!("{} {} exceeds u32 range", what, value)))
}
