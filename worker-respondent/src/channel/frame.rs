/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Datagram framing over a byte stream.
//!
//! A stream socket has no message boundaries, so every datagram is prefixed
//! with a small header.
//!
//! # Wire Format
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ Payload Length (4 bytes, big-endian u32, excludes header)     │
//! ├───────────────────────────────────────────────────────────────┤
//! │ Protocol Version (1 byte, currently 0x01)                     │
//! ├───────────────────────────────────────────────────────────────┤
//! │ Payload (JSON envelope bytes)                                 │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use super::ChannelError;

/// Protocol version byte.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Frame header size: 4 bytes length + 1 byte version.
pub const HEADER_SIZE: usize = 5;

/// Hard upper bound on a frame regardless of configuration (16 MiB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

fn map_read_error(e: std::io::Error) -> ChannelError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        ChannelError::ConnectionClosed
    } else {
        ChannelError::Io(e)
    }
}

/// Read one datagram.
///
/// # Errors
///
/// [`ChannelError::ConnectionClosed`] on EOF, [`ChannelError::Protocol`] on a
/// version mismatch, [`ChannelError::FrameTooLarge`] when the announced length
/// exceeds `max_size` or [`MAX_FRAME_SIZE`].
///
/// An oversized payload is read and dropped before the error is returned, so
/// the reader stays positioned at the next header. After a version mismatch
/// the position is unknown and the stream should not be read again.
pub async fn read_frame<R>(reader: &mut R, max_size: usize) -> Result<Vec<u8>, ChannelError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header).await.map_err(map_read_error)?;

    let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let version = header[4];

    if version != PROTOCOL_VERSION {
        return Err(ChannelError::Protocol(format!(
            "Unsupported protocol version: {version}, expected {PROTOCOL_VERSION}"
        )));
    }

    let limit = max_size.min(MAX_FRAME_SIZE);
    if length > limit {
        discard_payload(reader, length).await?;
        return Err(ChannelError::FrameTooLarge {
            size: length,
            max: limit,
        });
    }

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload).await.map_err(map_read_error)?;

    Ok(payload)
}

/// Skips `length` payload bytes without buffering them.
///
/// A short read means the peer hung up; the next read reports it.
async fn discard_payload<R>(reader: &mut R, length: usize) -> Result<(), ChannelError>
where
    R: AsyncRead + Unpin,
{
    let mut payload = (&mut *reader).take(length as u64);
    let skipped = tokio::io::copy(&mut payload, &mut tokio::io::sink())
        .await
        .map_err(map_read_error)?;
    trace!("Discarded {} of {} oversized payload bytes", skipped, length);
    Ok(())
}

/// Write one datagram and flush it.
///
/// # Errors
///
/// [`ChannelError::FrameTooLarge`] when the payload exceeds `max_size`, or any
/// underlying I/O failure.
pub async fn write_frame<W>(
    writer: &mut W,
    payload: &[u8],
    max_size: usize,
) -> Result<(), ChannelError>
where
    W: AsyncWrite + Unpin,
{
    let limit = max_size.min(MAX_FRAME_SIZE);
    if payload.len() > limit {
        return Err(ChannelError::FrameTooLarge {
            size: payload.len(),
            max: limit,
        });
    }

    let length: u32 = payload
        .len()
        .try_into()
        .map_err(|_| ChannelError::Protocol("Payload too large for u32".to_string()))?;

    let mut header = [0u8; HEADER_SIZE];
    header[..4].copy_from_slice(&length.to_be_bytes());
    header[4] = PROTOCOL_VERSION;

    writer.write_all(&header).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;

    Ok(())
}
