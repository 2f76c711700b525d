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

use thiserror::Error;

/// Transport-level failures reported by a [`Channel`](super::Channel).
///
/// Responders never inspect the variant: any `Err` from `recv` counts as one
/// consecutive receive failure, and connection-phase errors are retried.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// `dial` was attempted before a successful `initialize`.
    #[error("channel is not initialized")]
    NotInitialized,

    /// `send` or `recv` was attempted without a dialed session.
    #[error("channel is not connected")]
    NotConnected,

    /// The peer closed the session.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The configured address cannot be used.
    #[error("invalid channel address: {0}")]
    InvalidAddress(String),

    /// A frame exceeded the configured size limit.
    #[error("frame size {size} exceeds maximum {max}")]
    FrameTooLarge {
        /// Size announced or attempted.
        size: usize,
        /// Configured limit.
        max: usize,
    },

    /// Malformed frame (bad header, unsupported version).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Socket or other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
