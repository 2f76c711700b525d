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

//! The duplex transport consumed by the responders.
//!
//! A [`Channel`] is a session-oriented, local transport with explicit connect
//! phases. Its lifecycle as seen by a responder is:
//!
//! ```text
//! Unconnected ──initialize──► Initialized ──dial──► Dialed (ready) ──close──► Closed
//!      ▲                           │                                            │
//!      └───────────── close ───────┘◄───────────────────────────────────────────┘
//! ```
//!
//! `close` always returns the channel to a state from which `initialize` can
//! be attempted again.
//!
//! * [`UnixSocketChannel`]: Unix domain socket implementation used in production.
//! * [`frame`]: length-prefixed datagram framing shared with the peer side.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use error::ChannelError;
pub use unix::UnixSocketChannel;

use crate::common::DEFAULT_MAX_FRAME_SIZE;

mod error;

/// Datagram framing used by the Unix socket transport.
pub mod frame;

/// Unix domain socket channel.
mod unix;

/// Where and how a channel connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    address: PathBuf,
    max_frame_size: usize,
}

impl ChannelConfig {
    /// Creates a configuration for the given socket address with the default
    /// frame size limit.
    #[must_use]
    pub fn new(address: impl Into<PathBuf>) -> Self {
        Self {
            address: address.into(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Overrides the frame size limit.
    #[must_use]
    pub const fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Socket address of the peer.
    #[must_use]
    pub fn address(&self) -> &Path {
        &self.address
    }

    /// Largest datagram accepted or sent.
    #[must_use]
    pub const fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

/// Contract of the transport between the agent and its worker.
///
/// Implementations are owned by exactly one responder for its whole lifetime,
/// so every method takes `&mut self` and no internal locking is required.
#[async_trait]
pub trait Channel: Send {
    /// Prepares the channel for dialing.
    async fn initialize(&mut self, config: &ChannelConfig) -> Result<(), ChannelError>;

    /// Establishes the session with the peer.
    async fn dial(&mut self, config: &ChannelConfig) -> Result<(), ChannelError>;

    /// Whether `initialize` has succeeded since the last `close`.
    fn is_channel_initialized(&self) -> bool;

    /// Whether `dial` has succeeded since the last `close`.
    fn is_dial_successful(&self) -> bool;

    /// Sends one datagram.
    async fn send(&mut self, payload: &[u8]) -> Result<(), ChannelError>;

    /// Waits for the next datagram.
    async fn recv(&mut self) -> Result<Vec<u8>, ChannelError>;

    /// Tears the session down and discards partial state.
    async fn close(&mut self) -> Result<(), ChannelError>;
}

#[async_trait]
impl<C: Channel + ?Sized> Channel for Box<C> {
    async fn initialize(&mut self, config: &ChannelConfig) -> Result<(), ChannelError> {
        (**self).initialize(config).await
    }

    async fn dial(&mut self, config: &ChannelConfig) -> Result<(), ChannelError> {
        (**self).dial(config).await
    }

    fn is_channel_initialized(&self) -> bool {
        (**self).is_channel_initialized()
    }

    fn is_dial_successful(&self) -> bool {
        (**self).is_dial_successful()
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), ChannelError> {
        (**self).send(payload).await
    }

    async fn recv(&mut self) -> Result<Vec<u8>, ChannelError> {
        (**self).recv().await
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        (**self).close().await
    }
}
