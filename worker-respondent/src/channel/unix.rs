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

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tracing::{debug, trace, warn};

use super::frame::{read_frame, write_frame};
use super::{Channel, ChannelConfig, ChannelError};

/// Client side of a Unix domain socket session.
///
/// The surveyor (the process sending probes and shutdown commands) owns the
/// listening socket; this channel dials into it. `initialize` only validates
/// and records the address, `dial` performs the connect.
#[derive(Debug, Default)]
pub struct UnixSocketChannel {
    address: Option<PathBuf>,
    max_frame_size: usize,
    stream: Option<UnixStream>,
}

impl UnixSocketChannel {
    /// Creates an unconnected channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Channel for UnixSocketChannel {
    async fn initialize(&mut self, config: &ChannelConfig) -> Result<(), ChannelError> {
        let address = config.address();
        if address.as_os_str().is_empty() {
            return Err(ChannelError::InvalidAddress("socket path is empty".to_string()));
        }
        if address.is_dir() {
            return Err(ChannelError::InvalidAddress(format!(
                "{} is a directory",
                address.display()
            )));
        }

        self.address = Some(address.to_path_buf());
        self.max_frame_size = config.max_frame_size();
        trace!("Channel initialized for {}", address.display());
        Ok(())
    }

    async fn dial(&mut self, config: &ChannelConfig) -> Result<(), ChannelError> {
        if self.address.is_none() {
            return Err(ChannelError::NotInitialized);
        }

        let stream = UnixStream::connect(config.address()).await?;
        debug!("Channel dialed {}", config.address().display());
        self.stream = Some(stream);
        Ok(())
    }

    fn is_channel_initialized(&self) -> bool {
        self.address.is_some()
    }

    fn is_dial_successful(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), ChannelError> {
        let max = self.max_frame_size;
        let stream = self.stream.as_mut().ok_or(ChannelError::NotConnected)?;
        write_frame(stream, payload, max).await?;
        trace!("Sent frame of {} bytes", payload.len());
        Ok(())
    }

    async fn recv(&mut self) -> Result<Vec<u8>, ChannelError> {
        let max = self.max_frame_size;
        let stream = self.stream.as_mut().ok_or(ChannelError::NotConnected)?;
        match read_frame(stream, max).await {
            Ok(payload) => {
                trace!("Received frame of {} bytes", payload.len());
                Ok(payload)
            }
            Err(e @ ChannelError::Protocol(_)) => {
                // Frame boundaries are lost; drop the session.
                warn!("Dropping desynchronized session: {}", e);
                self.stream = None;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.address = None;
        if let Some(mut stream) = self.stream.take() {
            debug!("Closing channel");
            stream.shutdown().await?;
        }
        Ok(())
    }
}
