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

//! Connection recovery for a responder's channel.
//!
//! The worker may come up after the respondent, so connecting is retried
//! forever with a fixed delay. Every failed step is followed by a `close` so
//! no half-initialized state leaks into the next attempt.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use crate::channel::{Channel, ChannelConfig};

/// Wait strategy between connection attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspends the caller for `duration` (or not at all).
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately. Makes retry sequences deterministic in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSleeper;

#[async_trait]
impl Sleeper for NoopSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Brings a channel from disconnected to ready.
#[derive(Clone)]
pub struct ConnectionManager {
    config: ChannelConfig,
    delay: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("config", &self.config)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Creates a manager dialing `config` with a fixed `delay` between attempts.
    #[must_use]
    pub fn new(config: ChannelConfig, delay: Duration, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            config,
            delay,
            sleeper,
        }
    }

    /// Settings passed to `initialize` and `dial`.
    #[must_use]
    pub const fn channel_config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Blocks until `channel` reports a successful dial.
    ///
    /// There is no attempt cap. Returns the number of attempts that failed
    /// before the channel became ready.
    pub async fn ensure_connected<C>(&self, channel: &mut C) -> u64
    where
        C: Channel + ?Sized,
    {
        let mut failed_attempts: u64 = 0;

        while !channel.is_dial_successful() {
            if let Err(e) = channel.initialize(&self.config).await {
                failed_attempts += 1;
                warn!(
                    "Failed to initialize channel {} (attempt {}): {}",
                    self.config.address().display(),
                    failed_attempts,
                    e
                );
                self.discard_and_wait(channel).await;
                continue;
            }

            if let Err(e) = channel.dial(&self.config).await {
                failed_attempts += 1;
                warn!(
                    "Failed to dial channel {} (attempt {}): {}",
                    self.config.address().display(),
                    failed_attempts,
                    e
                );
                self.discard_and_wait(channel).await;
            }
        }

        debug!(
            "Channel {} ready after {} failed attempt(s)",
            self.config.address().display(),
            failed_attempts
        );
        failed_attempts
    }

    async fn discard_and_wait<C>(&self, channel: &mut C)
    where
        C: Channel + ?Sized,
    {
        if let Err(e) = channel.close().await {
            trace!("Ignoring close error while discarding channel state: {}", e);
        }
        self.sleeper.sleep(self.delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_waits() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(5)).await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_noop_sleeper_returns_immediately() {
        let start = std::time::Instant::now();
        NoopSleeper.sleep(Duration::from_secs(60)).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_debug_omits_sleeper() {
        let manager = ConnectionManager::new(
            ChannelConfig::new("/tmp/health.sock"),
            Duration::from_millis(10),
            Arc::new(NoopSleeper),
        );
        let rendered = format!("{manager:?}");
        assert!(rendered.contains("health.sock"));
        assert!(!rendered.contains("sleeper"));
    }
}
