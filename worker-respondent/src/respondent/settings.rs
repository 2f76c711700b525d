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

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::channel::ChannelConfig;
use crate::common::{
    RespondentConfig, DEFAULT_MAX_CONSECUTIVE_RECV_ERRORS, DEFAULT_RECONNECT_DELAY_MS,
};
use crate::message::WorkerIdentity;

use super::connection::{ConnectionManager, Sleeper, TokioSleeper};

/// Runtime knobs shared by both responders.
#[derive(Clone)]
pub struct RespondentSettings {
    /// Fixed delay between failed connection attempts.
    pub reconnect_delay: Duration,
    /// Consecutive receive failures after which a responder stops.
    pub max_consecutive_recv_errors: u32,
    /// Identity reported in reply bodies.
    pub identity: WorkerIdentity,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for RespondentSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RespondentSettings")
            .field("reconnect_delay", &self.reconnect_delay)
            .field("max_consecutive_recv_errors", &self.max_consecutive_recv_errors)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl Default for RespondentSettings {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            max_consecutive_recv_errors: DEFAULT_MAX_CONSECUTIVE_RECV_ERRORS,
            identity: WorkerIdentity::current("worker"),
            sleeper: Arc::new(TokioSleeper),
        }
    }
}

impl RespondentSettings {
    /// Settings derived from a loaded configuration, sleeping on the tokio timer.
    #[must_use]
    pub fn from_config(config: &RespondentConfig) -> Self {
        Self {
            reconnect_delay: config.reconnect_delay(),
            max_consecutive_recv_errors: config.max_consecutive_recv_errors(),
            identity: WorkerIdentity::current(config.worker.name.clone()),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replaces the wait strategy used between connection attempts.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Sets the consecutive receive failure threshold.
    #[must_use]
    pub const fn with_max_consecutive_recv_errors(mut self, max: u32) -> Self {
        self.max_consecutive_recv_errors = max;
        self
    }

    /// Sets the identity reported in replies.
    #[must_use]
    pub fn with_identity(mut self, identity: WorkerIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Connection manager for a channel using these settings.
    #[must_use]
    pub fn connection_manager(&self, channel_config: ChannelConfig) -> ConnectionManager {
        ConnectionManager::new(channel_config, self.reconnect_delay, Arc::clone(&self.sleeper))
    }
}
