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

//! Owner of both responders.

use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::channel::{Channel, ChannelConfig};

use super::health::HealthResponder;
use super::signal::Signal;
use super::termination::TerminationResponder;
use super::{RespondentSettings, ResponderExit};

/// Starts the health and termination responders as independent tasks.
///
/// Each responder owns its own channel; the only state shared with the
/// caller is the pair of termination signals.
pub struct MessageBus<H, T> {
    health: HealthResponder<H>,
    termination: TerminationResponder<T>,
}

/// Handle to running responders.
#[derive(Debug)]
pub struct MessageBusHandle {
    health_task: JoinHandle<ResponderExit>,
    termination_task: JoinHandle<ResponderExit>,
    channel_connected: Signal,
    termination_requested: Signal,
}

/// How each responder ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageBusExit {
    /// Outcome of the health responder, `None` if its task panicked or was aborted.
    pub health: Option<ResponderExit>,
    /// Outcome of the termination responder, `None` if its task panicked or was aborted.
    pub termination: Option<ResponderExit>,
}

impl<H, T> MessageBus<H, T>
where
    H: Channel + 'static,
    T: Channel + 'static,
{
    /// Builds both responders.
    #[must_use]
    pub fn new(
        health_channel: (H, ChannelConfig),
        termination_channel: (T, ChannelConfig),
        settings: &RespondentSettings,
    ) -> Self {
        let (health, health_config) = health_channel;
        let (termination, termination_config) = termination_channel;
        Self {
            health: HealthResponder::new(health, health_config, settings),
            termination: TerminationResponder::new(termination, termination_config, settings),
        }
    }

    /// Spawns both responders on the current tokio runtime.
    #[must_use]
    pub fn start(self) -> MessageBusHandle {
        let channel_connected = self.termination.channel_connected_signal();
        let termination_requested = self.termination.termination_requested_signal();

        debug!("Starting health and termination responders");
        let health_task = tokio::spawn(self.health.run());
        let termination_task = tokio::spawn(self.termination.run());

        MessageBusHandle {
            health_task,
            termination_task,
            channel_connected,
            termination_requested,
        }
    }
}

impl MessageBusHandle {
    /// Raised once the termination channel is ready.
    #[must_use]
    pub fn channel_connected_signal(&self) -> Signal {
        self.channel_connected.clone()
    }

    /// Raised once a shutdown command has been acknowledged.
    #[must_use]
    pub fn termination_requested_signal(&self) -> Signal {
        self.termination_requested.clone()
    }

    /// Waits for the shutdown command.
    ///
    /// Resolves to `true` once the command has been acknowledged. Unlike a
    /// latch that blocks until written, this also resolves, to `false`, when
    /// the termination responder ends without ever receiving one (receive
    /// threshold reached, or its task aborted), since the signal can then
    /// never be raised.
    pub async fn wait_for_termination(&self) -> bool {
        self.termination_requested.wait().await
    }

    /// Whether the health responder is still running.
    #[must_use]
    pub fn is_health_running(&self) -> bool {
        !self.health_task.is_finished()
    }

    /// Stops the health responder task.
    ///
    /// The responder has no cancellation point of its own; this is the
    /// owner dropping it at process teardown.
    pub fn abort_health(&self) {
        self.health_task.abort();
    }

    /// Stops the termination responder task without raising its signal.
    pub fn abort_termination(&self) {
        self.termination_task.abort();
    }

    /// Waits for both responder tasks to finish.
    pub async fn join(self) -> MessageBusExit {
        let health = match self.health_task.await {
            Ok(exit) => Some(exit),
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                error!("Health responder task failed: {}", e);
                None
            }
        };
        let termination = match self.termination_task.await {
            Ok(exit) => Some(exit),
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                error!("Termination responder task failed: {}", e);
                None
            }
        };
        MessageBusExit {
            health,
            termination,
        }
    }
}
