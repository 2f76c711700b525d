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

//! Clean shutdown command responder.

use tracing::{debug, error, info, instrument, trace, warn};

use crate::channel::{Channel, ChannelConfig};
use crate::message::{Envelope, Topic, WorkerIdentity};

use super::connection::ConnectionManager;
use super::recv_budget::RecvErrorBudget;
use super::signal::{signal, Signal, SignalSender};
use super::{RespondentSettings, ResponderExit};

/// Waits for exactly one `TerminateWorkerRequest`.
///
/// Raises the channel-connected signal as soon as its channel is ready, then
/// listens. The first valid request is acknowledged with a
/// `TerminateWorkerReply`, the termination-requested signal is raised and the
/// loop ends. If the receive failure threshold is reached first, the
/// termination-requested signal is never raised. The channel is closed once
/// on either exit.
pub struct TerminationResponder<C> {
    channel: C,
    connection: ConnectionManager,
    identity: WorkerIdentity,
    max_recv_errors: u32,
    channel_connected: SignalSender,
    termination_requested: SignalSender,
}

impl<C: Channel> TerminationResponder<C> {
    /// Creates a responder owning `channel`.
    #[must_use]
    pub fn new(channel: C, channel_config: ChannelConfig, settings: &RespondentSettings) -> Self {
        let (channel_connected, _) = signal();
        let (termination_requested, _) = signal();
        Self {
            channel,
            connection: settings.connection_manager(channel_config),
            identity: settings.identity.clone(),
            max_recv_errors: settings.max_consecutive_recv_errors,
            channel_connected,
            termination_requested,
        }
    }

    /// Raised once the channel has been dialed.
    #[must_use]
    pub fn channel_connected_signal(&self) -> Signal {
        self.channel_connected.subscribe()
    }

    /// Raised once a shutdown command has been received and acknowledged.
    #[must_use]
    pub fn termination_requested_signal(&self) -> Signal {
        self.termination_requested.subscribe()
    }

    /// Connects, then waits for the shutdown command.
    #[instrument(name = "termination_responder", skip_all)]
    pub async fn run(mut self) -> ResponderExit {
        if !(self.channel.is_channel_initialized() && self.channel.is_dial_successful()) {
            self.connection.ensure_connected(&mut self.channel).await;
        }
        self.channel_connected.raise();
        info!(
            "Termination responder listening on {}",
            self.connection.channel_config().address().display()
        );

        let exit = self.listen().await;

        if let Err(e) = self.channel.close().await {
            warn!("Failed to close termination channel: {}", e);
        }
        exit
    }

    async fn listen(&mut self) -> ResponderExit {
        let mut budget = RecvErrorBudget::new(self.max_recv_errors);
        loop {
            let datagram = match self.channel.recv().await {
                Ok(datagram) => datagram,
                Err(e) => {
                    let exhausted = budget.record_failure();
                    warn!(
                        "Failed to receive on termination channel ({}/{}): {}",
                        budget.consecutive(),
                        budget.max(),
                        e
                    );
                    if exhausted {
                        error!(
                            "Termination responder giving up after {} consecutive receive failures",
                            budget.consecutive()
                        );
                        return ResponderExit::RecvErrorsExhausted {
                            consecutive: budget.consecutive(),
                        };
                    }
                    continue;
                }
            };
            budget.reset();

            match Envelope::decode_expecting(&datagram, Topic::TerminateWorkerRequest) {
                Ok(request) => {
                    debug!(
                        "Termination requested (envelope created at {})",
                        request.created_date()
                    );
                    self.acknowledge().await;
                    self.termination_requested.raise();
                    return ResponderExit::Terminated;
                }
                Err(e) => trace!("Discarding datagram on termination channel: {}", e),
            }
        }
    }

    async fn acknowledge(&mut self) {
        let reply = match Envelope::terminate_worker_reply(&self.identity.termination())
            .and_then(|reply| reply.to_bytes())
        {
            Ok(reply) => reply,
            Err(e) => {
                error!("Failed to encode termination reply: {}", e);
                return;
            }
        };

        if let Err(e) = self.channel.send(&reply).await {
            warn!("Failed to send termination reply: {}", e);
        }
    }
}
