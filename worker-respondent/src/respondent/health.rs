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

//! Liveness probe responder.

use tracing::{error, info, instrument, trace, warn};

use crate::channel::{Channel, ChannelConfig};
use crate::message::{Envelope, Topic, WorkerIdentity};

use super::connection::ConnectionManager;
use super::recv_budget::RecvErrorBudget;
use super::{RespondentSettings, ResponderExit};

/// Answers every `HealthCheckRequest` with a `HealthCheckReply`.
///
/// The loop has no success exit: a healthy worker is probed for as long as
/// it runs. It stops only when `max_consecutive_recv_errors` receives fail
/// back to back, and then closes its channel. Restarting it is left to
/// whoever supervises the process.
pub struct HealthResponder<C> {
    channel: C,
    connection: ConnectionManager,
    identity: WorkerIdentity,
    max_recv_errors: u32,
}

impl<C: Channel> HealthResponder<C> {
    /// Creates a responder owning `channel`.
    #[must_use]
    pub fn new(channel: C, channel_config: ChannelConfig, settings: &RespondentSettings) -> Self {
        Self {
            channel,
            connection: settings.connection_manager(channel_config),
            identity: settings.identity.clone(),
            max_recv_errors: settings.max_consecutive_recv_errors,
        }
    }

    /// Runs the probe loop until the receive failure threshold is reached.
    #[instrument(name = "health_responder", skip_all)]
    pub async fn run(mut self) -> ResponderExit {
        if !(self.channel.is_channel_initialized() && self.channel.is_dial_successful()) {
            self.connection.ensure_connected(&mut self.channel).await;
        }
        info!(
            "Health responder listening on {}",
            self.connection.channel_config().address().display()
        );

        let mut budget = RecvErrorBudget::new(self.max_recv_errors);
        loop {
            match self.channel.recv().await {
                Ok(datagram) => {
                    budget.reset();
                    self.answer(&datagram).await;
                }
                Err(e) => {
                    let exhausted = budget.record_failure();
                    warn!(
                        "Failed to receive on health channel ({}/{}): {}",
                        budget.consecutive(),
                        budget.max(),
                        e
                    );
                    if exhausted {
                        break;
                    }
                }
            }
        }

        error!(
            "Health responder giving up after {} consecutive receive failures",
            budget.consecutive()
        );
        if let Err(e) = self.channel.close().await {
            warn!("Failed to close health channel: {}", e);
        }

        ResponderExit::RecvErrorsExhausted {
            consecutive: budget.consecutive(),
        }
    }

    async fn answer(&mut self, datagram: &[u8]) {
        let request = match Envelope::decode_expecting(datagram, Topic::HealthCheckRequest) {
            Ok(request) => request,
            Err(e) => {
                trace!("Discarding datagram on health channel: {}", e);
                return;
            }
        };
        trace!("Health check request created at {}", request.created_date());

        let reply = match Envelope::health_check_reply(&self.identity.health())
            .and_then(|reply| reply.to_bytes())
        {
            Ok(reply) => reply,
            Err(e) => {
                error!("Failed to encode health check reply: {}", e);
                return;
            }
        };

        if let Err(e) = self.channel.send(&reply).await {
            warn!("Failed to send health check reply: {}", e);
        }
    }
}
