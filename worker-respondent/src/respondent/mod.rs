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

//! The IPC respondent: connection recovery plus the two receive loops.
//!
//! Both responders share the same shape:
//!
//! ```text
//! Disconnected ─► Connecting ─► Connected ─► Listening ─┬─► Done    (termination only)
//!                 (retries forever)           (bounded)  └─► Failed  (error threshold)
//! ```
//!
//! and both terminal states close the channel.

pub use connection::{ConnectionManager, NoopSleeper, Sleeper, TokioSleeper};
pub use health::HealthResponder;
pub use message_bus::{MessageBus, MessageBusExit, MessageBusHandle};
pub use settings::RespondentSettings;
pub use signal::{signal, Signal, SignalSender};
pub use termination::TerminationResponder;

mod connection;
mod health;
mod message_bus;
mod recv_budget;
mod settings;
mod signal;
mod termination;

/// Why a responder's `run` future completed.
///
/// Informational only: neither variant is an error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderExit {
    /// A shutdown command was received and acknowledged.
    Terminated,
    /// The receive failure threshold was reached.
    RecvErrorsExhausted {
        /// The threshold the loop stopped at: the configured maximum, or 1 if
        /// that was configured as 0.
        consecutive: u32,
    },
}
