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

#![forbid(unsafe_code)]
#![forbid(missing_docs)]

//! # Worker Respondent
//!
//! The IPC respondent of a managed worker process. It owns two local duplex
//! channels to the surveyor, keeps each one connected under failure, and runs
//! two independent receive loops on top of them:
//!
//! - **Health**: answers every liveness probe, forever, until the channel
//!   fails too many times in a row.
//! - **Termination**: announces that its channel is ready, waits for exactly
//!   one shutdown command, acknowledges it and raises a signal the owning
//!   process waits on before tearing down.
//!
//! ## Key Concepts
//!
//! - **Channel (`Channel`)**: the transport contract. [`channel::UnixSocketChannel`]
//!   implements it over a Unix domain socket.
//! - **Envelope (`Envelope`)**: topic-tagged JSON message.
//! - **Connection manager (`ConnectionManager`)**: retries `initialize`/`dial`
//!   with a fixed delay until the channel is ready, closing after each failure.
//! - **Signals (`Signal`)**: write-once, read-many latches.
//! - **Message bus (`MessageBus`)**: spawns both responders and hands back
//!   the signals.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use worker_respondent::prelude::*;
//!
//! let config = RespondentConfig::load();
//! let settings = RespondentSettings::from_config(&config);
//! let bus = MessageBus::new(
//!     (UnixSocketChannel::new(), config.health_channel()),
//!     (UnixSocketChannel::new(), config.termination_channel()),
//!     &settings,
//! );
//! let handle = bus.start();
//! if handle.wait_for_termination().await {
//!     // shut the worker down
//! }
//! ```

/// Configuration and logging.
pub(crate) mod common;

/// Envelopes and reply bodies.
pub(crate) mod message;

/// Connection manager, responders and signals.
pub(crate) mod respondent;

/// The transport contract and its Unix socket implementation.
pub mod channel;

/// Ambient setup: configuration loading and tracing.
pub mod config {
    pub use crate::common::{
        init_tracing, ChannelSection, ReceiveConfig, ReconnectConfig, RespondentConfig,
        TracingConfig, WorkerConfig, APP_PREFIX, CONFIG_FILE_NAME,
        DEFAULT_MAX_CONSECUTIVE_RECV_ERRORS, DEFAULT_MAX_FRAME_SIZE, DEFAULT_RECONNECT_DELAY_MS,
    };
}

/// Wire messages.
pub mod message_types {
    pub use crate::message::{
        CodecError, Envelope, Topic, WorkerHealth, WorkerIdentity, WorkerTermination,
        SCHEMA_VERSION,
    };
}

/// A prelude module for conveniently importing the most commonly used items.
///
/// # Re-exports
///
/// *   [`async_trait::async_trait`]: needed to implement [`Channel`](crate::channel::Channel)
///     or [`Sleeper`](crate::respondent::Sleeper).
/// *   [`crate::channel::Channel`], [`crate::channel::ChannelConfig`],
///     [`crate::channel::ChannelError`], [`crate::channel::UnixSocketChannel`].
/// *   [`crate::message::Envelope`], [`crate::message::Topic`] and reply bodies.
/// *   [`crate::respondent::HealthResponder`], [`crate::respondent::TerminationResponder`],
///     [`crate::respondent::MessageBus`] and their signals and settings.
/// *   [`crate::common::RespondentConfig`] and [`crate::common::init_tracing`].
pub mod prelude {
    pub use async_trait::async_trait;

    pub use crate::channel::{Channel, ChannelConfig, ChannelError, UnixSocketChannel};
    pub use crate::common::{init_tracing, RespondentConfig, TracingConfig};
    pub use crate::message::{
        CodecError, Envelope, Topic, WorkerHealth, WorkerIdentity, WorkerTermination,
    };
    pub use crate::respondent::{
        signal, ConnectionManager, HealthResponder, MessageBus, MessageBusExit, MessageBusHandle,
        NoopSleeper, RespondentSettings, ResponderExit, Signal, SignalSender, Sleeper,
        TerminationResponder, TokioSleeper,
    };
}
