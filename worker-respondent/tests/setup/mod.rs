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
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use parking_lot::Mutex;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use worker_respondent::prelude::*;

/// Threshold used by the responder tests.
pub const MAX_RECV_ERRORS: u32 = 5;

// Ensures tracing initialization happens only once across all tests.
static INIT: Once = Once::new();

/// Installs a test-writer subscriber once per test binary.
///
/// Output is captured by the test harness and only shown for failing tests.
pub fn initialize_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::new("worker_respondent=trace")
            .add_directive(tracing_subscriber::filter::LevelFilter::DEBUG.into());

        let subscriber = FmtSubscriber::builder()
            .with_span_events(FmtSpan::NONE)
            .compact()
            .with_line_number(true)
            .without_time()
            .with_target(true)
            .with_env_filter(filter)
            .with_test_writer()
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");
    });
}

/// Settings with a no-op sleeper and the test threshold.
pub fn test_settings() -> RespondentSettings {
    RespondentSettings::default()
        .with_sleeper(NoopSleeper)
        .with_max_consecutive_recv_errors(MAX_RECV_ERRORS)
        .with_identity(WorkerIdentity::new("test-worker", 4242))
}

pub fn test_channel_config() -> ChannelConfig {
    ChannelConfig::new("/tmp/worker-respondent-test.sock")
}

/// One channel operation, in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Initialize,
    Dial,
    Send,
    Recv,
    Close,
}

#[derive(Debug)]
enum RecvStep {
    Datagram(Vec<u8>),
    Error,
}

#[derive(Debug, Default)]
struct MockState {
    initialized: bool,
    dialed: bool,
    initialize_failures: usize,
    dial_failures: usize,
    failing_sends: bool,
    recv_script: VecDeque<RecvStep>,
    calls: Vec<Call>,
    sent: Vec<Vec<u8>>,
}

/// Scripted in-memory channel.
///
/// `initialize` and `dial` fail the scripted number of times and then
/// succeed. `recv` replays the script; once it runs dry every further
/// `recv` fails, which eventually trips any responder's threshold.
#[derive(Debug, Clone, Default)]
pub struct MockChannel {
    state: Arc<Mutex<MockState>>,
}

/// Read side of a [`MockChannel`] kept by the test after the channel moves
/// into a responder.
#[derive(Debug, Clone)]
pub struct MockProbe {
    state: Arc<Mutex<MockState>>,
}

impl MockChannel {
    /// A channel that still has to be initialized and dialed.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// A channel that is already initialized and dialed.
    pub fn connected() -> Self {
        let channel = Self::default();
        {
            let mut state = channel.state.lock();
            state.initialized = true;
            state.dialed = true;
        }
        channel
    }

    pub fn probe(&self) -> MockProbe {
        MockProbe {
            state: Arc::clone(&self.state),
        }
    }

    pub fn failing_initialize(self, times: usize) -> Self {
        self.state.lock().initialize_failures = times;
        self
    }

    pub fn failing_dial(self, times: usize) -> Self {
        self.state.lock().dial_failures = times;
        self
    }

    pub fn failing_sends(self) -> Self {
        self.state.lock().failing_sends = true;
        self
    }

    pub fn then_recv_errors(self, count: u32) -> Self {
        {
            let mut state = self.state.lock();
            for _ in 0..count {
                state.recv_script.push_back(RecvStep::Error);
            }
        }
        self
    }

    pub fn then_recv_bytes(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.state
            .lock()
            .recv_script
            .push_back(RecvStep::Datagram(bytes.into()));
        self
    }

    pub fn then_recv(self, envelope: &Envelope) -> Self {
        let bytes = envelope.to_bytes().expect("envelope encodes");
        self.then_recv_bytes(bytes)
    }
}

impl MockProbe {
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == call).count()
    }

    pub fn sent(&self) -> Vec<Envelope> {
        self.state
            .lock()
            .sent
            .iter()
            .map(|bytes| Envelope::decode(bytes).expect("responder sends valid envelopes"))
            .collect()
    }

    pub fn script_remaining(&self) -> usize {
        self.state.lock().recv_script.len()
    }

    pub fn is_dialed(&self) -> bool {
        self.state.lock().dialed
    }
}

#[async_trait]
impl Channel for MockChannel {
    async fn initialize(&mut self, _config: &ChannelConfig) -> Result<(), ChannelError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Initialize);
        if state.initialize_failures > 0 {
            state.initialize_failures -= 1;
            return Err(ChannelError::InvalidAddress("scripted initialize failure".into()));
        }
        state.initialized = true;
        Ok(())
    }

    async fn dial(&mut self, _config: &ChannelConfig) -> Result<(), ChannelError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Dial);
        if !state.initialized {
            return Err(ChannelError::NotInitialized);
        }
        if state.dial_failures > 0 {
            state.dial_failures -= 1;
            return Err(ChannelError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "scripted dial failure",
            )));
        }
        state.dialed = true;
        Ok(())
    }

    fn is_channel_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    fn is_dial_successful(&self) -> bool {
        self.state.lock().dialed
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), ChannelError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Send);
        if state.failing_sends {
            return Err(ChannelError::ConnectionClosed);
        }
        state.sent.push(payload.to_vec());
        Ok(())
    }

    async fn recv(&mut self) -> Result<Vec<u8>, ChannelError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Recv);
        match state.recv_script.pop_front() {
            Some(RecvStep::Datagram(bytes)) => Ok(bytes),
            Some(RecvStep::Error) | None => Err(ChannelError::ConnectionClosed),
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Close);
        state.initialized = false;
        state.dialed = false;
        Ok(())
    }
}

/// Sleeper that records requested delays without waiting.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<Duration>>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> usize {
        self.sleeps.load(Ordering::SeqCst)
    }

    pub fn last_delay(&self) -> Option<Duration> {
        *self.last.lock()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        *self.last.lock() = Some(duration);
    }
}
