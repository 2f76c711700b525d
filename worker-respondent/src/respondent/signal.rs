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

//! One-shot, single-writer / multi-reader boolean latches.
//!
//! A [`SignalSender`] is held by exactly one responder. Any number of
//! [`Signal`] readers can be cloned from it; every reader observes the same
//! value and reading never consumes it. Once raised, a latch stays raised.

use tokio::sync::watch;

/// Write half of a latch. Not `Clone`: there is a single writer.
#[derive(Debug)]
pub struct SignalSender {
    tx: watch::Sender<bool>,
}

/// Read half of a latch.
#[derive(Debug, Clone)]
pub struct Signal {
    rx: watch::Receiver<bool>,
}

/// Creates a lowered latch.
#[must_use]
pub fn signal() -> (SignalSender, Signal) {
    let (tx, rx) = watch::channel(false);
    (SignalSender { tx }, Signal { rx })
}

impl SignalSender {
    /// Raises the latch.
    ///
    /// Never blocks and succeeds with or without readers. Returns `true` only
    /// for the call that actually moved the latch from lowered to raised.
    pub fn raise(&self) -> bool {
        self.tx.send_if_modified(|raised| {
            if *raised {
                false
            } else {
                *raised = true;
                true
            }
        })
    }

    /// Whether the latch has been raised.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        *self.tx.borrow()
    }

    /// Another reader for this latch.
    #[must_use]
    pub fn subscribe(&self) -> Signal {
        Signal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Signal {
    /// Current value without waiting.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until the latch is raised.
    ///
    /// Resolves to `true` as soon as (or if already) raised. Resolves to
    /// `false` if the writer was dropped without raising, meaning the latch
    /// can no longer fire.
    pub async fn wait(&self) -> bool {
        let mut rx = self.rx.clone();
        // Bind the result so the watch guard is released before returning.
        let raised = rx.wait_for(|raised| *raised).await.is_ok();
        raised
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_starts_lowered() {
        let (sender, reader) = signal();
        assert!(!sender.is_raised());
        assert!(!reader.is_raised());
    }

    #[tokio::test]
    async fn test_only_first_raise_counts() {
        let (sender, reader) = signal();
        assert!(sender.raise());
        assert!(!sender.raise());
        assert!(reader.is_raised());
    }

    #[tokio::test]
    async fn test_every_reader_sees_the_value() {
        let (sender, reader) = signal();
        let other = reader.clone();
        let late = sender.subscribe();
        sender.raise();

        assert!(reader.wait().await);
        assert!(reader.wait().await);
        assert!(other.wait().await);
        assert!(late.wait().await);
    }

    #[tokio::test]
    async fn test_wait_blocks_until_raised() {
        let (sender, reader) = signal();
        let waiter = tokio::spawn(async move { reader.wait().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        sender.raise();
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_raise_without_readers() {
        let (sender, reader) = signal();
        drop(reader);
        assert!(sender.raise());
        assert!(sender.is_raised());
        assert!(sender.subscribe().is_raised());
    }

    #[tokio::test]
    async fn test_value_survives_writer_drop() {
        let (sender, reader) = signal();
        sender.raise();
        drop(sender);
        assert!(reader.wait().await);
    }

    #[tokio::test]
    async fn test_dropped_writer_never_fires() {
        let (sender, reader) = signal();
        drop(sender);
        assert!(!reader.wait().await);
        assert!(!reader.is_raised());
    }
}
