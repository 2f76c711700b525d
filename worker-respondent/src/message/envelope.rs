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

//! Topic-tagged message envelopes and their JSON codec.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::worker::{WorkerHealth, WorkerTermination};

/// Current envelope schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Discriminator carried by every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// Liveness probe sent by the surveyor.
    HealthCheckRequest,
    /// Answer to a liveness probe.
    HealthCheckReply,
    /// Clean shutdown command sent by the surveyor.
    TerminateWorkerRequest,
    /// Acknowledgement of a shutdown command.
    TerminateWorkerReply,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HealthCheckRequest => "HealthCheckRequest",
            Self::HealthCheckReply => "HealthCheckReply",
            Self::TerminateWorkerRequest => "TerminateWorkerRequest",
            Self::TerminateWorkerReply => "TerminateWorkerReply",
        };
        f.write_str(name)
    }
}

/// Reasons a datagram does not yield the expected envelope.
///
/// Responders treat every variant the same way: the datagram is dropped.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Not a JSON envelope, or an unknown topic.
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A well-formed envelope for a different topic.
    #[error("unexpected topic: expected {expected}, found {found}")]
    UnexpectedTopic {
        /// Topic the caller asked for.
        expected: Topic,
        /// Topic found in the datagram.
        found: Topic,
    },
}

/// An immutable, topic-tagged message.
///
/// # Wire Format
///
/// ```json
/// {
///   "SchemaVersion": 1,
///   "Topic": "HealthCheckReply",
///   "CreatedDate": "2024-05-01T12:00:00Z",
///   "Payload": { "name": "worker", "pid": 4242 }
/// }
/// ```
///
/// `SchemaVersion`, `CreatedDate` and `Payload` are optional on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    topic: Topic,
    #[serde(default = "Utc::now")]
    created_date: DateTime<Utc>,
    #[serde(default)]
    payload: serde_json::Value,
}

const fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Envelope {
    /// Creates an envelope stamped with the current time.
    #[must_use]
    pub fn new(topic: Topic, payload: serde_json::Value) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            topic,
            created_date: Utc::now(),
            payload,
        }
    }

    /// A liveness probe with an empty body.
    #[must_use]
    pub fn health_check_request() -> Self {
        Self::new(Topic::HealthCheckRequest, serde_json::Value::Null)
    }

    /// A shutdown command with an empty body.
    #[must_use]
    pub fn terminate_worker_request() -> Self {
        Self::new(Topic::TerminateWorkerRequest, serde_json::Value::Null)
    }

    /// Reply to a liveness probe.
    ///
    /// # Errors
    ///
    /// Fails only if the body cannot be represented as JSON.
    pub fn health_check_reply(health: &WorkerHealth) -> Result<Self, CodecError> {
        Ok(Self::new(Topic::HealthCheckReply, serde_json::to_value(health)?))
    }

    /// Acknowledgement of a shutdown command.
    ///
    /// # Errors
    ///
    /// Fails only if the body cannot be represented as JSON.
    pub fn terminate_worker_reply(termination: &WorkerTermination) -> Result<Self, CodecError> {
        Ok(Self::new(
            Topic::TerminateWorkerReply,
            serde_json::to_value(termination)?,
        ))
    }

    /// Decodes any envelope.
    ///
    /// # Errors
    ///
    /// [`CodecError::Malformed`] for non-JSON input, missing fields or an
    /// unknown topic.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decodes an envelope and checks its topic.
    ///
    /// # Errors
    ///
    /// As [`decode`](Self::decode), plus [`CodecError::UnexpectedTopic`].
    pub fn decode_expecting(bytes: &[u8], expected: Topic) -> Result<Self, CodecError> {
        let envelope = Self::decode(bytes)?;
        if envelope.topic == expected {
            Ok(envelope)
        } else {
            Err(CodecError::UnexpectedTopic {
                expected,
                found: envelope.topic,
            })
        }
    }

    /// Encodes the envelope as JSON bytes.
    ///
    /// # Errors
    ///
    /// Fails only if the payload cannot be serialized.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserializes the body into a concrete type.
    ///
    /// # Errors
    ///
    /// [`CodecError::Malformed`] if the body has a different shape.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        Ok(T::deserialize(&self.payload)?)
    }

    /// The topic discriminator.
    #[must_use]
    pub const fn topic(&self) -> Topic {
        self.topic
    }

    /// Schema version the sender used.
    #[must_use]
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// When the sender built the envelope.
    #[must_use]
    pub const fn created_date(&self) -> DateTime<Utc> {
        self.created_date
    }

    /// The opaque body.
    #[must_use]
    pub const fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_wire_names() {
        let json = serde_json::to_string(&Topic::TerminateWorkerRequest).unwrap();
        assert_eq!(json, "\"TerminateWorkerRequest\"");
        assert_eq!(Topic::HealthCheckReply.to_string(), "HealthCheckReply");
    }

    #[test]
    fn test_request_decodes_with_expected_topic() {
        let bytes = Envelope::health_check_request().to_bytes().unwrap();
        let envelope = Envelope::decode_expecting(&bytes, Topic::HealthCheckRequest).unwrap();
        assert_eq!(envelope.topic(), Topic::HealthCheckRequest);
        assert_eq!(envelope.schema_version(), SCHEMA_VERSION);
    }

    #[test]
    fn test_wrong_topic_is_rejected() {
        let bytes = Envelope::health_check_request().to_bytes().unwrap();
        let result = Envelope::decode_expecting(&bytes, Topic::TerminateWorkerRequest);
        assert!(matches!(
            result,
            Err(CodecError::UnexpectedTopic {
                expected: Topic::TerminateWorkerRequest,
                found: Topic::HealthCheckRequest,
            })
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let result = Envelope::decode(b"not valid json message");
        assert!(matches!(result, Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_unknown_topic_is_malformed() {
        let result = Envelope::decode(br#"{"Topic":"RebootWorker"}"#);
        assert!(matches!(result, Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_minimal_envelope_fills_defaults() {
        let envelope = Envelope::decode(br#"{"Topic":"TerminateWorkerRequest"}"#).unwrap();
        assert_eq!(envelope.schema_version(), SCHEMA_VERSION);
        assert!(envelope.payload().is_null());
    }

    #[test]
    fn test_reply_body_is_readable() {
        let health = WorkerHealth::new("worker", 4242);
        let envelope = Envelope::health_check_reply(&health).unwrap();
        let bytes = envelope.to_bytes().unwrap();

        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"Topic\":\"HealthCheckReply\""));
        assert!(text.contains("\"CreatedDate\""));

        let decoded = Envelope::decode_expecting(&bytes, Topic::HealthCheckReply).unwrap();
        let body: WorkerHealth = decoded.payload_as().unwrap();
        assert_eq!(body, health);
    }
}
