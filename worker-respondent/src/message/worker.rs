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

use serde::{Deserialize, Serialize};

/// Identity of the process running the responders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerIdentity {
    name: String,
    pid: u32,
}

impl WorkerIdentity {
    /// Identity with an explicit process id.
    #[must_use]
    pub fn new(name: impl Into<String>, pid: u32) -> Self {
        Self {
            name: name.into(),
            pid,
        }
    }

    /// Identity of the current process.
    #[must_use]
    pub fn current(name: impl Into<String>) -> Self {
        Self::new(name, std::process::id())
    }

    /// Reported name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reported process id.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Body of a `HealthCheckReply`.
    #[must_use]
    pub fn health(&self) -> WorkerHealth {
        WorkerHealth::new(self.name.clone(), self.pid)
    }

    /// Body of a `TerminateWorkerReply`.
    #[must_use]
    pub fn termination(&self) -> WorkerTermination {
        WorkerTermination {
            name: self.name.clone(),
            pid: self.pid,
            acknowledged: true,
        }
    }
}

/// Body of a `HealthCheckReply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerHealth {
    /// Worker name.
    pub name: String,
    /// Worker process id.
    pub pid: u32,
}

impl WorkerHealth {
    /// Creates a health body.
    #[must_use]
    pub fn new(name: impl Into<String>, pid: u32) -> Self {
        Self {
            name: name.into(),
            pid,
        }
    }
}

/// Body of a `TerminateWorkerReply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerTermination {
    /// Worker name.
    pub name: String,
    /// Worker process id.
    pub pid: u32,
    /// Always `true` in a reply; the worker accepted the command.
    pub acknowledged: bool,
}
