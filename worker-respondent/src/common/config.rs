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

//! Respondent configuration with XDG-compliant file and socket locations.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::channel::ChannelConfig;

/// Directory prefix used for XDG config and runtime paths.
pub const APP_PREFIX: &str = "worker-respondent";

/// Name of the configuration file inside `$XDG_CONFIG_HOME/worker-respondent/`.
pub const CONFIG_FILE_NAME: &str = "respondent.toml";

/// Default delay between connection attempts.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1_000;

/// Default number of back-to-back receive failures a responder tolerates.
pub const DEFAULT_MAX_CONSECUTIVE_RECV_ERRORS: u32 = 5;

/// Default upper bound on a single frame read from the channel.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1_048_576;

/// Configuration for the respondent process.
///
/// Loaded from `$XDG_CONFIG_HOME/worker-respondent/respondent.toml`. Every
/// section is optional; missing keys take their defaults.
///
/// # Example Configuration File
///
/// ```toml
/// [channel]
/// # health_socket = "/run/user/1000/worker-respondent/health.sock"
/// # termination_socket = "/run/user/1000/worker-respondent/termination.sock"
/// max_frame_size = 1048576
///
/// [reconnect]
/// delay_ms = 1000
///
/// [receive]
/// max_consecutive_errors = 5
///
/// [worker]
/// name = "worker"
///
/// [tracing]
/// level = "info"
/// # log_directory = "/var/log/worker-respondent"
/// log_file = "respondent.log"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RespondentConfig {
    /// Channel locations and limits.
    pub channel: ChannelSection,
    /// Reconnect policy.
    pub reconnect: ReconnectConfig,
    /// Receive loop limits.
    pub receive: ReceiveConfig,
    /// Identity reported back to the surveyor.
    pub worker: WorkerConfig,
    /// Logging setup.
    pub tracing: TracingConfig,
}

/// Socket locations for the two responder channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSection {
    /// Override for the health channel socket.
    ///
    /// If `None`, `$XDG_RUNTIME_DIR/worker-respondent/health.sock` is used.
    pub health_socket: Option<PathBuf>,

    /// Override for the termination channel socket.
    ///
    /// If `None`, `$XDG_RUNTIME_DIR/worker-respondent/termination.sock` is used.
    pub termination_socket: Option<PathBuf>,

    /// Maximum frame size in bytes.
    pub max_frame_size: usize,
}

/// Reconnect behaviour of the connection manager.
///
/// The delay is fixed; there is no backoff between attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Delay between failed connection attempts in milliseconds.
    pub delay_ms: u64,
}

/// Receive loop limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiveConfig {
    /// Consecutive receive failures after which a responder gives up.
    pub max_consecutive_errors: u32,
}

/// Worker identity carried in reply bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Name reported in health and termination replies.
    pub name: String,
}

/// Tracing and logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Default filter directive, overridden by `RUST_LOG` when set.
    pub level: String,
    /// Directory for the log file. Logs go to stderr when unset.
    pub log_directory: Option<PathBuf>,
    /// File name inside `log_directory`.
    pub log_file: String,
}

impl Default for ChannelSection {
    fn default() -> Self {
        Self {
            health_socket: None,
            termination_socket: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_RECONNECT_DELAY_MS,
        }
    }
}

impl Default for ReceiveConfig {
    fn default() -> Self {
        Self {
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_RECV_ERRORS,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: default_worker_name(),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_directory: None,
            log_file: "respondent.log".to_string(),
        }
    }
}

fn default_worker_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "worker".to_string())
}

impl RespondentConfig {
    /// Load configuration from XDG-compliant locations.
    ///
    /// Looks for `respondent.toml` under `$XDG_CONFIG_HOME/worker-respondent/`
    /// (falling back to `~/.config/worker-respondent/`). A missing, unreadable
    /// or malformed file is logged and the defaults are returned.
    #[must_use]
    pub fn load() -> Self {
        let xdg_dirs = match xdg::BaseDirectories::with_prefix(APP_PREFIX) {
            Ok(dirs) => dirs,
            Err(e) => {
                warn!("Failed to initialize XDG directories for respondent config: {}", e);
                return Self::default();
            }
        };

        xdg_dirs.find_config_file(CONFIG_FILE_NAME).map_or_else(
            || {
                info!("No respondent configuration file found, using defaults");
                Self::default()
            },
            |path| {
                info!("Loading respondent configuration from: {}", path.display());
                match std::fs::read_to_string(&path) {
                    Ok(config_str) => Self::from_toml_str(&config_str).unwrap_or_else(|e| {
                        warn!(
                            "Failed to parse respondent configuration file {}: {}",
                            path.display(),
                            e
                        );
                        Self::default()
                    }),
                    Err(e) => {
                        warn!(
                            "Failed to read respondent configuration file {}: {}",
                            path.display(),
                            e
                        );
                        Self::default()
                    }
                }
            },
        )
    }

    /// Parse configuration from a TOML document.
    pub fn from_toml_str(config_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(config_str)
    }

    /// Directory holding the default sockets.
    ///
    /// - Linux: `$XDG_RUNTIME_DIR/worker-respondent/`
    /// - Fallback: `/tmp/worker-respondent/`
    #[must_use]
    pub fn runtime_dir() -> PathBuf {
        std::env::var("XDG_RUNTIME_DIR")
            .map_or_else(|_| PathBuf::from("/tmp"), PathBuf::from)
            .join(APP_PREFIX)
    }

    /// Resolved socket path of the health channel.
    #[must_use]
    pub fn health_socket_path(&self) -> PathBuf {
        self.channel
            .health_socket
            .clone()
            .unwrap_or_else(|| Self::runtime_dir().join("health.sock"))
    }

    /// Resolved socket path of the termination channel.
    #[must_use]
    pub fn termination_socket_path(&self) -> PathBuf {
        self.channel
            .termination_socket
            .clone()
            .unwrap_or_else(|| Self::runtime_dir().join("termination.sock"))
    }

    /// Channel settings for the health responder.
    #[must_use]
    pub fn health_channel(&self) -> ChannelConfig {
        ChannelConfig::new(self.health_socket_path()).with_max_frame_size(self.channel.max_frame_size)
    }

    /// Channel settings for the termination responder.
    #[must_use]
    pub fn termination_channel(&self) -> ChannelConfig {
        ChannelConfig::new(self.termination_socket_path())
            .with_max_frame_size(self.channel.max_frame_size)
    }

    /// Get the reconnect delay as a `Duration`.
    #[must_use]
    pub const fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect.delay_ms)
    }

    /// Consecutive receive failures tolerated before a responder stops.
    #[must_use]
    pub const fn max_consecutive_recv_errors(&self) -> u32 {
        self.receive.max_consecutive_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RespondentConfig::default();
        assert_eq!(config.reconnect.delay_ms, 1_000);
        assert_eq!(config.receive.max_consecutive_errors, 5);
        assert_eq!(config.channel.max_frame_size, 1_048_576);
        assert_eq!(config.tracing.level, "info");
    }

    #[test]
    fn test_socket_paths_default() {
        let config = RespondentConfig::default();
        let health = config.health_socket_path();
        let termination = config.termination_socket_path();

        assert!(health.to_string_lossy().contains(APP_PREFIX));
        assert!(health.to_string_lossy().ends_with("health.sock"));
        assert!(termination.to_string_lossy().ends_with("termination.sock"));
        assert_eq!(health.parent(), termination.parent());
    }

    #[test]
    fn test_socket_path_override() {
        let mut config = RespondentConfig::default();
        config.channel.health_socket = Some(PathBuf::from("/custom/health.sock"));

        assert_eq!(config.health_socket_path(), PathBuf::from("/custom/health.sock"));
        assert_eq!(
            config.health_channel().address(),
            PathBuf::from("/custom/health.sock").as_path()
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RespondentConfig::from_toml_str(
            r"
            [receive]
            max_consecutive_errors = 3
            ",
        )
        .unwrap();

        assert_eq!(config.max_consecutive_recv_errors(), 3);
        assert_eq!(config.reconnect_delay(), Duration::from_millis(1_000));
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        let result = RespondentConfig::from_toml_str("[receive]\nmax_consecutive_errors = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = RespondentConfig::default();
        config.worker.name = "probe-target".to_string();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed = RespondentConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed.worker.name, "probe-target");
        assert_eq!(parsed.channel.max_frame_size, config.channel.max_frame_size);
    }

    #[test]
    fn test_frame_size_flows_into_channel_config() {
        let mut config = RespondentConfig::default();
        config.channel.max_frame_size = 4096;
        assert_eq!(config.termination_channel().max_frame_size(), 4096);
    }
}
