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

//! Global tracing subscriber setup.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use crate::common::config::TracingConfig;

/// Builds the filter from the `RUST_LOG` value when it is set and valid,
/// otherwise from the configured level.
fn build_filter(config: &TracingConfig, env_directives: Option<&str>) -> EnvFilter {
    env_directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(&config.level))
}

/// Installs the global tracing subscriber.
///
/// With `log_directory` set, output goes through a non-blocking writer to
/// `<log_directory>/<log_file>` (no rotation) and the returned guard must be
/// held until shutdown so buffered lines are flushed. Without it, logs go to
/// stderr and no guard is returned.
///
/// # Errors
///
/// Fails if the log directory cannot be created or a global subscriber is
/// already installed.
pub fn init_tracing(config: &TracingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(config, env_directives.as_deref());

    match &config.log_directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = RollingFileAppender::new(Rotation::NEVER, dir, &config.log_file);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let subscriber = tracing_subscriber::fmt()
                .with_span_events(FmtSpan::CLOSE)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_env_filter(filter)
                .with_writer(non_blocking)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(Some(guard))
        }
        None => {
            let subscriber = tracing_subscriber::fmt()
                .compact()
                .with_target(true)
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(None)
        }
    }
}
