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

use tracing::{info, warn};
use worker_respondent::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RespondentConfig::load();
    let _guard = init_tracing(&config.tracing)?;

    let settings = RespondentSettings::from_config(&config);
    info!(
        "Starting respondent for worker {} (pid {})",
        settings.identity.name(),
        settings.identity.pid()
    );

    let bus = MessageBus::new(
        (UnixSocketChannel::new(), config.health_channel()),
        (UnixSocketChannel::new(), config.termination_channel()),
        &settings,
    );
    let handle = bus.start();

    tokio::select! {
        terminated = handle.wait_for_termination() => {
            if terminated {
                info!("Termination requested by surveyor");
            } else {
                warn!("Termination channel gave up before a shutdown command arrived");
            }
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Interrupted, shutting down");
            handle.abort_termination();
        }
    }

    handle.abort_health();
    let exit = handle.join().await;
    info!("Respondent stopped: {:?}", exit);
    Ok(())
}
