// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Tracing initialization for binaries and tests.

use std::env;

use tracing_subscriber::EnvFilter;

/// Initialize tracing.
///
/// Tracing is configured to filter modules and write up to a specific level by passing
/// a configuration using the `RUST_LOG` environment variable, e.g.
/// `RUST_LOG=wsapi_network=debug`. When `RUST_LOG` is not set this is a no-op.
///
/// Should only be called once during an application's run, ideally at the beginning.
///
/// # Errors
///
/// Returns an error if a global tracing subscriber has already been installed.
pub fn init_tracing() -> anyhow::Result<()> {
    if let Ok(v) = env::var("RUST_LOG") {
        let env_filter = EnvFilter::new(v.clone());

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))?;

        tracing::debug!("Initialized tracing logs with RUST_LOG={v}");
    }
    Ok(())
}
