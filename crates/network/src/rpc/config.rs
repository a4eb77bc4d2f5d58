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

//! Configuration for [`WsApiClient`](super::WsApiClient) connections.

use std::{fmt::Debug, time::Duration};

use serde::Deserialize;
use wsapi_core::env::get_or_env_var_opt;

use super::error::{WsApiError, WsApiResult};
use crate::{backoff::ExponentialBackoff, credential::Credential};

/// Binance USDⓈ-M futures WebSocket API endpoint.
pub const DEFAULT_WS_API_URL: &str = "wss://ws-fapi.binance.com/ws-fapi/v1";
/// Environment variable consulted for the API key.
pub const ENV_API_KEY: &str = "WSAPI_API_KEY";
/// Environment variable consulted for the API secret.
pub const ENV_API_SECRET: &str = "WSAPI_API_SECRET";

/// Configuration for a WebSocket API client.
///
/// Every field has a default, so a partial TOML or JSON document deserializes into a
/// complete configuration. Call [`WsApiClientConfig::validate`] before connecting;
/// [`WsApiClient::connect`](super::WsApiClient::connect) does so itself.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WsApiClientConfig {
    /// The URL to connect to.
    pub url: String,
    /// Extra headers sent with the opening handshake.
    pub headers: Vec<(String, String)>,
    /// The API key added to signed requests.
    pub api_key: Option<String>,
    /// The API secret used to sign requests.
    pub api_secret: Option<String>,
    /// Milliseconds subtracted from local time when stamping `timestamp`.
    pub time_offset_ms: i64,
    /// Optional `recvWindow` added to signed requests.
    pub recv_window_ms: Option<u64>,
    /// The initial reconnect delay (milliseconds).
    pub reconnect_delay_initial_ms: u64,
    /// The maximum reconnect delay (milliseconds).
    pub reconnect_delay_max_ms: u64,
    /// The exponential backoff factor for reconnect delays.
    pub reconnect_backoff_factor: f64,
    /// The maximum jitter (milliseconds) added to reconnect delays.
    pub reconnect_jitter_ms: u64,
    /// Whether the first reconnect attempt after a drop runs without delay.
    pub reconnect_immediate: bool,
    /// The bound (milliseconds) on a single connection attempt.
    pub connect_timeout_ms: u64,
    /// Whether pending calls fail with `ConnectionClosed` when the connection drops.
    ///
    /// When false, calls outstanding at the drop stay pending and rely on the caller's
    /// own deadline or cancellation.
    pub fail_pending_on_disconnect: bool,
}

impl Default for WsApiClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_API_URL.to_string(),
            headers: Vec::new(),
            api_key: None,
            api_secret: None,
            time_offset_ms: 0,
            recv_window_ms: None,
            reconnect_delay_initial_ms: 100,
            reconnect_delay_max_ms: 10_000,
            reconnect_backoff_factor: 1.8,
            reconnect_jitter_ms: 0,
            reconnect_immediate: false,
            connect_timeout_ms: 10_000,
            fail_pending_on_disconnect: true,
        }
    }
}

impl Debug for WsApiClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(WsApiClientConfig))
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<redacted>"))
            .field("time_offset_ms", &self.time_offset_ms)
            .field("recv_window_ms", &self.recv_window_ms)
            .field(
                "reconnect_delay_initial_ms",
                &self.reconnect_delay_initial_ms,
            )
            .field("reconnect_delay_max_ms", &self.reconnect_delay_max_ms)
            .field("reconnect_backoff_factor", &self.reconnect_backoff_factor)
            .field("reconnect_jitter_ms", &self.reconnect_jitter_ms)
            .field("reconnect_immediate", &self.reconnect_immediate)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field(
                "fail_pending_on_disconnect",
                &self.fail_pending_on_disconnect,
            )
            .finish()
    }
}

impl WsApiClientConfig {
    /// Creates a default configuration targeting `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the API credential.
    #[must_use]
    pub fn with_credentials(
        mut self,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        self.api_key = Some(api_key.into());
        self.api_secret = Some(api_secret.into());
        self
    }

    /// Fills missing credentials from `WSAPI_API_KEY` and `WSAPI_API_SECRET`.
    #[must_use]
    pub fn with_env_credentials(mut self) -> Self {
        self.api_key = get_or_env_var_opt(self.api_key.take(), ENV_API_KEY);
        self.api_secret = get_or_env_var_opt(self.api_secret.take(), ENV_API_SECRET);
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WsApiError::Config`] if:
    /// - `url` is not a `ws://` or `wss://` URL.
    /// - Only one of `api_key` and `api_secret` is set.
    /// - The reconnect parameters do not form a valid backoff.
    /// - `connect_timeout_ms` is zero.
    pub fn validate(&self) -> WsApiResult<()> {
        let uri: http::Uri = self
            .url
            .parse()
            .map_err(|e| WsApiError::Config(format!("Invalid url '{}': {e}", self.url)))?;

        match uri.scheme_str() {
            Some("ws" | "wss") => {}
            other => {
                return Err(WsApiError::Config(format!(
                    "Invalid url scheme {other:?}, expected 'ws' or 'wss'"
                )));
            }
        }

        if self.api_key.is_some() != self.api_secret.is_some() {
            return Err(WsApiError::Config(
                "Both `api_key` and `api_secret` must be provided together".to_string(),
            ));
        }

        if self.connect_timeout_ms == 0 {
            return Err(WsApiError::Config(
                "`connect_timeout_ms` must be positive".to_string(),
            ));
        }

        self.backoff().map(|_| ())
    }

    /// Returns the credential if one is configured.
    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) => Some(Credential::new(key.clone(), secret.clone())),
            _ => None,
        }
    }

    /// Builds the reconnect backoff described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WsApiError::Config`] if the reconnect parameters are invalid.
    pub fn backoff(&self) -> WsApiResult<ExponentialBackoff> {
        ExponentialBackoff::new(
            Duration::from_millis(self.reconnect_delay_initial_ms),
            Duration::from_millis(self.reconnect_delay_max_ms),
            self.reconnect_backoff_factor,
            self.reconnect_jitter_ms,
            self.reconnect_immediate,
        )
        .map_err(|e| WsApiError::Config(e.to_string()))
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
