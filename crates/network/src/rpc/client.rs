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

//! Request/response client over a single persistent WebSocket API connection.
//!
//! **Key features**:
//! - Many concurrent in-flight requests correlated by identifier
//! - HMAC-SHA256 request signing with clock offset and optional `recvWindow`
//! - Transparent reconnection with exponential backoff
//! - Caller-driven deadlines and cancellation

use std::{
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration,
};

use futures_util::SinkExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use wsapi_core::{UUID4, time::unix_millis_with_offset};

use super::{
    config::WsApiClientConfig,
    connector::{Connector, TungsteniteConnector},
    error::{WsApiError, WsApiResult},
    messages::{Params, WsApiRequest, decode_response},
    supervisor::{self, ConnectionShared, ReconnectPolicy},
    waiter::Waiter,
};
use crate::{
    credential::{Credential, SIGNATURE_PARAM},
    mode::ConnectionMode,
};

const PARAM_API_KEY: &str = "apiKey";
const PARAM_TIMESTAMP: &str = "timestamp";
const PARAM_RECV_WINDOW: &str = "recvWindow";

const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Authenticated request/response client for a WebSocket API.
///
/// Connecting establishes the first socket (failing outright if that is impossible) and
/// spawns a read task and a supervisor task. After that, connection losses are repaired in
/// the background with unbounded retries until [`WsApiClient::disconnect`] is called or the
/// client is dropped.
pub struct WsApiClient {
    shared: ConnectionShared,
    credential: Option<Credential>,
    recv_window_ms: Option<u64>,
    time_offset_ms: AtomicI64,
    supervisor_task: tokio::task::JoinHandle<()>,
    read_task: tokio::task::JoinHandle<()>,
}

impl Debug for WsApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(WsApiClient))
            .field("credential", &self.credential)
            .field("recv_window_ms", &self.recv_window_ms)
            .field("time_offset_ms", &self.time_offset_ms())
            .field("connection_mode", &self.connection_mode())
            .field("pending", &self.pending_count())
            .field("reconnect_count", &self.reconnect_count())
            .finish_non_exhaustive()
    }
}

impl WsApiClient {
    /// Connects to `config.url` with the default `tokio-tungstenite` connector.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the first connection fails.
    pub async fn connect_url(config: WsApiClientConfig) -> WsApiResult<Self> {
        let connector = TungsteniteConnector::new(config.url.clone(), config.headers.clone());
        Self::connect(config, Arc::new(connector)).await
    }

    /// Connects using `connector` for the first and every subsequent connection.
    ///
    /// # Errors
    ///
    /// Returns [`WsApiError::Config`] if the configuration is invalid, or
    /// [`WsApiError::ConnectError`] if the first connection attempt fails. The first attempt
    /// is not retried.
    pub async fn connect(
        config: WsApiClientConfig,
        connector: Arc<dyn Connector>,
    ) -> WsApiResult<Self> {
        config.validate()?;

        let connect_timeout = config.connect_timeout();
        let connection = match tokio::time::timeout(connect_timeout, connector.connect()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(WsApiError::ConnectError(format!(
                    "Timed out after {}s connecting to {}",
                    connect_timeout.as_secs_f64(),
                    config.url
                )));
            }
        };
        tracing::debug!("Connected to {}", config.url);

        let policy = ReconnectPolicy {
            backoff: config.backoff()?,
            connect_timeout,
            fail_pending_on_disconnect: config.fail_pending_on_disconnect,
        };
        let tasks = supervisor::start(connection, connector, policy);

        Ok(Self {
            shared: tasks.shared,
            credential: config.credential(),
            recv_window_ms: config.recv_window_ms,
            time_offset_ms: AtomicI64::new(config.time_offset_ms),
            supervisor_task: tasks.supervisor_task,
            read_task: tasks.read_task,
        })
    }

    /// Writes a pre-serialized request and registers its pending call.
    ///
    /// Registration and the write happen under the connection lock, so the request is never
    /// written to a connection that is being replaced. A failed write removes the
    /// registration again and asks the supervisor to reconnect. Dropping the returned future
    /// before the write completes also removes the registration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The client is disconnected ([`WsApiError::ConnectionClosed`]).
    /// - `id` is already pending ([`WsApiError::DuplicateIdentifier`]); nothing is written.
    /// - The socket write fails ([`WsApiError::WriteFailure`]).
    pub async fn write(&self, id: &str, payload: String) -> WsApiResult<Waiter> {
        let mut connection = self.shared.connection.lock().await;

        if self.connection_mode().is_terminal() {
            return Err(WsApiError::ConnectionClosed);
        }

        // Rolled back on drop unless the write completes
        let (waiter, registration) = self.shared.pending.register_guarded(id)?;
        let epoch = connection.epoch;

        let Some(writer) = connection.writer.as_mut() else {
            return Err(WsApiError::WriteFailure("No connection installed".to_string()));
        };

        tracing::trace!("Sending text: {payload}");

        match writer.send(Message::text(payload)).await {
            Ok(()) => {
                registration.commit();
                Ok(waiter)
            }
            Err(e) => {
                tracing::warn!("Write for {id} failed on connection epoch {epoch}: {e}");
                drop(registration);
                self.shared.signal_reconnect(epoch);
                Err(WsApiError::WriteFailure(e.to_string()))
            }
        }
    }

    /// Serializes and writes `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails, otherwise as [`WsApiClient::write`].
    pub async fn send_request(&self, request: &WsApiRequest) -> WsApiResult<Waiter> {
        let payload = serde_json::to_string(request)?;
        self.write(&request.id, payload).await
    }

    /// Sends `method` under a fresh identifier, signing `params` if a credential is configured.
    ///
    /// # Errors
    ///
    /// As [`WsApiClient::send_with_id`].
    pub async fn send(&self, method: &str, params: Params) -> WsApiResult<Waiter> {
        self.send_with_id(&UUID4::new().to_string(), method, params).await
    }

    /// Sends `method` under the caller-chosen `id`, signing `params` if a credential is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns an error if signing or serialization fails, otherwise as
    /// [`WsApiClient::write`].
    pub async fn send_with_id(
        &self,
        id: &str,
        method: &str,
        params: Params,
    ) -> WsApiResult<Waiter> {
        let params = if self.credential.is_some() {
            self.sign_params(params)?
        } else {
            params
        };
        self.send_request(&WsApiRequest::new(id, method, params)).await
    }

    /// Sends `method` under a fresh identifier without authentication fields.
    ///
    /// # Errors
    ///
    /// As [`WsApiClient::write`].
    pub async fn send_unsigned(&self, method: &str, params: Params) -> WsApiResult<Waiter> {
        let request = WsApiRequest::new(UUID4::new().to_string(), method, params);
        self.send_request(&request).await
    }

    /// Sends `method` and waits at most `timeout` for its decoded result.
    ///
    /// # Errors
    ///
    /// Returns [`WsApiError::RemoteError`] if the endpoint rejects the request,
    /// [`WsApiError::DeadlineExceeded`] if the timeout elapses, or any transport error.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Params,
        timeout: Duration,
    ) -> WsApiResult<T> {
        let waiter = self.send(method, params).await?;
        let payload = waiter.wait_timeout(timeout).await?;
        decode_response(&payload)
    }

    /// Sends `method` and waits for its decoded result until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`WsApiError::RemoteError`] if the endpoint rejects the request,
    /// [`WsApiError::Cancelled`] if the token fires first, or any transport error.
    pub async fn call_cancellable<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Params,
        cancel: &CancellationToken,
    ) -> WsApiResult<T> {
        let waiter = self.send(method, params).await?;
        let payload = waiter.wait_cancellable(cancel).await?;
        decode_response(&payload)
    }

    /// Adds `apiKey`, `timestamp`, `recvWindow` (when configured) and `signature` to `params`.
    ///
    /// Null-valued entries are removed first. The signature covers every other parameter, so
    /// the set returned is exactly the set that must be transmitted.
    ///
    /// # Errors
    ///
    /// Returns [`WsApiError::Config`] if no credential is configured, or
    /// [`WsApiError::Signing`] if signing fails.
    pub fn sign_params(&self, mut params: Params) -> WsApiResult<Params> {
        let credential = self
            .credential
            .as_ref()
            .ok_or_else(|| WsApiError::Config("No API credential configured".to_string()))?;

        params.retain(|_, value| !value.is_null());
        params.insert(PARAM_API_KEY.to_string(), Value::from(credential.api_key()));
        params.insert(
            PARAM_TIMESTAMP.to_string(),
            Value::from(unix_millis_with_offset(self.time_offset_ms())),
        );
        if let Some(recv_window) = self.recv_window_ms {
            params
                .entry(PARAM_RECV_WINDOW.to_string())
                .or_insert_with(|| Value::from(recv_window));
        }
        params.remove(SIGNATURE_PARAM);

        let signature = credential
            .sign_params(&params)
            .map_err(|e| WsApiError::Signing(e.to_string()))?;
        params.insert(SIGNATURE_PARAM.to_string(), Value::from(signature));

        Ok(params)
    }

    /// Sets the clock offset (milliseconds) subtracted from local time in `timestamp`.
    pub fn set_time_offset_ms(&self, offset_ms: i64) {
        self.time_offset_ms.store(offset_ms, Ordering::Relaxed);
    }

    #[must_use]
    pub fn time_offset_ms(&self) -> i64 {
        self.time_offset_ms.load(Ordering::Relaxed)
    }

    /// Returns the number of connection attempts made by the supervisor.
    #[must_use]
    pub fn reconnect_count(&self) -> u64 {
        self.shared.reconnect_count.load(Ordering::SeqCst)
    }

    /// Returns the number of calls awaiting a response.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.pending.len()
    }

    /// Returns true if a call with `id` is awaiting a response.
    #[must_use]
    pub fn is_pending(&self, id: &str) -> bool {
        self.shared.pending.contains(id)
    }

    #[must_use]
    pub fn connection_mode(&self) -> ConnectionMode {
        self.shared.connection_mode()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.connection_mode().is_active()
    }

    #[must_use]
    pub fn is_reconnecting(&self) -> bool {
        self.connection_mode().is_reconnect()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.connection_mode().is_closed()
    }

    /// Shuts the client down.
    ///
    /// Stops reconnecting, fails every pending call with [`WsApiError::ConnectionClosed`],
    /// closes the socket and ends in [`ConnectionMode::Closed`]. Later sends fail with
    /// [`WsApiError::ConnectionClosed`].
    pub async fn disconnect(&self) {
        if self.connection_mode().is_terminal() {
            return;
        }

        tracing::debug!("Disconnecting");
        ConnectionMode::Disconnect.store(&self.shared.mode);
        self.shared.cancel.cancel();

        // Acquired once any in-progress write or reconnect has released the connection
        let mut connection = self.shared.connection.lock().await;

        let failed = self.shared.pending.fail_all(&WsApiError::ConnectionClosed);
        if failed > 0 {
            tracing::debug!("Failed {failed} pending call(s) on disconnect");
        }

        if let Some(mut writer) = connection.writer.take() {
            match tokio::time::timeout(CLOSE_TIMEOUT, writer.close()).await {
                Ok(Ok(())) => tracing::debug!("Sent close message"),
                Ok(Err(e)) => tracing::debug!("Error closing connection: {e}"),
                Err(_) => tracing::warn!("Timed out closing connection"),
            }
        }
        drop(connection);

        if tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
            while !(self.supervisor_task.is_finished() && self.read_task.is_finished()) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .is_err()
        {
            tracing::error!("Shutdown timed out after {}s", SHUTDOWN_TIMEOUT.as_secs());
            self.supervisor_task.abort();
            self.read_task.abort();
        }

        ConnectionMode::Closed.store(&self.shared.mode);
        tracing::debug!("Closed");
    }
}

impl Drop for WsApiClient {
    fn drop(&mut self) {
        self.shared.cancel.cancel();

        if !self.supervisor_task.is_finished() {
            self.supervisor_task.abort();
            tracing::debug!("Aborted task 'supervisor'");
        }

        if !self.read_task.is_finished() {
            self.read_task.abort();
            tracing::debug!("Aborted task 'read'");
        }
    }
}
