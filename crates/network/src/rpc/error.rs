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

//! Error types produced by the WebSocket API client.

use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// A typed error enumeration for the WebSocket API client.
///
/// The type is [`Clone`] so a single teardown error can be delivered to every pending call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WsApiError {
    /// The request identifier is already pending on this client; nothing was written.
    #[error("Request id already pending: {0}")]
    DuplicateIdentifier(String),
    /// Writing the request to the socket failed; no pending record was kept.
    #[error("Write failure: {0}")]
    WriteFailure(String),
    /// The connection was torn down before a correlated response arrived.
    #[error("Connection closed")]
    ConnectionClosed,
    /// The caller cancelled the wait.
    #[error("Cancelled")]
    Cancelled,
    /// The caller's deadline elapsed before a response arrived.
    #[error("Deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),
    /// A response frame could not be decoded.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// The remote endpoint answered with a structured error instead of a result.
    #[error("Remote error (status {status}) {code}: {message}")]
    RemoteError {
        status: u16,
        code: i64,
        message: String,
    },
    /// The connector failed to establish a socket.
    #[error("Connect error: {0}")]
    ConnectError(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Signing error: {0}")]
    Signing(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WsApiError {
    /// Returns true if the error was reported by the remote endpoint.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteError { .. })
    }

    /// Returns true if the error ended a wait without a response being observed.
    #[must_use]
    pub const fn is_abandoned(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed | Self::Cancelled | Self::DeadlineExceeded(_)
        )
    }
}

impl From<serde_json::Error> for WsApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<tungstenite::Error> for WsApiError {
    fn from(error: tungstenite::Error) -> Self {
        Self::ConnectError(error.to_string())
    }
}

/// Result alias for WebSocket API client operations.
pub type WsApiResult<T> = Result<T, WsApiError>;
