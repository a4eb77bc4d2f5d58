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

//! Establishes duplex socket connections for the client.

use std::{fmt::Debug, pin::Pin};

use futures_util::{Sink, Stream, StreamExt, future::BoxFuture};
use http::HeaderName;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message, client::IntoClientRequest, http::HeaderValue},
};
use wsapi_cryptography::providers::install_cryptographic_provider;

use super::error::{WsApiError, WsApiResult};

/// Write half of an established connection.
pub type MessageWriter = Pin<Box<dyn Sink<Message, Error = tungstenite::Error> + Send>>;
/// Read half of an established connection.
pub type MessageReader = Pin<Box<dyn Stream<Item = Result<Message, tungstenite::Error>> + Send>>;

/// A freshly established connection, ready for immediate reads and writes.
pub struct WsConnection {
    pub writer: MessageWriter,
    pub reader: MessageReader,
}

impl WsConnection {
    #[must_use]
    pub fn new(writer: MessageWriter, reader: MessageReader) -> Self {
        Self { writer, reader }
    }
}

impl Debug for WsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(WsConnection))
            .field("writer", &"<sink>")
            .field("reader", &"<stream>")
            .finish()
    }
}

/// Factory for new connections to the remote endpoint.
///
/// Called once at construction and again for every reconnect attempt.
pub trait Connector: Send + Sync + Debug {
    /// Establishes one new connection.
    fn connect(&self) -> BoxFuture<'_, WsApiResult<WsConnection>>;
}

/// Connects with `tokio-tungstenite`, over TLS for `wss://` URLs.
#[derive(Clone, Debug)]
pub struct TungsteniteConnector {
    url: String,
    headers: Vec<(String, String)>,
}

impl TungsteniteConnector {
    #[must_use]
    pub fn new(url: impl Into<String>, headers: Vec<(String, String)>) -> Self {
        Self {
            url: url.into(),
            headers,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn connect_with_server(&self) -> Result<WsConnection, tungstenite::Error> {
        install_cryptographic_provider();

        let mut request = self.url.as_str().into_client_request()?;
        let req_headers = request.headers_mut();

        for (key, val) in &self.headers {
            let header_value = HeaderValue::from_str(val)?;
            let header_name: HeaderName = key.parse()?;
            req_headers.insert(header_name, header_value);
        }

        let (stream, _response) = connect_async(request).await?;
        let (writer, reader) = stream.split();

        Ok(WsConnection::new(Box::pin(writer), Box::pin(reader)))
    }
}

impl Connector for TungsteniteConnector {
    fn connect(&self) -> BoxFuture<'_, WsApiResult<WsConnection>> {
        Box::pin(async move {
            tracing::debug!("Connecting to {}", self.url);
            self.connect_with_server()
                .await
                .map_err(|e| WsApiError::ConnectError(format!("{}: {e}", self.url)))
        })
    }
}
