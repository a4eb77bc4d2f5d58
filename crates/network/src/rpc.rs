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

//! Authenticated request/response client over a persistent WebSocket API connection.
//!
//! - [`PendingRegistry`] maps request identifiers to waiting callers.
//! - [`Waiter`] is the caller's handle, with deadline and cancellation support.
//! - The connection supervisor reads responses and replaces failed connections.
//! - [`WsApiClient`] assigns identifiers, signs, writes and decodes.

pub mod client;
pub mod config;
pub mod connector;
pub mod error;
pub mod messages;
pub mod pending;
pub mod waiter;

mod supervisor;

// Re-exports
pub use self::{
    client::WsApiClient,
    config::WsApiClientConfig,
    connector::{Connector, TungsteniteConnector, WsConnection},
    error::{WsApiError, WsApiResult},
    messages::{Params, WsApiRequest, WsApiResponse},
    pending::PendingRegistry,
    waiter::Waiter,
};
