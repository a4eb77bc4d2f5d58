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

//! Network machinery for authenticated WebSocket API clients.
//!
//! The `wsapi-network` crate multiplexes many concurrent requests over one persistent
//! WebSocket connection, correlating responses by request identifier and recovering the
//! connection after failures:
//!
//! - [`backoff`]: exponential reconnect delays with optional jitter.
//! - [`mode`]: the connection lifecycle state.
//! - [`credential`]: API credentials and canonical parameter signing.
//! - [`rpc`]: the pending-call registry, the connection supervisor and the client.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod backoff;
pub mod credential;
pub mod mode;
pub mod rpc;
