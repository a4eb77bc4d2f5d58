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

//! Caller-side handle for a pending call.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::{
    error::{WsApiError, WsApiResult},
    pending::CallOutcome,
};

/// Handle returned when a request is written, used to await its correlated response.
///
/// Abandoning a wait (deadline, cancellation or dropping the waiter) leaves the pending record
/// in place; it is removed later by whichever of response delivery or teardown happens first.
#[derive(Debug)]
pub struct Waiter {
    id: String,
    rx: oneshot::Receiver<CallOutcome>,
}

impl Waiter {
    pub(crate) const fn new(id: String, rx: oneshot::Receiver<CallOutcome>) -> Self {
        Self { id, rx }
    }

    /// Returns the correlation identifier of the awaited request.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Waits without a bound for the raw response frame.
    ///
    /// # Errors
    ///
    /// Returns the error delivered by teardown, or [`WsApiError::ConnectionClosed`] if the
    /// record was dropped without an outcome.
    pub async fn wait(self) -> WsApiResult<String> {
        Self::flatten(self.rx.await)
    }

    /// Waits for the raw response frame for at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`WsApiError::DeadlineExceeded`] when the timeout elapses first, otherwise as
    /// [`Waiter::wait`].
    pub async fn wait_timeout(self, timeout: Duration) -> WsApiResult<String> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(outcome) => Self::flatten(outcome),
            Err(_) => {
                tracing::debug!("Wait for {} exceeded {timeout:?}", self.id);
                Err(WsApiError::DeadlineExceeded(timeout))
            }
        }
    }

    /// Waits for the raw response frame until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`WsApiError::Cancelled`] when the token is cancelled first, otherwise as
    /// [`Waiter::wait`].
    pub async fn wait_cancellable(self, cancel: &CancellationToken) -> WsApiResult<String> {
        let Self { id, rx } = self;

        tokio::select! {
            biased;
            outcome = rx => Self::flatten(outcome),
            () = cancel.cancelled() => {
                tracing::debug!("Wait for {id} cancelled");
                Err(WsApiError::Cancelled)
            }
        }
    }

    fn flatten(outcome: Result<CallOutcome, oneshot::error::RecvError>) -> WsApiResult<String> {
        outcome.unwrap_or(Err(WsApiError::ConnectionClosed))
    }
}
