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

//! Registry of in-flight requests keyed by correlation identifier.

use std::sync::Arc;

use ahash::RandomState;
use dashmap::{DashMap, mapref::entry::Entry};
use tokio::sync::oneshot;

use super::{
    error::{WsApiError, WsApiResult},
    waiter::Waiter,
};

/// Terminal outcome of a pending call: the raw response frame or the error which ended it.
pub type CallOutcome = WsApiResult<String>;

pub(crate) type CallSender = oneshot::Sender<CallOutcome>;

/// Concurrency-safe mapping from request identifier to the completion channel of its caller.
///
/// Each record receives exactly one terminal outcome: removal from the map and delivery happen
/// together, so whichever of [`PendingRegistry::resolve`], [`PendingRegistry::fail`] or
/// [`PendingRegistry::fail_all`] removes the record first is the only one to deliver.
///
/// Cloning is cheap and yields a handle to the same registry.
#[derive(Clone, Debug, Default)]
pub struct PendingRegistry {
    calls: Arc<DashMap<String, CallSender, RandomState>>,
}

impl PendingRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pending call for `id` and returns the caller's [`Waiter`].
    ///
    /// # Errors
    ///
    /// Returns [`WsApiError::DuplicateIdentifier`] if `id` is already pending, leaving the
    /// existing record untouched.
    pub fn register(&self, id: &str) -> WsApiResult<Waiter> {
        match self.calls.entry(id.to_string()) {
            Entry::Occupied(_) => Err(WsApiError::DuplicateIdentifier(id.to_string())),
            Entry::Vacant(entry) => {
                let (tx, rx) = oneshot::channel();
                entry.insert(tx);
                Ok(Waiter::new(id.to_string(), rx))
            }
        }
    }

    /// Registers `id` like [`PendingRegistry::register`], returning a guard which removes the
    /// record again when dropped unless it is committed.
    ///
    /// Used around a socket write: the record only survives once the write completes, even
    /// if the writing future is dropped part way.
    pub(crate) fn register_guarded(&self, id: &str) -> WsApiResult<(Waiter, Registration<'_>)> {
        let waiter = self.register(id)?;
        let registration = Registration {
            registry: self,
            id: Some(id.to_string()),
        };
        Ok((waiter, registration))
    }

    /// Returns true if a call with `id` is still awaiting its outcome.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.calls.contains_key(id)
    }

    /// Delivers `payload` to the call registered under `id` and removes it.
    ///
    /// Returns false when no such call is pending, e.g. an unsolicited frame or a response
    /// arriving after the registry was failed.
    pub fn resolve(&self, id: &str, payload: String) -> bool {
        self.complete(id, Ok(payload))
    }

    /// Delivers `error` to the call registered under `id` and removes it.
    pub fn fail(&self, id: &str, error: WsApiError) -> bool {
        self.complete(id, Err(error))
    }

    /// Removes the record for `id` without delivering anything.
    ///
    /// The waiter then observes [`WsApiError::ConnectionClosed`]. Used to roll back a
    /// registration whose request never reached the wire.
    pub fn remove(&self, id: &str) -> bool {
        self.calls.remove(id).is_some()
    }

    /// Delivers `error` to every pending call and clears the registry.
    ///
    /// Returns the number of calls failed.
    pub fn fail_all(&self, error: &WsApiError) -> usize {
        let ids: Vec<String> = self.calls.iter().map(|entry| entry.key().clone()).collect();

        ids.into_iter()
            .filter(|id| self.complete(id, Err(error.clone())))
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    fn complete(&self, id: &str, outcome: CallOutcome) -> bool {
        match self.calls.remove(id) {
            Some((_, tx)) => {
                // The caller may have stopped waiting; the record is cleaned up regardless
                if tx.send(outcome).is_err() {
                    tracing::trace!("Waiter for {id} already dropped");
                }
                true
            }
            None => false,
        }
    }
}

/// Rolls back an uncommitted registration on drop.
#[derive(Debug)]
pub(crate) struct Registration<'a> {
    registry: &'a PendingRegistry,
    id: Option<String>,
}

impl Registration<'_> {
    /// Keeps the record registered.
    pub(crate) fn commit(mut self) {
        self.id = None;
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take()
            && self.registry.remove(&id)
        {
            tracing::debug!("Rolled back registration for {id}");
        }
    }
}
