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

//! Property-based tests for pending-call correlation.

use proptest::{prelude::*, sample::subsequence};
use rstest::rstest;
use wsapi_network::rpc::{PendingRegistry, WsApiError};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn response(id: &str) -> String {
    format!(r#"{{"id":"{id}","status":200,"result":{{"echo":"{id}"}}}}"#)
}

proptest! {
    /// Responses delivered in any order reach exactly the caller with the matching id.
    #[rstest]
    fn responses_correlate_in_any_order(
        order in (1usize..=32).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle()),
    ) {
        let registry = PendingRegistry::new();
        let n = order.len();
        let waiters: Vec<_> = (0..n)
            .map(|i| registry.register(&format!("req-{i}")).unwrap())
            .collect();

        for i in &order {
            let id = format!("req-{i}");
            prop_assert!(registry.resolve(&id, response(&id)));
        }
        prop_assert!(registry.is_empty());

        let rt = runtime();
        for waiter in waiters {
            let id = waiter.id().to_string();
            let payload = rt.block_on(waiter.wait()).unwrap();
            prop_assert_eq!(payload, response(&id));
        }
    }

    /// A repeated identifier is rejected while the first is pending, and accepted again after.
    #[rstest]
    fn duplicate_ids_rejected_while_pending(
        ids in prop::collection::vec("[a-z]{1,3}", 1..64),
    ) {
        let registry = PendingRegistry::new();
        let mut accepted = std::collections::HashSet::new();
        let mut waiters = Vec::new();

        for id in &ids {
            match registry.register(id) {
                Ok(waiter) => {
                    prop_assert!(accepted.insert(id.clone()));
                    waiters.push(waiter);
                }
                Err(e) => {
                    prop_assert!(accepted.contains(id));
                    prop_assert_eq!(e, WsApiError::DuplicateIdentifier(id.clone()));
                }
            }
        }
        prop_assert_eq!(registry.len(), accepted.len());

        for id in &accepted {
            prop_assert!(registry.resolve(id, response(id)));
            prop_assert!(registry.register(id).is_ok());
        }
    }

    /// Each call observes exactly one outcome: resolved calls keep their response and the
    /// rest receive the teardown error.
    #[rstest]
    fn teardown_fails_only_unresolved_calls(
        (n, resolved) in (1usize..=32).prop_flat_map(|n| {
            (Just(n), subsequence((0..n).collect::<Vec<_>>(), 0..=n))
        }),
    ) {
        let registry = PendingRegistry::new();
        let waiters: Vec<_> = (0..n)
            .map(|i| registry.register(&format!("req-{i}")).unwrap())
            .collect();

        for i in &resolved {
            registry.resolve(&format!("req-{i}"), response(&format!("req-{i}")));
        }
        let failed = registry.fail_all(&WsApiError::ConnectionClosed);

        prop_assert_eq!(failed, n - resolved.len());
        prop_assert!(registry.is_empty());

        let rt = runtime();
        for (i, waiter) in waiters.into_iter().enumerate() {
            let outcome = rt.block_on(waiter.wait());
            if resolved.contains(&i) {
                prop_assert_eq!(outcome.unwrap(), response(&format!("req-{i}")));
            } else {
                prop_assert_eq!(outcome, Err(WsApiError::ConnectionClosed));
            }
        }
    }
}
