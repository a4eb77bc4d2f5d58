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

//! Property-based tests for the reconnect backoff.
//!
//! - Base delays never decrease and never exceed the ceiling
//! - Jitter stays within its bound
//! - Reset returns to the floor and re-arms immediate-first
//! - Out-of-range parameters are rejected

use std::time::Duration;

use proptest::prelude::*;
use rstest::rstest;
use wsapi_network::backoff::ExponentialBackoff;

fn backoff_params_strategy() -> impl Strategy<Value = (Duration, Duration, f64, u64, bool)> {
    (1u64..=5_000, 10u64..=60_000, 1.0f64..=10.0, 0u64..=1_000, any::<bool>())
        .prop_filter("max >= initial", |(initial_ms, max_ms, ..)| max_ms >= initial_ms)
        .prop_map(|(initial_ms, max_ms, factor, jitter_ms, immediate_first)| {
            (
                Duration::from_millis(initial_ms),
                Duration::from_millis(max_ms),
                factor,
                jitter_ms,
                immediate_first,
            )
        })
}

proptest! {
    #[rstest]
    fn base_delay_is_monotonic_and_capped(
        (initial, max, factor, jitter_ms, immediate_first) in backoff_params_strategy(),
        iterations in 1usize..=40,
    ) {
        let mut backoff =
            ExponentialBackoff::new(initial, max, factor, jitter_ms, immediate_first).unwrap();
        let mut previous = backoff.current_delay();

        for _ in 0..iterations {
            backoff.next_duration();
            let current = backoff.current_delay();

            prop_assert!(current >= previous, "{current:?} < {previous:?}");
            prop_assert!(current <= max, "{current:?} > {max:?}");
            previous = current;
        }
    }

    #[rstest]
    fn delay_is_base_plus_bounded_jitter(
        (initial, max, factor, jitter_ms, _) in backoff_params_strategy(),
        iterations in 1usize..=40,
    ) {
        let mut backoff = ExponentialBackoff::new(initial, max, factor, jitter_ms, false).unwrap();

        for _ in 0..iterations {
            let base = backoff.current_delay();
            let delay = backoff.next_duration();

            prop_assert!(delay >= base);
            prop_assert!(delay <= base + Duration::from_millis(jitter_ms));
        }
    }

    #[rstest]
    fn reset_returns_to_floor(
        (initial, max, factor, jitter_ms, immediate_first) in backoff_params_strategy(),
        advance in 1usize..=20,
    ) {
        let mut backoff =
            ExponentialBackoff::new(initial, max, factor, jitter_ms, immediate_first).unwrap();

        for _ in 0..advance {
            backoff.next_duration();
        }
        backoff.reset();

        prop_assert_eq!(backoff.current_delay(), initial);

        let first = backoff.next_duration();
        if immediate_first {
            prop_assert_eq!(first, Duration::ZERO);
        } else {
            prop_assert!(first >= initial);
            prop_assert!(first <= initial + Duration::from_millis(jitter_ms));
        }
    }

    #[rstest]
    fn reaches_ceiling_without_jitter(
        (initial, max, _, _, _) in backoff_params_strategy(),
        factor in 1.5f64..=10.0,
    ) {
        let mut backoff = ExponentialBackoff::new(initial, max, factor, 0, false).unwrap();
        let ratio = max.as_secs_f64() / initial.as_secs_f64();
        let needed = ratio.log(factor).ceil() as usize + 2;

        for _ in 0..needed {
            backoff.next_duration();
        }

        prop_assert_eq!(backoff.current_delay(), max);
        prop_assert_eq!(backoff.next_duration(), max);
    }

    #[rstest]
    fn factor_outside_range_rejected(
        initial_ms in 1u64..=1_000,
        max_ms in 1_000u64..=10_000,
        factor in prop_oneof![0.0f64..1.0, 100.001f64..1_000.0],
    ) {
        let result = ExponentialBackoff::new(
            Duration::from_millis(initial_ms),
            Duration::from_millis(max_ms),
            factor,
            0,
            false,
        );
        prop_assert!(result.is_err());
    }
}
