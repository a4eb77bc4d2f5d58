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

//! Exponential backoff for reconnect scheduling.
//!
//! Each failed connection attempt is followed by a sleep of [`ExponentialBackoff::next_duration`].
//! The base delay starts at a floor, grows by a constant factor per call and is capped at a
//! ceiling. Optional jitter spreads reconnect attempts from many clients apart, and the
//! immediate-first flag lets the first attempt after a drop run without any delay.

use std::time::Duration;

use rand::Rng;

/// Smallest accepted growth factor; below this the delay would shrink between attempts.
pub const BACKOFF_FACTOR_MIN: f64 = 1.0;
/// Largest accepted growth factor.
pub const BACKOFF_FACTOR_MAX: f64 = 100.0;
/// Largest accepted random jitter in milliseconds.
pub const BACKOFF_JITTER_MAX_MS: u64 = 60_000;

/// Reconnect delay cursor with a floor, a ceiling and a multiplicative growth factor.
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    delay_initial: Duration,
    delay_max: Duration,
    delay_current: Duration,
    factor: f64,
    jitter_ms: u64,
    immediate_first: bool,
    immediate_pending: bool,
}

impl ExponentialBackoff {
    /// Creates a new [`ExponentialBackoff`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `factor` is not finite or outside `[1.0, 100.0]`.
    /// - `delay_max` is less than `delay_initial`.
    /// - `jitter_ms` exceeds [`BACKOFF_JITTER_MAX_MS`].
    pub fn new(
        delay_initial: Duration,
        delay_max: Duration,
        factor: f64,
        jitter_ms: u64,
        immediate_first: bool,
    ) -> anyhow::Result<Self> {
        if !factor.is_finite() || !(BACKOFF_FACTOR_MIN..=BACKOFF_FACTOR_MAX).contains(&factor) {
            anyhow::bail!(
                "Invalid backoff factor {factor}, expected a value in [{BACKOFF_FACTOR_MIN}, {BACKOFF_FACTOR_MAX}]"
            );
        }
        if delay_max < delay_initial {
            anyhow::bail!(
                "Invalid backoff delays, max {delay_max:?} is less than initial {delay_initial:?}"
            );
        }
        if jitter_ms > BACKOFF_JITTER_MAX_MS {
            anyhow::bail!(
                "Invalid backoff jitter {jitter_ms}ms, expected at most {BACKOFF_JITTER_MAX_MS}ms"
            );
        }

        Ok(Self {
            delay_initial,
            delay_max,
            delay_current: delay_initial,
            factor,
            jitter_ms,
            immediate_first,
            immediate_pending: immediate_first,
        })
    }

    /// Returns the delay to sleep before the next attempt and advances the cursor.
    ///
    /// With immediate-first enabled the first call after construction or [`Self::reset`]
    /// returns [`Duration::ZERO`] without advancing.
    pub fn next_duration(&mut self) -> Duration {
        if self.immediate_pending {
            self.immediate_pending = false;
            return Duration::ZERO;
        }

        let jitter = if self.jitter_ms > 0 {
            rand::rng().random_range(0..=self.jitter_ms)
        } else {
            0
        };
        let delay = self.delay_current + Duration::from_millis(jitter);

        let max_nanos = self.delay_max.as_nanos() as f64;
        let next_nanos = (self.delay_current.as_nanos() as f64 * self.factor).min(max_nanos);
        self.delay_current = Duration::from_nanos(next_nanos as u64);

        delay
    }

    /// Resets the cursor to its floor, re-arming immediate-first if it was configured.
    pub const fn reset(&mut self) {
        self.delay_current = self.delay_initial;
        self.immediate_pending = self.immediate_first;
    }

    /// Returns the base delay (without jitter) the next call to [`Self::next_duration`] uses.
    #[must_use]
    pub const fn current_delay(&self) -> Duration {
        self.delay_current
    }

    /// Returns the configured ceiling.
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        self.delay_max
    }
}
