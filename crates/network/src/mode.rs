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

//! Connection lifecycle state shared between the client and its background tasks.

use std::sync::atomic::{AtomicU8, Ordering};

use strum::{AsRefStr, Display, EnumString};

/// Connection mode of a [`WsApiClient`](crate::rpc::WsApiClient).
///
/// Stored in an [`AtomicU8`] so the read loop, the supervisor and callers can query it
/// without taking the connection lock.
#[derive(Clone, Copy, Debug, Default, Display, Hash, PartialEq, Eq, AsRefStr, EnumString)]
#[repr(u8)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ConnectionMode {
    /// A socket is installed and the read loop is consuming it.
    #[default]
    Active = 0,
    /// The socket failed; the supervisor is establishing a replacement.
    Reconnect = 1,
    /// The owner requested shutdown; no further reconnects are attempted.
    Disconnect = 2,
    /// Shutdown completed; the client accepts no more requests.
    Closed = 3,
}

impl ConnectionMode {
    /// Converts a raw value loaded from an `AtomicU8`.
    ///
    /// # Panics
    ///
    /// Panics if `value` was not produced by [`ConnectionMode::as_u8`].
    #[inline]
    #[must_use]
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Active,
            1 => Self::Reconnect,
            2 => Self::Disconnect,
            3 => Self::Closed,
            _ => panic!("Invalid `ConnectionMode` value: {value}"),
        }
    }

    /// Loads the current mode from `value`.
    #[inline]
    #[must_use]
    pub fn from_atomic(value: &AtomicU8) -> Self {
        Self::from_u8(value.load(Ordering::SeqCst))
    }

    /// Stores this mode into `value`.
    #[inline]
    pub fn store(self, value: &AtomicU8) {
        value.store(self.as_u8(), Ordering::SeqCst);
    }

    /// Stores `next` into `value` only if it currently holds `current`.
    ///
    /// Returns false, leaving `value` unchanged, if another mode was stored in between.
    #[inline]
    pub fn transition(value: &AtomicU8, current: Self, next: Self) -> bool {
        value
            .compare_exchange(
                current.as_u8(),
                next.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    #[inline]
    #[must_use]
    pub const fn is_reconnect(&self) -> bool {
        matches!(self, Self::Reconnect)
    }

    #[inline]
    #[must_use]
    pub const fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnect)
    }

    #[inline]
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns true once shutdown has been requested or completed.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnect | Self::Closed)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ConnectionMode::Active, "ACTIVE")]
    #[case(ConnectionMode::Reconnect, "RECONNECT")]
    #[case(ConnectionMode::Disconnect, "DISCONNECT")]
    #[case(ConnectionMode::Closed, "CLOSED")]
    fn test_atomic_and_string_conversions(#[case] mode: ConnectionMode, #[case] name: &str) {
        let atomic = AtomicU8::new(ConnectionMode::default().as_u8());
        mode.store(&atomic);

        assert_eq!(ConnectionMode::from_atomic(&atomic), mode);
        assert_eq!(mode.to_string(), name);
        assert_eq!(ConnectionMode::from_str(name).unwrap(), mode);
    }

    #[rstest]
    fn test_transition_only_from_expected_mode() {
        let atomic = AtomicU8::new(ConnectionMode::Reconnect.as_u8());
        assert!(ConnectionMode::transition(
            &atomic,
            ConnectionMode::Reconnect,
            ConnectionMode::Active
        ));
        assert_eq!(ConnectionMode::from_atomic(&atomic), ConnectionMode::Active);

        ConnectionMode::Disconnect.store(&atomic);
        assert!(!ConnectionMode::transition(
            &atomic,
            ConnectionMode::Reconnect,
            ConnectionMode::Active
        ));
        assert_eq!(ConnectionMode::from_atomic(&atomic), ConnectionMode::Disconnect);
    }

    #[rstest]
    fn test_terminal_modes() {
        assert!(!ConnectionMode::Active.is_terminal());
        assert!(!ConnectionMode::Reconnect.is_terminal());
        assert!(ConnectionMode::Disconnect.is_terminal());
        assert!(ConnectionMode::Closed.is_terminal());
    }

    #[rstest]
    #[should_panic(expected = "Invalid `ConnectionMode` value: 9")]
    fn test_from_u8_invalid() {
        let _ = ConnectionMode::from_u8(9);
    }
}
