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

//! Wall-clock helpers for stamping signed requests.

use chrono::Utc;

/// Number of milliseconds in one second.
pub const MILLISECONDS_IN_SECOND: u64 = 1_000;

/// Returns the current UNIX epoch time in milliseconds.
#[must_use]
pub fn unix_millis_now() -> i64 {
    Utc::now().timestamp_millis()
}

/// Returns the current UNIX epoch time in milliseconds adjusted by a clock `offset_ms`.
///
/// The offset is the local clock's lead over the server clock, so it is subtracted.
#[must_use]
pub fn unix_millis_with_offset(offset_ms: i64) -> i64 {
    unix_millis_now().saturating_sub(offset_ms)
}
