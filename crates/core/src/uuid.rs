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

//! Random version 4 UUIDs used as request correlation identifiers.

use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Represents a pseudo-random UUID (universally unique identifier) version 4.
///
/// Rendered in the canonical lowercase hyphenated form, e.g.
/// `2d89666b-1a1e-4a75-b193-4eb3b454c757`.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct UUID4 {
    value: Uuid,
}

impl UUID4 {
    /// Creates a new random [`UUID4`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: Uuid::new_v4(),
        }
    }

    /// Returns the underlying [`Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.value
    }
}

impl Default for UUID4 {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for UUID4 {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value =
            Uuid::parse_str(s).map_err(|e| anyhow::anyhow!("invalid UUID string '{s}': {e}"))?;
        if value.get_version_num() != 4 {
            anyhow::bail!("UUID '{s}' is not version 4");
        }
        Ok(Self { value })
    }
}

impl Debug for UUID4 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}('{}')", stringify!(UUID4), self.value)
    }
}

impl Display for UUID4 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value.hyphenated())
    }
}

impl Serialize for UUID4 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UUID4 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: String = Deserialize::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_new_is_version_4() {
        let uuid = UUID4::new();
        assert_eq!(uuid.as_uuid().get_version_num(), 4);
        assert_eq!(uuid.to_string().len(), 36);
    }

    #[rstest]
    fn test_new_values_are_unique() {
        let ids: HashSet<UUID4> = (0..1_000).map(|_| UUID4::new()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[rstest]
    fn test_from_str_round_trip() {
        let value = "2d89666b-1a1e-4a75-b193-4eb3b454c757";
        let uuid = UUID4::from_str(value).unwrap();
        assert_eq!(uuid.to_string(), value);
        assert_eq!(format!("{uuid:?}"), format!("UUID4('{value}')"));
    }

    #[rstest]
    #[case("not-a-uuid")]
    #[case("")]
    #[case("6ba7b810-9dad-11d1-80b4-00c04fd430c8")] // Version 1
    fn test_from_str_invalid(#[case] value: &str) {
        assert!(UUID4::from_str(value).is_err());
    }

    #[rstest]
    fn test_serializes_as_string() {
        let uuid = UUID4::from_str("2d89666b-1a1e-4a75-b193-4eb3b454c757").unwrap();
        let json = serde_json::to_string(&uuid).unwrap();
        assert_eq!(json, "\"2d89666b-1a1e-4a75-b193-4eb3b454c757\"");

        let parsed: UUID4 = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, uuid);
    }
}
