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

//! Environment variable helpers used when loading credentials.

/// Returns the environment variable for the given `key`.
///
/// # Errors
///
/// Returns an error if the environment variable is not set.
pub fn get_env_var(key: &str) -> anyhow::Result<String> {
    match std::env::var(key) {
        Ok(var) => Ok(var),
        Err(_) => anyhow::bail!("environment variable '{key}' must be set"),
    }
}

/// Returns `value` when provided, otherwise the environment variable for `key`.
///
/// # Errors
///
/// Returns an error if `value` is `None` and the environment variable is not set.
pub fn get_or_env_var(value: Option<String>, key: &str) -> anyhow::Result<String> {
    match value {
        Some(v) => Ok(v),
        None => get_env_var(key),
    }
}

/// Returns `value` when provided, otherwise the environment variable for `key` if it is set.
#[must_use]
pub fn get_or_env_var_opt(value: Option<String>, key: &str) -> Option<String> {
    value.or_else(|| std::env::var(key).ok())
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const MISSING_KEY: &str = "WSAPI_CORE_TEST_DEFINITELY_NOT_SET";

    #[rstest]
    fn test_get_env_var_missing() {
        let result = get_env_var(MISSING_KEY);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains(MISSING_KEY));
    }

    #[rstest]
    fn test_get_or_env_var_prefers_value() {
        let result = get_or_env_var(Some("explicit".to_string()), MISSING_KEY).unwrap();
        assert_eq!(result, "explicit");
    }

    #[rstest]
    fn test_get_or_env_var_falls_back_to_env() {
        assert!(get_or_env_var(None, MISSING_KEY).is_err());
    }

    #[rstest]
    #[case(Some("key".to_string()), Some("key".to_string()))]
    #[case(None, None)]
    fn test_get_or_env_var_opt(#[case] value: Option<String>, #[case] expected: Option<String>) {
        assert_eq!(get_or_env_var_opt(value, MISSING_KEY), expected);
    }
}
