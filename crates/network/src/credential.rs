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

//! API credential storage and canonical request signing.

#![allow(unused_assignments)] // Fields are used in methods, false positive from nightly

use std::fmt::Debug;

use serde_json::Value;
use wsapi_cryptography::signing::hmac_signature_bytes;
use zeroize::ZeroizeOnDrop;

use crate::rpc::messages::Params;

/// Parameter name carrying the signature, never part of the signed payload.
pub const SIGNATURE_PARAM: &str = "signature";

/// API credentials used to authenticate WebSocket API requests.
#[derive(Clone, ZeroizeOnDrop)]
pub struct Credential {
    #[zeroize(skip)]
    api_key: String,
    api_secret: Box<[u8]>,
}

impl Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(Credential))
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl Credential {
    /// Creates a new [`Credential`] instance from the API key and secret.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into().into_bytes().into_boxed_slice(),
        }
    }

    /// Returns the API key associated with this credential.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Signs `payload` with HMAC-SHA256, returning lowercase hex.
    ///
    /// # Errors
    ///
    /// Returns an error if the signing primitive fails.
    pub fn sign(&self, payload: &str) -> anyhow::Result<String> {
        hmac_signature_bytes(&self.api_secret, payload.as_bytes())
    }

    /// Signs the canonical query-string encoding of `params`.
    ///
    /// The `signature` entry, if present, is excluded from the signed payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters cannot be encoded.
    pub fn sign_params(&self, params: &Params) -> anyhow::Result<String> {
        let query = canonical_query(params)?;
        self.sign(&query)
    }
}

/// Encodes `params` as an `application/x-www-form-urlencoded` query string with keys in
/// ascending byte order.
///
/// Strings are taken verbatim, numbers and booleans use their JSON rendering, nulls are
/// omitted and nested arrays or objects are embedded as compact JSON. The `signature`
/// entry is skipped.
///
/// # Errors
///
/// Returns an error if URL encoding fails.
pub fn canonical_query(params: &Params) -> anyhow::Result<String> {
    let pairs: Vec<(&str, String)> = params
        .iter()
        .filter(|(key, _)| key.as_str() != SIGNATURE_PARAM)
        .filter_map(|(key, value)| render_value(value).map(|value| (key.as_str(), value)))
        .collect();

    serde_urlencoded::to_string(pairs)
        .map_err(|e| anyhow::anyhow!("Failed to encode request parameters: {e}"))
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;
    use wsapi_cryptography::signing::{hmac_signature, verify_hmac_signature};

    use super::*;

    const API_KEY: &str = "test_api_key";
    const API_SECRET: &str = "test_secret";

    fn params(value: Value) -> Params {
        serde_json::from_value(value).unwrap()
    }

    #[rstest]
    fn test_canonical_query_sorts_keys() {
        let params = params(json!({
            "timestamp": 1_499_827_319_559_i64,
            "symbol": "LTCBTC",
            "side": "BUY",
            "apiKey": API_KEY,
            "quantity": "1",
            "reduceOnly": false,
        }));

        let query = canonical_query(&params).unwrap();

        assert_eq!(
            query,
            "apiKey=test_api_key&quantity=1&reduceOnly=false&side=BUY&symbol=LTCBTC&timestamp=1499827319559"
        );
    }

    #[rstest]
    fn test_canonical_query_percent_encodes_values() {
        let params = params(json!({
            "newClientOrderId": "my order/1&x=y",
            "price": "0.1",
        }));

        let query = canonical_query(&params).unwrap();

        assert_eq!(query, "newClientOrderId=my+order%2F1%26x%3Dy&price=0.1");
    }

    #[rstest]
    fn test_canonical_query_skips_signature_and_nulls() {
        let params = params(json!({
            "symbol": "BTCUSDT",
            "signature": "deadbeef",
            "stopPrice": null,
        }));

        assert_eq!(canonical_query(&params).unwrap(), "symbol=BTCUSDT");
    }

    #[rstest]
    fn test_canonical_query_empty() {
        assert_eq!(canonical_query(&Params::new()).unwrap(), "");
    }

    #[rstest]
    fn test_sign_params_matches_hmac_of_canonical_query() {
        let credential = Credential::new(API_KEY, API_SECRET);
        let params = params(json!({
            "symbol": "BTCUSDT",
            "side": "SELL",
            "timestamp": 1_700_000_000_000_i64,
        }));

        let signature = credential.sign_params(&params).unwrap();
        let expected = hmac_signature(
            API_SECRET,
            "side=SELL&symbol=BTCUSDT&timestamp=1700000000000",
        )
        .unwrap();

        assert_eq!(signature, expected);
        assert!(verify_hmac_signature(
            API_SECRET,
            &canonical_query(&params).unwrap(),
            &signature
        ));
    }

    #[rstest]
    fn test_signature_ignores_existing_signature_param() {
        let credential = Credential::new(API_KEY, API_SECRET);
        let mut params = params(json!({"symbol": "BTCUSDT"}));
        let unsigned = credential.sign_params(&params).unwrap();

        params.insert(SIGNATURE_PARAM.to_string(), Value::String(unsigned.clone()));

        assert_eq!(credential.sign_params(&params).unwrap(), unsigned);
    }

    #[rstest]
    fn test_debug_redacts_secret() {
        let credential = Credential::new(API_KEY, API_SECRET);
        let debug = format!("{credential:?}");

        assert!(debug.contains(API_KEY));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains(API_SECRET));
    }
}
