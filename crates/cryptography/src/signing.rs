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

//! Signature functions over canonical request payloads.
//!
//! Every function takes the exact string that is transmitted (or a canonical encoding of it):
//! the remote endpoint recomputes the signature over what it receives, so any byte-level
//! difference between the signed and the transmitted payload rejects the request.

use aws_lc_rs::hmac;

/// Generates an HMAC-SHA256 signature for the given data using the provided secret.
///
/// The resulting signature is returned as a lowercase hexadecimal string.
///
/// # Errors
///
/// Returns an error if signature generation fails due to key or cryptographic errors.
pub fn hmac_signature(secret: &str, data: &str) -> anyhow::Result<String> {
    hmac_signature_bytes(secret.as_bytes(), data.as_bytes())
}

/// Generates an HMAC-SHA256 signature over raw `data` bytes with a raw `secret`.
///
/// # Errors
///
/// Returns an error if signature generation fails due to key or cryptographic errors.
pub fn hmac_signature_bytes(secret: &[u8], data: &[u8]) -> anyhow::Result<String> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    let tag = hmac::sign(&key, data);
    Ok(hex::encode(tag.as_ref()))
}

/// Verifies a lowercase or uppercase hex HMAC-SHA256 `signature` in constant time.
///
/// Returns `false` for signatures which are not valid hex.
#[must_use]
pub fn verify_hmac_signature(secret: &str, data: &str, signature: &str) -> bool {
    let Ok(tag) = hex::decode(signature) else {
        return false;
    };
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hmac::verify(&key, data.as_bytes(), &tag).is_ok()
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const BINANCE_DOC_SECRET: &str =
        "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
    const BINANCE_DOC_QUERY: &str = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";

    #[rstest]
    #[case(
        "mysecretkey",
        "data-to-sign",
        "19ed21a8b2a6b847d7d7aea059ab3134cd58f13c860cfbe89338c718685fe077"
    )]
    #[case(
        "",
        "",
        "b613679a0814d9ec772f95d778c35fc5ff1697c493715653c6c712144292c5ad"
    )]
    #[case(
        BINANCE_DOC_SECRET,
        BINANCE_DOC_QUERY,
        "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
    )]
    fn test_hmac_signature(
        #[case] secret: &str,
        #[case] data: &str,
        #[case] expected_signature: &str,
    ) {
        let result = hmac_signature(secret, data).unwrap();
        assert_eq!(result, expected_signature);
    }

    #[rstest]
    fn test_hmac_signature_is_lowercase_hex() {
        let signature = hmac_signature("secret", "payload").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(
            signature
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[rstest]
    fn test_verify_hmac_signature() {
        let signature = hmac_signature(BINANCE_DOC_SECRET, BINANCE_DOC_QUERY).unwrap();

        assert!(verify_hmac_signature(
            BINANCE_DOC_SECRET,
            BINANCE_DOC_QUERY,
            &signature
        ));
        assert!(verify_hmac_signature(
            BINANCE_DOC_SECRET,
            BINANCE_DOC_QUERY,
            &signature.to_uppercase()
        ));
        assert!(!verify_hmac_signature(
            "other-secret",
            BINANCE_DOC_QUERY,
            &signature
        ));
        assert!(!verify_hmac_signature(
            BINANCE_DOC_SECRET,
            "symbol=LTCBTC",
            &signature
        ));
        assert!(!verify_hmac_signature(
            BINANCE_DOC_SECRET,
            BINANCE_DOC_QUERY,
            "not-hex"
        ));
    }
}
