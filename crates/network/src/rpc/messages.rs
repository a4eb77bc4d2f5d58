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

//! Request and response envelopes exchanged with the WebSocket API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::error::{WsApiError, WsApiResult};

/// Request parameters keyed by name, iterated in ascending key order.
pub type Params = BTreeMap<String, Value>;

/// Outbound request envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WsApiRequest {
    pub id: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub params: Params,
}

impl WsApiRequest {
    #[must_use]
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Params) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// Structured error object carried by a rejected request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsApiErrorPayload {
    pub code: i64,
    #[serde(alias = "msg")]
    pub message: String,
}

/// Rate limit usage reported alongside a response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsApiRateLimit {
    pub rate_limit_type: String,
    pub interval: String,
    pub interval_num: u32,
    pub limit: u32,
    #[serde(default)]
    pub count: Option<u32>,
}

/// Inbound response envelope.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct WsApiResponse<T = Value> {
    #[serde(default)]
    pub id: Option<String>,
    pub status: u16,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<WsApiErrorPayload>,
    #[serde(default, rename = "rateLimits")]
    pub rate_limits: Vec<WsApiRateLimit>,
}

impl<T> WsApiResponse<T> {
    /// Converts the envelope into the operation's outcome.
    ///
    /// # Errors
    ///
    /// Returns [`WsApiError::RemoteError`] when the response carries an error object or a
    /// failure status, and [`WsApiError::MalformedResponse`] when it carries neither an
    /// error nor a result.
    pub fn into_result(self) -> WsApiResult<T> {
        if let Some(error) = self.error {
            return Err(WsApiError::RemoteError {
                status: self.status,
                code: error.code,
                message: error.message,
            });
        }

        match self.result {
            Some(result) => Ok(result),
            None if self.status >= 400 => Err(WsApiError::RemoteError {
                status: self.status,
                code: 0,
                message: "Request failed without an error payload".to_string(),
            }),
            None => Err(WsApiError::MalformedResponse(format!(
                "Response {} with status {} has neither result nor error",
                self.id.as_deref().unwrap_or("<none>"),
                self.status,
            ))),
        }
    }
}

/// Decodes a raw response payload into `T` or the remote error it carries.
///
/// # Errors
///
/// Returns an error if the payload is not a response envelope or the result does not
/// decode as `T`.
pub fn decode_response<T: DeserializeOwned>(payload: &str) -> WsApiResult<T> {
    let response: WsApiResponse<T> = serde_json::from_str(payload)
        .map_err(|e| WsApiError::MalformedResponse(e.to_string()))?;
    response.into_result()
}

/// Extracts only the correlation identifier from an inbound frame.
///
/// # Errors
///
/// Returns [`WsApiError::MalformedResponse`] if the frame is not a JSON object or carries
/// no string `id`.
pub fn correlation_id(payload: &str) -> WsApiResult<String> {
    let frame: serde_json::Map<String, Value> = serde_json::from_str(payload)
        .map_err(|e| WsApiError::MalformedResponse(e.to_string()))?;
    match frame.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        _ => Err(WsApiError::MalformedResponse("Frame has no string `id`".to_string())),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct OrderResult {
        order_id: u64,
        symbol: String,
    }

    #[rstest]
    fn test_request_serialization() {
        let mut params = Params::new();
        params.insert("symbol".to_string(), json!("BTCUSDT"));
        params.insert("side".to_string(), json!("BUY"));
        let request = WsApiRequest::new("a1", "order.place", params);

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "id": "a1",
                "method": "order.place",
                "params": {"side": "BUY", "symbol": "BTCUSDT"},
            })
        );
    }

    #[rstest]
    fn test_request_without_params_omits_field() {
        let request = WsApiRequest::new("p1", "ping", Params::new());
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"id":"p1","method":"ping"}"#
        );
    }

    #[rstest]
    fn test_decode_success() {
        let payload = r#"{
            "id": "a1",
            "status": 200,
            "result": {"orderId": 325078477, "symbol": "BTCUSDT"},
            "rateLimits": [
                {"rateLimitType": "REQUEST_WEIGHT", "interval": "MINUTE", "intervalNum": 1, "limit": 2400, "count": 1}
            ]
        }"#;

        let result: OrderResult = decode_response(payload).unwrap();

        assert_eq!(
            result,
            OrderResult {
                order_id: 325_078_477,
                symbol: "BTCUSDT".to_string(),
            }
        );

        let envelope: WsApiResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(envelope.rate_limits.len(), 1);
        assert_eq!(envelope.rate_limits[0].limit, 2400);
    }

    #[rstest]
    #[case(r#"{"id":"a1","status":400,"error":{"code":-1013,"msg":"Invalid quantity"}}"#)]
    #[case(r#"{"id":"a1","status":400,"error":{"code":-1013,"message":"Invalid quantity"}}"#)]
    fn test_decode_remote_error(#[case] payload: &str) {
        let error = decode_response::<OrderResult>(payload).unwrap_err();

        assert_eq!(
            error,
            WsApiError::RemoteError {
                status: 400,
                code: -1013,
                message: "Invalid quantity".to_string(),
            }
        );
    }

    #[rstest]
    fn test_decode_failure_status_without_error_payload() {
        let error = decode_response::<Value>(r#"{"id":"a1","status":503}"#).unwrap_err();
        assert!(matches!(error, WsApiError::RemoteError { status: 503, .. }));
    }

    #[rstest]
    #[case(r#"{"id":"a1","status":200}"#)]
    #[case(r#"{"id":"a1","status":200,"result":{"symbol":"BTCUSDT"}}"#)]
    #[case("not json")]
    fn test_decode_malformed(#[case] payload: &str) {
        let error = decode_response::<OrderResult>(payload).unwrap_err();
        assert!(matches!(error, WsApiError::MalformedResponse(_)));
    }

    #[rstest]
    #[case(r#"{"id":"a1","status":200,"result":{}}"#, Some("a1"))]
    #[case(r#"{"status":200,"id":"b2"}"#, Some("b2"))]
    #[case(r#"{"id":null,"status":400}"#, None)]
    #[case(r#"{"id":7}"#, None)]
    #[case(r#"[1,2,3]"#, None)]
    #[case(r#"["a1"]"#, None)]
    #[case(r#"{"e":"ORDER_TRADE_UPDATE"}"#, None)]
    #[case("garbage", None)]
    fn test_correlation_id(#[case] payload: &str, #[case] expected: Option<&str>) {
        let result = correlation_id(payload);
        match expected {
            Some(id) => assert_eq!(result.unwrap(), id),
            None => assert!(matches!(result, Err(WsApiError::MalformedResponse(_)))),
        }
    }
}
