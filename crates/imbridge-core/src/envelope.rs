// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Response envelope returned by the native host for every bridge call.
//
// Wire format: a JSON string decoding to `{ "err_code"?: number, ...fields }`.
// A missing (or null) `err_code`, or one equal to 200, means success. Anything
// else is an application-level failure and the whole envelope is handed to the
// caller's error continuation. A bare `null` response carries no envelope at all
// and is rejected as malformed.

use std::fmt;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status code the host uses for a successful call.
pub const SUCCESS_CODE: i64 = 200;

/// Name of the status field inside the envelope.
pub const ERR_CODE_FIELD: &str = "err_code";

/// A decoded host response.
///
/// The payload is kept as raw JSON so that fields the SDK knows nothing about
/// reach the page untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseEnvelope(Value);

impl ResponseEnvelope {
    /// Decode the response string sent back by the host.
    ///
    /// Fails on invalid JSON and on a top-level `null`.
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        match serde_json::from_str(raw)? {
            Value::Null => Err(de::Error::custom("response is null")),
            value => Ok(Self(value)),
        }
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Whether the envelope reports success.
    ///
    /// The host is loose about the type of `err_code`: `null` counts as
    /// absent and a numeric string such as `"200"` compares equal to 200.
    /// A response that is not a JSON object carries no status and succeeds.
    pub fn is_success(&self) -> bool {
        match self.0.get(ERR_CODE_FIELD) {
            None | Some(Value::Null) => true,
            Some(Value::Number(n)) => n.as_f64() == Some(SUCCESS_CODE as f64),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .is_ok_and(|code| code == SUCCESS_CODE as f64),
            Some(_) => false,
        }
    }

    /// Integer status code, when the host sent one. Integral floats such as
    /// `403.0` count.
    pub fn err_code(&self) -> Option<i64> {
        match self.0.get(ERR_CODE_FIELD)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
            Value::String(s) => {
                let s = s.trim();
                s.parse().ok().or_else(|| s.parse().ok().and_then(integral))
            }
            _ => None,
        }
    }

    /// Human-readable failure message (`msg`), if present.
    pub fn message(&self) -> Option<&str> {
        self.0.get("msg").and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Deserialize the payload into a typed structure.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.0)
    }
}

fn integral(code: f64) -> Option<i64> {
    (code.is_finite() && code.fract() == 0.0 && code.abs() < i64::MAX as f64).then_some(code as i64)
}

impl From<Value> for ResponseEnvelope {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for ResponseEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(raw: &str) -> ResponseEnvelope {
        ResponseEnvelope::parse(raw).expect("valid json")
    }

    #[test]
    fn missing_code_is_success() {
        assert!(env(r#"{"name":"general"}"#).is_success());
    }

    #[test]
    fn code_200_is_success() {
        let e = env(r#"{"err_code":200,"name":"general"}"#);
        assert!(e.is_success());
        assert_eq!(e.err_code(), Some(200));
        assert_eq!(e.get("name"), Some(&json!("general")));
    }

    #[test]
    fn other_codes_fail() {
        let e = env(r#"{"err_code":403,"msg":"denied"}"#);
        assert!(!e.is_success());
        assert_eq!(e.err_code(), Some(403));
        assert_eq!(e.message(), Some("denied"));

        assert!(!env(r#"{"err_code":0}"#).is_success());
        assert!(!env(r#"{"err_code":500}"#).is_success());
    }

    #[test]
    fn loose_code_forms() {
        assert!(env(r#"{"err_code":null}"#).is_success());
        assert!(env(r#"{"err_code":"200"}"#).is_success());
        assert!(env(r#"{"err_code":200.0}"#).is_success());
        assert!(!env(r#"{"err_code":"denied"}"#).is_success());
        assert!(!env(r#"{"err_code":true}"#).is_success());
        assert!(!env(r#"{"err_code":""}"#).is_success());
    }

    #[test]
    fn non_object_payload_is_success() {
        assert!(env(r#""ok""#).is_success());
        assert!(env("[1,2,3]").is_success());
        assert_eq!(env("42").err_code(), None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(ResponseEnvelope::parse("{not json").is_err());
        assert!(ResponseEnvelope::parse("").is_err());
    }

    #[test]
    fn null_response_is_an_error() {
        assert!(ResponseEnvelope::parse("null").is_err());
        assert!(ResponseEnvelope::parse(" null ").is_err());
        assert!(env(r#"{"err_code":null}"#).is_success());
    }

    #[test]
    fn float_codes_are_reported() {
        let e = env(r#"{"err_code":403.0,"msg":"denied"}"#);
        assert!(!e.is_success());
        assert_eq!(e.err_code(), Some(403));
        assert_eq!(env(r#"{"err_code":"500.0"}"#).err_code(), Some(500));
        assert_eq!(env(r#"{"err_code":403.5}"#).err_code(), None);
    }

    #[test]
    fn decode_typed_payload() {
        #[derive(Deserialize)]
        struct Named {
            name: String,
        }
        let named: Named = env(r#"{"err_code":200,"name":"general"}"#)
            .decode()
            .expect("decode");
        assert_eq!(named.name, "general");
    }

    #[test]
    fn display_is_raw_json() {
        let e = ResponseEnvelope::from_value(json!({"err_code": 403}));
        assert_eq!(e.to_string(), r#"{"err_code":403}"#);
    }
}
