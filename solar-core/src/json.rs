// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0
pub use tinyjson::{
    JsonGenerateError, JsonGenerateResult, JsonGenerator, JsonParseError, JsonParseResult,
    JsonParser, JsonValue,
};

use std::collections::HashMap;

/// Look up a member of a JSON object without panicking.
///
/// Returns `None` if `value` is not an object or has no such member.
pub fn member<'a>(value: &'a JsonValue, key: &str) -> Option<&'a JsonValue> {
    value
        .get::<HashMap<String, JsonValue>>()
        .and_then(|object| object.get(key))
}

/// Render a scalar JSON value as plain text.
///
/// Strings are returned verbatim, numbers in their shortest decimal form.
/// Other value kinds have no scalar text.
pub fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) if n.is_finite() => Some(format!("{n}")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_json() {
        let json_str = r#"
        {
            "message": "success",
            "timestamp": 1492455258,
            "iss_position": {
                "longitude": "-118.6624",
                "latitude": "33.5182"
            }
        }
        "#;

        let value: JsonValue = json_str.parse::<JsonValue>().unwrap();
        let v = value["message"].get::<String>().unwrap();
        assert_eq!(v.as_str(), "success");

        let position = member(&value, "iss_position").unwrap();
        assert_eq!(
            scalar_text(member(position, "latitude").unwrap()),
            Some("33.5182".to_string())
        );
        assert!(member(position, "altitude").is_none());
        assert!(member(&value["message"], "anything").is_none());
    }

    #[test]
    fn scalar_text_of_numbers() {
        let value: JsonValue = r#"{"lat": 12.5, "lon": -3, "ok": true, "none": null}"#
            .parse()
            .unwrap();
        assert_eq!(scalar_text(&value["lat"]), Some("12.5".to_string()));
        assert_eq!(scalar_text(&value["lon"]), Some("-3".to_string()));
        assert_eq!(scalar_text(&value["ok"]), None);
        assert_eq!(scalar_text(&value["none"]), None);
    }
}
