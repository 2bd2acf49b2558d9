// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0
use crate::core_errors;
use crate::json::{member, JsonValue};
use crate::{CoreResult, Error};

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration structure
///
/// A thin layer over a JSON document. Values are addressed by dotted paths
/// (`"display.rotation_secs"`). Every accessor takes a default that is used
/// when the path is absent, while a present value of the wrong kind is an error.
#[derive(Debug, Clone)]
pub struct Config {
    value: JsonValue,
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl Config {
    pub fn new() -> Config {
        Config {
            value: JsonValue::Null,
        }
    }

    /// Read and parse a configuration file
    pub fn from_file(path: &Path) -> CoreResult<Config> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::new(
                core_errors::CONFIG_IO_ERROR,
                format!("Cannot read configuration `{}`: {}", path.display(), e),
            )
        })?;
        text.parse()
    }

    pub fn get(&self) -> &JsonValue {
        &self.value
    }

    /// Resolve a dotted path. Returns `None` if any segment is missing.
    pub fn lookup(&self, path: &str) -> Option<&JsonValue> {
        // an empty document has nothing to look up
        if self.value.is_null() {
            return None;
        }

        path.split('.')
            .try_fold(&self.value, |value, key| member(value, key))
    }

    /// Get a string value or the default
    pub fn str_or(&self, path: &str, default: &str) -> CoreResult<String> {
        match self.lookup(path) {
            None => Ok(default.to_string()),
            Some(JsonValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(Self::wrong_kind(path, "a string")),
        }
    }

    /// Get a boolean value or the default
    pub fn bool_or(&self, path: &str, default: bool) -> CoreResult<bool> {
        match self.lookup(path) {
            None => Ok(default),
            Some(JsonValue::Boolean(b)) => Ok(*b),
            Some(_) => Err(Self::wrong_kind(path, "a boolean")),
        }
    }

    /// Get a number value or the default
    pub fn f64_or(&self, path: &str, default: f64) -> CoreResult<f64> {
        match self.lookup(path) {
            None => Ok(default),
            Some(JsonValue::Number(n)) => Ok(*n),
            Some(_) => Err(Self::wrong_kind(path, "a number")),
        }
    }

    /// Get a duration given in (fractional) seconds or the default.
    ///
    /// The value must be positive and representable as a `Duration`.
    pub fn seconds_or(&self, path: &str, default: f64) -> CoreResult<Duration> {
        let secs = self.f64_or(path, default)?;
        let invalid = || {
            Error::new(
                core_errors::INVALID_CONFIG,
                format!("`{path}` must be a positive number of seconds, got {secs}"),
            )
        };

        if secs <= 0.0 {
            return Err(invalid());
        }
        // rejects NaN, infinity and overflow
        Duration::try_from_secs_f64(secs).map_err(|_| invalid())
    }

    /// Get an array value, `None` if absent
    pub fn array(&self, path: &str) -> CoreResult<Option<&Vec<JsonValue>>> {
        match self.lookup(path) {
            None => Ok(None),
            Some(JsonValue::Array(items)) => Ok(Some(items)),
            Some(_) => Err(Self::wrong_kind(path, "an array")),
        }
    }

    fn wrong_kind(path: &str, expected: &str) -> Error {
        Error::new(
            core_errors::INVALID_CONFIG,
            format!("`{path}` must be {expected}"),
        )
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: JsonValue = s
            .parse()
            .map_err(|e| Error::new(core_errors::PARSE_ERROR, format!("{e}")))?;

        // the root of a configuration is always an object
        if !value.is_object() {
            return Err(Error::const_new(
                core_errors::INVALID_CONFIG,
                "Configuration root must be an object",
            ));
        }
        Ok(Config { value })
    }
}

impl From<JsonValue> for Config {
    fn from(value: JsonValue) -> Self {
        Config { value }
    }
}

impl core::ops::Index<&str> for Config {
    type Output = JsonValue;
    fn index(&self, index: &str) -> &Self::Output {
        &self.value[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
    {
        "input": { "device": "/dev/input/event3", "enabled": false },
        "display": { "rotation_secs": 12.5, "tick_secs": 0.05 },
        "slots": [ { "name": "earth" } ]
    }
    "#;

    #[test]
    fn typed_lookups_with_defaults() {
        let config: Config = SAMPLE.parse().unwrap();

        assert_eq!(
            config.str_or("input.device", "/dev/input/event0").unwrap(),
            "/dev/input/event3"
        );
        assert!(!config.bool_or("input.enabled", true).unwrap());
        assert_eq!(
            config.seconds_or("display.rotation_secs", 30.0).unwrap(),
            Duration::from_millis(12500)
        );
        // absent values fall back to the default
        assert_eq!(
            config.seconds_or("display.rate_limit_secs", 0.2).unwrap(),
            Duration::from_millis(200)
        );
        assert_eq!(config.str_or("refresh.feed_url", "x").unwrap(), "x");
        assert_eq!(config.array("slots").unwrap().unwrap().len(), 1);
        assert!(config.array("missing").unwrap().is_none());
        assert!(config["input"]["device"].is_string());
    }

    #[test]
    fn wrong_kinds_are_errors() {
        let config: Config = SAMPLE.parse().unwrap();

        let err = config.bool_or("input.device", true).unwrap_err();
        assert_eq!(err.code(), core_errors::INVALID_CONFIG);

        let err = config.array("display").unwrap_err();
        assert_eq!(err.code(), core_errors::INVALID_CONFIG);

        // traversing through a scalar is just absent
        assert!(config.lookup("input.device.deeper").is_none());
    }

    #[test]
    fn non_positive_durations_are_rejected() {
        let config: Config = r#"{ "display": { "tick_secs": 0, "rotation_secs": -1 } }"#
            .parse()
            .unwrap();
        assert_eq!(
            config.seconds_or("display.tick_secs", 0.1).unwrap_err().code(),
            core_errors::INVALID_CONFIG
        );
        assert_eq!(
            config.seconds_or("display.rotation_secs", 30.0).unwrap_err().code(),
            core_errors::INVALID_CONFIG
        );
    }

    #[test]
    fn unrepresentable_durations_are_rejected() {
        let config: Config = r#"{ "display": { "rotation_secs": 1e30 } }"#.parse().unwrap();
        assert_eq!(
            config.seconds_or("display.rotation_secs", 30.0).unwrap_err().code(),
            core_errors::INVALID_CONFIG
        );
        assert_eq!(
            Config::new().seconds_or("x", f64::INFINITY).unwrap_err().code(),
            core_errors::INVALID_CONFIG
        );
        assert_eq!(
            Config::new().seconds_or("x", f64::NAN).unwrap_err().code(),
            core_errors::INVALID_CONFIG
        );
    }

    #[test]
    fn parse_failures() {
        assert_eq!(
            "{ not json".parse::<Config>().unwrap_err().code(),
            core_errors::PARSE_ERROR
        );
        assert_eq!(
            "[1, 2]".parse::<Config>().unwrap_err().code(),
            core_errors::INVALID_CONFIG
        );
        assert!(Config::default().lookup("anything").is_none());
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert!(!config.bool_or("input.enabled", true).unwrap());

        let err = Config::from_file(Path::new("/nonexistent/solar.json")).unwrap_err();
        assert_eq!(err.code(), core_errors::CONFIG_IO_ERROR);
    }
}
