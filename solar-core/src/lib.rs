// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Display;

pub mod config;
pub mod json;

/// The core preample publicly re-exports the most common symbols
pub mod prelude {
    pub use super::*;
    pub use config::Config;
}

/// Error code
/// The solar clock error codes are structured error codes:
///
/// | Byte 7  | Byte 6 | Byte 5     | Byte 4   | Bytes 3..0   |
/// | ------- | ------ | ---------- | -------- | ------------ |
/// | Library | Module | Sub-module | Reserved | Error Number |
///
/// ### Library
///
/// | value | description |
/// | -- | -- |
/// | 0x00 xxxxxx xxxxxxxx | General error codes |
/// | 0x10 xxxxxx xxxxxxxx | Foundation libraries |
/// | 0x80 xxxxxx xxxxxxxx | Application |
///
/// ### Foundation library modules
///
/// | value | description |
/// | -- | -- |
/// | 0x10 00 xx xxxxxxxx | Core |
/// | 0x10 10 xx xxxxxxxx | Os |
/// | 0x10 30 xx xxxxxxxx | Runtime |
///
pub type ErrorCode = u64;

pub mod core_errors;

/// Helper for storing static and dynamic error texts
#[derive(Debug, Clone, PartialEq)]
enum ErrorText {
    None,
    Static(&'static str),
    Dynamic(String),
}

impl Display for ErrorText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::None => "n/a",
                Self::Static(str) => str,
                Self::Dynamic(str) => str.as_str(),
            }
        )
    }
}

/// Base class for errors
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    code: ErrorCode,
    text: ErrorText,
}

impl Error {
    /// Create a new error code from a dynamic string
    pub fn new(code: ErrorCode, text: String) -> Self {
        Error {
            code,
            text: ErrorText::Dynamic(text),
        }
    }

    /// Create a new error code from a `&'static str`
    pub const fn const_new(code: ErrorCode, text: &'static str) -> Self {
        Error {
            code,
            text: ErrorText::Static(text),
        }
    }

    /// Create a new error code without an error text
    pub const fn from_code(code: ErrorCode) -> Self {
        Error {
            code,
            text: ErrorText::None,
        }
    }

    /// Get the code of an error
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the error text
    pub fn text(&self) -> &str {
        match &self.text {
            ErrorText::None => "",
            ErrorText::Static(s) => s,
            ErrorText::Dynamic(s) => s.as_str(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08x}: {}", self.code(), self.text)
    }
}

impl From<ErrorCode> for Error {
    fn from(code: ErrorCode) -> Self {
        Self::from_code(code)
    }
}

impl std::error::Error for Error {}

pub type CoreResult<T> = std::result::Result<T, Error>;
