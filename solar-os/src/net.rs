// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0
use super::os_errors;
use super::{Error, OsResult};

use std::time::Duration;

/// Fetch a resource with HTTP GET and return the body as text.
///
/// The whole request including the body transfer is bounded by `timeout`.
pub fn http_get(url: &str, timeout: Duration) -> OsResult<String> {
    let agent = ureq::AgentBuilder::new().timeout(timeout).build();

    match agent.get(url).call() {
        Ok(response) => response.into_string().map_err(|e| {
            Error::new(
                os_errors::NET_TRANSPORT_FAILURE,
                format!("Cannot read response from {url}: {e}"),
            )
        }),
        Err(ureq::Error::Status(code, _)) => Err(Error::new(
            os_errors::NET_STATUS_FAILURE,
            format!("{url} answered with status {code}"),
        )),
        Err(e) => Err(Error::new(
            os_errors::NET_TRANSPORT_FAILURE,
            format!("Cannot reach {url}: {e}"),
        )),
    }
}
