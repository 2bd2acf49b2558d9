// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0
use super::os_errors;
use super::{Error, OsResult};

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Marker inserted into the file name of staging files
const STAGING: &str = "staging";

/// Get the staging path for a target file.
///
/// The staging file lives next to the target so the final rename stays on one file system.
/// The extension is kept last, as external renderers pick the output format from it:
/// `earth.png` stages as `earth.staging.png`.
pub fn staging_path(target: &Path) -> PathBuf {
    let stem = target.file_stem().map(OsString::from).unwrap_or_default();

    let mut name = stem;
    name.push(".");
    name.push(STAGING);
    if let Some(ext) = target.extension() {
        name.push(".");
        name.push(ext);
    }

    target.with_file_name(name)
}

/// Atomically move a staged file over its target
pub fn replace(staging: &Path, target: &Path) -> OsResult<()> {
    fs::rename(staging, target).map_err(|e| {
        Error::new(
            os_errors::FILE_REPLACE_FAILURE,
            format!(
                "Cannot move `{}` to `{}`: {}",
                staging.display(),
                target.display(),
                e
            ),
        )
    })
}

/// Remove a staging file if it exists
pub fn discard(staging: &Path) {
    // a missing file is what we want anyway
    let _ = fs::remove_file(staging);
}

/// Write the full contents of a file so readers see either the old or the new content
pub fn write_atomic(target: &Path, contents: &[u8]) -> OsResult<()> {
    let staging = staging_path(target);

    let written = File::create(&staging)
        .and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        })
        .map_err(|e| {
            Error::new(
                os_errors::FILE_WRITE_FAILURE,
                format!("Cannot write `{}`: {}", staging.display(), e),
            )
        });

    if let Err(err) = written {
        discard(&staging);
        return Err(err);
    }

    replace(&staging, target).inspect_err(|_| discard(&staging))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_keeps_extension() {
        assert_eq!(
            staging_path(Path::new("/images/earth.png")),
            PathBuf::from("/images/earth.staging.png")
        );
        assert_eq!(
            staging_path(Path::new("/usr/share/xplanet/markers/iss")),
            PathBuf::from("/usr/share/xplanet/markers/iss.staging")
        );
        assert_eq!(
            staging_path(Path::new("relative.tar.gz")),
            PathBuf::from("relative.tar.staging.gz")
        );
    }

    #[test]
    fn write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("marker");

        write_atomic(&target, b"first").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"first");

        write_atomic(&target, b"second").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"second");

        // no staging leftovers
        assert!(!staging_path(&target).exists());
    }

    #[test]
    fn write_atomic_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("marker");

        let err = write_atomic(&target, b"x").unwrap_err();
        assert_eq!(err.code(), os_errors::FILE_WRITE_FAILURE);
    }

    #[test]
    fn replace_missing_staging_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = replace(&dir.path().join("a"), &dir.path().join("b")).unwrap_err();
        assert_eq!(err.code(), os_errors::FILE_REPLACE_FAILURE);
    }
}
