// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0
use super::os_errors;
use super::{Error, OsResult};

use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Placeholder in a job argument that is replaced by the output path
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// An external command that renders a file.
///
/// The command line is given as program plus arguments. Every occurrence of `{output}`
/// in an argument is substituted by the output path of the run. If no argument carries
/// the placeholder, the output path is appended as the last argument.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandJob {
    argv: Vec<String>,
}

impl CommandJob {
    /// Create a new job from a command line
    pub fn new<I, S>(argv: I) -> OsResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        if argv.first().map_or(true, |program| program.trim().is_empty()) {
            return Err(Error::const_new(
                os_errors::PROCESS_EMPTY_COMMAND,
                "Job command line is empty",
            ));
        }
        Ok(Self { argv })
    }

    /// The program that runs
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Arguments for a run writing to `output`
    pub fn arguments(&self, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        let mut args: Vec<String> = self.argv[1..]
            .iter()
            .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, &output))
            .collect();

        if !self.argv[1..].iter().any(|arg| arg.contains(OUTPUT_PLACEHOLDER)) {
            args.push(output.into_owned());
        }
        args
    }

    /// Run the job to completion and return its exit status.
    ///
    /// This blocks for as long as the job runs. Output of the job is captured and
    /// logged on debug level.
    pub fn run(&self, output: &Path) -> OsResult<ExitStatus> {
        let result = Command::new(self.program())
            .args(self.arguments(output))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                Error::new(
                    os_errors::PROCESS_SPAWN_FAILURE,
                    format!("Cannot run `{}`: {}", self.program(), e),
                )
            })?;

        if !result.stderr.is_empty() {
            debug!(
                "{} stderr: {}",
                self.program(),
                String::from_utf8_lossy(&result.stderr).trim_end()
            );
        }
        Ok(result.status)
    }
}

impl fmt::Display for CommandJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_substitution() {
        let job = CommandJob::new(["xplanet", "-geometry", "800x480", "-output", "{output}"]).unwrap();
        assert_eq!(job.program(), "xplanet");
        assert_eq!(
            job.arguments(Path::new("/tmp/earth.staging.png")),
            vec!["-geometry", "800x480", "-output", "/tmp/earth.staging.png"]
        );
    }

    #[test]
    fn output_appended_without_placeholder() {
        let job = CommandJob::new(["render"]).unwrap();
        assert_eq!(job.arguments(Path::new("/tmp/a.png")), vec!["/tmp/a.png"]);
    }

    #[test]
    fn empty_command_is_rejected() {
        assert_eq!(
            CommandJob::new(Vec::<String>::new()).unwrap_err().code(),
            os_errors::PROCESS_EMPTY_COMMAND
        );
        assert_eq!(
            CommandJob::new([" "]).unwrap_err().code(),
            os_errors::PROCESS_EMPTY_COMMAND
        );
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_is_captured() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");

        let ok = CommandJob::new(["sh", "-c", "echo rendered > \"$0\"", "{output}"]).unwrap();
        assert!(ok.run(&output).unwrap().success());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "rendered\n");

        let failing = CommandJob::new(["sh", "-c", "exit 3"]).unwrap();
        assert_eq!(failing.run(&output).unwrap().code(), Some(3));

        let missing = CommandJob::new(["/nonexistent/renderer"]).unwrap();
        assert_eq!(
            missing.run(&output).unwrap_err().code(),
            os_errors::PROCESS_SPAWN_FAILURE
        );
    }
}
