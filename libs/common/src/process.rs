//! External media tool invocation
//!
//! Commands are described as plain values ([`CommandSpec`]) by the
//! builders below and executed through the [`ProcessRunner`] seam, so the
//! service can be exercised without ffmpeg installed.

use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ProcessError, ProcessResult};

/// Width and height of a frame, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A program and its argument list, ready to be spawned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Last argument, which for every builder in this module is the output path
    pub fn output_path(&self) -> Option<&Path> {
        self.args.last().map(Path::new)
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

/// Builder for the inspection tool
pub struct FfprobeCommand;

impl FfprobeCommand {
    /// Dump format and stream metadata of `input` as JSON on stdout
    pub fn streams(program: &str, input: &Path) -> CommandSpec {
        CommandSpec::new(program)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(input)
    }
}

/// Builder for the encoder
pub struct FfmpegCommand;

impl FfmpegCommand {
    /// `fps=<fps>,scale=<w>:<h>:flags=lanczos`
    pub fn scale_filter(size: FrameSize, fps: u32) -> String {
        format!(
            "fps={},scale={}:{}:flags=lanczos",
            fps, size.width, size.height
        )
    }

    /// First pass: compute an optimal palette for the scaled clip
    pub fn palette(
        program: &str,
        input: &Path,
        palette: &Path,
        size: FrameSize,
        fps: u32,
    ) -> CommandSpec {
        CommandSpec::new(program)
            .args(["-y", "-i"])
            .arg(input)
            .arg("-vf")
            .arg(format!("{},palettegen", Self::scale_filter(size, fps)))
            .arg(palette)
    }

    /// Second pass: encode the GIF against a previously generated palette
    pub fn paletteuse(
        program: &str,
        input: &Path,
        palette: &Path,
        output: &Path,
        size: FrameSize,
        fps: u32,
    ) -> CommandSpec {
        CommandSpec::new(program)
            .args(["-y", "-i"])
            .arg(input)
            .arg("-i")
            .arg(palette)
            .arg("-filter_complex")
            .arg(format!(
                "{}[x];[x][1:v]paletteuse",
                Self::scale_filter(size, fps)
            ))
            .arg(output)
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// Standard error decoded for logging
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Executes a [`CommandSpec`] to completion
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> ProcessResult<ProcessOutput>;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner {
    timeout: Option<Duration>,
}

impl TokioProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> ProcessResult<ProcessOutput> {
        debug!("Running {} {:?}", spec.program, spec.args);

        let child = spec.to_command().spawn().map_err(|source| ProcessError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        // the child is killed on drop, so abandoning the future on timeout reaps it
        let wait = child.wait_with_output();
        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, wait).await.map_err(|_| {
                ProcessError::TimedOut {
                    program: spec.program.clone(),
                    timeout,
                }
            })?,
            None => wait.await,
        }
        .map_err(|source| ProcessError::Wait {
            program: spec.program.clone(),
            source,
        })?;

        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
