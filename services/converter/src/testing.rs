//! Scripted process runner for tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use common::error::{ProcessError, ProcessResult};
use common::process::{CommandSpec, ProcessOutput, ProcessRunner};

/// Bytes written by [`Step::encode`] in place of a real encoder output
pub const FAKE_GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";

/// Scripted outcome of one process invocation
#[derive(Debug, Clone)]
pub enum Step {
    Succeed { stdout: Vec<u8>, write_output: bool },
    Fail { stderr: String },
    SpawnError,
}

impl Step {
    pub fn stdout(stdout: &str) -> Self {
        Step::Succeed {
            stdout: stdout.as_bytes().to_vec(),
            write_output: false,
        }
    }

    /// Succeeds and writes [`FAKE_GIF`] to the command's output path
    pub fn encode() -> Self {
        Step::Succeed {
            stdout: Vec::new(),
            write_output: true,
        }
    }

    pub fn fail(stderr: &str) -> Self {
        Step::Fail {
            stderr: stderr.to_string(),
        }
    }

    pub fn spawn_error() -> Self {
        Step::SpawnError
    }

    /// ffprobe JSON for a single video stream
    pub fn probe(duration: f64, width: u32, height: u32) -> Self {
        Self::stdout(&format!(
            r#"{{"streams": [{{"codec_type": "video", "duration": "{:.6}", "width": {}, "height": {}}}]}}"#,
            duration, width, height
        ))
    }
}

/// Replays [`Step`]s in order and records every command it receives
#[derive(Debug, Default)]
pub struct FakeRunner {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl FakeRunner {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> ProcessResult<ProcessOutput> {
        self.calls.lock().unwrap().push(spec.clone());

        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected command: {:?}", spec));

        match step {
            Step::Succeed {
                stdout,
                write_output,
            } => {
                if write_output {
                    let path = spec.output_path().expect("command has no output path");
                    if std::fs::write(path, FAKE_GIF).is_err() {
                        return Ok(ProcessOutput {
                            success: false,
                            code: Some(1),
                            stderr: b"Could not open output file".to_vec(),
                            ..Default::default()
                        });
                    }
                }
                Ok(ProcessOutput {
                    success: true,
                    code: Some(0),
                    stdout,
                    stderr: Vec::new(),
                })
            }
            Step::Fail { stderr } => Ok(ProcessOutput {
                success: false,
                code: Some(1),
                stdout: Vec::new(),
                stderr: stderr.into_bytes(),
            }),
            Step::SpawnError => Err(ProcessError::Spawn {
                program: spec.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            }),
        }
    }
}
