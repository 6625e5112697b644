//! Integration tests for the process runner
//!
//! These tests spawn real child processes through `sh` to verify output
//! capture, exit status reporting and the timeout path.

use std::path::Path;
use std::time::Duration;

use common::error::ProcessError;
use common::process::{CommandSpec, FfmpegCommand, FrameSize, ProcessRunner, TokioProcessRunner};

fn shell(script: &str) -> CommandSpec {
    CommandSpec::new("sh").arg("-c").arg(script)
}

#[tokio::test]
async fn test_runner_captures_stdout_and_stderr() -> Result<(), Box<dyn std::error::Error>> {
    let runner = TokioProcessRunner::default();

    let output = runner
        .run(&shell("printf out; printf err >&2"))
        .await?;

    assert!(output.success);
    assert_eq!(output.code, Some(0));
    assert_eq!(output.stdout, b"out");
    assert_eq!(output.stderr_lossy(), "err");
    Ok(())
}

#[tokio::test]
async fn test_runner_reports_non_zero_exit() -> Result<(), Box<dyn std::error::Error>> {
    let runner = TokioProcessRunner::default();

    let output = runner.run(&shell("echo boom >&2; exit 3")).await?;

    assert!(!output.success);
    assert_eq!(output.code, Some(3));
    assert!(output.stderr_lossy().contains("boom"));
    Ok(())
}

#[tokio::test]
async fn test_runner_missing_program_is_spawn_error() {
    let runner = TokioProcessRunner::default();

    let result = runner
        .run(&CommandSpec::new("definitely-not-a-real-encoder-binary"))
        .await;

    assert!(matches!(result, Err(ProcessError::Spawn { .. })));
}

#[tokio::test]
async fn test_runner_times_out_hung_process() {
    let runner = TokioProcessRunner::new(Some(Duration::from_millis(200)));

    let result = runner.run(&shell("sleep 5")).await;

    assert!(matches!(result, Err(ProcessError::TimedOut { .. })));
}

#[tokio::test]
async fn test_runner_passes_paths_verbatim() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let palette = dir.path().join("palette with space.png");

    // stand-in encoder that just touches its last argument
    let script = dir.path().join("fake-ffmpeg.sh");
    std::fs::write(&script, "#!/bin/sh\nfor last; do :; done\ntouch \"$last\"\n")?;

    let spec = FfmpegCommand::palette(
        "sh",
        Path::new("in.mp4"),
        &palette,
        FrameSize::new(480, 270),
        15,
    );
    let spec = CommandSpec::new("sh").arg(&script).args(spec.args);

    let output = TokioProcessRunner::default().run(&spec).await?;

    assert!(output.success);
    assert!(palette.exists());
    Ok(())
}
