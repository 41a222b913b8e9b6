// src/exec/shell.rs

//! External program runner.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::errors::JobError;
use crate::job::ShellJob;

/// Run one external program to completion.
///
/// Returns `Ok(None)` on success and `Ok(Some(warning))` when a non-zero exit
/// status was tolerated through `ignore_failure`. `base_dir` resolves a
/// relative working directory.
pub async fn run_shell(
    unit: &str,
    job: &ShellJob,
    base_dir: &Path,
) -> Result<Option<String>, JobError> {
    let command_line = job.command_line();
    let working_dir = match &job.working_dir {
        Some(dir) if dir.is_relative() => base_dir.join(dir),
        Some(dir) => dir.clone(),
        None => base_dir.to_path_buf(),
    };

    info!(
        unit = %unit,
        cmd = %command_line,
        dir = %working_dir.display(),
        "starting process"
    );
    if job.display_output {
        println!("{command_line}");
    }

    let mut cmd = Command::new(&job.program);
    cmd.args(&job.args)
        .current_dir(&working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| JobError::Spawn {
        program: job.program.clone(),
        source,
    })?;

    let readers = [
        child
            .stdout
            .take()
            .map(|out| forward_lines(unit, "stdout", out, job.display_output)),
        child
            .stderr
            .take()
            .map(|err| forward_lines(unit, "stderr", err, job.display_output)),
    ];

    let status = child.wait().await.map_err(|source| JobError::Spawn {
        program: job.program.clone(),
        source,
    })?;

    // Drain remaining output so it is printed before the unit reports back.
    for reader in readers.into_iter().flatten() {
        let _ = reader.await;
    }

    let code = status.code().unwrap_or(-1);
    info!(unit = %unit, exit_code = code, success = status.success(), "process exited");

    if status.success() {
        return Ok(None);
    }

    let err = JobError::ExitStatus {
        command: command_line,
        code,
    };
    if job.ignore_failure {
        Ok(Some(err.to_string()))
    } else {
        Err(err)
    }
}

/// Consume a child's output stream line by line so its pipe never fills.
fn forward_lines<R>(unit: &str, stream: &'static str, reader: R, display: bool) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let unit = unit.to_string();
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if display {
                match stream {
                    "stderr" => eprintln!("{line}"),
                    _ => println!("{line}"),
                }
            } else {
                debug!(unit = %unit, "{stream}: {line}");
            }
        }
    })
}
