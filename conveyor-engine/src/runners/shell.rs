// Shell runner
// Runs each job command through `sh -c` with piped output. One process per
// command; the job-level timeout is enforced by the executor around the
// whole script.

use crate::runners::{CommandOutput, CommandRunner};

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(
        &self,
        command: &str,
        env: &HashMap<String, String>,
        workspace: &Path,
    ) -> CommandOutput {
        let mut cmd = Command::new("sh");
        cmd.arg("-c");
        cmd.arg(command);
        cmd.current_dir(workspace);
        cmd.envs(env);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // If the executor aborts us (cancellation), the child dies too.
        cmd.kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return CommandOutput {
                    stdout: String::new(),
                    stderr: format!("failed to spawn shell: {}", e),
                    exit_code: None,
                };
            }
        };

        let stdout = child.stdout.take().expect("stdout was piped");
        let stderr = child.stderr.take().expect("stderr was piped");

        let stdout_handle = tokio::spawn(collect_lines(BufReader::new(stdout)));
        let stderr_handle = tokio::spawn(collect_lines(BufReader::new(stderr)));

        let exit_code = child.wait().await.ok().and_then(|s| s.code());
        let stdout = stdout_handle.await.unwrap_or_default();
        let stderr = stderr_handle.await.unwrap_or_default();

        CommandOutput {
            stdout,
            stderr,
            exit_code,
        }
    }
}

async fn collect_lines<R>(reader: BufReader<R>) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = reader.lines();
    let mut output = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&line);
    }
    output
}
