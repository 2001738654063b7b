// Job runners
// A runner executes a single command in a job workspace. The engine ships a
// shell runner; tests substitute their own through the trait.

pub mod shell;

pub use shell::ShellRunner;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// Output of one executed command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Executes one command of a job script in an isolated process.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        command: &str,
        env: &HashMap<String, String>,
        workspace: &Path,
    ) -> CommandOutput;
}
