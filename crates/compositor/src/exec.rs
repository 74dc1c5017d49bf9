//! Process execution seam for the external video tool.
//!
//! Commands are plain data (program plus arguments) run through the
//! [`ProcessRunner`] trait, so the compositor's orchestration can be
//! tested without ffmpeg installed. [`SystemRunner`] is the real
//! implementation; [`RecordingRunner`] records invocations and serves
//! canned output.

use std::process::Command;

/// A command to run: program name and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        ToolCommand {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Captured output of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Launch or exit failures from the external tool.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} exited with status {status}: {stderr}")]
    Failed {
        program: String,
        status: i32,
        stderr: String,
    },
}

/// Runs tool commands to completion, capturing output.
pub trait ProcessRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ExecError>;
}

/// Runs commands as real subprocesses, blocking until exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ExecError> {
        tracing::debug!(program = %command.program, args = ?command.args, "running tool");
        let output = Command::new(&command.program)
            .args(&command.args)
            .output()
            .map_err(|source| ExecError::Launch {
                program: command.program.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(ExecError::Failed {
                program: command.program.clone(),
                status: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }
}

/// Records every command without executing anything, answering with a
/// fixed output per program name. Useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    commands: std::cell::RefCell<Vec<ToolCommand>>,
    outputs: std::collections::HashMap<String, ToolOutput>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        RecordingRunner::default()
    }

    /// Serve `output` for every invocation of `program`.
    pub fn with_output(mut self, program: impl Into<String>, output: ToolOutput) -> Self {
        self.outputs.insert(program.into(), output);
        self
    }

    /// All commands run so far, in order.
    pub fn commands(&self) -> Vec<ToolCommand> {
        self.commands.borrow().clone()
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ExecError> {
        self.commands.borrow_mut().push(command.clone());
        Ok(self
            .outputs
            .get(&command.program)
            .cloned()
            .unwrap_or_default())
    }
}
