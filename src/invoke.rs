//! External-tool invocation.
//!
//! Every subprocess the harness runs goes through one capability interface:
//! run a program with an argument list, optionally redirecting captured
//! stdout into a named artifact. The variable calling conventions of the
//! individual tools (ELF input for LLVM objdump, raw bytes for the others)
//! live entirely in the pipeline; implementations of [`ToolInvoker`] only see
//! a uniform [`Invocation`]. Tests substitute a fake implementation.

use crate::error::{DifftestError, Result};
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// One external-tool run: program, arguments, and optional stdout capture.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Short tool name used in logs and error messages.
    pub tool: &'static str,
    /// Program to execute.
    pub program: PathBuf,
    /// Argument list, in order.
    pub args: Vec<OsString>,
    /// Artifact file receiving the tool's stdout, if any.
    pub stdout_to: Option<PathBuf>,
}

impl Invocation {
    /// Start building an invocation of `program`.
    pub fn new(tool: &'static str, program: impl Into<PathBuf>) -> Self {
        Invocation {
            tool,
            program: program.into(),
            args: Vec::new(),
            stdout_to: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Redirect the tool's stdout into `path`.
    pub fn capture(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_to = Some(path.into());
        self
    }
}

/// Capability to run an external tool to completion.
///
/// Implementations must be shareable across worker threads.
pub trait ToolInvoker: Sync {
    /// Run the tool, blocking until it exits, and return its exit code.
    ///
    /// A launch failure (program not found, not executable) is an error;
    /// a non-zero exit code is not — callers decide which codes are
    /// acceptable, since GNU diff reports "inputs differ" as exit 1.
    fn run(&self, invocation: &Invocation) -> Result<i32>;
}

/// Run a tool and require its exit code to be one of `ok_codes`.
pub fn run_expecting(
    invoker: &dyn ToolInvoker,
    invocation: &Invocation,
    ok_codes: &[i32],
) -> Result<()> {
    let code = invoker.run(invocation)?;
    if ok_codes.contains(&code) {
        Ok(())
    } else {
        Err(DifftestError::ToolFailed {
            tool: invocation.tool.to_string(),
            status: format!("exit code {code}"),
        })
    }
}

/// Run a tool and require a zero exit code.
pub fn run_checked(invoker: &dyn ToolInvoker, invocation: &Invocation) -> Result<()> {
    run_expecting(invoker, invocation, &[0])
}

/// [`ToolInvoker`] backed by real subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

impl ToolInvoker for ProcessInvoker {
    fn run(&self, invocation: &Invocation) -> Result<i32> {
        debug!(
            tool = invocation.tool,
            program = %invocation.program.display(),
            args = ?invocation.args,
            "running external tool"
        );

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(path) = &invocation.stdout_to {
            let artifact = File::create(path)?;
            command.stdout(Stdio::from(artifact));
        }

        let status = command
            .status()
            .map_err(|source| DifftestError::ToolLaunch {
                tool: invocation.tool.to_string(),
                source,
            })?;

        // A signal-terminated child has no code; report it as a failure code.
        Ok(status.code().unwrap_or(-1))
    }
}

/// Require that a tool left its expected output file behind.
pub fn require_artifact(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(DifftestError::missing(path))
    }
}
