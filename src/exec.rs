//! External command execution.
//!
//! The scaffolder shells out for three things: `npm` (install / test /
//! outdated), `git init`, and the docker presence probe. All of it goes
//! through the [`ProcessRunner`] trait so the orchestration layer is
//! testable without a working toolchain; [`SystemRunner`] is the real
//! implementation, [`ScriptedRunner`] the test double.
//!
//! Non-zero exit codes are reported to the user but do not abort the run —
//! by the time npm runs, the manifest and templates are already committed.

use std::collections::VecDeque;
use std::path::Path;
use std::process::Command;

use anyhow::{Context as _, Result};
use tracing::debug;

use crate::prompt::{Prompter, Status};

/// Error indicating a child process exited with a non-zero status.
/// Carries the exit code for the caller to propagate.
#[derive(Debug)]
pub struct ExitCodeError(pub i32);

impl std::fmt::Display for ExitCodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "command exited with code {}", self.0)
    }
}

impl std::error::Error for ExitCodeError {}

// ---------------------------------------------------------------------------
// ProcessRunner
// ---------------------------------------------------------------------------

/// Run external commands in a working directory. Returns the exit code;
/// failing to spawn at all is an error.
pub trait ProcessRunner {
    /// Run with inherited stdio, returning the exit code.
    fn run(&mut self, cwd: &Path, program: &str, args: &[&str]) -> Result<i32>;

    /// Run silently, capturing stdout. Returns (exit code, stdout).
    fn run_capture(&mut self, cwd: &Path, program: &str, args: &[&str]) -> Result<(i32, String)>;
}

/// Real process execution via `std::process::Command`.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&mut self, cwd: &Path, program: &str, args: &[&str]) -> Result<i32> {
        debug!(program, ?args, "running command");
        let status = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .status()
            .context(format!("failed to run '{program}'"))?;
        Ok(status.code().unwrap_or(1))
    }

    fn run_capture(&mut self, cwd: &Path, program: &str, args: &[&str]) -> Result<(i32, String)> {
        debug!(program, ?args, "running command (captured)");
        let out = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .context(format!("failed to run '{program}'"))?;
        Ok((
            out.status.code().unwrap_or(1),
            String::from_utf8_lossy(&out.stdout).into_owned(),
        ))
    }
}

/// Test double: records every invocation and replays queued results.
/// An empty queue answers exit code 0 with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    /// Every invocation as `"program arg1 arg2"`.
    pub calls: Vec<String>,
    /// Queued (exit code, stdout) results, consumed in order.
    pub results: VecDeque<(i32, String)>,
}

impl ScriptedRunner {
    #[must_use]
    pub fn new(results: Vec<(i32, String)>) -> Self {
        Self {
            calls: Vec::new(),
            results: results.into(),
        }
    }

    fn record(&mut self, program: &str, args: &[&str]) -> (i32, String) {
        self.calls.push(format!("{program} {}", args.join(" ")));
        self.results.pop_front().unwrap_or((0, String::new()))
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&mut self, _cwd: &Path, program: &str, args: &[&str]) -> Result<i32> {
        Ok(self.record(program, args).0)
    }

    fn run_capture(&mut self, _cwd: &Path, program: &str, args: &[&str]) -> Result<(i32, String)> {
        Ok(self.record(program, args))
    }
}

// ---------------------------------------------------------------------------
// npm / git / docker helpers
// ---------------------------------------------------------------------------

/// `npm install` in the project root. Non-zero exit is reported, not fatal.
pub fn npm_install(
    runner: &mut dyn ProcessRunner,
    root: &Path,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    prompter.report(Status::Info, "starting `npm install`");
    let code = runner.run(root, "npm", &["install"])?;
    if code == 0 {
        prompter.report(Status::Ok, "npm install done");
    } else {
        prompter.report(Status::Warn, &format!("npm exited with code {code}"));
    }
    Ok(())
}

/// `npm test` in the project root. Non-zero exit is reported, not fatal.
pub fn npm_test(
    runner: &mut dyn ProcessRunner,
    root: &Path,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    prompter.report(Status::Info, "running `npm test`");
    let code = runner.run(root, "npm", &["test"])?;
    if code == 0 {
        prompter.report(Status::Ok, "tests passed");
    } else {
        prompter.report(Status::Warn, &format!("npm test exited with code {code}"));
    }
    Ok(())
}

/// Install one package at an exact version, to the right dependency
/// section.
pub fn npm_install_package(
    runner: &mut dyn ProcessRunner,
    root: &Path,
    name: &str,
    version: &str,
    dev: bool,
) -> Result<i32> {
    let spec = format!("{name}@{version}");
    let save_flag = if dev { "--save-dev" } else { "--save" };
    runner.run(root, "npm", &["install", &spec, save_flag])
}

/// `git init` in the project root. A failure asks whether to continue;
/// declining aborts with the git exit code.
pub fn git_init(
    runner: &mut dyn ProcessRunner,
    root: &Path,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    prompter.report(Status::Info, "initializing git repository");
    let code = runner.run(root, "git", &["init"])?;
    if code != 0 {
        let proceed =
            prompter.confirm("Problem encountered initializing git repository, continue?", false)?;
        if !proceed {
            return Err(ExitCodeError(code).into());
        }
    }
    Ok(())
}

/// True when a `docker` executable is on the PATH.
pub fn docker_present(runner: &mut dyn ProcessRunner, root: &Path) -> bool {
    matches!(runner.run_capture(root, "which", &["docker"]), Ok((0, _)))
}
