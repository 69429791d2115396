use crate::error::{Result, TreekeeperError};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

/// One external command invocation: program, arguments, working directory
/// and any extra environment passed only to that subprocess.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new<P: AsRef<Path>>(program: impl Into<String>, cwd: P) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.as_ref().to_path_buf(),
            envs: Vec::new(),
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

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Rendering used in logs and error messages.
    pub fn display_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured result of a finished command. A non-zero exit is not an error
/// at this layer; callers decide what failure means for their step.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }

    pub fn stderr_trimmed(&self) -> String {
        self.stderr.trim().to_string()
    }
}

/// Capability for executing external commands. Production shells out;
/// tests substitute a scripted runner so no real process is spawned.
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Production runner backed by `std::process::Command`.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!("Executing: {}", spec.display_line());

        let output = Command::new(&spec.program)
            .current_dir(&spec.cwd)
            .args(&spec.args)
            .envs(spec.envs.iter().map(|(k, v)| (k, v)))
            .output()
            .map_err(|e| {
                TreekeeperError::Process(format!(
                    "Failed to execute '{}': {e}",
                    spec.display_line()
                ))
            })?;

        Ok(CommandOutput {
            status_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_line_joins_program_and_args() {
        let spec = CommandSpec::new("git", "/tmp").args(["status", "--porcelain"]);
        assert_eq!(spec.display_line(), "git status --porcelain");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_output_and_exit() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SystemRunner;

        let ok = runner
            .run(&CommandSpec::new("sh", dir.path()).args(["-c", "printf hello"]))
            .unwrap();
        assert!(ok.success());
        assert_eq!(ok.stdout, "hello");

        let failed = runner
            .run(&CommandSpec::new("sh", dir.path()).args(["-c", "echo oops >&2; exit 3"]))
            .unwrap();
        assert!(!failed.success());
        assert_eq!(failed.status_code, Some(3));
        assert_eq!(failed.stderr_trimmed(), "oops");
    }

    #[test]
    fn test_system_runner_reports_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SystemRunner;
        let err = runner
            .run(&CommandSpec::new("treekeeper-no-such-binary", dir.path()))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to execute"));
    }

    #[test]
    fn test_scripted_runner_replays_in_order() {
        use testing::ScriptedRunner;

        let runner = ScriptedRunner::new();
        runner.push_ok("first");
        runner.push_exit(1, "", "boom");

        let spec = CommandSpec::new("git", "/tmp").arg("status");
        assert_eq!(runner.run(&spec).unwrap().stdout, "first");
        let second = runner.run(&spec).unwrap();
        assert!(!second.success());
        assert_eq!(runner.call_lines(), vec!["git status", "git status"]);
    }
}
