use crate::error::{Result, TreekeeperError};
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use std::path::PathBuf;
use std::sync::Arc;

/// VCS state of one checkout. Exactly one orchestrator run may hold a
/// working tree at a time; the clean-tree precondition and path diffing
/// are only correct under that exclusivity.
pub trait WorkingTree: Send + Sync {
    /// True when nothing differs from the committed state, untracked
    /// files included.
    fn is_clean(&self) -> Result<bool>;

    /// Every changed and untracked path, repository-relative.
    fn changed_paths(&self) -> Result<Vec<String>>;

    /// Creates or resets the branch and switches to it.
    fn switch_branch(&self, branch: &str) -> Result<()>;

    fn stage(&self, paths: &[String]) -> Result<()>;

    /// Paths currently staged for commit.
    fn staged_paths(&self) -> Result<Vec<String>>;

    fn commit(&self, message: &str) -> Result<()>;

    fn push_force(&self, branch: &str) -> Result<()>;
}

/// Production working tree shelling out to git.
pub struct GitWorkingTree {
    runner: Arc<dyn CommandRunner>,
    repo_root: PathBuf,
}

impl GitWorkingTree {
    pub fn new(runner: Arc<dyn CommandRunner>, repo_root: impl Into<PathBuf>) -> Self {
        GitWorkingTree {
            runner,
            repo_root: repo_root.into(),
        }
    }

    fn run_git(&self, args: &[&str]) -> Result<CommandOutput> {
        let spec = CommandSpec::new("git", &self.repo_root).args(args.iter().copied());
        self.runner.run(&spec).map_err(|e| {
            TreekeeperError::GitOperation(format!(
                "Failed to execute git {}: {e}",
                args.join(" ")
            ))
        })
    }

    fn ensure_success(output: &CommandOutput, command: &str) -> Result<()> {
        if output.success() {
            return Ok(());
        }
        Err(TreekeeperError::GitOperation(format!(
            "{command} failed: {}",
            output.stderr_trimmed()
        )))
    }

    fn status_porcelain(&self) -> Result<String> {
        let output = self.run_git(&["status", "--porcelain"])?;
        Self::ensure_success(&output, "git status")?;
        Ok(output.stdout)
    }
}

/// Parses `git status --porcelain` output into paths. Rename entries
/// contribute the new path; C-quoted entries are unquoted so the scope
/// check and `git add` see the path as it exists on disk.
fn parse_porcelain(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| {
            let path = &line[3..];
            let path = match path.split_once(" -> ") {
                Some((_, renamed_to)) => renamed_to,
                None => path,
            };
            unquote_c_style(path)
        })
        .collect()
}

/// Undoes the C-style quoting git applies to paths with special bytes,
/// e.g. `"h\303\251llo.nix"`. Unquoted paths pass through unchanged.
fn unquote_c_style(path: &str) -> String {
    let inner = match path.strip_prefix('"').and_then(|p| p.strip_suffix('"')) {
        Some(inner) => inner.as_bytes(),
        None => return path.to_string(),
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut i = 0;
    while i < inner.len() {
        let byte = inner[i];
        i += 1;
        if byte != b'\\' || i >= inner.len() {
            bytes.push(byte);
            continue;
        }
        let escape = inner[i];
        i += 1;
        match escape {
            b'a' => bytes.push(0x07),
            b'b' => bytes.push(0x08),
            b'f' => bytes.push(0x0c),
            b'n' => bytes.push(b'\n'),
            b'r' => bytes.push(b'\r'),
            b't' => bytes.push(b'\t'),
            b'v' => bytes.push(0x0b),
            b'0'..=b'7' => {
                let mut value = u32::from(escape - b'0');
                let mut digits = 1;
                while digits < 3 && i < inner.len() && matches!(inner[i], b'0'..=b'7') {
                    value = value * 8 + u32::from(inner[i] - b'0');
                    i += 1;
                    digits += 1;
                }
                bytes.push(value as u8);
            }
            other => bytes.push(other),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

impl WorkingTree for GitWorkingTree {
    fn is_clean(&self) -> Result<bool> {
        Ok(self.status_porcelain()?.is_empty())
    }

    fn changed_paths(&self) -> Result<Vec<String>> {
        Ok(parse_porcelain(&self.status_porcelain()?))
    }

    fn switch_branch(&self, branch: &str) -> Result<()> {
        let output = self.run_git(&["checkout", "-B", branch])?;
        Self::ensure_success(&output, "git checkout -B")
    }

    fn stage(&self, paths: &[String]) -> Result<()> {
        let mut args: Vec<&str> = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));
        let output = self.run_git(&args)?;
        Self::ensure_success(&output, "git add")
    }

    fn staged_paths(&self) -> Result<Vec<String>> {
        let output = self.run_git(&["diff", "--cached", "--name-only"])?;
        Self::ensure_success(&output, "git diff --cached")?;
        Ok(output
            .stdout
            .lines()
            .filter(|line| !line.is_empty())
            .map(unquote_c_style)
            .collect())
    }

    fn commit(&self, message: &str) -> Result<()> {
        let output = self.run_git(&["commit", "-m", message])?;
        Self::ensure_success(&output, "git commit")
    }

    fn push_force(&self, branch: &str) -> Result<()> {
        let output = self.run_git(&["push", "--force", "--set-upstream", "origin", branch])?;
        Self::ensure_success(&output, "git push")
    }
}
