use crate::config::Config;
use crate::error::{Result, TreekeeperError};
use crate::process::{CommandRunner, CommandSpec};
use std::path::PathBuf;
use std::sync::Arc;

/// Normalizes the tree after an update so formatting noise never reaches
/// review.
pub trait Formatter: Send + Sync {
    fn format_tree(&self) -> Result<()>;
}

/// Production formatter running the configured argv at the repo root.
pub struct CommandFormatter {
    runner: Arc<dyn CommandRunner>,
    repo_root: PathBuf,
    argv: Vec<String>,
}

impl CommandFormatter {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &Config) -> Result<Self> {
        if config.formatter.is_empty() {
            return Err(TreekeeperError::Configuration(
                "Formatter command is empty".to_string(),
            ));
        }
        Ok(CommandFormatter {
            runner,
            repo_root: config.repo_root.clone(),
            argv: config.formatter.clone(),
        })
    }
}

impl Formatter for CommandFormatter {
    fn format_tree(&self) -> Result<()> {
        let spec = CommandSpec::new(&self.argv[0], &self.repo_root)
            .args(self.argv[1..].iter().cloned());

        let output = self
            .runner
            .run(&spec)
            .map_err(|e| TreekeeperError::Format(e.to_string()))?;

        if !output.success() {
            return Err(TreekeeperError::Format(format!(
                "'{}' failed: {}",
                spec.display_line(),
                output.stderr_trimmed()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::testing::config_at;
    use crate::process::testing::ScriptedRunner;

    #[test]
    fn test_runs_configured_argv() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_ok("");

        let config = config_at("/repo");
        let formatter = CommandFormatter::new(runner.clone(), &config).unwrap();
        formatter.format_tree().unwrap();

        assert_eq!(runner.call_lines(), vec!["nix fmt"]);
        assert_eq!(runner.call_specs()[0].cwd, PathBuf::from("/repo"));
    }

    #[test]
    fn test_nonzero_exit_is_a_format_error() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_exit(1, "", "syntax error at packages/foo/default.nix");

        let config = config_at("/repo");
        let formatter = CommandFormatter::new(runner, &config).unwrap();
        let err = formatter.format_tree().unwrap_err();
        assert!(matches!(err, TreekeeperError::Format(_)));
        assert!(err.to_string().contains("syntax error"));
    }

    #[test]
    fn test_empty_formatter_command_is_rejected() {
        let runner = Arc::new(ScriptedRunner::new());
        let mut config = config_at("/repo");
        config.formatter.clear();

        assert!(CommandFormatter::new(runner, &config).is_err());
    }
}
