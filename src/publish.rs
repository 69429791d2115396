use crate::config::Config;
use crate::error::{Result, TreekeeperError};
use crate::item::{ItemKind, MatrixItem};
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Commit subject for one completed update; also the proposal title.
/// Pure in `(kind, name, current_version, new_version)` so re-runs
/// supersede instead of duplicating.
pub fn change_title(item: &MatrixItem, new_version: &str, lock_document: &str) -> String {
    match item.kind {
        ItemKind::Package => format!(
            "{}: {} -> {}",
            item.name, item.current_version, new_version
        ),
        ItemKind::PinnedReference => format!("{lock_document}: Update {}", item.name),
    }
}

/// Full commit message: subject, blank line, attribution trailer.
pub fn commit_message(
    item: &MatrixItem,
    new_version: &str,
    lock_document: &str,
    trailer: &str,
) -> String {
    format!("{}\n\n{trailer}", change_title(item, new_version, lock_document))
}

pub fn proposal_body(item: &MatrixItem, new_version: &str) -> String {
    match item.kind {
        ItemKind::Package => format!(
            "Automated update of package `{}`.\n\n\
             - Current version: `{}`\n\
             - New version: `{}`\n\n\
             The recipe was updated, the tree was reformatted, and the \
             package was built before this proposal was published.",
            item.name, item.current_version, new_version
        ),
        ItemKind::PinnedReference => format!(
            "Automated update of pinned reference `{}`.\n\n\
             - Current revision: `{}`\n\
             - New revision: `{}`\n\n\
             The lock document was re-locked for this input only.",
            item.name, item.current_version, new_version
        ),
    }
}

/// Everything the review system needs for one proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalDraft {
    pub branch: String,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Capability over the code-review system. At most one open proposal
/// exists per branch; publish is create-or-update, never a duplicate.
pub trait ProposalPublisher: Send + Sync {
    /// Number of the open proposal for the branch, if one exists.
    fn find_open(&self, branch: &str) -> Result<Option<u64>>;

    fn create(&self, draft: &ProposalDraft) -> Result<()>;

    /// Replaces title and body of an existing proposal and applies the
    /// labels.
    fn update(&self, number: u64, draft: &ProposalDraft) -> Result<()>;

    fn request_auto_merge(&self, branch: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct ProposalNumber {
    number: u64,
}

/// Production publisher shelling out to the `gh` CLI. The credential is
/// passed only in the subprocess environment.
pub struct GhPublisher {
    runner: Arc<dyn CommandRunner>,
    repo_root: PathBuf,
    token: String,
}

impl GhPublisher {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &Config) -> Result<Self> {
        let token = config.require_token()?.to_string();
        Ok(GhPublisher {
            runner,
            repo_root: config.repo_root.clone(),
            token,
        })
    }

    fn run_gh(&self, args: &[&str]) -> Result<CommandOutput> {
        let spec = CommandSpec::new("gh", &self.repo_root)
            .args(args.iter().copied())
            .env("GH_TOKEN", &self.token);
        self.runner.run(&spec)
    }

    fn publish_error(
        branch: &str,
        context: &str,
        detail: impl std::fmt::Display,
    ) -> TreekeeperError {
        TreekeeperError::Publish {
            branch: branch.to_string(),
            message: format!("{context}: {detail}"),
        }
    }
}

impl ProposalPublisher for GhPublisher {
    fn find_open(&self, branch: &str) -> Result<Option<u64>> {
        let output = self
            .run_gh(&["pr", "list", "--head", branch, "--state", "open", "--json", "number"])
            .map_err(|e| Self::publish_error(branch, "proposal lookup", e))?;

        if !output.success() {
            return Err(Self::publish_error(
                branch,
                "proposal lookup",
                output.stderr_trimmed(),
            ));
        }

        let proposals: Vec<ProposalNumber> = serde_json::from_str(&output.stdout)
            .map_err(|e| Self::publish_error(branch, "proposal lookup payload", e))?;
        Ok(proposals.first().map(|proposal| proposal.number))
    }

    fn create(&self, draft: &ProposalDraft) -> Result<()> {
        let mut args: Vec<&str> = vec![
            "pr", "create", "--head", &draft.branch, "--title", &draft.title, "--body",
            &draft.body,
        ];
        for label in &draft.labels {
            args.push("--label");
            args.push(label);
        }

        let output = self
            .run_gh(&args)
            .map_err(|e| Self::publish_error(&draft.branch, "proposal create", e))?;
        if !output.success() {
            return Err(Self::publish_error(
                &draft.branch,
                "proposal create",
                output.stderr_trimmed(),
            ));
        }
        Ok(())
    }

    fn update(&self, number: u64, draft: &ProposalDraft) -> Result<()> {
        let number = number.to_string();
        let mut args: Vec<&str> = vec![
            "pr", "edit", number.as_str(), "--title", &draft.title, "--body", &draft.body,
        ];
        for label in &draft.labels {
            args.push("--add-label");
            args.push(label);
        }

        let output = self
            .run_gh(&args)
            .map_err(|e| Self::publish_error(&draft.branch, "proposal update", e))?;
        if !output.success() {
            return Err(Self::publish_error(
                &draft.branch,
                "proposal update",
                output.stderr_trimmed(),
            ));
        }
        Ok(())
    }

    fn request_auto_merge(&self, branch: &str) -> Result<()> {
        let output = self
            .run_gh(&["pr", "merge", "--auto", "--squash", branch])
            .map_err(|e| TreekeeperError::AutoMerge(e.to_string()))?;
        if !output.success() {
            return Err(TreekeeperError::AutoMerge(format!(
                "'gh pr merge' failed for {branch}: {}",
                output.stderr_trimmed()
            )));
        }
        Ok(())
    }
}
