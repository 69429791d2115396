use crate::config::Config;
use crate::docs::DocsRegenerator;
use crate::error::{Result, TreekeeperError};
use crate::format::Formatter;
use crate::item::{ItemKind, MatrixItem};
use crate::publish::{
    ProposalDraft, ProposalPublisher, change_title, commit_message, proposal_body,
};
use crate::scope::ScopeSource;
use crate::updaters::UpdaterSet;
use crate::validate::Validator;
use crate::version;
use crate::worktree::WorkingTree;
use colored::Colorize;
use log::{debug, info, warn};
use std::fmt;

const UNKNOWN_VERSION: &str = "unknown";

/// Pipeline states in execution order. Each run walks them front to back;
/// the two diff states are the only legitimate early exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    PreconditionChecked,
    Updated,
    DiffChecked,
    DocsRegenerated,
    Formatted,
    DiffCheckedAgain,
    VersionResolved,
    Validated,
    ScopeChecked,
    Committed,
    Published,
    AutoMergeRequested,
}

impl PipelineState {
    fn step(self) -> usize {
        self as usize + 1
    }

    fn banner(self) -> String {
        let action = match self {
            PipelineState::PreconditionChecked => "Checking the working tree",
            PipelineState::Updated => "Applying the update",
            PipelineState::DiffChecked => "Checking for changes",
            PipelineState::DocsRegenerated => "Regenerating documentation",
            PipelineState::Formatted => "Formatting the tree",
            PipelineState::DiffCheckedAgain => "Re-checking for changes",
            PipelineState::VersionResolved => "Resolving the new version",
            PipelineState::Validated => "Validating the updated tree",
            PipelineState::ScopeChecked => "Checking the change scope",
            PipelineState::Committed => "Committing to the update branch",
            PipelineState::Published => "Publishing the change proposal",
            PipelineState::AutoMergeRequested => "Requesting auto-merge",
        };
        format!("{}. {}...", self.step(), action)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::PreconditionChecked => "precondition check",
            PipelineState::Updated => "update",
            PipelineState::DiffChecked => "diff check",
            PipelineState::DocsRegenerated => "docs regeneration",
            PipelineState::Formatted => "formatting",
            PipelineState::DiffCheckedAgain => "post-format diff check",
            PipelineState::VersionResolved => "version resolution",
            PipelineState::Validated => "validation",
            PipelineState::ScopeChecked => "scope check",
            PipelineState::Committed => "commit",
            PipelineState::Published => "publish",
            PipelineState::AutoMergeRequested => "auto-merge request",
        };
        f.write_str(name)
    }
}

/// Terminal outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The change was committed, pushed and published for review.
    Published {
        branch: String,
        title: String,
        auto_merge_requested: bool,
    },
    /// The run ended early with nothing to publish.
    NoChanges { after: PipelineState },
}

/// Drives one item through the update pipeline. One instance processes
/// exactly one item against one working tree; runs sharing a tree must
/// not overlap, or the clean-tree precondition and path diffing break.
///
/// Every external effect goes through an injected capability, so the
/// pipeline itself never spawns a process.
pub struct UpdateOrchestrator<'a> {
    config: &'a Config,
    tree: &'a dyn WorkingTree,
    updaters: UpdaterSet<'a>,
    docs: &'a dyn DocsRegenerator,
    formatter: &'a dyn Formatter,
    validator: &'a dyn Validator,
    scopes: &'a dyn ScopeSource,
    publisher: &'a dyn ProposalPublisher,
}

impl<'a> UpdateOrchestrator<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &'a Config,
        tree: &'a dyn WorkingTree,
        updaters: UpdaterSet<'a>,
        docs: &'a dyn DocsRegenerator,
        formatter: &'a dyn Formatter,
        validator: &'a dyn Validator,
        scopes: &'a dyn ScopeSource,
        publisher: &'a dyn ProposalPublisher,
    ) -> Self {
        UpdateOrchestrator {
            config,
            tree,
            updaters,
            docs,
            formatter,
            validator,
            scopes,
            publisher,
        }
    }

    fn enter(&self, state: PipelineState) {
        println!("\n{}", state.banner().yellow());
    }

    pub fn run(&self, item: &MatrixItem) -> Result<RunOutcome> {
        println!("{}", format!("Starting update for {item}...").cyan().bold());

        self.enter(PipelineState::PreconditionChecked);
        let clean = self.tree.is_clean().map_err(|e| {
            TreekeeperError::Precondition(format!("Unable to read working tree status: {e}"))
        })?;
        if !clean {
            return Err(TreekeeperError::Precondition(
                "Working tree has uncommitted changes".to_string(),
            ));
        }
        println!("{}", "✓ Working tree is clean".green());

        self.enter(PipelineState::Updated);
        self.updaters
            .for_kind(item.kind)
            .apply(item, &self.config.platform)?;
        println!("{}", "✓ Update step completed".green());

        self.enter(PipelineState::DiffChecked);
        if self.tree.changed_paths()?.is_empty() {
            info!("Run for '{}' ended at the {} state", item.name, PipelineState::DiffChecked);
            println!("\n{}", "No changes detected; the tree is already up to date".yellow());
            return Ok(RunOutcome::NoChanges {
                after: PipelineState::DiffChecked,
            });
        }
        println!("{}", "✓ Tree has pending changes".green());

        self.enter(PipelineState::DocsRegenerated);
        self.docs.regenerate()?;
        println!("{}", "✓ Documentation regenerated".green());

        self.enter(PipelineState::Formatted);
        self.formatter.format_tree()?;
        println!("{}", "✓ Tree formatted".green());

        self.enter(PipelineState::DiffCheckedAgain);
        if self.tree.changed_paths()?.is_empty() {
            info!(
                "Run for '{}' ended at the {} state",
                item.name,
                PipelineState::DiffCheckedAgain
            );
            println!("\n{}", "Formatting cancelled the change; nothing to publish".yellow());
            return Ok(RunOutcome::NoChanges {
                after: PipelineState::DiffCheckedAgain,
            });
        }
        println!("{}", "✓ Changes survive formatting".green());

        self.enter(PipelineState::VersionResolved);
        let new_version = match self
            .updaters
            .for_kind(item.kind)
            .resolved_version(item, &self.config.platform)
        {
            Some(version) => {
                println!("{}", format!("✓ New version: {version}").green());
                version
            }
            None => {
                println!(
                    "{}",
                    format!("⚠ New version could not be resolved, reporting '{UNKNOWN_VERSION}'")
                        .yellow()
                );
                UNKNOWN_VERSION.to_string()
            }
        };
        // Revisions are not ordered, so the downgrade warning only makes
        // sense for package versions.
        if item.kind == ItemKind::Package
            && new_version != UNKNOWN_VERSION
            && !version::should_update(&item.current_version, &new_version)
        {
            warn!(
                "Resolved version '{new_version}' for '{}' does not supersede '{}'",
                item.name, item.current_version
            );
        }

        self.enter(PipelineState::Validated);
        self.validator.validate(item)?;
        println!("{}", "✓ Validation passed".green());

        self.enter(PipelineState::ScopeChecked);
        let scope = self.scopes.allowlist(item.kind)?;
        debug!(
            "Allowed patterns for {}: {:?}",
            scope.kind(),
            scope.pattern_list()
        );
        let changed = self.tree.changed_paths()?;
        scope.check_paths(&changed)?;
        println!(
            "{}",
            format!("✓ {} path(s) within the {} scope", changed.len(), item.kind).green()
        );

        let branch = item.branch_name();
        let title = change_title(item, &new_version, &self.config.lock_document);

        self.enter(PipelineState::Committed);
        self.commit_changes(item, &branch, &changed, &new_version)?;
        println!(
            "{}",
            format!("✓ Changes committed and pushed to branch: {branch}").green()
        );

        self.enter(PipelineState::Published);
        let draft = ProposalDraft {
            branch: branch.clone(),
            title: title.clone(),
            body: proposal_body(item, &new_version),
            labels: self.config.labels.clone(),
        };
        match self.publisher.find_open(&branch)? {
            Some(number) => {
                self.publisher.update(number, &draft)?;
                println!("{}", format!("✓ Proposal #{number} updated in place").green());
            }
            None => {
                self.publisher.create(&draft)?;
                println!("{}", "✓ Proposal created".green());
            }
        }

        let mut auto_merge_requested = false;
        if self.config.auto_merge {
            self.enter(PipelineState::AutoMergeRequested);
            match self.publisher.request_auto_merge(&branch) {
                Ok(()) => {
                    auto_merge_requested = true;
                    println!("{}", "✓ Auto-merge requested".green());
                }
                Err(e) => {
                    warn!("{e}");
                    println!("{}", format!("⚠ {e}").yellow());
                }
            }
        }

        println!(
            "\n{}",
            "✨ Update proposal is ready for review!".green().bold()
        );
        Ok(RunOutcome::Published {
            branch,
            title,
            auto_merge_requested,
        })
    }

    /// Branch, stage, verify, commit, push. Only the paths that passed
    /// the scope check get staged; an empty stage afterwards means the
    /// diff and the index disagree, which is never committed.
    fn commit_changes(
        &self,
        item: &MatrixItem,
        branch: &str,
        paths: &[String],
        new_version: &str,
    ) -> Result<()> {
        self.tree.switch_branch(branch).map_err(commit_failure)?;
        self.tree.stage(paths).map_err(commit_failure)?;

        let staged = self.tree.staged_paths().map_err(commit_failure)?;
        if staged.is_empty() {
            return Err(TreekeeperError::Commit(
                "Nothing is staged after the scope check".to_string(),
            ));
        }

        let message = commit_message(
            item,
            new_version,
            &self.config.lock_document,
            &self.config.commit_trailer,
        );
        self.tree.commit(&message).map_err(commit_failure)?;
        self.tree.push_force(branch).map_err(commit_failure)
    }
}

fn commit_failure(e: TreekeeperError) -> TreekeeperError {
    TreekeeperError::Commit(e.to_string())
}
