mod cli;
mod config;
mod discovery;
mod docs;
mod error;
mod format;
mod index;
mod item;
mod lock;
mod orchestrator;
mod process;
mod publish;
mod scope;
mod updaters;
mod validate;
mod version;
mod worktree;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use config::Config;
use discovery::CandidateDiscovery;
use docs::MarkerDocs;
use error::Result;
use format::CommandFormatter;
use index::NixIndex;
use item::{ItemKind, MatrixItem};
use orchestrator::{RunOutcome, UpdateOrchestrator};
use process::{CommandRunner, SystemRunner};
use publish::GhPublisher;
use scope::ConfigScopeSource;
use std::sync::Arc;
use updaters::{PackageUpdater, PinnedUpdater, UpdaterSet};
use validate::NixValidator;
use worktree::GitWorkingTree;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = match cli.command {
        Commands::Discover { ref packages, ref pins } => {
            execute_discover(&cli, packages.as_deref(), pins.as_deref())
        }
        Commands::Update {
            kind,
            ref name,
            ref current_version,
        } => execute_update(&cli, kind, name, current_version),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn execute_discover(
    cli: &Cli,
    package_filter: Option<&str>,
    pinned_filter: Option<&str>,
) -> Result<()> {
    let config = Config::load(&cli.path)?.with_platform(cli.platform.clone());

    let runner = Arc::new(SystemRunner);
    let index = NixIndex::new(runner, &config.repo_root);

    let matrix = CandidateDiscovery::new(&index, &config).discover(package_filter, pinned_filter);
    matrix.emit(config.results_path.as_deref())
}

fn execute_update(cli: &Cli, kind: ItemKind, name: &str, current_version: &str) -> Result<()> {
    let config = Config::load(&cli.path)?.with_platform(cli.platform.clone());
    let item = MatrixItem::new(kind, name, current_version);

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);

    // The publisher is built first so a missing credential fails the run
    // before anything touches the tree.
    let publisher = GhPublisher::new(runner.clone(), &config)?;

    let tree = GitWorkingTree::new(runner.clone(), &config.repo_root);
    let package_updater = PackageUpdater::new(runner.clone(), &config.repo_root);
    let pinned_updater = PinnedUpdater::new(
        runner.clone(),
        &config.repo_root,
        config.lock_document.clone(),
    );
    let index = Arc::new(NixIndex::new(runner.clone(), &config.repo_root));
    let docs = MarkerDocs::new(index, &config);
    let formatter = CommandFormatter::new(runner.clone(), &config)?;
    let validator = NixValidator::new(runner, &config);
    let scopes = ConfigScopeSource::from_config(&config);

    let orchestrator = UpdateOrchestrator::new(
        &config,
        &tree,
        UpdaterSet::new(&package_updater, &pinned_updater),
        &docs,
        &formatter,
        &validator,
        &scopes,
        &publisher,
    );

    match orchestrator.run(&item)? {
        RunOutcome::Published { branch, title, .. } => {
            log::info!("Published '{title}' from branch '{branch}'");
        }
        RunOutcome::NoChanges { after } => {
            log::info!("Nothing to publish for '{name}' (stopped at the {after} state)");
        }
    }
    Ok(())
}
