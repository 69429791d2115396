use crate::item::ItemKind;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "treekeeper",
    about = "Keeps packaged recipes and pinned references up to date",
    version,
    author
)]
pub struct Cli {
    /// Path to the repository root (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    pub path: String,

    /// Target platform to evaluate and build for (e.g. x86_64-linux)
    #[arg(long, global = true, value_name = "PLATFORM")]
    pub platform: Option<String>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enumerate updatable items and emit them as a work matrix
    Discover {
        /// Restrict packages to these names (whitespace separated)
        #[arg(long, value_name = "NAMES")]
        packages: Option<String>,

        /// Restrict pinned references to these names (whitespace separated)
        #[arg(long, value_name = "NAMES")]
        pins: Option<String>,
    },

    /// Run the update pipeline for a single discovered item
    Update {
        /// Kind of item to update
        #[arg(value_enum)]
        kind: ItemKind,

        /// Name of the item, as discovered
        #[arg(value_name = "NAME")]
        name: String,

        /// Version or short revision currently recorded in the tree
        #[arg(value_name = "CURRENT_VERSION")]
        current_version: String,
    },
}
