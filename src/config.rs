use crate::error::{Result, TreekeeperError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_PLATFORM: &str = "x86_64-linux";

const CONFIG_FILE: &str = "treekeeper.toml";
const DEFAULT_LABELS: &str = "dependencies,automated";
const DEFAULT_LOCK_DOCUMENT: &str = "flake.lock";
const DEFAULT_DOCS_DOCUMENT: &str = "README.md";
const DEFAULT_BEGIN_MARKER: &str = "<!-- BEGIN GENERATED PACKAGES -->";
const DEFAULT_END_MARKER: &str = "<!-- END GENERATED PACKAGES -->";
const DEFAULT_COMMIT_TRAILER: &str = "Automated-by: treekeeper";

/// Resolved, immutable run configuration. Built once at startup and
/// threaded through construction; nothing else reads the environment.
/// Precedence per value: CLI flag, then environment, then `treekeeper.toml`
/// at the repository root, then the built-in default.
#[derive(Debug, Clone)]
pub struct Config {
    pub repo_root: PathBuf,
    pub platform: String,
    pub labels: Vec<String>,
    pub auto_merge: bool,
    pub token: Option<String>,
    pub results_path: Option<PathBuf>,
    pub lock_document: String,
    pub formatter: Vec<String>,
    pub commit_trailer: String,
    pub docs_document: String,
    pub docs_begin_marker: String,
    pub docs_end_marker: String,
    pub package_scope: Vec<String>,
    pub pinned_scope: Vec<String>,
}

/// Optional file-backed settings; every field falls back to a default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub platform: Option<String>,
    pub labels: Option<Vec<String>>,
    pub auto_merge: Option<bool>,
    pub lock_document: Option<String>,
    pub formatter: Option<Vec<String>>,
    pub commit_trailer: Option<String>,
    pub docs: Option<DocsFileConfig>,
    pub scope: Option<ScopeFileConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocsFileConfig {
    pub document: Option<String>,
    pub begin_marker: Option<String>,
    pub end_marker: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopeFileConfig {
    pub package: Option<Vec<String>>,
    pub pinned_reference: Option<Vec<String>>,
}

impl FileConfig {
    fn read(repo_root: &Path) -> Result<Self> {
        let path = repo_root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(FileConfig::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Environment values captured in one place at startup.
#[derive(Debug, Clone, Default)]
struct EnvSnapshot {
    platform: Option<String>,
    labels: Option<String>,
    auto_merge: Option<String>,
    token: Option<String>,
    results_path: Option<String>,
}

impl EnvSnapshot {
    fn capture() -> Self {
        EnvSnapshot {
            platform: std::env::var("TREEKEEPER_PLATFORM").ok(),
            labels: std::env::var("TREEKEEPER_LABELS").ok(),
            auto_merge: std::env::var("TREEKEEPER_AUTO_MERGE").ok(),
            token: std::env::var("TREEKEEPER_TOKEN")
                .or_else(|_| std::env::var("GITHUB_TOKEN"))
                .ok(),
            results_path: std::env::var("GITHUB_OUTPUT").ok(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(repo_root: P) -> Result<Self> {
        let repo_root = repo_root.as_ref().to_path_buf();
        let file = FileConfig::read(&repo_root)?;
        Self::resolve(repo_root, file, EnvSnapshot::capture())
    }

    fn resolve(repo_root: PathBuf, file: FileConfig, env: EnvSnapshot) -> Result<Self> {
        let platform = env
            .platform
            .or(file.platform)
            .unwrap_or_else(|| DEFAULT_PLATFORM.to_string());

        let labels = match env.labels {
            Some(raw) => parse_label_list(&raw),
            None => file
                .labels
                .unwrap_or_else(|| parse_label_list(DEFAULT_LABELS)),
        };

        let auto_merge = match env.auto_merge {
            Some(raw) => parse_bool(&raw),
            None => file.auto_merge.unwrap_or(false),
        };

        let docs = file.docs.unwrap_or_default();
        let docs_document = docs
            .document
            .unwrap_or_else(|| DEFAULT_DOCS_DOCUMENT.to_string());
        let lock_document = file
            .lock_document
            .unwrap_or_else(|| DEFAULT_LOCK_DOCUMENT.to_string());

        let scope = file.scope.unwrap_or_default();
        let package_scope = scope
            .package
            .unwrap_or_else(|| vec!["packages/*".to_string(), docs_document.clone()]);
        let pinned_scope = scope
            .pinned_reference
            .unwrap_or_else(|| vec![lock_document.clone()]);

        Ok(Config {
            repo_root,
            platform,
            labels,
            auto_merge,
            token: env.token,
            results_path: env.results_path.map(PathBuf::from),
            lock_document,
            formatter: file
                .formatter
                .unwrap_or_else(|| vec!["nix".to_string(), "fmt".to_string()]),
            commit_trailer: file
                .commit_trailer
                .unwrap_or_else(|| DEFAULT_COMMIT_TRAILER.to_string()),
            docs_document,
            docs_begin_marker: docs
                .begin_marker
                .unwrap_or_else(|| DEFAULT_BEGIN_MARKER.to_string()),
            docs_end_marker: docs
                .end_marker
                .unwrap_or_else(|| DEFAULT_END_MARKER.to_string()),
            package_scope,
            pinned_scope,
        })
    }

    pub fn with_platform(mut self, platform: Option<String>) -> Self {
        if let Some(platform) = platform {
            self.platform = platform;
        }
        self
    }

    /// The access credential, required before any mutating run.
    pub fn require_token(&self) -> Result<&str> {
        self.token.as_deref().ok_or_else(|| {
            TreekeeperError::Configuration(
                "Access credential is not set; export TREEKEEPER_TOKEN or GITHUB_TOKEN"
                    .to_string(),
            )
        })
    }

    pub fn lock_path(&self) -> PathBuf {
        self.repo_root.join(&self.lock_document)
    }

    pub fn docs_path(&self) -> PathBuf {
        self.repo_root.join(&self.docs_document)
    }
}

fn parse_label_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
