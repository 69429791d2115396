use crate::item::ItemKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreekeeperError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Precondition check failed: {0}")]
    Precondition(String),

    #[error("Update delegate failed for '{name}': {message}")]
    DelegateUpdate { name: String, message: String },

    #[error("Docs regeneration failed: {0}")]
    DocsRegeneration(String),

    #[error("Formatting failed: {0}")]
    Format(String),

    #[error("Validation failed for '{name}': {message}")]
    Validation { name: String, message: String },

    #[error("Scope check failed: '{path}' is outside the {kind} allow-list")]
    ScopeViolation { kind: ItemKind, path: String },

    #[error("Commit step failed: {0}")]
    Commit(String),

    #[error("Publish failed for branch '{branch}': {message}")]
    Publish { branch: String, message: String },

    #[error("Auto-merge request failed: {0}")]
    AutoMerge(String),

    #[error("Process execution failed: {0}")]
    Process(String),

    #[error("Git operation failed: {0}")]
    GitOperation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TreekeeperError>;
