use crate::config::Config;
use crate::error::{Result, TreekeeperError};
use crate::item::ItemKind;
use regex::Regex;

/// Allow-list of path patterns one item kind is permitted to touch.
/// Patterns are glob style: `*` spans any run of characters including `/`,
/// `?` matches one character. Matching is anchored and case-sensitive.
#[derive(Debug)]
pub struct ChangeScope {
    kind: ItemKind,
    patterns: Vec<CompiledPattern>,
}

#[derive(Debug)]
struct CompiledPattern {
    raw: String,
    regex: Regex,
}

impl ChangeScope {
    pub fn new(kind: ItemKind, patterns: &[String]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            compiled.push(CompiledPattern {
                raw: pattern.clone(),
                regex: compile_glob(pattern)?,
            });
        }
        Ok(ChangeScope {
            kind,
            patterns: compiled,
        })
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn permits(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.regex.is_match(path))
    }

    /// Verifies every path is allow-listed; the first offender aborts.
    pub fn check_paths(&self, paths: &[String]) -> Result<()> {
        for path in paths {
            if !self.permits(path) {
                return Err(TreekeeperError::ScopeViolation {
                    kind: self.kind,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn pattern_list(&self) -> Vec<&str> {
        self.patterns.iter().map(|pattern| pattern.raw.as_str()).collect()
    }
}

fn compile_glob(pattern: &str) -> Result<Regex> {
    let trimmed = pattern.trim();
    if trimmed.is_empty() {
        return Err(TreekeeperError::Configuration(
            "Scope pattern cannot be empty".to_string(),
        ));
    }

    let mut regex = String::from("^");
    for ch in trimmed.chars() {
        match ch {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            '.' | '+' | '(' | ')' | '|' | '^' | '$' | '{' | '}' | '[' | ']' | '\\' => {
                regex.push('\\');
                regex.push(ch);
            }
            _ => regex.push(ch),
        }
    }
    regex.push('$');

    Regex::new(&regex).map_err(|e| {
        TreekeeperError::Configuration(format!("Invalid scope pattern '{pattern}': {e}"))
    })
}

/// Provides the allow-list for each item kind.
pub trait ScopeSource: Send + Sync {
    fn allowlist(&self, kind: ItemKind) -> Result<ChangeScope>;
}

/// Scope source backed by the run configuration.
pub struct ConfigScopeSource {
    package_patterns: Vec<String>,
    pinned_patterns: Vec<String>,
}

impl ConfigScopeSource {
    pub fn new(package_patterns: Vec<String>, pinned_patterns: Vec<String>) -> Self {
        ConfigScopeSource {
            package_patterns,
            pinned_patterns,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.package_scope.clone(), config.pinned_scope.clone())
    }
}

impl ScopeSource for ConfigScopeSource {
    fn allowlist(&self, kind: ItemKind) -> Result<ChangeScope> {
        let patterns = match kind {
            ItemKind::Package => &self.package_patterns,
            ItemKind::PinnedReference => &self.pinned_patterns,
        };
        ChangeScope::new(kind, patterns)
    }
}
