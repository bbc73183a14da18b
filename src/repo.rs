//! Repository context for the analyzed repository
//!
//! A `RepositoryContext` is a complete snapshot: metadata, the flat file
//! listing and language statistics. It is built once per analysis and
//! replaced wholesale on the next one; nothing mutates it in place.

use serde::Serialize;
use std::collections::BTreeMap;

/// Repository owner as reported by the remote API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Owner {
    pub login: String,
    pub profile_url: String,
}

/// Repository metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoMetadata {
    pub name: String,
    pub description: Option<String>,
    pub owner: Owner,
    pub star_count: u64,
    pub fork_count: u64,
    /// License display name, if the repository declares one
    pub license: Option<String>,
    pub default_branch: String,
}

/// One file in the flat listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Repository-relative path, `/`-separated
    pub path: String,
    /// Opaque identifier used to fetch the file body
    pub locator: String,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            locator: locator.into(),
        }
    }

    /// Final path segment
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Lowercased extension of the final segment, without the dot
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Share of one language in the repository
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageShare {
    pub name: String,
    pub bytes: u64,
    pub percent: f64,
}

/// Snapshot of the currently analyzed repository
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryContext {
    metadata: RepoMetadata,
    files: Vec<FileEntry>,
    languages: BTreeMap<String, u64>,
}

impl RepositoryContext {
    pub fn new(
        metadata: RepoMetadata,
        files: Vec<FileEntry>,
        languages: BTreeMap<String, u64>,
    ) -> Self {
        Self {
            metadata,
            files,
            languages,
        }
    }

    pub fn metadata(&self) -> &RepoMetadata {
        &self.metadata
    }

    /// File listing in the order the remote API enumerated it
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn languages(&self) -> &BTreeMap<String, u64> {
        &self.languages
    }

    /// Languages by byte count, largest first (ties broken by name)
    pub fn language_breakdown(&self) -> Vec<LanguageShare> {
        let total: u64 = self.languages.values().sum();
        if total == 0 {
            return Vec::new();
        }

        let mut shares: Vec<LanguageShare> = self
            .languages
            .iter()
            .map(|(name, &bytes)| LanguageShare {
                name: name.clone(),
                bytes,
                percent: bytes as f64 * 100.0 / total as f64,
            })
            .collect();
        // BTreeMap iteration is already name-ordered, so a stable sort keeps ties by name
        shares.sort_by(|a, b| b.bytes.cmp(&a.bytes));
        shares
    }
}
