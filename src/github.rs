//! Native GitHub API integration
//!
//! Fetches the repository snapshot used for analysis (metadata, recursive
//! tree of the default branch, language bytes) and serves file bodies by
//! blob URL. Public repositories work without a token; a token only raises
//! the rate limit.

use crate::cache::ContentFetcher;
use crate::config::Config;
use crate::error::{ContextError, FetchError};
use crate::repo::{FileEntry, Owner, RepoMetadata, RepositoryContext};
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "repolens";
const API_VERSION: &str = "2022-11-28";

/// Maximum length for error body content in error messages
const MAX_ERROR_BODY_LEN: usize = 200;

/// Sanitize an API error body to prevent credential leakage.
/// Truncates long responses and redacts potential secrets.
fn sanitize_error_body(body: &str) -> String {
    const SECRET_PATTERNS: &[&str] = &[
        "token",
        "secret",
        "password",
        "credential",
        "bearer",
        "ghp_",        // GitHub personal access token prefix
        "gho_",        // GitHub OAuth token prefix
        "github_pat_", // GitHub PAT prefix
    ];

    let truncated = crate::util::truncate(body, MAX_ERROR_BODY_LEN);
    let lower = truncated.to_lowercase();
    if SECRET_PATTERNS.iter().any(|p| lower.contains(p)) {
        return "(error details redacted - may contain sensitive data)".to_string();
    }
    truncated
}

// ============================================================================
// Repository Identifiers
// ============================================================================

/// `owner/name` pair identifying a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parse a user-supplied repository identifier.
///
/// Supports:
/// - owner/repo
/// - https://github.com/owner/repo(.git), including deeper paths like /tree/main
/// - github.com/owner/repo
/// - git@github.com:owner/repo.git
pub fn parse_repo_identifier(input: &str) -> Option<RepoId> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    // SSH format: git@github.com:owner/repo.git
    if let Some(rest) = input.strip_prefix("git@github.com:") {
        return repo_id_from_path(rest, true);
    }

    if input.contains("://") {
        let parsed = url::Url::parse(input).ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();
        if host != "github.com" && host != "www.github.com" {
            return None;
        }
        return repo_id_from_path(parsed.path(), false);
    }

    // Scheme-less URL: github.com/owner/repo
    let lower = input.to_ascii_lowercase();
    for prefix in ["github.com/", "www.github.com/"] {
        if lower.starts_with(prefix) {
            return repo_id_from_path(&input[prefix.len()..], false);
        }
    }

    // Shorthand: exactly owner/repo
    repo_id_from_path(input, true)
}

fn repo_id_from_path(path: &str, exact: bool) -> Option<RepoId> {
    let segments: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    if segments.len() < 2 || (exact && segments.len() != 2) {
        return None;
    }

    let owner = segments[0];
    let name = segments[1].trim_end_matches(".git");
    let valid = |s: &str| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    if !valid(owner) || !valid(name) {
        return None;
    }
    Some(RepoId {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}

// ============================================================================
// API Payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiRepository {
    name: Option<String>,
    description: Option<String>,
    owner: Option<ApiOwner>,
    stargazers_count: Option<u64>,
    forks_count: Option<u64>,
    license: Option<ApiLicense>,
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiOwner {
    login: Option<String>,
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiLicense {
    name: Option<String>,
    spdx_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTree {
    tree: Vec<ApiTreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct ApiTreeItem {
    path: Option<String>,
    #[serde(rename = "type")]
    item_type: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiContent {
    content: String,
    #[serde(default)]
    encoding: String,
}

impl TryFrom<ApiRepository> for RepoMetadata {
    type Error = ContextError;

    fn try_from(repo: ApiRepository) -> std::result::Result<Self, Self::Error> {
        let owner = repo.owner.ok_or(ContextError::MissingField("owner"))?;
        let login = owner.login.ok_or(ContextError::MissingField("owner.login"))?;
        let profile_url = owner
            .html_url
            .unwrap_or_else(|| format!("https://github.com/{}", login));

        // GitHub reports unrecognized licenses as NOASSERTION / "Other"
        let license = repo.license.and_then(|l| {
            l.name
                .filter(|n| !n.is_empty())
                .or(l.spdx_id.filter(|s| s != "NOASSERTION"))
        });

        Ok(RepoMetadata {
            name: repo.name.ok_or(ContextError::MissingField("name"))?,
            description: repo.description.filter(|d| !d.trim().is_empty()),
            owner: Owner { login, profile_url },
            star_count: repo
                .stargazers_count
                .ok_or(ContextError::MissingField("stargazers_count"))?,
            fork_count: repo
                .forks_count
                .ok_or(ContextError::MissingField("forks_count"))?,
            license,
            default_branch: repo
                .default_branch
                .ok_or(ContextError::MissingField("default_branch"))?,
        })
    }
}

/// Keep blobs only; their blob URL becomes the content locator.
fn files_from_tree(tree: ApiTree) -> std::result::Result<Vec<FileEntry>, ContextError> {
    let mut files = Vec::new();
    for item in tree.tree {
        if item.item_type.as_deref() != Some("blob") {
            continue;
        }
        let path = item.path.ok_or(ContextError::MissingField("tree.path"))?;
        let Some(url) = item.url else {
            return Err(ContextError::InvalidEntry {
                path,
                reason: "blob has no url".to_string(),
            });
        };
        files.push(FileEntry::new(path, url));
    }
    Ok(files)
}

/// Decode a contents/blob payload into text.
fn decode_content(payload: ApiContent) -> std::result::Result<String, FetchError> {
    match payload.encoding.as_str() {
        "base64" => {
            let compact: String = payload
                .content
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            let bytes = STANDARD
                .decode(compact)
                .map_err(|e| FetchError::Decode(format!("invalid base64: {}", e)))?;
            String::from_utf8(bytes)
                .map_err(|_| FetchError::Decode("content is not valid UTF-8".to_string()))
        }
        "utf-8" | "" => Ok(payload.content),
        other => Err(FetchError::Decode(format!("unknown encoding `{}`", other))),
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    api_url: url::Url,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        let api_base = config.api_base_url().trim_end_matches('/').to_string();
        let api_url = url::Url::parse(&api_base)
            .with_context(|| format!("Invalid GitHub API base URL: {}", api_base))?;

        Ok(Self {
            http,
            api_base,
            api_url,
            token: config.github_token(),
        })
    }

    /// Whether `locator` points below the configured API base. The token is
    /// only ever sent to that origin.
    fn is_api_locator(&self, locator: &str) -> bool {
        let Ok(target) = url::Url::parse(locator) else {
            return false;
        };
        let base_path = self.api_url.path().trim_end_matches('/');
        target.scheme() == self.api_url.scheme()
            && target.host_str() == self.api_url.host_str()
            && target.port_or_known_default() == self.api_url.port_or_known_default()
            && target.path().starts_with(&format!("{}/", base_path))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> std::result::Result<T, FetchError> {
        let mut request = self
            .http
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: sanitize_error_body(&body),
            });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| FetchError::Decode(format!("unexpected response from {}: {}", url, e)))
    }

    /// Fetch and validate the full snapshot of a repository.
    pub async fn analyze(&self, id: &RepoId) -> Result<RepositoryContext> {
        let repo_url = format!("{}/repos/{}/{}", self.api_base, id.owner, id.name);
        info!(repo = %id, "analyzing repository");

        let repo: ApiRepository = self
            .get_json(&repo_url)
            .await
            .with_context(|| format!("Failed to fetch repository {}", id))?;
        let metadata = RepoMetadata::try_from(repo)
            .with_context(|| format!("Unexpected repository metadata for {}", id))?;

        let tree_url = format!(
            "{}/git/trees/{}?recursive=1",
            repo_url, metadata.default_branch
        );
        let languages_url = format!("{}/languages", repo_url);
        let (tree, languages) = tokio::try_join!(
            self.get_json::<ApiTree>(&tree_url),
            self.get_json::<BTreeMap<String, u64>>(&languages_url),
        )
        .with_context(|| format!("Failed to fetch file tree and languages for {}", id))?;

        if tree.truncated {
            warn!(repo = %id, "file tree was truncated by the API; some files are missing");
        }
        let files = files_from_tree(tree)
            .with_context(|| format!("Unexpected file tree for {}", id))?;

        info!(
            repo = %id,
            files = files.len(),
            languages = languages.len(),
            "analysis complete"
        );
        Ok(RepositoryContext::new(metadata, files, languages))
    }
}

#[async_trait]
impl ContentFetcher for GitHubClient {
    async fn fetch_file_content(&self, locator: &str) -> std::result::Result<String, FetchError> {
        if !self.is_api_locator(locator) {
            return Err(FetchError::Unsupported(locator.to_string()));
        }
        debug!(locator, "fetching blob");
        let payload: ApiContent = self.get_json(locator).await?;
        decode_content(payload)
    }
}

// ============================================================================
// Tests
// ============================================================================
