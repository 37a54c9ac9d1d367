/*!
 * Git URL parsing and handling
 */

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::error::{GitError, GitResult};

// Statically compiled regexes for better performance
static HTTP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^https?://(?:www\.)?(?:github\.com|gitlab\.com|bitbucket\.org|.*)/[^/]+/[^/]+(?:\.git)?/?$",
    )
    .expect("valid HTTP git URL regex")
});

static SSH_PARSE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^git@([^:]+):([^/]+)/([^/]+?)(?:\.git)?$").expect("valid SSH git URL regex")
});

/// Fallback name when a source has no usable last segment
const UNNAMED_REPO: &str = "repository";

/// Git hosting platform types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitHost {
    /// GitHub repository
    GitHub,
    /// GitLab repository
    GitLab,
    /// Bitbucket repository
    Bitbucket,
    /// Other Git hosting
    Other(String),
}

impl GitHost {
    fn from_host(host: &str) -> Self {
        match host.trim_start_matches("www.") {
            "github.com" => GitHost::GitHub,
            "gitlab.com" => GitHost::GitLab,
            "bitbucket.org" => GitHost::Bitbucket,
            other => GitHost::Other(other.to_string()),
        }
    }

    /// Username/password pair used to pass an access token over HTTPS,
    /// or `None` for hosts we do not know how to authenticate against
    fn token_credentials<'a>(&self, token: &'a str) -> Option<(&'a str, Option<&'a str>)> {
        match self {
            GitHost::GitHub => Some((token, None)),
            GitHost::GitLab => Some(("oauth2", Some(token))),
            GitHost::Bitbucket => Some(("x-token-auth", Some(token))),
            GitHost::Other(_) => None,
        }
    }
}

impl std::fmt::Display for GitHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitHost::GitHub => write!(f, "GitHub"),
            GitHost::GitLab => write!(f, "GitLab"),
            GitHost::Bitbucket => write!(f, "Bitbucket"),
            GitHost::Other(host) => write!(f, "{}", host),
        }
    }
}

/// Information about a Git repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepoInfo {
    /// Original URL
    pub url: String,
    /// Git hosting platform
    pub host: GitHost,
    /// Repository owner/username
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl FromStr for GitRepoInfo {
    type Err = GitError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        // Handle HTTP/HTTPS URLs
        if HTTP_REGEX.is_match(url) {
            let parsed_url =
                Url::parse(url).map_err(|e| GitError::InvalidUrl(format!("{}: {}", url, e)))?;
            let host_str = parsed_url
                .host_str()
                .ok_or_else(|| GitError::InvalidUrl(format!("Invalid host in URL: {}", url)))?;

            let path_segments: Vec<&str> = parsed_url
                .path()
                .split('/')
                .filter(|segment| !segment.is_empty())
                .collect();

            if path_segments.len() < 2 {
                return Err(GitError::InvalidUrl(format!(
                    "Missing owner or repository in URL: {}",
                    url
                )));
            }

            // Nested groups (gitlab.com/group/subgroup/repo) all belong to the owner
            let (name, owner) = path_segments
                .split_last()
                .map(|(name, owner)| (strip_git_suffix(name).to_string(), owner.join("/")))
                .unwrap_or_default();

            return Ok(GitRepoInfo {
                url: url.to_string(),
                host: GitHost::from_host(host_str),
                owner,
                name,
            });
        }

        // Handle SSH URLs (git@github.com:owner/repo.git)
        if let Some(captures) = SSH_PARSE_REGEX.captures(url) {
            return Ok(GitRepoInfo {
                url: url.to_string(),
                host: GitHost::from_host(&captures[1]),
                owner: captures[2].to_string(),
                name: strip_git_suffix(&captures[3]).to_string(),
            });
        }

        Err(GitError::InvalidUrl(url.to_string()))
    }
}

fn strip_git_suffix(name: &str) -> &str {
    name.strip_suffix(".git").unwrap_or(name)
}

/// Parse a Git repository URL into components
pub fn parse_git_url(url: &str) -> GitResult<GitRepoInfo> {
    url.parse()
}

/// Name used for the session of a remote source: the last path segment
/// without a trailing `.git`
pub fn repo_name_from_source(source: &str) -> String {
    if let Ok(info) = parse_git_url(source) {
        return info.name;
    }

    let trimmed = source.trim_end_matches('/');
    let last = trimmed
        .rsplit(|c| c == '/' || c == ':')
        .next()
        .unwrap_or(trimmed);
    let name = strip_git_suffix(last);

    if name.is_empty() {
        UNNAMED_REPO.to_string()
    } else {
        name.to_string()
    }
}

/// Embed an access token into an HTTPS clone URL.
///
/// Only GitHub, GitLab and Bitbucket URLs are rewritten; anything else,
/// including SSH URLs, is returned unchanged.
pub fn authenticated_url(url: &str, token: &str) -> GitResult<String> {
    let mut parsed = match Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "https" => parsed,
        _ => return Ok(url.to_string()),
    };

    let host = match parsed.host_str() {
        Some(host) => GitHost::from_host(host),
        None => return Ok(url.to_string()),
    };

    let Some((username, password)) = host.token_credentials(token) else {
        return Ok(url.to_string());
    };

    parsed
        .set_username(username)
        .map_err(|_| GitError::CredentialError(host.to_string()))?;
    parsed
        .set_password(password)
        .map_err(|_| GitError::CredentialError(host.to_string()))?;

    Ok(parsed.to_string())
}
