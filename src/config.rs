use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::{GitHubError, Result};
use crate::filters::RepoRef;

const DEFAULT_REPO_OWNER: &str = "facebook";
const DEFAULT_REPO_NAME: &str = "react";

#[derive(Deserialize, Default)]
pub struct Config {
    pub token: Option<String>,
    pub repo_owner: Option<String>,
    pub repo_name: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).map_err(|e| GitHubError::ConfigRead {
                path: config_path.clone(),
                source: e,
            })?;

        toml::from_str(&contents).map_err(|e| GitHubError::ConfigParse {
            path: config_path,
            source: e,
        })
    }

    pub fn config_path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "ghi")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(GitHubError::NoConfigDir)
    }

    /// Get API token with env var taking precedence over config file
    pub fn token(&self) -> Result<String> {
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            return Ok(token);
        }

        self.token.clone().ok_or(GitHubError::MissingToken)
    }

    /// Resolve the repository scope: explicit `OWNER/NAME` argument first,
    /// then env vars, then config file, then the built-in default.
    pub fn resolve_repo(&self, explicit: Option<&str>) -> Result<RepoRef> {
        if let Some(spec) = explicit {
            let (owner, name) = spec
                .split_once('/')
                .filter(|(o, n)| !o.is_empty() && !n.is_empty())
                .ok_or_else(|| GitHubError::InvalidRepo(spec.to_string()))?;
            return Ok(RepoRef::new(owner, name));
        }

        let owner = std::env::var("GHI_REPO_OWNER")
            .ok()
            .or_else(|| self.repo_owner.clone())
            .unwrap_or_else(|| DEFAULT_REPO_OWNER.to_string());
        let name = std::env::var("GHI_REPO_NAME")
            .ok()
            .or_else(|| self.repo_name.clone())
            .unwrap_or_else(|| DEFAULT_REPO_NAME.to_string());

        Ok(RepoRef::new(owner, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_repo_overrides_defaults() {
        let config = Config::default();
        let repo = config.resolve_repo(Some("rust-lang/rust")).unwrap();
        assert_eq!(repo.owner, "rust-lang");
        assert_eq!(repo.name, "rust");
    }

    #[test]
    fn malformed_repo_spec_is_rejected() {
        let config = Config::default();
        assert!(config.resolve_repo(Some("no-slash")).is_err());
        assert!(config.resolve_repo(Some("/name")).is_err());
        assert!(config.resolve_repo(Some("owner/")).is_err());
    }
}
