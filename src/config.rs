use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::PapersError;

pub const DEFAULT_CONFIG_FILE: &str = "past-papers.json";
pub const MANIFEST_URL_ENV: &str = "PAST_PAPERS_MANIFEST_URL";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub manifest_url: Option<String>,
    #[serde(default)]
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub manifest_url: Option<String>,
    pub data_dir: Option<Utf8PathBuf>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, PapersError> {
        Self::resolve_with_env(path, std::env::var(MANIFEST_URL_ENV).ok())
    }

    pub fn resolve_with_env(
        path: Option<&str>,
        env_url: Option<String>,
    ) -> Result<ResolvedConfig, PapersError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| PapersError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content)
                .map_err(|err| PapersError::ConfigParse(err.to_string()))?
        };

        Ok(Self::resolve_config(config, env_url))
    }

    pub fn resolve_config(config: Config, env_url: Option<String>) -> ResolvedConfig {
        let raw_url = env_url
            .filter(|value| !value.trim().is_empty())
            .or(config.manifest_url);

        ResolvedConfig {
            manifest_url: raw_url.as_deref().and_then(validate_manifest_url),
            data_dir: config
                .data_dir
                .filter(|value| !value.trim().is_empty())
                .map(Utf8PathBuf::from),
        }
    }
}

pub fn validate_manifest_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = match Url::parse(trimmed) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
        _ => {
            tracing::warn!(url = trimmed, "manifest url is not http(s); remote sync disabled");
            return None;
        }
    };
    if is_admin_endpoint(&parsed) {
        tracing::warn!(
            url = trimmed,
            "manifest url points to an admin endpoint, which requires authentication; use the public manifest route for reads"
        );
    }
    Some(trimmed.to_string())
}

fn is_admin_endpoint(url: &Url) -> bool {
    url.path().contains("/api/admin/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_urls() {
        assert_eq!(validate_manifest_url(""), None);
        assert_eq!(validate_manifest_url("   "), None);
        assert_eq!(validate_manifest_url("ftp://host/manifest.json"), None);
        assert_eq!(validate_manifest_url("papers.example/manifest"), None);
        assert_eq!(
            validate_manifest_url(" https://host/api/papers-manifest "),
            Some("https://host/api/papers-manifest".to_string())
        );
    }

    fn admin(url: &str) -> bool {
        Url::parse(url).map(|url| is_admin_endpoint(&url)).unwrap_or(false)
    }

    #[test]
    fn admin_endpoint_detection() {
        assert!(admin("https://host/api/admin/manifest"));
        assert!(!admin("https://host/api/papers-manifest?from=/api/admin/"));
        assert!(!admin("https://host?next=/api/admin/manifest"));
        assert!(!admin("https://host#/api/admin/manifest"));
    }

    #[test]
    fn admin_endpoint_still_resolves() {
        assert_eq!(
            validate_manifest_url("https://host/api/admin/manifest"),
            Some("https://host/api/admin/manifest".to_string())
        );
        assert_eq!(validate_manifest_url("https://"), None);
    }

    #[test]
    fn env_overrides_file() {
        let config = Config {
            manifest_url: Some("https://file.example/manifest".to_string()),
            data_dir: Some("/tmp/papers".to_string()),
        };
        let resolved =
            ConfigLoader::resolve_config(config, Some("https://env.example/manifest".to_string()));
        assert_eq!(
            resolved.manifest_url.as_deref(),
            Some("https://env.example/manifest")
        );
        assert_eq!(resolved.data_dir, Some(Utf8PathBuf::from("/tmp/papers")));
    }
}
