//! Release listings from GitHub and GitLab

use crate::config::{Config, RepoId};
use crate::error::Result;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

const GITHUB_API: &str = "https://api.github.com";
const GITLAB_API: &str = "https://gitlab.com/api/v4";

/// A published release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub tag: String,
    pub name: String,
    pub assets: Vec<ReleaseAsset>,
}

/// A downloadable file attached to a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub name: String,
    pub download_url: String,
}

impl ReleaseAsset {
    pub fn new(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            download_url: download_url.into(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct GithubRelease {
    tag_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    assets: Vec<GithubAsset>,
}

#[derive(Deserialize, Debug)]
struct GithubAsset {
    name: String,
    browser_download_url: String,
}

/// `/releases` returns an array, `/releases/tags/{tag}` a single object
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Deserialize, Debug)]
struct GitlabRelease {
    tag_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    assets: GitlabAssets,
}

#[derive(Deserialize, Debug, Default)]
struct GitlabAssets {
    #[serde(default)]
    links: Vec<GitlabLink>,
}

#[derive(Deserialize, Debug)]
struct GitlabLink {
    name: String,
    url: String,
}

impl From<GithubRelease> for Release {
    fn from(r: GithubRelease) -> Self {
        Release {
            name: r.name.filter(|n| !n.is_empty()).unwrap_or_else(|| r.tag_name.clone()),
            tag: r.tag_name,
            assets: r
                .assets
                .into_iter()
                .map(|a| ReleaseAsset::new(a.name, a.browser_download_url))
                .collect(),
        }
    }
}

impl From<GitlabRelease> for Release {
    fn from(r: GitlabRelease) -> Self {
        Release {
            name: r.name.filter(|n| !n.is_empty()).unwrap_or_else(|| r.tag_name.clone()),
            tag: r.tag_name,
            assets: r
                .assets
                .links
                .into_iter()
                .map(|l| ReleaseAsset::new(l.name, l.url))
                .collect(),
        }
    }
}

/// Parse a GitHub release listing (array or single release)
pub fn parse_github_releases(body: &str) -> Result<Vec<Release>> {
    let parsed: OneOrMany<GithubRelease> = serde_json::from_str(body)?;
    Ok(parsed.into_vec().into_iter().map(Release::from).collect())
}

/// Parse a GitLab release listing
pub fn parse_gitlab_releases(body: &str) -> Result<Vec<Release>> {
    let parsed: OneOrMany<GitlabRelease> = serde_json::from_str(body)?;
    Ok(parsed.into_vec().into_iter().map(Release::from).collect())
}

/// Release listing client. Failures degrade to an empty listing.
#[derive(Clone)]
pub struct ReleaseClient {
    client: Client,
}

impl ReleaseClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self { client })
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Releases of a GitHub repository, or one release when `tag` is given
    pub async fn github_releases(&self, repo: &RepoId, tag: Option<&str>) -> Vec<Release> {
        let url = match tag {
            Some(tag) => format!(
                "{}/repos/{}/{}/releases/tags/{}",
                GITHUB_API, repo.owner, repo.name, tag
            ),
            None => format!("{}/repos/{}/{}/releases", GITHUB_API, repo.owner, repo.name),
        };
        match self.fetch(&url).await {
            Some(body) => parse_github_releases(&body).unwrap_or_else(|e| {
                warn!("Could not parse releases from {}: {}", url, e);
                Vec::new()
            }),
            None => Vec::new(),
        }
    }

    /// Releases of a GitLab project
    pub async fn gitlab_releases(&self, project_id: &str) -> Vec<Release> {
        let url = format!("{}/projects/{}/releases", GITLAB_API, project_id);
        match self.fetch(&url).await {
            Some(body) => parse_gitlab_releases(&body).unwrap_or_else(|e| {
                warn!("Could not parse releases from {}: {}", url, e);
                Vec::new()
            }),
            None => Vec::new(),
        }
    }

    async fn fetch(&self, url: &str) -> Option<String> {
        info!("Fetching releases from {}", url);
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Release request failed: {}", e);
                return None;
            }
        };
        if !response.status().is_success() {
            warn!("Release request to {} returned {}", url, response.status());
            return None;
        }
        match response.text().await {
            Ok(body) => {
                debug!("Received {} bytes from {}", body.len(), url);
                Some(body)
            }
            Err(e) => {
                warn!("Could not read release response: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_github_listing() {
        let body = r#"[
            {"tag_name": "v1.2", "name": "Templates 1.2", "assets": [
                {"name": "proton.sh", "browser_download_url": "https://example.com/proton.sh", "size": 10}
            ]},
            {"tag_name": "v1.1", "name": null, "assets": []}
        ]"#;
        let releases = parse_github_releases(body).unwrap();
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].name, "Templates 1.2");
        assert_eq!(
            releases[0].assets,
            vec![ReleaseAsset::new("proton.sh", "https://example.com/proton.sh")]
        );
        assert_eq!(releases[1].name, "v1.1");
    }

    #[test]
    fn test_parse_github_single_release() {
        let body = r#"{"tag_name": "templates", "assets": []}"#;
        let releases = parse_github_releases(body).unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].tag, "templates");
    }

    #[test]
    fn test_parse_gitlab_listing() {
        let body = r#"[{
            "tag_name": "v2.5",
            "name": "DXVK 2.5",
            "assets": {"count": 2, "sources": [], "links": [
                {"id": 1, "name": "dxvk-2.5.tar.gz", "url": "https://example.com/dxvk-2.5.tar.gz"}
            ]}
        }]"#;
        let releases = parse_gitlab_releases(body).unwrap();
        assert_eq!(releases[0].name, "DXVK 2.5");
        assert_eq!(releases[0].assets[0].name, "dxvk-2.5.tar.gz");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_github_releases("{\"message\": \"Not Found\"}").is_err());
        assert!(parse_gitlab_releases("not json").is_err());
    }
}
