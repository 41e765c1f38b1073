//! Release asset downloads with progress reporting

use crate::config::Config;
use crate::error::{BarrelError, Result};
use crate::interaction::{Interaction, NoticeLevel};
use crate::platform;
use crate::release::{Release, ReleaseAsset};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of a download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded(PathBuf),
    /// A file with the asset's name already existed and overwrite was off
    Skipped(PathBuf),
    /// The user declined to pick an asset
    Cancelled,
}

/// DXVK builds are published as gzipped tarballs
pub fn is_dxvk_archive(name: &str) -> bool {
    name.ends_with(".tar.gz")
}

/// Whether an asset name looks like a shell script
pub fn is_script_name(name: &str) -> bool {
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        None => true,
        Some(ext) => matches!(ext, "sh" | "bash"),
    }
}

/// Template assets are scripts; archives and checksums are skipped
pub fn is_template_asset(name: &str) -> bool {
    let lower = name.to_lowercase();
    is_script_name(&lower)
        && !lower.contains("sha256")
        && !lower.ends_with(".md")
        && !lower.starts_with("source code")
}

/// Download manager
pub struct DownloadManager {
    client: Client,
    progress: bool,
}

impl DownloadManager {
    /// Create a new download manager
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            progress: true,
        }
    }

    /// Enable or disable the progress bar
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Stream `url` into `dest`. A partial file is removed on failure.
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<()> {
        info!("Downloading {} to {}", url, dest.display());
        match self.stream(url, dest).await {
            Ok(bytes) => {
                debug!("Downloaded {} bytes", bytes);
                Ok(())
            }
            Err(e) => {
                if let Err(cleanup) = platform::remove_if_present(dest) {
                    warn!("Could not remove partial download {}: {}", dest.display(), cleanup);
                }
                Err(e)
            }
        }
    }

    async fn stream(&self, url: &str, dest: &Path) -> Result<u64> {
        let network = |e: reqwest::Error| BarrelError::Network(e.to_string());

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(network)?;

        let total_size = response.content_length().unwrap_or(0);

        let pb = if self.progress && total_size > 0 {
            let pb = ProgressBar::new(total_size);
            let style = ProgressStyle::default_bar()
                .template("{msg} {bar:40.cyan/blue} {bytes}/{total_bytes} {eta}")
                .map_err(|e| BarrelError::Network(format!("Progress bar template error: {}", e)))?;
            pb.set_style(style);
            pb.set_message("Downloading");
            Some(pb)
        } else {
            None
        };

        let mut file = std::fs::File::create(dest)?;
        let mut written = 0u64;

        while let Some(chunk) = response.chunk().await.map_err(network)? {
            file.write_all(&chunk)?;
            written += chunk.len() as u64;

            if let Some(ref pb) = pb {
                pb.inc(chunk.len() as u64);
            }
        }
        file.flush()?;

        if let Some(pb) = pb {
            pb.finish_with_message("Downloaded");
        }

        Ok(written)
    }

    /// Download one asset into `dest_dir` under its own name
    pub async fn download_asset(
        &self,
        asset: &ReleaseAsset,
        dest_dir: &Path,
        overwrite: bool,
    ) -> Result<DownloadOutcome> {
        let file_name = Path::new(&asset.name)
            .file_name()
            .ok_or_else(|| BarrelError::Validation(format!("bad asset name '{}'", asset.name)))?;
        let dest = dest_dir.join(file_name);

        if dest.exists() && !overwrite {
            info!("{} already exists, skipping", dest.display());
            return Ok(DownloadOutcome::Skipped(dest));
        }

        std::fs::create_dir_all(dest_dir)?;
        self.download_to(&asset.download_url, &dest).await?;

        if is_script_name(&asset.name) {
            platform::set_executable(&dest)?;
        }
        Ok(DownloadOutcome::Downloaded(dest))
    }

    /// Let the user pick one of the assets matching `predicate` and download it
    pub async fn choose_and_download(
        &self,
        assets: &[ReleaseAsset],
        predicate: impl Fn(&str) -> bool,
        dest_dir: &Path,
        overwrite: bool,
        interaction: &mut dyn Interaction,
    ) -> Result<DownloadOutcome> {
        let candidates: Vec<&ReleaseAsset> =
            assets.iter().filter(|a| predicate(&a.name)).collect();
        if candidates.is_empty() {
            return Err(BarrelError::NotFound("no matching assets in release".into()));
        }

        let names: Vec<String> = candidates.iter().map(|a| a.name.clone()).collect();
        let Some(index) = interaction.ask_choice("Choose a file to download", &names) else {
            return Ok(DownloadOutcome::Cancelled);
        };
        let asset = candidates
            .get(index)
            .ok_or_else(|| BarrelError::Validation(format!("no asset at position {}", index)))?;

        let outcome = self.download_asset(asset, dest_dir, overwrite).await?;
        if let DownloadOutcome::Skipped(path) = &outcome {
            interaction.notify(
                NoticeLevel::Info,
                "Download skipped",
                &format!("{} already exists", path.display()),
            );
        }
        Ok(outcome)
    }

    /// Download template scripts from `release` into `dest_dir`, replacing
    /// existing copies. The first choice downloads every template asset.
    pub async fn fetch_templates(
        &self,
        release: &Release,
        dest_dir: &Path,
        interaction: &mut dyn Interaction,
    ) -> Result<Vec<PathBuf>> {
        let candidates: Vec<&ReleaseAsset> = release
            .assets
            .iter()
            .filter(|a| is_template_asset(&a.name))
            .collect();
        if candidates.is_empty() {
            return Err(BarrelError::NotFound(format!(
                "no templates in release {}",
                release.tag
            )));
        }

        let mut options = vec!["All templates".to_string()];
        options.extend(candidates.iter().map(|a| a.name.clone()));
        let selected: Vec<&ReleaseAsset> = match interaction.ask_choice("Download templates", &options) {
            None => return Ok(Vec::new()),
            Some(0) => candidates,
            Some(i) => candidates.get(i - 1).copied().into_iter().collect(),
        };

        let mut saved = Vec::new();
        for asset in selected {
            if let DownloadOutcome::Downloaded(path) = self.download_asset(asset, dest_dir, true).await? {
                saved.push(path);
            }
        }
        info!("Downloaded {} templates into {}", saved.len(), dest_dir.display());
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::ScriptedInteraction;
    use tempfile::TempDir;

    fn manager() -> DownloadManager {
        let client = Client::builder().no_proxy().build().unwrap();
        DownloadManager::with_client(client).progress(false)
    }

    /// Answer every request on a local port with `body`. Returns the base URL.
    fn serve(body: &'static [u8]) -> String {
        use std::io::{BufRead, BufReader};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut line = String::new();
                while reader.read_line(&mut line).unwrap_or(0) > 0 && line != "\r\n" {
                    line.clear();
                }
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(body);
            }
        });
        format!("http://{}", addr)
    }

    #[cfg(unix)]
    fn mode(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[test]
    fn test_predicates() {
        assert!(is_dxvk_archive("dxvk-2.5.tar.gz"));
        assert!(!is_dxvk_archive("dxvk-2.5.zip"));

        assert!(is_script_name("proton"));
        assert!(is_script_name("run.sh"));
        assert!(!is_script_name("dxvk.tar.gz"));

        assert!(is_template_asset("hangover.sh"));
        assert!(!is_template_asset("templates.sha256"));
        assert!(!is_template_asset("README.md"));
    }

    #[tokio::test]
    async fn test_existing_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        let existing = temp.path().join("proton.sh");
        std::fs::write(&existing, "keep").unwrap();

        let asset = ReleaseAsset::new("proton.sh", "http://127.0.0.1:9/proton.sh");
        let outcome = manager()
            .download_asset(&asset, temp.path(), false)
            .await
            .unwrap();

        assert_eq!(outcome, DownloadOutcome::Skipped(existing.clone()));
        assert_eq!(std::fs::read_to_string(existing).unwrap(), "keep");
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_file() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("x.tar.gz");

        let result = manager().download_to("http://127.0.0.1:9/x.tar.gz", &dest).await;
        assert!(matches!(result, Err(BarrelError::Network(_))));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_choose_without_matches_or_choice() {
        let temp = TempDir::new().unwrap();
        let assets = vec![ReleaseAsset::new("dxvk.zip", "http://127.0.0.1:9/dxvk.zip")];
        let mut ui = ScriptedInteraction::default();

        let result = manager()
            .choose_and_download(&assets, is_dxvk_archive, temp.path(), false, &mut ui)
            .await;
        assert!(matches!(result, Err(BarrelError::NotFound(_))));

        let assets = vec![ReleaseAsset::new("dxvk.tar.gz", "http://127.0.0.1:9/dxvk.tar.gz")];
        let outcome = manager()
            .choose_and_download(&assets, is_dxvk_archive, temp.path(), false, &mut ui)
            .await
            .unwrap();
        assert_eq!(outcome, DownloadOutcome::Cancelled);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_script_asset_is_made_executable() {
        let temp = TempDir::new().unwrap();
        let base = serve(b"#!/bin/sh\necho hi\n");

        let asset = ReleaseAsset::new("run.sh", format!("{}/run.sh", base));
        let outcome = manager()
            .download_asset(&asset, temp.path(), false)
            .await
            .unwrap();

        let dest = temp.path().join("run.sh");
        assert_eq!(outcome, DownloadOutcome::Downloaded(dest.clone()));
        assert_eq!(std::fs::read(&dest).unwrap(), b"#!/bin/sh\necho hi\n");
        assert_eq!(mode(&dest), 0o755);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_archive_asset_is_not_executable() {
        let temp = TempDir::new().unwrap();
        let base = serve(b"not really gzip");

        let asset = ReleaseAsset::new("x.tar.gz", format!("{}/x.tar.gz", base));
        manager()
            .download_asset(&asset, temp.path(), false)
            .await
            .unwrap();

        let dest = temp.path().join("x.tar.gz");
        assert_eq!(std::fs::read(&dest).unwrap(), b"not really gzip");
        assert_eq!(mode(&dest) & 0o111, 0);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_existing_file() {
        let temp = TempDir::new().unwrap();
        let existing = temp.path().join("proton.sh");
        std::fs::write(&existing, "old contents").unwrap();
        let base = serve(b"new");

        let asset = ReleaseAsset::new("proton.sh", format!("{}/proton.sh", base));
        let outcome = manager()
            .download_asset(&asset, temp.path(), true)
            .await
            .unwrap();

        assert_eq!(outcome, DownloadOutcome::Downloaded(existing.clone()));
        assert_eq!(std::fs::read_to_string(existing).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_fetch_templates_downloads_every_template() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("templates");
        let base = serve(b"#!/bin/bash\n");
        let release = Release {
            tag: "v1".into(),
            name: "Templates".into(),
            assets: vec![
                ReleaseAsset::new("wine.sh", format!("{}/wine.sh", base)),
                ReleaseAsset::new("proton", format!("{}/proton", base)),
                ReleaseAsset::new("README.md", format!("{}/README.md", base)),
            ],
        };
        let mut ui = ScriptedInteraction::default();
        ui.choices.push_back(Some(0));

        let mut saved = manager()
            .fetch_templates(&release, &dest, &mut ui)
            .await
            .unwrap();
        saved.sort();

        assert_eq!(saved, vec![dest.join("proton"), dest.join("wine.sh")]);
        assert!(!dest.join("README.md").exists());
        for path in &saved {
            assert_eq!(std::fs::read(path).unwrap(), b"#!/bin/bash\n");
        }
    }

    #[tokio::test]
    async fn test_fetch_templates_downloads_single_choice() {
        let temp = TempDir::new().unwrap();
        let base = serve(b"#!/bin/bash\n");
        let release = Release {
            tag: "v1".into(),
            name: "Templates".into(),
            assets: vec![
                ReleaseAsset::new("wine.sh", format!("{}/wine.sh", base)),
                ReleaseAsset::new("proton", format!("{}/proton", base)),
            ],
        };
        let mut ui = ScriptedInteraction::default();
        ui.choices.push_back(Some(2));

        let saved = manager()
            .fetch_templates(&release, temp.path(), &mut ui)
            .await
            .unwrap();

        assert_eq!(saved, vec![temp.path().join("proton")]);
        assert!(!temp.path().join("wine.sh").exists());
    }
}
