//! DXVK installation into a prefix
//!
//! Only the 64-bit `d3d11.dll` and `dxgi.dll` are taken from a release
//! tarball; nothing else in the archive is written.

use crate::config::Config;
use crate::download::{is_dxvk_archive, DownloadManager};
use crate::error::{BarrelError, Result};
use crate::interaction::Interaction;
use crate::release::{Release, ReleaseClient};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tar::Archive;
use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, info};

/// Archive member suffixes copied into the prefix
pub const DXVK_MEMBERS: &[&str] = &["x64/d3d11.dll", "x64/dxgi.dll"];

/// Where DXVK DLLs land inside a prefix
pub fn system32_dir(prefix: &Path) -> PathBuf {
    prefix.join("drive_c").join("windows").join("system32")
}

/// Copy the DXVK DLLs out of `archive` into the prefix's system32,
/// replacing existing files. Returns the written paths.
///
/// Members are staged next to their destination and only moved into place
/// once the whole archive has been read, so a damaged archive leaves
/// system32 untouched.
pub fn install_dxvk(archive: &Path, prefix: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive)?;
    let mut tar = Archive::new(GzDecoder::new(file));
    let target_dir = system32_dir(prefix);
    let mut staged: Vec<(PathBuf, NamedTempFile)> = Vec::new();

    let entries = tar
        .entries()
        .map_err(|e| BarrelError::Archive(format!("{}: {}", archive.display(), e)))?;
    for entry in entries {
        let mut entry =
            entry.map_err(|e| BarrelError::Archive(format!("{}: {}", archive.display(), e)))?;
        let member = entry
            .path()
            .map_err(|e| BarrelError::Archive(e.to_string()))?
            .to_string_lossy()
            .to_string();

        let Some(suffix) = DXVK_MEMBERS.iter().find(|s| member.ends_with(*s)) else {
            continue;
        };
        let Some(dll_name) = Path::new(suffix).file_name() else {
            continue;
        };

        fs::create_dir_all(&target_dir)?;
        let dest = target_dir.join(dll_name);
        let mut stage = NamedTempFile::new_in(&target_dir)?;
        std::io::copy(&mut entry, &mut stage)
            .map_err(|e| BarrelError::Archive(format!("{}: {}", member, e)))?;
        debug!("Staged {} for {}", member, dest.display());

        // A repeated member replaces the earlier copy
        staged.retain(|(d, _)| d != &dest);
        staged.push((dest, stage));
    }

    if staged.is_empty() {
        return Err(BarrelError::Archive(format!(
            "{} contains no DXVK libraries",
            archive.display()
        )));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (dest, stage) in staged {
        stage.as_file().sync_all()?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            stage
                .as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))?;
        }
        stage.persist(&dest).map_err(|e| BarrelError::Io(e.error))?;
        written.push(dest);
    }
    info!("Installed {} DXVK libraries into {}", written.len(), target_dir.display());
    Ok(written)
}

/// Fetches DXVK releases from GitLab and installs a chosen build
pub struct DxvkInstaller {
    releases: ReleaseClient,
    downloads: DownloadManager,
    project_id: String,
}

impl DxvkInstaller {
    pub fn new(config: &Config) -> Result<Self> {
        let releases = ReleaseClient::new(config)?;
        let downloads = DownloadManager::with_client(releases.http().clone());
        Ok(Self {
            releases,
            downloads,
            project_id: config.dxvk_project_id.clone(),
        })
    }

    pub async fn releases(&self) -> Vec<Release> {
        self.releases.gitlab_releases(&self.project_id).await
    }

    /// Let the user choose a DXVK build and install it into `prefix`.
    ///
    /// Returns `None` when there is nothing to choose or the user cancels.
    pub async fn install(
        &self,
        prefix: &Path,
        interaction: &mut dyn Interaction,
    ) -> Result<Option<Vec<PathBuf>>> {
        if !prefix.is_dir() {
            return Err(BarrelError::NotFound(format!("prefix {}", prefix.display())));
        }

        let releases = self.releases().await;
        let archives: Vec<_> = releases
            .iter()
            .flat_map(|r| r.assets.iter())
            .filter(|a| is_dxvk_archive(&a.name))
            .collect();
        if archives.is_empty() {
            return Ok(None);
        }

        let names: Vec<String> = archives.iter().map(|a| a.name.clone()).collect();
        let Some(index) = interaction.ask_choice("Choose a DXVK build", &names) else {
            return Ok(None);
        };
        let asset = archives
            .get(index)
            .ok_or_else(|| BarrelError::Validation(format!("no build at position {}", index)))?;

        self.download_and_install(&asset.download_url, prefix, &std::env::temp_dir())
            .await
            .map(Some)
    }

    /// Download the archive at `url` into a temp file under `temp_dir` and
    /// install it. The temp file is gone when this returns.
    async fn download_and_install(
        &self,
        url: &str,
        prefix: &Path,
        temp_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        // Dropping the TempPath deletes the download on every return path
        let temp = tempfile::Builder::new()
            .prefix("dxvk-")
            .suffix(".tar.gz")
            .tempfile_in(temp_dir)?
            .into_temp_path();

        self.downloads.download_to(url, &temp).await?;
        install_downloaded(temp, prefix).await
    }
}

/// Extract a downloaded archive off the async runtime, then delete it.
/// The archive is also deleted when extraction fails.
async fn install_downloaded(archive: TempPath, prefix: &Path) -> Result<Vec<PathBuf>> {
    let (path, prefix) = (archive.to_path_buf(), prefix.to_path_buf());
    let written = tokio::task::spawn_blocking(move || install_dxvk(&path, &prefix))
        .await
        .map_err(|e| BarrelError::Archive(format!("extraction task failed: {}", e)))??;

    archive.close()?;
    Ok(written)
}
