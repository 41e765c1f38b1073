//! File permission and link helpers.

use crate::error::Result;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Make a file executable (mode 0o755 on Unix, no-op elsewhere).
pub fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(path, permissions)?;
        debug!("Set executable permissions on: {}", path.display());
    }

    #[cfg(not(unix))]
    {
        debug!("Skipping executable bit for: {}", path.display());
    }

    Ok(())
}

/// Remove a file or symlink if present. Returns whether something was removed.
pub fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => {
            fs::remove_file(path)?;
            debug!("Removed {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Point `link` at `target`, replacing whatever is at `link`.
///
/// Falls back to copying when a symlink cannot be created. Failures are
/// logged and reported as `false`; the caller's primary file stays intact.
pub fn mirror_file(target: &Path, link: &Path) -> bool {
    if let Some(parent) = link.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Could not create {}: {}", parent.display(), e);
            return false;
        }
    }

    if let Err(e) = remove_if_present(link) {
        warn!("Could not replace {}: {}", link.display(), e);
        return false;
    }

    match symlink(target, link) {
        Ok(()) => {
            debug!("Linked {} -> {}", link.display(), target.display());
            true
        }
        Err(e) => {
            debug!("Symlink failed ({}), copying instead", e);
            match fs::copy(target, link) {
                Ok(_) => true,
                Err(e) => {
                    warn!("Could not mirror {} to {}: {}", target.display(), link.display(), e);
                    false
                }
            }
        }
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(_target: &Path, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symlinks not supported",
    ))
}
