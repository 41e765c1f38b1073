//! Icon extraction from Windows executables

use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};
use which::which;

/// Image extensions barrel writes into the icon theme directory
pub const ICON_EXTENSIONS: &[&str] = &["png", "svg", "ico", "xpm"];

pub trait IconExtractor {
    /// Extract the primary icon of `exe` into `output`. Returns whether an
    /// icon file now exists at `output`.
    fn extract(&self, exe: &Path, output: &Path) -> bool;
}

/// Extracts icon resources with `wrestool`, resizing with ImageMagick when
/// `convert` is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct WrestoolExtractor;

impl IconExtractor for WrestoolExtractor {
    fn extract(&self, exe: &Path, output: &Path) -> bool {
        let wrestool = match which("wrestool") {
            Ok(path) => path,
            Err(_) => {
                debug!("wrestool not found, skipping icon extraction");
                return false;
            }
        };

        if let Some(parent) = output.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Could not create icon directory {}: {}", parent.display(), e);
                return false;
            }
        }

        // Resource type 14 is the group icon
        let status = Command::new(wrestool)
            .args(["-x", "-t", "14", "-o"])
            .arg(output)
            .arg(exe)
            .status();
        match status {
            Ok(s) if s.success() => {}
            Ok(s) => {
                warn!("wrestool exited with {} for {}", s, exe.display());
                return false;
            }
            Err(e) => {
                warn!("Failed to run wrestool: {}", e);
                return false;
            }
        }

        if let Ok(convert) = which("convert") {
            let resized = Command::new(convert)
                .arg(output)
                .args(["-resize", "48x48"])
                .arg(output)
                .status();
            if !matches!(resized, Ok(s) if s.success()) {
                warn!("Icon resize failed for {}", output.display());
            }
        }

        output.exists()
    }
}

/// Whether `path` names a Windows executable
pub fn is_windows_executable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("exe"))
        .unwrap_or(false)
}
