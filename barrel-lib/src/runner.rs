//! Runner detection and checked process execution

use crate::error::{BarrelError, Result};
use std::process::Command;
use tracing::{debug, info};
use which::which;

/// Runner executables looked up on PATH, in display order
pub const RUNNER_CANDIDATES: &[&str] = &[
    "wine",
    "proton-run.sh",
    "hangover-wine",
    "hangover-run.sh",
    "wine-stable",
    "proton-wine",
    "proton-box",
    "box64",
    "box86",
    "box32",
];

/// Offered when nothing on PATH matches
pub const FALLBACK_RUNNERS: &[&str] = &["wine", "bash"];

/// Runners available on PATH, or [`FALLBACK_RUNNERS`] when none are
pub fn detect_runners() -> Vec<String> {
    let found: Vec<String> = RUNNER_CANDIDATES
        .iter()
        .filter(|name| which(name).is_ok())
        .map(|name| name.to_string())
        .collect();

    if found.is_empty() {
        debug!("No known runners on PATH, offering fallbacks");
        FALLBACK_RUNNERS.iter().map(|s| s.to_string()).collect()
    } else {
        found
    }
}

/// Human-readable form of a command for logs and errors
pub(crate) fn describe(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().to_string()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().to_string()));
    parts.join(" ")
}

/// Run a command to completion, failing on spawn errors and non-zero exits
pub(crate) fn run_checked(cmd: &mut Command) -> Result<()> {
    let described = describe(cmd);
    info!("Running: {}", described);

    let status = cmd
        .status()
        .map_err(|e| BarrelError::runner(described.clone(), e))?;

    if !status.success() {
        return Err(BarrelError::runner(
            described,
            format!("exited with {}", status),
        ));
    }
    Ok(())
}
