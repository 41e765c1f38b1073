//! Wine prefix lifecycle
//!
//! Prefixes are created by booting a runner against an empty directory and
//! tracked in a JSON list. Deleting a prefix only forgets it; the directory
//! stays on disk.

use crate::config::Config;
use crate::error::{BarrelError, Result};
use crate::runner::run_checked;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use tracing::{debug, info};

/// Architecture a new prefix is booted as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WineArch {
    Win32,
    #[default]
    Win64,
}

impl WineArch {
    pub fn as_str(&self) -> &'static str {
        match self {
            WineArch::Win32 => "win32",
            WineArch::Win64 => "win64",
        }
    }
}

impl fmt::Display for WineArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WineArch {
    type Err = BarrelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "win32" | "32" => Ok(WineArch::Win32),
            "win64" | "64" => Ok(WineArch::Win64),
            other => Err(BarrelError::Validation(format!(
                "unknown architecture '{}', expected win32 or win64",
                other
            ))),
        }
    }
}

/// What initializes a new prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootRunner {
    /// A runner binary, invoked as `<runner> wineboot`
    Runner(String),
    /// A template script, invoked as `<shell> <template> wineboot`
    Template(PathBuf),
}

/// Persisted list of known prefixes
#[derive(Debug, Clone)]
pub struct PrefixStore {
    file: PathBuf,
}

impl PrefixStore {
    pub fn new(file: PathBuf) -> Self {
        Self { file }
    }

    /// Stored paths in insertion order. A missing file is an empty list.
    pub fn load(&self) -> Result<Vec<PathBuf>> {
        if !self.file.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.file)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Append `path` unless already present. Returns whether it was added.
    pub fn add(&self, path: &Path) -> Result<bool> {
        let mut paths = self.load()?;
        if paths.iter().any(|p| p == path) {
            debug!("Prefix already registered: {}", path.display());
            return Ok(false);
        }
        paths.push(path.to_path_buf());
        self.save(&paths)?;
        Ok(true)
    }

    /// Drop `path` from the list. Returns whether it was present.
    pub fn remove(&self, path: &Path) -> Result<bool> {
        let mut paths = self.load()?;
        let before = paths.len();
        paths.retain(|p| p != path);
        if paths.len() == before {
            return Ok(false);
        }
        self.save(&paths)?;
        Ok(true)
    }

    /// Replace the file via a synced temp file and rename
    fn save(&self, paths: &[PathBuf]) -> Result<()> {
        let parent = self
            .file
            .parent()
            .ok_or_else(|| BarrelError::Config(format!("invalid list path {}", self.file.display())))?;
        fs::create_dir_all(parent)?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)?;
        serde_json::to_writer_pretty(&mut temp, paths)?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.file).map_err(|e| BarrelError::Io(e.error))?;

        debug!("Saved {} prefixes to {}", paths.len(), self.file.display());
        Ok(())
    }
}

/// Prefix manager
pub struct PrefixManager {
    store: PrefixStore,
    template_shell: String,
}

impl PrefixManager {
    pub fn new(config: &Config) -> Self {
        Self {
            store: PrefixStore::new(config.prefixes_file.clone()),
            template_shell: config.template_shell.clone(),
        }
    }

    pub fn store(&self) -> &PrefixStore {
        &self.store
    }

    /// Create and boot a prefix, registering it only if the boot succeeds
    pub fn create(&self, path: &Path, boot: &BootRunner, arch: WineArch) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(BarrelError::Validation("prefix path cannot be empty".into()));
        }
        fs::create_dir_all(path)?;

        let mut cmd = self.boot_command(path, boot, arch);
        info!("Creating {} prefix at {}", arch, path.display());
        run_checked(&mut cmd)?;

        if self.store.add(path)? {
            info!("Registered prefix {}", path.display());
        }
        Ok(())
    }

    fn boot_command(&self, path: &Path, boot: &BootRunner, arch: WineArch) -> Command {
        let mut cmd = match boot {
            BootRunner::Template(template) => {
                let mut cmd = Command::new(&self.template_shell);
                cmd.arg(template);
                cmd
            }
            BootRunner::Runner(runner) => Command::new(runner),
        };
        cmd.arg("wineboot").env("WINEPREFIX", path);
        match arch {
            WineArch::Win32 => cmd.env("WINEARCH", "win32"),
            WineArch::Win64 => cmd.env_remove("WINEARCH"),
        };
        cmd
    }

    /// Forget a prefix. The directory is left untouched.
    pub fn delete(&self, path: &Path) -> Result<bool> {
        let removed = self.store.remove(path)?;
        if removed {
            info!("Removed prefix {} from list", path.display());
        }
        Ok(removed)
    }

    pub fn list(&self) -> Result<Vec<PathBuf>> {
        self.store.load()
    }

    /// Run winetricks against a prefix with `runner` as its wine
    pub fn run_winetricks(&self, path: &Path, runner: &str) -> Result<()> {
        let mut cmd = Command::new("winetricks");
        cmd.env("WINEPREFIX", path).env("WINE", runner);
        run_checked(&mut cmd)
    }

    pub fn run_script(&self, path: &Path, runner: &str, script: &Path) -> Result<()> {
        if !script.is_file() {
            return Err(BarrelError::NotFound(format!("script {}", script.display())));
        }
        let mut cmd = Command::new(runner);
        cmd.arg(script).env("WINEPREFIX", path);
        run_checked(&mut cmd)
    }

    /// Import a `.reg` file with the runner's regedit
    pub fn import_registry(&self, path: &Path, runner: &str, reg_file: &Path) -> Result<()> {
        if !reg_file.is_file() {
            return Err(BarrelError::NotFound(format!(
                "registry file {}",
                reg_file.display()
            )));
        }
        let mut cmd = Command::new(runner);
        cmd.arg("regedit").arg(reg_file).env("WINEPREFIX", path);
        run_checked(&mut cmd)
    }
}

/// `*.reg` files in `dir`, sorted. A missing directory yields nothing.
pub fn list_registry_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let pattern = dir.join("*.reg");
    let pattern = pattern.to_string_lossy();
    let mut files = Vec::new();
    for entry in glob::glob(&pattern).map_err(|e| BarrelError::Config(e.to_string()))? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => debug!("Skipping unreadable registry entry: {}", e),
        }
    }
    files.sort();
    Ok(files)
}
