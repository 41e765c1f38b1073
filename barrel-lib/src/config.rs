//! Configuration management for barrel
//!
//! Every directory the engine touches is resolved once into a [`Config`] and
//! handed to the components that need it. Defaults follow the XDG base
//! directories; `barrel.toml` in the config directory and `BARREL_*`
//! environment variables can override any path.

use crate::error::{BarrelError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Application directory name used under the XDG roots
const APP_DIR: &str = "shortcut_launcher";

/// Owner/name pair identifying a hosted repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

/// Barrel configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Per-user configuration directory (~/.config/shortcut_launcher)
    pub config_dir: PathBuf,

    /// Data directory (~/.local/share/shortcut_launcher)
    pub data_dir: PathBuf,

    /// Cache directory (~/.cache/shortcut_launcher)
    pub cache_dir: PathBuf,

    /// Where the source-of-truth .desktop files live
    pub applications_dir: PathBuf,

    /// Desktop folder receiving the mirror links
    pub desktop_dir: PathBuf,

    /// Icon theme directory for extracted icons
    pub icons_dir: PathBuf,

    /// Generated and downloaded template scripts
    pub templates_dir: PathBuf,

    /// Directory scanned for importable .reg files
    pub registry_dir: PathBuf,

    /// JSON list of registered prefixes
    pub prefixes_file: PathBuf,

    /// Release source for downloadable templates
    pub template_repo: RepoId,

    /// Release source for application updates
    pub app_repo: RepoId,

    /// GitLab project id of the DXVK build
    pub dxvk_project_id: String,

    /// Interpreter used to invoke template scripts
    pub template_shell: String,

    /// User agent sent to release-hosting APIs
    pub user_agent: String,

    /// Icon identifier used when no icon could be resolved
    pub default_icon: String,
}

/// Path overrides read from barrel.toml / BARREL_* variables
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Overrides {
    applications_dir: Option<PathBuf>,
    desktop_dir: Option<PathBuf>,
    icons_dir: Option<PathBuf>,
    templates_dir: Option<PathBuf>,
    registry_dir: Option<PathBuf>,
    prefixes_file: Option<PathBuf>,
    template_shell: Option<String>,
    dxvk_project_id: Option<String>,
}

impl Config {
    /// Create a new config with default paths
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| BarrelError::Config("Could not determine home directory".into()))?;
        let config_root = dirs::config_dir().unwrap_or_else(|| home.join(".config"));
        let data_root = dirs::data_dir().unwrap_or_else(|| home.join(".local").join("share"));
        let cache_root = dirs::cache_dir().unwrap_or_else(|| home.join(".cache"));
        let desktop_dir = dirs::desktop_dir().unwrap_or_else(|| home.join("Desktop"));

        Ok(Self::from_roots(
            &home,
            &config_root,
            &data_root,
            &cache_root,
            desktop_dir,
        ))
    }

    /// Build a layout where every directory lives under `root`
    pub fn with_root(root: &Path) -> Self {
        Self::from_roots(
            root,
            &root.join("config"),
            &root.join("data"),
            &root.join("cache"),
            root.join("Desktop"),
        )
    }

    fn from_roots(
        home: &Path,
        config_root: &Path,
        data_root: &Path,
        cache_root: &Path,
        desktop_dir: PathBuf,
    ) -> Self {
        let config_dir = config_root.join(APP_DIR);
        let data_dir = data_root.join(APP_DIR);

        Self {
            prefixes_file: config_dir.join("wine_prefixes.json"),
            templates_dir: data_dir.join("templates"),
            applications_dir: data_root.join("applications").join("shortcuts"),
            icons_dir: data_root
                .join("icons")
                .join("hicolor")
                .join("48x48")
                .join("apps"),
            registry_dir: home.join("registry"),
            cache_dir: cache_root.join(APP_DIR),
            desktop_dir,
            config_dir,
            data_dir,
            template_repo: RepoId::new("moio9", "barrel"),
            app_repo: RepoId::new("moio9", "barrel"),
            dxvk_project_id: "43488626".to_string(),
            template_shell: "bash".to_string(),
            user_agent: "ShortcutLauncher/1.0".to_string(),
            default_icon: "application-x-executable".to_string(),
        }
    }

    /// Load defaults, then apply barrel.toml and BARREL_* overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::new()?;
        let settings_file = config.settings_file();

        let settings = config::Config::builder()
            .add_source(config::File::from(settings_file.as_path()).required(false))
            .add_source(config::Environment::with_prefix("BARREL"))
            .build()?;
        let overrides: Overrides = settings.try_deserialize()?;
        config.apply(overrides);

        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    fn apply(&mut self, overrides: Overrides) {
        if let Some(dir) = overrides.applications_dir {
            self.applications_dir = dir;
        }
        if let Some(dir) = overrides.desktop_dir {
            self.desktop_dir = dir;
        }
        if let Some(dir) = overrides.icons_dir {
            self.icons_dir = dir;
        }
        if let Some(dir) = overrides.templates_dir {
            self.templates_dir = dir;
        }
        if let Some(dir) = overrides.registry_dir {
            self.registry_dir = dir;
        }
        if let Some(file) = overrides.prefixes_file {
            self.prefixes_file = file;
        }
        if let Some(shell) = overrides.template_shell {
            self.template_shell = shell;
        }
        if let Some(id) = overrides.dxvk_project_id {
            self.dxvk_project_id = id;
        }
    }

    /// Optional settings file consulted by [`Config::load`]
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("barrel.toml")
    }

    /// Ensure directories exist
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.cache_dir)?;
        std::fs::create_dir_all(&self.applications_dir)?;
        std::fs::create_dir_all(&self.icons_dir)?;
        std::fs::create_dir_all(&self.templates_dir)?;
        info!("Using templates directory {:?}", self.templates_dir);
        Ok(())
    }
}
