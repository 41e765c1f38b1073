//! Barrel Library
//!
//! Engine for managing Wine application shortcuts, launch templates and
//! Wine prefixes. Front ends drive it through the [`Interaction`] trait.

pub mod config;
pub mod desktop_entry;
pub mod download;
pub mod dxvk;
pub mod error;
pub mod icon;
pub mod interaction;
pub mod launch;
pub mod platform;
pub mod prefix;
pub mod release;
pub mod runner;
pub mod shortcut;
pub mod template;
pub mod updater;

pub use config::{Config, RepoId};
pub use desktop_entry::DesktopEntry;
pub use download::{DownloadManager, DownloadOutcome};
pub use dxvk::{install_dxvk, DxvkInstaller};
pub use error::{BarrelError, Result};
pub use icon::{IconExtractor, WrestoolExtractor};
pub use interaction::{Interaction, NoticeLevel};
pub use launch::LaunchCommand;
pub use prefix::{list_registry_files, BootRunner, PrefixManager, PrefixStore, WineArch};
pub use release::{Release, ReleaseAsset, ReleaseClient};
pub use runner::detect_runners;
pub use shortcut::{NewShortcut, ShortcutEdit, ShortcutEntry, ShortcutManager, ShortcutSummary};
pub use template::{DxvkHud, TemplateConfig, TemplateStore};
pub use updater::{check_for_update, is_newer_version};
