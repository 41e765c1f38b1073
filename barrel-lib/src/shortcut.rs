//! Shortcut lifecycle: create, edit, delete, run and list `.desktop` files
//!
//! The file in the applications directory is the source of truth. A link
//! with the same file name on the desktop mirrors it and follows it through
//! renames and deletes.

use crate::config::Config;
use crate::desktop_entry::DesktopEntry;
use crate::error::{BarrelError, Result};
use crate::icon::{is_windows_executable, IconExtractor, WrestoolExtractor, ICON_EXTENSIONS};
use crate::interaction::{Interaction, NoticeLevel};
use crate::launch::LaunchCommand;
use crate::platform;
use crate::template::TemplateStore;
use command_group::CommandGroup;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Desktop entry file extension
pub const DESKTOP_EXTENSION: &str = "desktop";

const COMMENT: &str = "Created with Shortcut Launcher";
const MANAGER_TAG: &str = "Shortcut Launcher";

/// A shortcut as read back from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutEntry {
    pub display_name: String,
    pub path: PathBuf,
    pub launch: LaunchCommand,
    /// Icon theme name or absolute image path
    pub icon: String,
    pub terminal: bool,
}

impl ShortcutEntry {
    fn from_desktop(path: &Path, entry: &DesktopEntry) -> Self {
        let display_name = match entry.get("Name", "") {
            "" => file_stem(path),
            name => name.to_string(),
        };
        Self {
            display_name,
            path: path.to_path_buf(),
            launch: LaunchCommand::parse(entry.get("Exec", "")),
            icon: entry.get("Icon", "").to_string(),
            terminal: entry.get("Terminal", "false").eq_ignore_ascii_case("true"),
        }
    }
}

/// Request to create a shortcut
#[derive(Debug, Clone)]
pub struct NewShortcut {
    /// Display name and file stem; must not contain spaces
    pub name: String,
    pub target: PathBuf,
    /// Template name in the templates directory; `None` launches directly
    pub template: Option<String>,
    /// Explicit icon; skips extraction when set
    pub icon: Option<String>,
    pub terminal: bool,
}

impl NewShortcut {
    pub fn new(name: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            template: None,
            icon: None,
            terminal: true,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }
}

/// Changes applied by [`ShortcutManager::edit`]
#[derive(Debug, Clone, Default)]
pub struct ShortcutEdit {
    /// New display name; `None` or blank keeps the current one
    pub name: Option<String>,
    /// Template to launch through; `None` switches to a direct launch
    pub template: Option<String>,
    pub terminal: bool,
    /// Replacement icon; `None` keeps the current one
    pub icon: Option<String>,
}

/// Name/path pair for listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutSummary {
    pub display_name: String,
    pub path: PathBuf,
}

/// Shortcut manager
pub struct ShortcutManager {
    applications_dir: PathBuf,
    desktop_dir: PathBuf,
    icons_dir: PathBuf,
    templates: TemplateStore,
    template_shell: String,
    default_icon: String,
    extractor: Box<dyn IconExtractor>,
}

impl ShortcutManager {
    /// Create a manager extracting icons with wrestool
    pub fn new(config: &Config) -> Self {
        Self::with_extractor(config, Box::new(WrestoolExtractor))
    }

    pub fn with_extractor(config: &Config, extractor: Box<dyn IconExtractor>) -> Self {
        Self {
            applications_dir: config.applications_dir.clone(),
            desktop_dir: config.desktop_dir.clone(),
            icons_dir: config.icons_dir.clone(),
            templates: TemplateStore::new(config.templates_dir.clone()),
            template_shell: config.template_shell.clone(),
            default_icon: config.default_icon.clone(),
            extractor,
        }
    }

    /// Backing file for a shortcut given by stem or file name
    pub fn entry_path(&self, entry_ref: &str) -> PathBuf {
        self.applications_dir.join(desktop_file_name(entry_ref))
    }

    fn mirror_path(&self, entry_ref: &str) -> PathBuf {
        self.desktop_dir.join(desktop_file_name(entry_ref))
    }

    /// Create a shortcut and mirror it onto the desktop
    pub fn create(
        &self,
        request: &NewShortcut,
        interaction: &mut dyn Interaction,
    ) -> Result<ShortcutEntry> {
        let name = request.name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) || name.contains('/') {
            return Err(BarrelError::Validation(
                "Name cannot be empty or contain spaces".into(),
            ));
        }
        if request.target.as_os_str().is_empty() {
            return Err(BarrelError::Validation(
                "A file to launch must be selected".into(),
            ));
        }

        let target = request.target.to_string_lossy().to_string();
        let launch = self.launch_command(request.template.as_deref(), target)?;
        let icon = match &request.icon {
            Some(icon) => icon.clone(),
            None => self.resolve_icon(name, &request.target, interaction),
        };

        let mut entry = DesktopEntry::new();
        entry.set_many([
            ("Type", "Application".to_string()),
            ("Name", name.to_string()),
            ("Exec", launch.to_exec()),
            ("Icon", icon),
            ("Terminal", request.terminal.to_string()),
            ("Comment", COMMENT.to_string()),
            ("X-Shortcut-Manager", MANAGER_TAG.to_string()),
        ]);

        let path = self.entry_path(name);
        self.write_entry(&path, &entry)?;
        self.mirror(&path, name, interaction);

        info!("Shortcut created: {}", path.display());
        Ok(ShortcutEntry::from_desktop(&path, &entry))
    }

    /// Read a shortcut
    pub fn load(&self, entry_ref: &str) -> Result<ShortcutEntry> {
        let path = self.entry_path(entry_ref);
        let entry = read_entry(&path)?;
        Ok(ShortcutEntry::from_desktop(&path, &entry))
    }

    /// Rewrite a shortcut's name, launch mode and terminal flag.
    ///
    /// A rename writes a new file, removes the old one and moves the
    /// desktop mirror along with it.
    pub fn edit(
        &self,
        entry_ref: &str,
        changes: &ShortcutEdit,
        interaction: &mut dyn Interaction,
    ) -> Result<ShortcutEntry> {
        let path = self.entry_path(entry_ref);
        let mut entry = read_entry(&path)?;
        let current = ShortcutEntry::from_desktop(&path, &entry);

        let target = current.launch.target().to_string();
        let launch = self.launch_command(changes.template.as_deref(), target)?;

        let new_name = changes
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&current.display_name)
            .to_string();
        if new_name.contains('/') {
            return Err(BarrelError::Validation(format!(
                "'{}' is not a valid shortcut name",
                new_name
            )));
        }

        entry.set_many([
            ("Name", new_name.clone()),
            ("Exec", launch.to_exec()),
            ("Terminal", changes.terminal.to_string()),
        ]);
        if let Some(icon) = &changes.icon {
            entry.set("Icon", icon.clone());
        }

        let new_path = if new_name != current.display_name {
            let new_path = self.entry_path(&new_name);
            if changes.icon.is_none() {
                let old_stem = file_stem(&path);
                if let Some(icon) = self.rename_icon(&current.icon, &old_stem, &new_name) {
                    entry.set("Icon", icon);
                }
            }
            self.write_entry(&new_path, &entry)?;
            if new_path != path {
                fs::remove_file(&path)?;
                let old_file = file_name(&path);
                if let Err(e) = platform::remove_if_present(&self.mirror_path(&old_file)) {
                    warn!("Could not remove stale desktop link for {}: {}", old_file, e);
                }
            }
            self.mirror(&new_path, &new_name, interaction);
            info!("Shortcut renamed: {} -> {}", current.display_name, new_name);
            new_path
        } else {
            self.write_entry(&path, &entry)?;
            info!("Shortcut updated: {}", path.display());
            path
        };

        Ok(ShortcutEntry::from_desktop(&new_path, &entry))
    }

    /// Remove the backing file, its desktop mirror and any icon named
    /// after it. Missing pieces are skipped.
    pub fn delete(&self, entry_ref: &str) -> Result<()> {
        let file = desktop_file_name(entry_ref);
        let stem = file_stem(Path::new(&file));
        let mut first_error = None;

        let mut targets = vec![self.entry_path(&file), self.mirror_path(&file)];
        targets.extend(
            ICON_EXTENSIONS
                .iter()
                .map(|ext| self.icons_dir.join(format!("{}.{}", stem, ext))),
        );

        for target in targets {
            if let Err(e) = platform::remove_if_present(&target) {
                warn!("Could not remove {}: {}", target.display(), e);
                first_error.get_or_insert(e);
            }
        }

        info!("Shortcut deleted: {}", file);
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Launch a shortcut's command in the background without waiting for it.
    /// `Terminal=` is ignored; front ends that want a terminal wrap the command themselves.
    pub fn run(&self, entry_ref: &str) -> Result<()> {
        let path = self.entry_path(entry_ref);
        let entry = read_entry(&path)?;
        let exec = entry.get("Exec", "");
        if exec.trim().is_empty() {
            return Err(BarrelError::NotFound(format!(
                "no Exec line in {}",
                path.display()
            )));
        }

        Command::new("sh")
            .arg("-c")
            .arg(exec)
            .group_spawn()
            .map_err(|e| BarrelError::runner(format!("sh -c {}", exec), e))?;
        info!("Launched shortcut {}", path.display());
        Ok(())
    }

    /// Shortcuts in the applications directory, sorted by file name
    pub fn list(&self) -> Result<Vec<ShortcutSummary>> {
        if !self.applications_dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.applications_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| BarrelError::Io(e.into()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(DESKTOP_EXTENSION) {
                files.push(path.to_path_buf());
            }
        }

        let mut items = Vec::new();
        for path in files {
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    debug!("Skipping unreadable shortcut {}: {}", path.display(), e);
                    continue;
                }
            };
            let entry = DesktopEntry::parse(&text);
            let display_name = match entry.get("Name", "") {
                "" => file_stem(&path),
                name => name.to_string(),
            };
            items.push(ShortcutSummary { display_name, path });
        }
        Ok(items)
    }

    fn launch_command(&self, template: Option<&str>, target: String) -> Result<LaunchCommand> {
        match template {
            Some(name) => {
                if !self.templates.exists(name) {
                    return Err(BarrelError::NotFound(format!("template '{}'", name)));
                }
                // Templated Exec= lines quote both paths with '"'
                if target.contains('"') || name.contains('"') {
                    return Err(BarrelError::Validation(format!(
                        "'{}' cannot be launched through a template: paths may not contain '\"'",
                        target
                    )));
                }
                Ok(LaunchCommand::templated(
                    self.template_shell.clone(),
                    self.templates.path(name),
                    target,
                ))
            }
            None => Ok(LaunchCommand::direct(target)),
        }
    }

    /// Move an icon stored as `<icons_dir>/<old_stem>.<ext>` to the new stem.
    /// Returns the new `Icon=` value, or `None` when the icon is not ours or
    /// could not be moved.
    fn rename_icon(&self, icon: &str, old_stem: &str, new_stem: &str) -> Option<String> {
        let icon_path = Path::new(icon);
        if icon_path.parent() != Some(self.icons_dir.as_path())
            || icon_path.file_stem()? != old_stem
        {
            return None;
        }
        let ext = icon_path.extension()?.to_string_lossy();
        let renamed = self.icons_dir.join(format!("{}.{}", new_stem, ext));
        match fs::rename(icon_path, &renamed) {
            Ok(()) => Some(renamed.to_string_lossy().to_string()),
            Err(e) => {
                warn!("Could not rename icon {}: {}", icon_path.display(), e);
                None
            }
        }
    }

    /// Extract the executable's icon, ask for one, or fall back to the default
    fn resolve_icon(&self, name: &str, target: &Path, interaction: &mut dyn Interaction) -> String {
        if !is_windows_executable(target) {
            return self.default_icon.clone();
        }

        let output = self.icons_dir.join(format!("{}.png", name));
        if self.extractor.extract(target, &output) {
            return output.to_string_lossy().to_string();
        }

        match interaction.ask_file("Choose an icon (optional)", Some(&self.icons_dir)) {
            Some(chosen) => chosen.to_string_lossy().to_string(),
            None => self.default_icon.clone(),
        }
    }

    fn write_entry(&self, path: &Path, entry: &DesktopEntry) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, entry.serialize())?;
        platform::set_executable(path)?;
        debug!("Wrote desktop entry to {:?}", path);
        Ok(())
    }

    fn mirror(&self, path: &Path, name: &str, interaction: &mut dyn Interaction) {
        let link = self.mirror_path(name);
        if !platform::mirror_file(path, &link) {
            interaction.notify(
                NoticeLevel::Warning,
                "Desktop link",
                &format!("Shortcut saved but could not be placed on {}", link.display()),
            );
        }
    }
}

fn read_entry(path: &Path) -> Result<DesktopEntry> {
    if !path.is_file() {
        return Err(BarrelError::NotFound(format!("shortcut {}", path.display())));
    }
    Ok(DesktopEntry::parse(&fs::read_to_string(path)?))
}

fn desktop_file_name(entry_ref: &str) -> String {
    let suffix = format!(".{}", DESKTOP_EXTENSION);
    if entry_ref.ends_with(&suffix) {
        entry_ref.to_string()
    } else {
        format!("{}{}", entry_ref, suffix)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::ScriptedInteraction;
    use crate::template::TemplateConfig;
    use std::cell::Cell;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Extractor that writes a fake icon, or fails, and counts calls
    struct FakeExtractor {
        succeed: bool,
        calls: Rc<Cell<usize>>,
    }

    impl IconExtractor for FakeExtractor {
        fn extract(&self, _exe: &Path, output: &Path) -> bool {
            self.calls.set(self.calls.get() + 1);
            if self.succeed {
                fs::create_dir_all(output.parent().unwrap()).unwrap();
                fs::write(output, b"png").unwrap();
            }
            self.succeed
        }
    }

    fn setup(succeed: bool) -> (TempDir, Config, ShortcutManager, Rc<Cell<usize>>) {
        let temp = TempDir::new().unwrap();
        let config = Config::with_root(temp.path());
        let calls = Rc::new(Cell::new(0));
        let manager = ShortcutManager::with_extractor(
            &config,
            Box::new(FakeExtractor {
                succeed,
                calls: calls.clone(),
            }),
        );
        (temp, config, manager, calls)
    }

    #[test]
    fn test_create_direct_shortcut() {
        let (_temp, config, manager, _) = setup(false);
        let mut ui = ScriptedInteraction::default();

        let entry = manager
            .create(&NewShortcut::new("Game1", "/tmp/game1.sh"), &mut ui)
            .unwrap();

        assert_eq!(entry.display_name, "Game1");
        assert_eq!(entry.icon, "application-x-executable");
        assert!(entry.terminal);

        let text = fs::read_to_string(config.applications_dir.join("Game1.desktop")).unwrap();
        assert!(text.starts_with("[Desktop Entry]\nType=Application\nName=Game1\n"));
        assert!(text.contains("Exec=sh -c '/tmp/game1.sh; read -p \"Press Enter...\"'\n"));
        assert!(text.contains("Terminal=true\n"));
        assert!(text.contains("Comment=Created with Shortcut Launcher\n"));

        let mirror = config.desktop_dir.join("Game1.desktop");
        assert!(fs::symlink_metadata(&mirror).is_ok());
    }

    #[test]
    fn test_create_rejects_spaces_without_writing() {
        let (_temp, config, manager, _) = setup(false);
        let mut ui = ScriptedInteraction::default();

        let result = manager.create(&NewShortcut::new("My Game", "/tmp/x.exe"), &mut ui);
        assert!(matches!(result, Err(BarrelError::Validation(_))));
        assert!(!config.applications_dir.join("My Game.desktop").exists());
        assert!(!config.applications_dir.exists());
    }

    #[test]
    fn test_create_with_missing_template() {
        let (_temp, _config, manager, _) = setup(false);
        let mut ui = ScriptedInteraction::default();

        let request = NewShortcut::new("G", "/tmp/g.exe").with_template("nope");
        assert!(matches!(
            manager.create(&request, &mut ui),
            Err(BarrelError::NotFound(_))
        ));
    }

    #[test]
    fn test_exe_icon_is_extracted() {
        let (_temp, config, manager, calls) = setup(true);
        let mut ui = ScriptedInteraction::default();

        let entry = manager
            .create(&NewShortcut::new("Game1", "/tmp/game1.exe"), &mut ui)
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(
            PathBuf::from(&entry.icon),
            config.icons_dir.join("Game1.png")
        );
    }

    #[test]
    fn test_failed_extraction_asks_for_icon() {
        let (_temp, _config, manager, _) = setup(false);
        let mut ui = ScriptedInteraction::default();
        ui.files.push_back(Some(PathBuf::from("/icons/chosen.svg")));

        let entry = manager
            .create(&NewShortcut::new("Game1", "/tmp/game1.exe"), &mut ui)
            .unwrap();
        assert_eq!(entry.icon, "/icons/chosen.svg");

        let mut ui = ScriptedInteraction::default();
        let entry = manager
            .create(&NewShortcut::new("Game2", "/tmp/game2.exe"), &mut ui)
            .unwrap();
        assert_eq!(entry.icon, "application-x-executable");
    }

    #[test]
    fn test_edit_switches_to_template_and_back() {
        let (_temp, config, manager, _) = setup(false);
        let mut ui = ScriptedInteraction::default();
        let store = TemplateStore::new(config.templates_dir.clone());
        store.create("T1", &TemplateConfig::default()).unwrap();

        manager
            .create(&NewShortcut::new("Game1", "/tmp/game1.exe"), &mut ui)
            .unwrap();
        let original_icon = manager.load("Game1").unwrap().icon;

        let edited = manager
            .edit(
                "Game1",
                &ShortcutEdit {
                    template: Some("T1".into()),
                    terminal: false,
                    ..Default::default()
                },
                &mut ui,
            )
            .unwrap();
        assert_eq!(
            edited.launch.to_exec(),
            format!("bash \"{}\" \"/tmp/game1.exe\"", store.path("T1").display())
        );
        assert!(!edited.terminal);
        assert_eq!(edited.icon, original_icon);

        let direct = manager
            .edit("Game1", &ShortcutEdit::default(), &mut ui)
            .unwrap();
        assert_eq!(direct.launch, LaunchCommand::direct("/tmp/game1.exe"));
    }

    #[test]
    fn test_edit_rename_moves_file_and_mirror() {
        let (_temp, config, manager, _) = setup(false);
        let mut ui = ScriptedInteraction::default();
        manager
            .create(&NewShortcut::new("Old", "/tmp/old.sh"), &mut ui)
            .unwrap();

        let renamed = manager
            .edit(
                "Old",
                &ShortcutEdit {
                    name: Some("New".into()),
                    terminal: true,
                    ..Default::default()
                },
                &mut ui,
            )
            .unwrap();

        assert_eq!(renamed.display_name, "New");
        assert!(!config.applications_dir.join("Old.desktop").exists());
        assert!(config.applications_dir.join("New.desktop").exists());
        assert!(fs::symlink_metadata(config.desktop_dir.join("Old.desktop")).is_err());
        assert!(fs::symlink_metadata(config.desktop_dir.join("New.desktop")).is_ok());
        assert_eq!(renamed.launch.target(), "/tmp/old.sh");
    }

    #[test]
    fn test_edit_rename_moves_extracted_icon() {
        let (_temp, config, manager, _) = setup(true);
        let mut ui = ScriptedInteraction::default();
        manager
            .create(&NewShortcut::new("Old", "/tmp/old.exe"), &mut ui)
            .unwrap();
        assert!(config.icons_dir.join("Old.png").exists());

        let renamed = manager
            .edit(
                "Old",
                &ShortcutEdit {
                    name: Some("New".into()),
                    ..Default::default()
                },
                &mut ui,
            )
            .unwrap();

        let new_icon = config.icons_dir.join("New.png");
        assert!(!config.icons_dir.join("Old.png").exists());
        assert!(new_icon.exists());
        assert_eq!(renamed.icon, new_icon.to_string_lossy());
        assert_eq!(manager.load("New").unwrap().icon, renamed.icon);

        manager.delete("New").unwrap();
        assert!(!new_icon.exists());
    }

    #[test]
    fn test_edit_rename_keeps_foreign_icon() {
        let (temp, _config, manager, _) = setup(false);
        let mut ui = ScriptedInteraction::default();
        let foreign = temp.path().join("Old.png");
        fs::write(&foreign, b"png").unwrap();
        let mut request = NewShortcut::new("Old", "/tmp/old.exe");
        request.icon = Some(foreign.to_string_lossy().to_string());
        manager.create(&request, &mut ui).unwrap();

        let renamed = manager
            .edit(
                "Old",
                &ShortcutEdit {
                    name: Some("New".into()),
                    ..Default::default()
                },
                &mut ui,
            )
            .unwrap();

        assert!(foreign.exists());
        assert_eq!(renamed.icon, foreign.to_string_lossy());
    }

    #[test]
    fn test_templated_target_with_double_quote_is_rejected() {
        let (_temp, config, manager, _) = setup(false);
        let mut ui = ScriptedInteraction::default();
        let store = TemplateStore::new(config.templates_dir.clone());
        store.create("T1", &TemplateConfig::default()).unwrap();

        let request = NewShortcut::new("Quoted", "/tmp/say \"hi\".exe").with_template("T1");
        let result = manager.create(&request, &mut ui);
        assert!(matches!(result, Err(BarrelError::Validation(_))));
        assert!(!config.applications_dir.join("Quoted.desktop").exists());

        // Direct launches single-quote the target, so '"' is fine there
        let entry = manager
            .create(&NewShortcut::new("Quoted", "/tmp/say \"hi\".exe"), &mut ui)
            .unwrap();
        assert_eq!(entry.launch.target(), "/tmp/say \"hi\".exe");
        let edit = ShortcutEdit {
            template: Some("T1".into()),
            ..Default::default()
        };
        assert!(matches!(
            manager.edit("Quoted", &edit, &mut ui),
            Err(BarrelError::Validation(_))
        ));
    }

    #[test]
    fn test_edit_preserves_unknown_keys() {
        let (_temp, config, manager, _) = setup(false);
        let mut ui = ScriptedInteraction::default();
        fs::create_dir_all(&config.applications_dir).unwrap();
        fs::write(
            config.applications_dir.join("X.desktop"),
            "[Desktop Entry]\nName=X\nExec=/usr/bin/x\nX-Extra=1\n",
        )
        .unwrap();

        manager
            .edit("X", &ShortcutEdit::default(), &mut ui)
            .unwrap();
        let text = fs::read_to_string(config.applications_dir.join("X.desktop")).unwrap();
        assert!(text.contains("X-Extra=1\n"));
        assert!(text.contains("Exec=sh -c '/usr/bin/x; read -p \"Press Enter...\"'\n"));
    }

    #[test]
    fn test_edit_missing_shortcut() {
        let (_temp, _config, manager, _) = setup(false);
        let mut ui = ScriptedInteraction::default();
        assert!(matches!(
            manager.edit("ghost", &ShortcutEdit::default(), &mut ui),
            Err(BarrelError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_removes_file_mirror_and_icons() {
        let (_temp, config, manager, _) = setup(true);
        let mut ui = ScriptedInteraction::default();
        manager
            .create(&NewShortcut::new("Game1", "/tmp/game1.exe"), &mut ui)
            .unwrap();
        fs::write(config.icons_dir.join("Game1.xpm"), b"x").unwrap();

        manager.delete("Game1").unwrap();

        assert!(!config.applications_dir.join("Game1.desktop").exists());
        assert!(fs::symlink_metadata(config.desktop_dir.join("Game1.desktop")).is_err());
        assert!(!config.icons_dir.join("Game1.png").exists());
        assert!(!config.icons_dir.join("Game1.xpm").exists());
        // deleting again is not an error
        manager.delete("Game1").unwrap();
    }

    #[test]
    fn test_list_sorted_with_stem_fallback() {
        let (_temp, config, manager, _) = setup(false);
        fs::create_dir_all(&config.applications_dir).unwrap();
        fs::write(config.applications_dir.join("b.desktop"), "[Desktop Entry]\nName=Bee\n").unwrap();
        fs::write(config.applications_dir.join("a.desktop"), "[Desktop Entry]\nExec=x\n").unwrap();
        fs::write(config.applications_dir.join("notes.txt"), "ignored").unwrap();

        let items = manager.list().unwrap();
        let names: Vec<_> = items.iter().map(|i| i.display_name.as_str()).collect();
        assert_eq!(names, vec!["a", "Bee"]);
    }

    #[test]
    fn test_run_missing_shortcut() {
        let (_temp, _config, manager, _) = setup(false);
        assert!(matches!(manager.run("ghost"), Err(BarrelError::NotFound(_))));
    }

    #[test]
    fn test_run_does_not_block() {
        let (_temp, config, manager, _) = setup(false);
        fs::create_dir_all(&config.applications_dir).unwrap();
        fs::write(
            config.applications_dir.join("S.desktop"),
            "[Desktop Entry]\nName=S\nExec=sleep 5\n",
        )
        .unwrap();

        let start = std::time::Instant::now();
        manager.run("S").unwrap();
        assert!(start.elapsed() < std::time::Duration::from_secs(5));
    }
}
