//! Launch template generation and storage
//!
//! A template is a small POSIX shell script that prepares the Wine
//! environment and runs the program passed as its only argument:
//!
//! ```text
//! template_script <target_executable_path>
//! ```
//!
//! Shortcuts rely on that contract, so the generated run line always
//! targets `"$1"` and the working directory is always derived from it.

use crate::error::{BarrelError, Result};
use crate::platform;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Environment variable carrying the emulation DLL override
pub const EMU_OVERRIDE_VAR: &str = "HODLL";

/// Post-run actions offered by front ends, in display order
pub const POST_ACTION_CATALOG: &[&str] = &[
    r#"echo "Done""#,
    r#"notify-send "Template Done""#,
    "rm -f *.tmp",
    "sync",
    "poweroff",
    "pkill -9 -f services.exe",
];

/// DXVK HUD level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DxvkHud {
    #[default]
    None,
    Fps,
    Full,
}

impl DxvkHud {
    pub fn as_str(&self) -> &'static str {
        match self {
            DxvkHud::None => "none",
            DxvkHud::Fps => "1",
            DxvkHud::Full => "full",
        }
    }
}

impl FromStr for DxvkHud {
    type Err = BarrelError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" | "" => Ok(DxvkHud::None),
            "1" => Ok(DxvkHud::Fps),
            "full" => Ok(DxvkHud::Full),
            _ => Err(BarrelError::Validation(format!(
                "Unknown DXVK HUD level '{}' (expected none, 1 or full)",
                s
            ))),
        }
    }
}

impl fmt::Display for DxvkHud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured input for a template script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateConfig {
    /// Runner binary invoked on the target
    pub runner: String,

    /// Background the main run line with `&`
    pub parallel: bool,

    /// Emulation DLL override; `None` leaves the variable unset
    pub emu: Option<String>,

    /// WINEPREFIX exported by the script
    pub wine_prefix: String,

    pub dxvk_hud: DxvkHud,

    /// VK_ICD_FILENAMES value; `None` leaves the variable unset
    pub vulkan_icd: Option<String>,

    /// Shell commands run after the main run line, in order
    pub post_actions: Vec<String>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            runner: "wine".to_string(),
            parallel: false,
            emu: None,
            wine_prefix: String::new(),
            dxvk_hud: DxvkHud::None,
            vulkan_icd: None,
            post_actions: Vec::new(),
        }
    }
}

impl TemplateConfig {
    /// Set the emulation override from a UI value where `"none"` means unset
    pub fn with_emu(mut self, emu: &str) -> Self {
        self.emu = optional_choice(emu);
        self
    }

    /// Set the Vulkan ICD from a UI value where an empty string means unset
    pub fn with_vulkan_icd(mut self, icd: &str) -> Self {
        self.vulkan_icd = optional_choice(icd);
        self
    }

    /// Render the script text. Pure: identical configs give identical bytes.
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = vec!["#!/bin/sh".into(), String::new()];

        lines.push("# Environment Variables".into());
        lines.push(export_line("WINEPREFIX", &self.wine_prefix));
        if self.dxvk_hud != DxvkHud::None {
            lines.push(export_line("DXVK_HUD", self.dxvk_hud.as_str()));
        }
        if let Some(icd) = &self.vulkan_icd {
            lines.push(export_line("VK_ICD_FILENAMES", icd));
        }
        if let Some(emu) = &self.emu {
            lines.push(export_line(EMU_OVERRIDE_VAR, emu));
        }

        lines.push(String::new());
        lines.push("# Change to executable directory".into());
        lines.push(r#"cd "$(dirname "$1")""#.into());

        lines.push(String::new());
        lines.push("# Main Runner".into());
        let background = if self.parallel { " &" } else { "" };
        lines.push(format!(r#"{} "$1"{}"#, self.runner, background));

        if !self.post_actions.is_empty() {
            lines.push(String::new());
            lines.push("# Post-Run Actions".into());
            lines.extend(self.post_actions.iter().cloned());
        }

        let mut script = lines.join("\n");
        script.push('\n');
        script
    }

    /// Best-effort recovery of a config from script text.
    ///
    /// Fields that cannot be found keep their defaults; this never fails.
    pub fn from_script(text: &str) -> Self {
        let mut config = Self::default();
        let mut after_run_line = false;

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if after_run_line {
                config.post_actions.push(line.to_string());
                continue;
            }

            if let Some(export) = line.strip_prefix("export ") {
                if let Some((var, value)) = export.split_once('=') {
                    let value = unquote(value);
                    match var.trim() {
                        "WINEPREFIX" => config.wine_prefix = value,
                        "DXVK_HUD" => config.dxvk_hud = value.parse().unwrap_or_default(),
                        "VK_ICD_FILENAMES" => config.vulkan_icd = optional_choice(&value),
                        EMU_OVERRIDE_VAR => config.emu = optional_choice(&value),
                        _ => {}
                    }
                }
                continue;
            }

            if line.starts_with("cd ") {
                continue;
            }

            if line.contains(r#""$1""#) {
                if let Some(runner) = line.split_whitespace().next() {
                    config.runner = runner.to_string();
                }
                config.parallel = line.ends_with('&');
                after_run_line = true;
            }
        }

        config
    }
}

fn optional_choice(value: &str) -> Option<String> {
    match value.trim() {
        "" | "none" => None,
        v => Some(v.to_string()),
    }
}

fn export_line(var: &str, value: &str) -> String {
    if value.chars().any(char::is_whitespace) {
        format!(r#"export {}="{}""#, var, value)
    } else {
        format!("export {}={}", var, value)
    }
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}

/// Order post-run actions: catalog entries first (catalog order), then
/// custom commands in the order they were added.
pub fn order_post_actions(selected: &[String]) -> Vec<String> {
    let mut ordered: Vec<String> = POST_ACTION_CATALOG
        .iter()
        .copied()
        .filter(|action| selected.iter().any(|s| s == action))
        .map(str::to_string)
        .collect();

    ordered.extend(
        selected
            .iter()
            .filter(|s| !POST_ACTION_CATALOG.contains(&s.as_str()))
            .cloned(),
    );
    ordered
}

/// Templates directory manager
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a template with `name` lives at
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    /// Template names, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| BarrelError::Io(e.into()))?;
            if entry.file_type().is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Script text a save of `config` would write
    pub fn preview(&self, config: &TemplateConfig) -> String {
        config.render()
    }

    /// Render `config` and write it as an executable script.
    /// An existing template with the same name is replaced.
    pub fn create(&self, name: &str, config: &TemplateConfig) -> Result<PathBuf> {
        validate_name(name)?;
        let path = self.write(name, &config.render())?;
        info!("Template created: {}", name);
        Ok(path)
    }

    pub fn read(&self, name: &str) -> Result<String> {
        let path = self.path(name);
        if !path.is_file() {
            return Err(BarrelError::NotFound(format!("template '{}'", name)));
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Overwrite a template with hand-edited text
    pub fn save_raw(&self, name: &str, text: &str) -> Result<PathBuf> {
        validate_name(name)?;
        let mut content = text.trim_end_matches('\n').to_string();
        content.push('\n');
        let path = self.write(name, &content)?;
        info!("Template saved: {}", name);
        Ok(path)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path(name);
        if !path.is_file() {
            return Err(BarrelError::NotFound(format!("template '{}'", name)));
        }
        fs::remove_file(&path)?;
        info!("Template deleted: {}", name);
        Ok(())
    }

    /// Recover the config of an existing template for an edit form
    pub fn summary(&self, name: &str) -> Result<TemplateConfig> {
        Ok(TemplateConfig::from_script(&self.read(name)?))
    }

    fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(name);
        fs::write(&path, content)?;
        platform::set_executable(&path)?;
        debug!("Wrote template script to {:?}", path);
        Ok(path)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(BarrelError::Validation(
            "Template name cannot be empty".into(),
        ));
    }
    if name.contains('/') || name == "." || name == ".." {
        return Err(BarrelError::Validation(format!(
            "Template name '{}' is not a valid file name",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scenario_config() -> TemplateConfig {
        TemplateConfig {
            runner: "wine".into(),
            parallel: true,
            wine_prefix: "/home/u/.wine".into(),
            dxvk_hud: DxvkHud::Fps,
            post_actions: vec!["sync".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_render_full_script() {
        let script = scenario_config().render();
        assert_eq!(
            script,
            "#!/bin/sh\n\
             \n\
             # Environment Variables\n\
             export WINEPREFIX=/home/u/.wine\n\
             export DXVK_HUD=1\n\
             \n\
             # Change to executable directory\n\
             cd \"$(dirname \"$1\")\"\n\
             \n\
             # Main Runner\n\
             wine \"$1\" &\n\
             \n\
             # Post-Run Actions\n\
             sync\n"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let config = scenario_config()
            .with_emu("box64")
            .with_vulkan_icd("/usr/share/vulkan/icd.d/x.json");
        assert_eq!(config.render(), config.render());

        let store = TemplateStore::new(PathBuf::from("/unused"));
        assert_eq!(store.preview(&config), config.render());
    }

    #[test]
    fn test_optional_sections_are_omitted() {
        let config = TemplateConfig {
            wine_prefix: "/p".into(),
            ..Default::default()
        }
        .with_emu("none")
        .with_vulkan_icd("");
        let script = config.render();

        assert!(!script.contains("DXVK_HUD"));
        assert!(!script.contains("VK_ICD_FILENAMES"));
        assert!(!script.contains(EMU_OVERRIDE_VAR));
        assert!(!script.contains("Post-Run"));
        assert!(script.contains("wine \"$1\"\n"));
    }

    #[test]
    fn test_optional_exports_present_when_set() {
        let config = TemplateConfig {
            wine_prefix: "/p".into(),
            dxvk_hud: DxvkHud::Full,
            ..Default::default()
        }
        .with_emu("box64")
        .with_vulkan_icd("$PREFIX/share/vulkan/icd.d/wrapper_icd.aarch64.json");
        let script = config.render();

        assert!(script.contains("export DXVK_HUD=full\n"));
        assert!(script
            .contains("export VK_ICD_FILENAMES=$PREFIX/share/vulkan/icd.d/wrapper_icd.aarch64.json\n"));
        assert!(script.contains("export HODLL=box64\n"));
    }

    #[test]
    fn test_run_line_only_uses_first_argument() {
        let script = scenario_config().render();
        assert!(!script.contains("$2"));
        assert!(!script.contains("$@"));
        let run_line = script.lines().find(|l| l.starts_with("wine ")).unwrap();
        assert!(run_line.ends_with('&'));
        assert!(run_line.find("\"$1\"").unwrap() < run_line.find('&').unwrap());
    }

    #[test]
    fn test_prefix_with_spaces_is_quoted() {
        let config = TemplateConfig {
            wine_prefix: "/home/u/My Games/pfx".into(),
            ..Default::default()
        };
        let script = config.render();
        assert!(script.contains("export WINEPREFIX=\"/home/u/My Games/pfx\"\n"));
        assert_eq!(
            TemplateConfig::from_script(&script).wine_prefix,
            "/home/u/My Games/pfx"
        );
    }

    #[test]
    fn test_from_script_recovers_config() {
        let config = scenario_config().with_emu("box64");
        assert_eq!(TemplateConfig::from_script(&config.render()), config);
    }

    #[test]
    fn test_from_script_falls_back_to_defaults() {
        let config = TemplateConfig::from_script("echo hello\n");
        assert_eq!(config, TemplateConfig::default());
    }

    #[test]
    fn test_order_post_actions_catalog_first() {
        let selected = vec![
            "my-cleanup".to_string(),
            "sync".to_string(),
            r#"echo "Done""#.to_string(),
        ];
        assert_eq!(
            order_post_actions(&selected),
            vec![
                r#"echo "Done""#.to_string(),
                "sync".to_string(),
                "my-cleanup".to_string()
            ]
        );
    }

    #[test]
    fn test_store_create_list_delete() {
        let temp = TempDir::new().unwrap();
        let store = TemplateStore::new(temp.path().join("templates"));

        let path = store.create("T1", &scenario_config()).unwrap();
        store.create("A0", &TemplateConfig::default()).unwrap();

        assert_eq!(store.list().unwrap(), vec!["A0", "T1"]);
        assert_eq!(store.read("T1").unwrap(), scenario_config().render());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_ne!(mode & 0o100, 0);
        }

        store.delete("A0").unwrap();
        assert_eq!(store.list().unwrap(), vec!["T1"]);
        assert!(matches!(store.delete("A0"), Err(BarrelError::NotFound(_))));
    }

    #[test]
    fn test_create_rejects_bad_names() {
        let temp = TempDir::new().unwrap();
        let store = TemplateStore::new(temp.path().to_path_buf());
        let config = TemplateConfig::default();

        assert!(matches!(store.create("", &config), Err(BarrelError::Validation(_))));
        assert!(matches!(
            store.create("../evil", &config),
            Err(BarrelError::Validation(_))
        ));
    }

    #[test]
    fn test_save_raw_normalises_trailing_newlines() {
        let temp = TempDir::new().unwrap();
        let store = TemplateStore::new(temp.path().to_path_buf());

        store.save_raw("raw", "#!/bin/sh\necho hi\n\n\n").unwrap();
        assert_eq!(store.read("raw").unwrap(), "#!/bin/sh\necho hi\n");
    }

    #[test]
    fn test_summary_of_missing_template() {
        let temp = TempDir::new().unwrap();
        let store = TemplateStore::new(temp.path().to_path_buf());
        assert!(matches!(store.summary("nope"), Err(BarrelError::NotFound(_))));
    }
}
