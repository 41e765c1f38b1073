//! `Exec=` command lines of barrel shortcuts
//!
//! Two shapes are written:
//!
//! ```text
//! Direct:     sh -c '<target>; read -p "Press Enter..."'
//! Templated:  <shell> "<template>" "<target>"
//! ```
//!
//! The target is always the last quoted argument of a templated line, so
//! [`LaunchCommand::parse`] can recover both paths. Anything else is read
//! as a direct launch of the whole value.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Prompt shown before a direct-launch terminal closes
pub const PAUSE_PROMPT: &str = "Press Enter...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchCommand {
    /// Run the target directly, pausing before the terminal closes
    Direct { target: String },

    /// Run the target through a template script
    Templated {
        shell: String,
        template: PathBuf,
        target: String,
    },
}

fn direct_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^sh -c '(?P<target>.*); read -p "[^"]*"'$"#).expect("valid direct regex")
    })
}

fn quoted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]*)""#).expect("valid quoted regex"))
}

impl LaunchCommand {
    pub fn direct(target: impl Into<String>) -> Self {
        LaunchCommand::Direct {
            target: target.into(),
        }
    }

    pub fn templated(shell: impl Into<String>, template: PathBuf, target: impl Into<String>) -> Self {
        LaunchCommand::Templated {
            shell: shell.into(),
            template,
            target: target.into(),
        }
    }

    /// Program the shortcut ultimately launches
    pub fn target(&self) -> &str {
        match self {
            LaunchCommand::Direct { target } | LaunchCommand::Templated { target, .. } => target,
        }
    }

    pub fn template(&self) -> Option<&Path> {
        match self {
            LaunchCommand::Direct { .. } => None,
            LaunchCommand::Templated { template, .. } => Some(template),
        }
    }

    /// Template file name, as listed by the template store
    pub fn template_name(&self) -> Option<String> {
        self.template()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().to_string())
    }

    /// Render the `Exec=` value
    pub fn to_exec(&self) -> String {
        match self {
            LaunchCommand::Direct { target } => format!(
                r#"sh -c '{}; read -p "{}"'"#,
                target.replace('\'', r"'\''"),
                PAUSE_PROMPT
            ),
            LaunchCommand::Templated {
                shell,
                template,
                target,
            } => format!(r#"{} "{}" "{}""#, shell, template.display(), target),
        }
    }

    /// Parse an `Exec=` value. Never fails; unknown shapes are direct launches.
    pub fn parse(exec: &str) -> Self {
        let exec = exec.trim();

        if let Some(caps) = direct_re().captures(exec) {
            return Self::direct(caps["target"].replace(r"'\''", "'"));
        }

        let quoted: Vec<&str> = quoted_re()
            .captures_iter(exec)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();

        match quoted.as_slice() {
            [.., template, target] => {
                let shell = exec
                    .split('"')
                    .next()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or("bash");
                Self::templated(shell, PathBuf::from(template), *target)
            }
            [target] => Self::direct(*target),
            [] => Self::direct(exec),
        }
    }
}
