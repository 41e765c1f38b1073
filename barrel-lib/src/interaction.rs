//! User interaction seam between the engine and a front end
//!
//! Engine operations that need a decision from the user (which release to
//! download, which icon to use) or need to report a result call into an
//! [`Interaction`]. Front ends implement it with whatever toolkit they use.

use std::path::{Path, PathBuf};

/// Severity of a notice shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

pub trait Interaction {
    /// Ask for a line of text. `None` means the user cancelled.
    fn ask_text(&mut self, title: &str, prompt: &str, initial: Option<&str>) -> Option<String>;

    /// Ask the user to pick one of `options`, returning its index.
    fn ask_choice(&mut self, title: &str, options: &[String]) -> Option<usize>;

    /// Ask for a file path, optionally starting in `initial_dir`.
    fn ask_file(&mut self, title: &str, initial_dir: Option<&Path>) -> Option<PathBuf>;

    fn notify(&mut self, level: NoticeLevel, title: &str, message: &str);
}

/// Scripted [`Interaction`] for tests: answers come from queues, notices
/// are recorded.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedInteraction {
    pub texts: std::collections::VecDeque<Option<String>>,
    pub choices: std::collections::VecDeque<Option<usize>>,
    pub files: std::collections::VecDeque<Option<PathBuf>>,
    pub notices: Vec<(NoticeLevel, String)>,
}

#[cfg(test)]
impl Interaction for ScriptedInteraction {
    fn ask_text(&mut self, _title: &str, _prompt: &str, initial: Option<&str>) -> Option<String> {
        self.texts
            .pop_front()
            .unwrap_or_else(|| initial.map(str::to_string))
    }

    fn ask_choice(&mut self, _title: &str, _options: &[String]) -> Option<usize> {
        self.choices.pop_front().flatten()
    }

    fn ask_file(&mut self, _title: &str, _initial_dir: Option<&Path>) -> Option<PathBuf> {
        self.files.pop_front().flatten()
    }

    fn notify(&mut self, level: NoticeLevel, _title: &str, message: &str) {
        self.notices.push((level, message.to_string()));
    }
}
