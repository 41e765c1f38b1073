//! Interaction over stdin/stdout

use barrel_lib::{Interaction, NoticeLevel};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

pub struct TerminalInteraction {
    /// Accept defaults and first choices without prompting
    assume_yes: bool,
}

impl TerminalInteraction {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    fn read_line(&self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        io::stdout().flush().ok()?;
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl Interaction for TerminalInteraction {
    fn ask_text(&mut self, title: &str, prompt: &str, initial: Option<&str>) -> Option<String> {
        if self.assume_yes {
            return initial.map(str::to_string);
        }
        println!("{}", title);
        let hint = initial.map(|i| format!(" [{}]", i)).unwrap_or_default();
        let answer = self.read_line(&format!("{}{}: ", prompt, hint))?;
        if answer.is_empty() {
            initial.map(str::to_string)
        } else {
            Some(answer)
        }
    }

    fn ask_choice(&mut self, title: &str, options: &[String]) -> Option<usize> {
        if options.is_empty() {
            return None;
        }
        if self.assume_yes {
            return Some(0);
        }

        println!("{}", title);
        for (i, option) in options.iter().enumerate() {
            println!("  {:>2}) {}", i + 1, option);
        }
        loop {
            let answer = self.read_line("Number (empty to cancel): ")?;
            if answer.is_empty() {
                return None;
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Some(n - 1),
                _ => println!("Enter a number between 1 and {}", options.len()),
            }
        }
    }

    fn ask_file(&mut self, title: &str, initial_dir: Option<&Path>) -> Option<PathBuf> {
        if self.assume_yes {
            return None;
        }
        println!("{}", title);
        if let Some(dir) = initial_dir {
            println!("(relative paths resolve against {})", dir.display());
        }
        let answer = self.read_line("Path (empty to skip): ")?;
        if answer.is_empty() {
            return None;
        }
        let path = PathBuf::from(answer);
        match initial_dir {
            Some(dir) if path.is_relative() => Some(dir.join(path)),
            _ => Some(path),
        }
    }

    fn notify(&mut self, level: NoticeLevel, title: &str, message: &str) {
        match level {
            NoticeLevel::Info => println!("{}: {}", title, message),
            NoticeLevel::Warning => eprintln!("Warning: {}: {}", title, message),
            NoticeLevel::Error => eprintln!("Error: {}: {}", title, message),
        }
    }
}
