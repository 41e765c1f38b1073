//! Barrel CLI

mod terminal;

use anyhow::{bail, Context};
use barrel_lib::{
    check_for_update, detect_runners, list_registry_files, BootRunner, Config, DownloadManager,
    DxvkHud, DxvkInstaller, Interaction, NewShortcut, NoticeLevel, PrefixManager, ReleaseClient,
    ShortcutEdit, ShortcutManager, TemplateConfig, TemplateStore, WineArch,
};
use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use terminal::TerminalInteraction;
use tracing::debug;

#[derive(Parser)]
#[command(name = "barrel")]
#[command(about = "Shortcuts, launch templates and Wine prefixes for Windows programs")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Don't ask questions; take defaults and first choices
    #[arg(short, long, global = true)]
    yes: bool,

    /// Keep every barrel directory under this root instead of the XDG locations
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage desktop shortcuts
    #[command(subcommand)]
    Shortcut(ShortcutCommand),

    /// Manage launch templates
    #[command(subcommand)]
    Template(TemplateCommand),

    /// Manage Wine prefixes
    #[command(subcommand)]
    Prefix(PrefixCommand),

    /// List runners found on PATH
    Runners,

    /// Check for a newer barrel release
    Update,
}

#[derive(Subcommand)]
enum ShortcutCommand {
    /// Create a shortcut for a program
    Create {
        /// Shortcut name (no spaces)
        name: String,
        /// Program to launch
        target: PathBuf,
        /// Launch through this template
        #[arg(short, long)]
        template: Option<String>,
        /// Icon name or image path (extracted from .exe files otherwise)
        #[arg(long)]
        icon: Option<String>,
        /// Don't open a terminal when launching
        #[arg(long)]
        no_terminal: bool,
    },

    /// Change a shortcut's name, template or terminal flag
    Edit {
        name: String,
        /// New name
        #[arg(long)]
        rename: Option<String>,
        /// Launch through this template
        #[arg(short, long, conflicts_with = "direct")]
        template: Option<String>,
        /// Launch the program directly
        #[arg(long)]
        direct: bool,
        /// Open a terminal when launching
        #[arg(long)]
        terminal: Option<bool>,
        /// Replace the icon
        #[arg(long)]
        icon: Option<String>,
    },

    /// Delete a shortcut, its desktop link and its icon
    Delete { name: String },

    /// Launch a shortcut in the background
    Run { name: String },

    /// Show a shortcut's launch details
    Show { name: String },

    /// List shortcuts
    List,
}

#[derive(Args)]
struct TemplateOptions {
    /// Runner invoked on the program (defaults to the first one found)
    #[arg(short, long)]
    runner: Option<String>,
    /// Run the program in the background
    #[arg(long)]
    parallel: bool,
    /// Emulation DLL override ("none" to leave unset)
    #[arg(long, default_value = "none")]
    emu: String,
    /// WINEPREFIX to export
    #[arg(short, long, default_value = "")]
    prefix: String,
    /// DXVK HUD level: none, 1 or full
    #[arg(long, default_value = "none")]
    dxvk_hud: DxvkHud,
    /// Vulkan ICD file to export
    #[arg(long, default_value = "")]
    vulkan_icd: String,
    /// Command to run afterwards (repeatable)
    #[arg(long = "post")]
    post_actions: Vec<String>,
}

impl TemplateOptions {
    fn into_config(self) -> TemplateConfig {
        let runner = self
            .runner
            .or_else(|| detect_runners().into_iter().next())
            .unwrap_or_else(|| "wine".to_string());
        TemplateConfig {
            runner,
            parallel: self.parallel,
            wine_prefix: self.prefix,
            dxvk_hud: self.dxvk_hud,
            post_actions: barrel_lib::template::order_post_actions(&self.post_actions),
            ..Default::default()
        }
        .with_emu(&self.emu)
        .with_vulkan_icd(&self.vulkan_icd)
    }
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// Generate a template script
    Create {
        name: String,
        #[command(flatten)]
        options: TemplateOptions,
        /// Print the script instead of saving it
        #[arg(long)]
        preview: bool,
    },

    /// Replace a template's text with a file's contents (stdin when omitted)
    Save {
        name: String,
        file: Option<PathBuf>,
    },

    /// Print a template
    Show { name: String },

    /// Show the settings recovered from a template
    Summary { name: String },

    /// Delete a template
    Delete { name: String },

    /// List templates
    List,

    /// List the post-run action catalog
    Actions,

    /// Download templates from the template repository
    Fetch {
        /// Release tag to fetch from
        #[arg(long)]
        tag: Option<String>,
    },
}

#[derive(Subcommand)]
enum PrefixCommand {
    /// Create and boot a prefix
    Create {
        path: PathBuf,
        /// Runner used for wineboot
        #[arg(short, long, conflicts_with = "template")]
        runner: Option<String>,
        /// Boot through a template instead of a runner
        #[arg(short, long)]
        template: Option<String>,
        /// win32 or win64
        #[arg(long, default_value = "win64")]
        arch: WineArch,
    },

    /// Forget a prefix (files stay on disk)
    Delete { path: PathBuf },

    /// List registered prefixes
    List,

    /// Run winetricks in a prefix
    Winetricks {
        path: PathBuf,
        #[arg(short, long)]
        runner: Option<String>,
    },

    /// Run a script in a prefix
    Script {
        path: PathBuf,
        script: PathBuf,
        #[arg(short, long)]
        runner: Option<String>,
    },

    /// Import a .reg file (chosen from ~/registry when omitted)
    Regedit {
        path: PathBuf,
        reg_file: Option<PathBuf>,
        #[arg(short, long)]
        runner: Option<String>,
    },

    /// Install DXVK into a prefix
    Dxvk { path: PathBuf },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("barrel={}", log_level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut ui = TerminalInteraction::new(cli.yes);
    if let Err(e) = run(cli, &mut ui).await {
        ui.notify(NoticeLevel::Error, "barrel", &format!("{:#}", e));
        process::exit(1);
    }
}

async fn run(cli: Cli, ui: &mut TerminalInteraction) -> anyhow::Result<()> {
    let config = match &cli.root {
        Some(root) => Config::with_root(root),
        None => Config::load().context("loading configuration")?,
    };
    config.ensure_dirs()?;
    debug!("Using configuration {:?}", config);

    match cli.command {
        Command::Shortcut(cmd) => shortcut(&config, cmd, ui),
        Command::Template(cmd) => template(&config, cmd, ui).await,
        Command::Prefix(cmd) => prefix(&config, cmd, ui).await,
        Command::Runners => {
            for runner in detect_runners() {
                println!("{}", runner);
            }
            Ok(())
        }
        Command::Update => {
            let current = env!("CARGO_PKG_VERSION");
            match check_for_update(&config, current).await? {
                Some(release) => ui.notify(
                    NoticeLevel::Info,
                    "Update available",
                    &format!("{} is available (running {})", release.tag, current),
                ),
                None => ui.notify(NoticeLevel::Info, "Up to date", &format!("barrel {}", current)),
            }
            Ok(())
        }
    }
}

fn shortcut(config: &Config, cmd: ShortcutCommand, ui: &mut TerminalInteraction) -> anyhow::Result<()> {
    let shortcuts = ShortcutManager::new(config);

    match cmd {
        ShortcutCommand::Create {
            name,
            target,
            template,
            icon,
            no_terminal,
        } => {
            let request = NewShortcut {
                name,
                target,
                template,
                icon,
                terminal: !no_terminal,
            };
            let entry = shortcuts.create(&request, ui)?;
            ui.notify(
                NoticeLevel::Info,
                "Shortcut created",
                &entry.path.display().to_string(),
            );
        }
        ShortcutCommand::Edit {
            name,
            rename,
            template,
            direct,
            terminal,
            icon,
        } => {
            let current = shortcuts.load(&name)?;
            let template = match (template, direct) {
                (Some(t), _) => Some(t),
                (None, true) => None,
                (None, false) => current.launch.template_name(),
            };
            let changes = ShortcutEdit {
                name: rename,
                template,
                terminal: terminal.unwrap_or(current.terminal),
                icon,
            };
            let entry = shortcuts.edit(&name, &changes, ui)?;
            ui.notify(
                NoticeLevel::Info,
                "Shortcut updated",
                &entry.path.display().to_string(),
            );
        }
        ShortcutCommand::Delete { name } => {
            shortcuts.delete(&name)?;
            ui.notify(NoticeLevel::Info, "Shortcut deleted", &name);
        }
        ShortcutCommand::Run { name } => shortcuts.run(&name)?,
        ShortcutCommand::Show { name } => {
            let entry = shortcuts.load(&name)?;
            println!("Name:     {}", entry.display_name);
            println!("File:     {}", entry.path.display());
            println!("Target:   {}", entry.launch.target());
            println!(
                "Template: {}",
                entry.launch.template_name().unwrap_or_else(|| "(direct)".into())
            );
            println!("Terminal: {}", entry.terminal);
            println!("Icon:     {}", entry.icon);
        }
        ShortcutCommand::List => {
            let items = shortcuts.list()?;
            if items.is_empty() {
                println!("No shortcuts found.");
            }
            for item in items {
                println!("{:<24} {}", item.display_name, item.path.display());
            }
        }
    }
    Ok(())
}

async fn template(config: &Config, cmd: TemplateCommand, ui: &mut TerminalInteraction) -> anyhow::Result<()> {
    let store = TemplateStore::new(config.templates_dir.clone());

    match cmd {
        TemplateCommand::Create {
            name,
            options,
            preview,
        } => {
            let template = options.into_config();
            if preview {
                print!("{}", store.preview(&template));
            } else {
                let path = store.create(&name, &template)?;
                ui.notify(NoticeLevel::Info, "Template saved", &path.display().to_string());
            }
        }
        TemplateCommand::Save { name, file } => {
            let text = match file {
                Some(file) => std::fs::read_to_string(&file)
                    .with_context(|| format!("reading {}", file.display()))?,
                None => {
                    let mut text = String::new();
                    std::io::stdin().read_to_string(&mut text)?;
                    text
                }
            };
            let path = store.save_raw(&name, &text)?;
            ui.notify(NoticeLevel::Info, "Template saved", &path.display().to_string());
        }
        TemplateCommand::Show { name } => print!("{}", store.read(&name)?),
        TemplateCommand::Summary { name } => {
            let summary = store.summary(&name)?;
            println!("Runner:     {}", summary.runner);
            println!("Prefix:     {}", summary.wine_prefix);
            println!("Parallel:   {}", summary.parallel);
            println!("DXVK HUD:   {}", summary.dxvk_hud);
            println!("Emulation:  {}", summary.emu.as_deref().unwrap_or("none"));
            println!("Vulkan ICD: {}", summary.vulkan_icd.as_deref().unwrap_or("none"));
            for action in &summary.post_actions {
                println!("Post:       {}", action);
            }
        }
        TemplateCommand::Delete { name } => {
            store.delete(&name)?;
            ui.notify(NoticeLevel::Info, "Template deleted", &name);
        }
        TemplateCommand::List => {
            let names = store.list()?;
            if names.is_empty() {
                println!("No templates found.");
            }
            for name in names {
                println!("{}", name);
            }
        }
        TemplateCommand::Actions => {
            for action in barrel_lib::template::POST_ACTION_CATALOG {
                println!("{}", action);
            }
        }
        TemplateCommand::Fetch { tag } => {
            let client = ReleaseClient::new(config)?;
            let releases = client
                .github_releases(&config.template_repo, tag.as_deref())
                .await;
            let Some(release) = releases.first() else {
                ui.notify(NoticeLevel::Info, "Templates", "No releases found");
                return Ok(());
            };
            let downloads = DownloadManager::new(config)?;
            let saved = downloads.fetch_templates(release, store.dir(), ui).await?;
            ui.notify(
                NoticeLevel::Info,
                "Templates",
                &format!("Downloaded {} template(s)", saved.len()),
            );
        }
    }
    Ok(())
}

fn pick_runner(runner: Option<String>) -> String {
    runner
        .or_else(|| detect_runners().into_iter().next())
        .unwrap_or_else(|| "wine".to_string())
}

async fn prefix(config: &Config, cmd: PrefixCommand, ui: &mut TerminalInteraction) -> anyhow::Result<()> {
    let prefixes = PrefixManager::new(config);

    match cmd {
        PrefixCommand::Create {
            path,
            runner,
            template,
            arch,
        } => {
            let path = absolute(&path)?;
            let boot = match template {
                Some(name) => {
                    let store = TemplateStore::new(config.templates_dir.clone());
                    if !store.exists(&name) {
                        bail!("template '{}' not found", name);
                    }
                    BootRunner::Template(store.path(&name))
                }
                None => BootRunner::Runner(pick_runner(runner)),
            };
            prefixes.create(&path, &boot, arch)?;
            ui.notify(NoticeLevel::Info, "Prefix created", &path.display().to_string());
        }
        PrefixCommand::Delete { path } => {
            let path = absolute(&path)?;
            if prefixes.delete(&path)? {
                ui.notify(NoticeLevel::Info, "Prefix removed", &path.display().to_string());
            } else {
                ui.notify(
                    NoticeLevel::Warning,
                    "Prefix",
                    &format!("{} is not registered", path.display()),
                );
            }
        }
        PrefixCommand::List => {
            let paths = prefixes.list()?;
            if paths.is_empty() {
                println!("No prefixes registered.");
            }
            for path in paths {
                println!("{}", path.display());
            }
        }
        PrefixCommand::Winetricks { path, runner } => {
            prefixes.run_winetricks(&absolute(&path)?, &pick_runner(runner))?;
        }
        PrefixCommand::Script {
            path,
            script,
            runner,
        } => {
            prefixes.run_script(&absolute(&path)?, &pick_runner(runner), &script)?;
        }
        PrefixCommand::Regedit {
            path,
            reg_file,
            runner,
        } => {
            let reg_file = match reg_file {
                Some(file) => file,
                None => {
                    let files = list_registry_files(&config.registry_dir)?;
                    if files.is_empty() {
                        ui.notify(
                            NoticeLevel::Info,
                            "Registry",
                            &format!("No .reg files in {}", config.registry_dir.display()),
                        );
                        return Ok(());
                    }
                    let names: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
                    match ui.ask_choice("Choose a registry file", &names) {
                        Some(i) => files[i].clone(),
                        None => return Ok(()),
                    }
                }
            };
            prefixes.import_registry(&absolute(&path)?, &pick_runner(runner), &reg_file)?;
            ui.notify(NoticeLevel::Info, "Registry imported", &reg_file.display().to_string());
        }
        PrefixCommand::Dxvk { path } => {
            let installer = DxvkInstaller::new(config)?;
            match installer.install(&absolute(&path)?, ui).await? {
                Some(files) => ui.notify(
                    NoticeLevel::Info,
                    "DXVK installed",
                    &format!("{} libraries written", files.len()),
                ),
                None => ui.notify(NoticeLevel::Info, "DXVK", "Nothing installed"),
            }
        }
    }
    Ok(())
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
