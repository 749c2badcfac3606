//! Interactive shell over an open database.
//!
//! Built on rustyline, with command and group-path completion and a
//! persistent history file.

pub mod command;
pub mod commands;
pub mod completer;

use anyhow::{Result, anyhow};
use rustyline::Editor;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::config::{AppConfig, DEFAULT_HISTORY_SIZE};
use crate::database::Database;
use crate::tree::Group;

use command::{CommandRegistry, CommandResult, ShellContext};
use commands::{display_group, register_all};
use completer::{GroupPaths, VaultHelper};

const PROMPT: &str = "keepvault> ";

/// Settings for one interactive session.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// `None` keeps history in memory only.
    pub history_path: Option<PathBuf>,
    /// Lines of history kept.
    pub history_size: usize,
    /// Print the command summary when the session starts.
    pub show_welcome: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            history_path: None,
            history_size: DEFAULT_HISTORY_SIZE,
            show_welcome: true,
        }
    }
}

impl From<&AppConfig> for ShellConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            history_path: Some(config.history_path.clone()),
            history_size: config.history_size,
            show_welcome: true,
        }
    }
}

/// The interactive command loop.
pub struct Shell {
    registry: Arc<CommandRegistry>,
    groups: GroupPaths,
    config: ShellConfig,
}

impl Shell {
    /// A shell with every built-in command and in-memory history.
    pub fn new() -> Self {
        Self::with_config(ShellConfig::default())
    }

    /// A shell with every built-in command and the given settings.
    pub fn with_config(config: ShellConfig) -> Self {
        let mut registry = CommandRegistry::new();
        register_all(&mut registry);

        Self {
            registry: Arc::new(registry),
            groups: Arc::new(RwLock::new(Vec::new())),
            config,
        }
    }

    /// Rebuilds the group paths offered by tab completion.
    fn refresh_groups(&self, db: &Database) {
        fn collect(group: &Group, out: &mut Vec<String>) {
            out.push(display_group(&group.path));
            for child in &group.groups {
                collect(child, out);
            }
        }

        if let Ok(mut paths) = self.groups.write() {
            paths.clear();
            for root in db.groups() {
                collect(&root, &mut paths);
            }
            log::debug!("Completion knows {} groups", paths.len());
        }
    }

    /// Runs the read-eval loop until `quit` or end of input.
    ///
    /// `save_fn` is called after every command that changed the database
    /// and after `save`.
    pub fn run_with_save<F>(&self, db: &mut Database, mut save_fn: F) -> Result<()>
    where
        F: FnMut(&mut Database) -> Result<()>,
    {
        self.refresh_groups(db);

        let helper = VaultHelper::new(Arc::clone(&self.registry), Arc::clone(&self.groups));
        let mut editor: Editor<VaultHelper, FileHistory> = Editor::new()?;
        editor.set_helper(Some(helper));
        editor.set_max_history_size(self.config.history_size)?;
        editor.set_history_ignore_dups(true)?;
        editor.set_history_ignore_space(true);

        if let Some(path) = self.config.history_path.as_ref().filter(|p| p.exists()) {
            if let Err(e) = editor.load_history(path) {
                log::warn!("Could not load history: {}", e);
            }
        }

        if self.config.show_welcome {
            println!(
                "Unlocked {} ({} entries). Type 'help' for available commands.",
                db.file_path().display(),
                db.entry_count()
            );
        }
        log::info!("Shell started");

        let mut unsaved = false;
        loop {
            let line = match editor.readline(PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("quit");
                    log::info!("EOF received (Ctrl-D)");
                    break;
                }
                Err(err) => {
                    log::error!("Readline error: {}", err);
                    return Err(anyhow!("Readline error: {}", err));
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            // Entries added on the command line carry their password.
            if !line.starts_with("add ") && !line.starts_with("a ") && !line.starts_with("new ") {
                let _ = editor.add_history_entry(line);
            }

            let mut ctx = ShellContext::new(db).with_registry(&self.registry);
            let result = self.execute_with_context(line, &mut ctx);
            let (modified, save_requested) = (ctx.modified, ctx.save_requested);

            match result {
                CommandResult::Success(Some(msg)) => println!("{}", msg),
                CommandResult::Success(None) | CommandResult::Continue => {}
                CommandResult::Error(msg) => eprintln!("Error: {}", msg),
                CommandResult::Exit => break,
            }

            if modified {
                unsaved = true;
                self.refresh_groups(db);
            }
            if modified || save_requested {
                match save_fn(db) {
                    Ok(()) => {
                        unsaved = false;
                        println!("Saved.");
                    }
                    Err(e) => {
                        eprintln!("Error: Failed to save: {}", e);
                        log::error!("Failed to save database: {}", e);
                    }
                }
            }
        }

        if unsaved {
            if let Err(e) = save_fn(db) {
                log::error!("Final save failed: {}", e);
                eprintln!("Error: Changes could not be saved: {}", e);
            }
        }

        if let Some(path) = &self.config.history_path {
            if let Err(e) = editor.save_history(path) {
                log::warn!("Failed to save history: {}", e);
            }
        }

        log::info!("Shell exited");
        Ok(())
    }

    /// Runs one command line against `db`.
    pub fn execute_line(&self, line: &str, db: &mut Database) -> CommandResult {
        let mut ctx = ShellContext::new(db).with_registry(&self.registry);
        self.execute_with_context(line, &mut ctx)
    }

    fn execute_with_context(&self, line: &str, ctx: &mut ShellContext) -> CommandResult {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((cmd_name, args)) = parts.split_first() else {
            return CommandResult::Continue;
        };

        // Arguments are not logged, they may hold passwords.
        log::debug!("Executing command: {}", cmd_name);

        match self.registry.get(cmd_name) {
            Some(cmd) => crate::log_timed!(cmd.name(), cmd.execute(args, ctx)),
            None => CommandResult::error(format!(
                "Unknown command: '{}'\nType 'help' to see available commands.",
                cmd_name
            )),
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}
