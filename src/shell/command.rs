//! Command trait and registry for the shell.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::database::Database;

/// Result of executing a command.
#[derive(Debug, Clone)]
pub enum CommandResult {
    /// Finished, with an optional message for the user.
    Success(Option<String>),
    /// Failed; the message is printed and the shell keeps going.
    Error(String),
    /// Leave the shell.
    Exit,
    /// Nothing to report, e.g. an empty line.
    Continue,
}

impl CommandResult {
    /// Success with a message.
    pub fn success(msg: impl Into<String>) -> Self {
        CommandResult::Success(Some(msg.into()))
    }

    /// Success without a message.
    pub fn ok() -> Self {
        CommandResult::Success(None)
    }

    /// An error message for the user.
    pub fn error(msg: impl Into<String>) -> Self {
        CommandResult::Error(msg.into())
    }
}

/// State a command can see and change while it runs.
pub struct ShellContext<'a> {
    pub db: &'a mut Database,
    /// Set by commands that changed the tree.
    pub modified: bool,
    /// Set by `save`; the shell writes the database after the command.
    pub save_requested: bool,
    /// Present when the shell runs the command; `help` reads it.
    pub registry: Option<&'a CommandRegistry>,
}

impl<'a> ShellContext<'a> {
    /// A context with no flags set and no registry.
    pub fn new(db: &'a mut Database) -> Self {
        Self {
            db,
            modified: false,
            save_requested: false,
            registry: None,
        }
    }

    /// Lets the command see every registered command.
    pub fn with_registry(mut self, registry: &'a CommandRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Records that the tree changed and should be written.
    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Asks the shell to write the database once the command returns.
    pub fn request_save(&mut self) {
        self.save_requested = true;
    }
}

/// A command that can be executed in the shell.
pub trait Command: Send + Sync {
    /// Primary name, as typed at the prompt.
    fn name(&self) -> &str;

    /// Other names that resolve to this command.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// One line for the command listing.
    fn description(&self) -> &str;

    /// e.g. `show <group> <title>`.
    fn usage(&self) -> &str;

    /// Longer text for `help <command>`. Defaults to the description.
    fn help(&self) -> &str {
        self.description()
    }

    /// Runs the command. `args` excludes the command name; commands with
    /// fixed arity call [`Command::check_arity`] first.
    fn execute(&self, args: &[&str], ctx: &mut ShellContext) -> CommandResult;

    /// Whether argument `arg_index` names a group, so the completer can
    /// offer group paths.
    fn completes_group(&self, _arg_index: usize) -> bool {
        false
    }

    /// Fewest arguments accepted.
    fn min_args(&self) -> usize {
        0
    }

    /// `None` means no upper bound.
    fn max_args(&self) -> Option<usize> {
        None
    }

    /// Checks the argument count against `min_args` and `max_args`.
    fn check_arity(&self, args: &[&str]) -> Result<(), String> {
        let too_few = args.len() < self.min_args();
        let too_many = self.max_args().is_some_and(|max| args.len() > max);
        if too_few || too_many {
            Err(format!("Usage: {}", self.usage()))
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for dyn Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name())
            .field("description", &self.description())
            .finish()
    }
}

/// Registry of all available commands, keyed by name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Arc<dyn Command>>,
    aliases: BTreeMap<String, String>,
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `command` under its name and aliases. A later command with the
    /// same name replaces the earlier one.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        let name = command.name().to_string();
        for alias in command.aliases() {
            self.aliases.insert(alias.to_string(), name.clone());
        }
        self.commands.insert(name, command);
    }

    /// Looks up a command by name or alias.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        let primary = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.commands.get(primary).map(Arc::clone)
    }

    /// Commands in name order.
    pub fn commands(&self) -> impl Iterator<Item = &Arc<dyn Command>> {
        self.commands.values()
    }

    /// Names and aliases starting with `prefix`, sorted.
    pub fn completions(&self, prefix: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .commands
            .keys()
            .chain(self.aliases.keys())
            .filter(|n| n.starts_with(prefix))
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Number of commands, aliases not counted.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
