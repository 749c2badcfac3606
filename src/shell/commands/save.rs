//! Save command implementation.

use crate::shell::command::{Command, CommandResult, ShellContext};

/// Command to write the database to disk.
pub struct SaveCommand;

impl Command for SaveCommand {
    fn name(&self) -> &str {
        "save"
    }

    fn aliases(&self) -> &[&str] {
        &["w", "write"]
    }

    fn description(&self) -> &str {
        "Write the database to disk"
    }

    fn usage(&self) -> &str {
        "save"
    }

    fn help(&self) -> &str {
        "Encrypt the database with its current settings and replace the file\n\
         on disk. Changes are also saved after every add or remove."
    }

    fn execute(&self, args: &[&str], ctx: &mut ShellContext) -> CommandResult {
        if let Err(usage) = self.check_arity(args) {
            return CommandResult::error(usage);
        }
        if ctx.db.is_locked() {
            return CommandResult::error("Database is locked");
        }
        ctx.request_save();
        CommandResult::ok()
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}
