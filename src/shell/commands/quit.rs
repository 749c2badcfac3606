//! Quit command implementation.

use crate::shell::command::{Command, CommandResult, ShellContext};

/// Command to leave the shell.
pub struct QuitCommand;

impl Command for QuitCommand {
    fn name(&self) -> &str {
        "quit"
    }

    fn aliases(&self) -> &[&str] {
        &["exit", "q"]
    }

    fn description(&self) -> &str {
        "Lock the database and exit"
    }

    fn usage(&self) -> &str {
        "quit"
    }

    fn help(&self) -> &str {
        "Leave the shell. The database is locked on the way out; unsaved\n\
         changes are written first.\n\n\
         Examples:\n  \
           quit\n  \
           q"
    }

    fn execute(&self, _args: &[&str], _ctx: &mut ShellContext) -> CommandResult {
        log::info!("User requested exit");
        CommandResult::Exit
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::commands::testing;

    #[test]
    fn test_quit_command() {
        let mut db = testing::database();
        let mut ctx = ShellContext::new(&mut db);

        assert!(matches!(
            QuitCommand.execute(&[], &mut ctx),
            CommandResult::Exit
        ));
    }
}
