//! Show command implementation.

use super::{display_group, group_arg};
use crate::shell::command::{Command, CommandResult, ShellContext};

/// Command to display one entry, password included.
pub struct ShowCommand;

impl Command for ShowCommand {
    fn name(&self) -> &str {
        "show"
    }

    fn aliases(&self) -> &[&str] {
        &["get", "g"]
    }

    fn description(&self) -> &str {
        "Show an entry and its password"
    }

    fn usage(&self) -> &str {
        "show <group> <title>"
    }

    fn help(&self) -> &str {
        "Display every field of an entry, including the password.\n\n\
         Arguments:\n  \
           <group> - Group path such as Work/Mail, or - for the root\n  \
           <title> - Entry title\n\n\
         Examples:\n  \
           show Work/Mail Outlook\n  \
           get - Router"
    }

    fn execute(&self, args: &[&str], ctx: &mut ShellContext) -> CommandResult {
        if let Err(usage) = self.check_arity(args) {
            return CommandResult::error(usage);
        }
        let group = group_arg(args[0]);
        let title = args[1];

        let Some(entry) = ctx
            .db
            .entries()
            .into_iter()
            .find(|e| e.group_path == group && e.title == title)
        else {
            return CommandResult::error(format!(
                "'{}' not found in {}",
                title,
                display_group(&group)
            ));
        };

        let password = entry.password().unwrap_or("(locked)");
        let mut out = format!(
            "Title:    {}\nGroup:    {}\nUserName: {}\nPassword: {}",
            entry.title,
            display_group(&entry.group_path),
            entry.username,
            password
        );
        if !entry.url.is_empty() {
            out.push_str(&format!("\nURL:      {}", entry.url));
        }
        if !entry.notes.is_empty() {
            out.push_str(&format!("\nNotes:    {}", entry.notes));
        }

        log::info!("Displayed entry '{}'", title);
        CommandResult::success(out)
    }

    fn completes_group(&self, arg_index: usize) -> bool {
        arg_index == 0
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::commands::testing;

    #[test]
    fn test_show_command_found() {
        let mut db = testing::database();
        db.add_entry("Work / Mail", "Outlook", "alice", "s3cret", "https://o.com", "")
            .unwrap();
        let mut ctx = ShellContext::new(&mut db);

        match ShowCommand.execute(&["Work/Mail", "Outlook"], &mut ctx) {
            CommandResult::Success(Some(msg)) => {
                assert!(msg.contains("UserName: alice"));
                assert!(msg.contains("Password: s3cret"));
                assert!(msg.contains("URL:      https://o.com"));
                assert!(!msg.contains("Notes:"));
            }
            other => panic!("Expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_show_command_wrong_group() {
        let mut db = testing::database();
        db.add_entry("Work", "Outlook", "alice", "s3cret", "", "").unwrap();
        let mut ctx = ShellContext::new(&mut db);

        let result = ShowCommand.execute(&["-", "Outlook"], &mut ctx);
        assert!(matches!(result, CommandResult::Error(_)));
    }

    #[test]
    fn test_show_command_locked_hides_password() {
        let mut db = testing::database();
        db.add_entry("", "T", "u", "secret", "", "").unwrap();
        db.close().unwrap();
        let mut ctx = ShellContext::new(&mut db);

        match ShowCommand.execute(&["-", "T"], &mut ctx) {
            CommandResult::Success(Some(msg)) => {
                assert!(msg.contains("(locked)"));
                assert!(!msg.contains("secret"));
            }
            other => panic!("Expected success, got {:?}", other),
        }
    }
}
