//! Add command implementation.

use super::{display_group, group_arg};
use crate::generator::{self, PasswordOptions};
use crate::shell::command::{Command, CommandResult, ShellContext};

/// Command to add a new entry.
pub struct AddCommand;

impl Command for AddCommand {
    fn name(&self) -> &str {
        "add"
    }

    fn aliases(&self) -> &[&str] {
        &["a", "new"]
    }

    fn description(&self) -> &str {
        "Add an entry to a group"
    }

    fn usage(&self) -> &str {
        "add <group> <title> <username> <password> [url] [notes...]"
    }

    fn help(&self) -> &str {
        "Add an entry, creating the group and its parents if needed.\n\n\
         Arguments:\n  \
           <group>    - Group path such as Work/Mail, or - for the root\n  \
           <title>    - Entry title\n  \
           <username> - Login name\n  \
           <password> - The password, or - to generate one\n  \
           [url]      - Optional URL\n  \
           [notes]    - Optional notes, the rest of the line\n\n\
         Examples:\n  \
           add Work/Mail Outlook alice s3cret https://outlook.com\n  \
           add - Router admin - 192.168.1.1 basement"
    }

    fn execute(&self, args: &[&str], ctx: &mut ShellContext) -> CommandResult {
        if let Err(usage) = self.check_arity(args) {
            return CommandResult::error(format!("{usage}\nMissing required arguments"));
        }

        let group = group_arg(args[0]);
        let title = args[1];
        let username = args[2];
        let url = args.get(4).copied().unwrap_or("");
        let notes = args.get(5..).map(|rest| rest.join(" ")).unwrap_or_default();

        let generated;
        let password = if args[3] == "-" {
            generated = match generator::generate(&PasswordOptions::default()) {
                Ok(p) => p,
                Err(e) => return CommandResult::error(e.to_string()),
            };
            generated.as_str()
        } else {
            args[3]
        };

        log::debug!("Adding entry '{}' to '{}'", title, group);

        match ctx
            .db
            .add_entry(&group, title, username, password, url, &notes)
        {
            Ok(()) => {
                ctx.mark_modified();
                let mut msg = format!("Added '{}' to {}", title, display_group(&group));
                if args[3] == "-" {
                    msg.push_str(&format!("\nGenerated password: {}", password));
                }
                CommandResult::success(msg)
            }
            Err(e) => {
                log::warn!("Failed to add entry '{}': {}", title, e);
                CommandResult::error(e.to_string())
            }
        }
    }

    fn completes_group(&self, arg_index: usize) -> bool {
        arg_index == 0
    }

    fn min_args(&self) -> usize {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::commands::testing;

    #[test]
    fn test_add_command_success() {
        let mut db = testing::database();
        let mut ctx = ShellContext::new(&mut db);

        let result = AddCommand.execute(&["Work/Mail", "Outlook", "alice", "s3cret"], &mut ctx);

        assert!(matches!(result, CommandResult::Success(_)));
        assert!(ctx.modified);
        let entries = db.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].group_path, "Work / Mail");
        assert_eq!(entries[0].username, "alice");
        assert_eq!(entries[0].password(), Some("s3cret"));
    }

    #[test]
    fn test_add_command_missing_args() {
        let mut db = testing::database();
        let mut ctx = ShellContext::new(&mut db);

        let result = AddCommand.execute(&["Work", "Outlook", "alice"], &mut ctx);

        assert!(matches!(result, CommandResult::Error(_)));
        assert!(!ctx.modified);
    }

    #[test]
    fn test_add_command_url_and_notes() {
        let mut db = testing::database();
        let mut ctx = ShellContext::new(&mut db);

        let args = ["-", "Router", "admin", "pw", "192.168.1.1", "in", "the", "basement"];
        let result = AddCommand.execute(&args, &mut ctx);

        assert!(matches!(result, CommandResult::Success(_)));
        let entry = &db.entries()[0];
        assert_eq!(entry.group_path, "");
        assert_eq!(entry.url, "192.168.1.1");
        assert_eq!(entry.notes, "in the basement");
    }

    #[test]
    fn test_add_command_generates_password() {
        let mut db = testing::database();
        let mut ctx = ShellContext::new(&mut db);

        let result = AddCommand.execute(&["-", "Bank", "bob", "-"], &mut ctx);

        match result {
            CommandResult::Success(Some(msg)) => assert!(msg.contains("Generated password")),
            other => panic!("Expected success, got {:?}", other),
        }
        let password = db.entries()[0].password().map(str::len);
        assert_eq!(password, Some(generator::DEFAULT_LENGTH));
    }

    #[test]
    fn test_add_command_on_locked_database() {
        let mut db = testing::database();
        db.close().unwrap();
        let mut ctx = ShellContext::new(&mut db);

        let result = AddCommand.execute(&["-", "T", "u", "p"], &mut ctx);
        assert!(matches!(result, CommandResult::Error(_)));
        assert!(!ctx.modified);
    }
}
