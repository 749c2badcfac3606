//! Remove command implementation.

use super::{display_group, group_arg};
use crate::shell::command::{Command, CommandResult, ShellContext};

/// Command to remove an entry, or a whole group.
pub struct RemoveCommand;

impl Command for RemoveCommand {
    fn name(&self) -> &str {
        "remove"
    }

    fn aliases(&self) -> &[&str] {
        &["rm", "del"]
    }

    fn description(&self) -> &str {
        "Remove an entry or a group"
    }

    fn usage(&self) -> &str {
        "remove <group> [title]"
    }

    fn help(&self) -> &str {
        "Remove the entry <title> from <group>. Without a title the group\n\
         itself is removed together with its subgroups and entries.\n\
         The root group cannot be removed.\n\n\
         Examples:\n  \
           remove Work/Mail Outlook\n  \
           rm Old"
    }

    fn execute(&self, args: &[&str], ctx: &mut ShellContext) -> CommandResult {
        if let Err(usage) = self.check_arity(args) {
            return CommandResult::error(usage);
        }
        let group = group_arg(args[0]);
        let shown = display_group(&group);

        let outcome = match args.get(1) {
            Some(title) => ctx
                .db
                .remove_entry(&group, title)
                .map(|found| (found, format!("'{}' from {}", title, shown))),
            None => ctx
                .db
                .remove_group(&group)
                .map(|found| (found, format!("group {}", shown))),
        };

        match outcome {
            Ok((true, what)) => {
                ctx.mark_modified();
                CommandResult::success(format!("Removed {}", what))
            }
            Ok((false, what)) => CommandResult::error(format!("Not found: {}", what)),
            Err(e) => {
                log::warn!("Failed to remove from '{}': {}", group, e);
                CommandResult::error(e.to_string())
            }
        }
    }

    fn completes_group(&self, arg_index: usize) -> bool {
        arg_index == 0
    }

    fn min_args(&self) -> usize {
        1
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
    fn test_remove_entry() {
        let mut db = testing::database();
        db.add_entry("Work", "a", "", "", "", "").unwrap();
        db.add_entry("Work", "b", "", "", "", "").unwrap();
        let mut ctx = ShellContext::new(&mut db);

        let result = RemoveCommand.execute(&["Work", "a"], &mut ctx);

        assert!(matches!(result, CommandResult::Success(_)));
        assert!(ctx.modified);
        let titles: Vec<String> = db.entries().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["b"]);
    }

    #[test]
    fn test_remove_group() {
        let mut db = testing::database();
        db.add_entry("Work / Mail", "a", "", "", "", "").unwrap();
        db.add_entry("Home", "b", "", "", "", "").unwrap();
        let mut ctx = ShellContext::new(&mut db);

        let result = RemoveCommand.execute(&["Work"], &mut ctx);

        assert!(matches!(result, CommandResult::Success(_)));
        assert_eq!(db.entry_count(), 1);
        assert!(db.group("Work / Mail").is_none());
    }

    #[test]
    fn test_remove_missing() {
        let mut db = testing::database();
        let mut ctx = ShellContext::new(&mut db);

        let result = RemoveCommand.execute(&["Nowhere", "x"], &mut ctx);
        assert!(matches!(result, CommandResult::Error(_)));
        assert!(!ctx.modified);
    }

    #[test]
    fn test_remove_root_rejected() {
        let mut db = testing::database();
        let mut ctx = ShellContext::new(&mut db);

        let result = RemoveCommand.execute(&["-"], &mut ctx);
        assert!(matches!(result, CommandResult::Error(_)));
    }
}
