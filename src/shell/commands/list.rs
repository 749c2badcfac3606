//! List command implementation.

use super::{display_group, group_arg};
use crate::shell::command::{Command, CommandResult, ShellContext};
use crate::tree::PATH_SEPARATOR;

/// Command to list entries.
pub struct ListCommand;

fn in_subtree(path: &str, group: &str) -> bool {
    group.is_empty()
        || path == group
        || path
            .strip_prefix(group)
            .is_some_and(|rest| rest.starts_with(PATH_SEPARATOR))
}

impl Command for ListCommand {
    fn name(&self) -> &str {
        "list"
    }

    fn aliases(&self) -> &[&str] {
        &["ls", "l"]
    }

    fn description(&self) -> &str {
        "List entries"
    }

    fn usage(&self) -> &str {
        "list [group]"
    }

    fn help(&self) -> &str {
        "List entries in tree order, with their group and username.\n\n\
         Passwords are not shown. With a group, only entries in that group\n\
         and its subgroups are listed.\n\n\
         Examples:\n  \
           list\n  \
           ls Work"
    }

    fn execute(&self, args: &[&str], ctx: &mut ShellContext) -> CommandResult {
        if let Err(usage) = self.check_arity(args) {
            return CommandResult::error(usage);
        }
        let group = args.first().map(|g| group_arg(g)).unwrap_or_default();

        let lines: Vec<String> = ctx
            .db
            .entries()
            .into_iter()
            .filter(|e| in_subtree(&e.group_path, &group))
            .map(|e| {
                format!(
                    "{:<20} {:<24} {}",
                    display_group(&e.group_path),
                    e.title,
                    e.username
                )
            })
            .collect();

        log::debug!("Listed {} entries", lines.len());

        if lines.is_empty() {
            return CommandResult::success("No entries.");
        }
        CommandResult::success(lines.join("\n"))
    }

    fn completes_group(&self, arg_index: usize) -> bool {
        arg_index == 0
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}
