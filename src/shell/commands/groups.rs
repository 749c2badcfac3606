//! Groups command implementation.

use crate::shell::command::{Command, CommandResult, ShellContext};
use crate::tree::Group;

/// Command to print the group hierarchy.
pub struct GroupsCommand;

fn render(group: &Group, depth: usize, out: &mut Vec<String>) {
    let count = group.entries.len();
    let noun = if count == 1 { "entry" } else { "entries" };
    out.push(format!(
        "{}{} ({} {})",
        "  ".repeat(depth),
        group.name,
        count,
        noun
    ));
    for child in &group.groups {
        render(child, depth + 1, out);
    }
}

impl Command for GroupsCommand {
    fn name(&self) -> &str {
        "groups"
    }

    fn aliases(&self) -> &[&str] {
        &["tree"]
    }

    fn description(&self) -> &str {
        "Show the group hierarchy"
    }

    fn usage(&self) -> &str {
        "groups"
    }

    fn execute(&self, args: &[&str], ctx: &mut ShellContext) -> CommandResult {
        if let Err(usage) = self.check_arity(args) {
            return CommandResult::error(usage);
        }

        let mut lines = Vec::new();
        for root in ctx.db.groups() {
            render(&root, 0, &mut lines);
        }
        CommandResult::success(lines.join("\n"))
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
    fn test_groups_command_indents_children() {
        let mut db = testing::database();
        db.add_entry("A / B", "x", "", "", "", "").unwrap();
        db.add_entry("A / B", "y", "", "", "", "").unwrap();
        db.add_entry("C", "z", "", "", "", "").unwrap();
        let mut ctx = ShellContext::new(&mut db);

        match GroupsCommand.execute(&[], &mut ctx) {
            CommandResult::Success(Some(msg)) => {
                let lines: Vec<&str> = msg.lines().collect();
                assert_eq!(
                    lines,
                    vec![
                        "Root (0 entries)",
                        "  A (0 entries)",
                        "    B (2 entries)",
                        "  C (1 entry)",
                    ]
                );
            }
            other => panic!("Expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_groups_command_rejects_arguments() {
        let mut db = testing::database();
        let mut ctx = ShellContext::new(&mut db);
        assert!(matches!(
            GroupsCommand.execute(&["extra"], &mut ctx),
            CommandResult::Error(_)
        ));
    }
}
