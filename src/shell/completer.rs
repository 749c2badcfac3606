//! Tab completion for command names and group paths.

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::sync::{Arc, RwLock};

use crate::shell::command::CommandRegistry;

/// Group paths in shell form, refreshed by the shell after each command.
pub type GroupPaths = Arc<RwLock<Vec<String>>>;

pub struct VaultHelper {
    registry: Arc<CommandRegistry>,
    groups: GroupPaths,
}

impl VaultHelper {
    pub fn new(registry: Arc<CommandRegistry>, groups: GroupPaths) -> Self {
        Self { registry, groups }
    }

    fn complete_command(&self, partial: &str) -> Vec<Pair> {
        self.registry
            .completions(partial)
            .into_iter()
            .map(pair)
            .collect()
    }

    fn complete_group(&self, partial: &str) -> Vec<Pair> {
        match self.groups.read() {
            Ok(groups) => groups
                .iter()
                .filter(|g| g.starts_with(partial))
                .cloned()
                .map(pair)
                .collect(),
            Err(_) => vec![],
        }
    }

    /// Completion start offset and candidates for `line[..pos]`.
    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let before = &line[..pos];
        let parts: Vec<&str> = before.split_whitespace().collect();
        let at_new_word = before.is_empty() || before.ends_with(char::is_whitespace);
        let partial = if at_new_word {
            ""
        } else {
            parts.last().copied().unwrap_or("")
        };
        let start = pos - partial.len();

        let Some(command) = parts.first() else {
            return (start, self.complete_command(""));
        };
        if parts.len() == 1 && !at_new_word {
            return (start, self.complete_command(partial));
        }

        let arg_index = if at_new_word {
            parts.len() - 1
        } else {
            parts.len() - 2
        };

        let completions = match self.registry.get(command) {
            Some(cmd) if cmd.name() == "help" && arg_index == 0 => {
                self.complete_command(partial)
            }
            Some(cmd) if cmd.completes_group(arg_index) => self.complete_group(partial),
            _ => vec![],
        };
        (start, completions)
    }
}

fn pair(s: String) -> Pair {
    Pair {
        display: s.clone(),
        replacement: s,
    }
}

impl Completer for VaultHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.candidates(line, pos))
    }
}

impl Hinter for VaultHelper {
    type Hint = String;
}

impl Highlighter for VaultHelper {}

impl Validator for VaultHelper {}

impl Helper for VaultHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::commands::register_all;

    fn helper() -> VaultHelper {
        let mut registry = CommandRegistry::new();
        register_all(&mut registry);
        let groups = vec!["-".to_string(), "Work".to_string(), "Work/Mail".to_string()];
        VaultHelper::new(Arc::new(registry), Arc::new(RwLock::new(groups)))
    }

    fn replacements(pairs: Vec<Pair>) -> Vec<String> {
        pairs.into_iter().map(|p| p.replacement).collect()
    }

    #[test]
    fn test_complete_command_name() {
        let (start, pairs) = helper().candidates("ge", 2);
        assert_eq!(start, 0);
        assert_eq!(replacements(pairs), vec!["gen", "generate", "get"]);
    }

    #[test]
    fn test_complete_group_argument() {
        let line = "show Wo";
        let (start, pairs) = helper().candidates(line, line.len());
        assert_eq!(start, 5);
        assert_eq!(replacements(pairs), vec!["Work", "Work/Mail"]);
    }

    #[test]
    fn test_no_group_completion_for_title() {
        let line = "show Work O";
        let (_, pairs) = helper().candidates(line, line.len());
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_help_completes_commands() {
        let line = "help sa";
        let (start, pairs) = helper().candidates(line, line.len());
        assert_eq!(start, 5);
        assert_eq!(replacements(pairs), vec!["save"]);
    }

    #[test]
    fn test_empty_line_lists_commands() {
        let (start, pairs) = helper().candidates("", 0);
        assert_eq!(start, 0);
        assert!(replacements(pairs).contains(&"add".to_string()));
    }
}
