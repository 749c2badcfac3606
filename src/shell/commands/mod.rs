//! Individual command implementations.

mod add;
mod generate;
mod groups;
mod help;
mod list;
mod quit;
mod remove;
mod save;
mod show;

pub use add::AddCommand;
pub use generate::GenerateCommand;
pub use groups::GroupsCommand;
pub use help::HelpCommand;
pub use list::ListCommand;
pub use quit::QuitCommand;
pub use remove::RemoveCommand;
pub use save::SaveCommand;
pub use show::ShowCommand;

use std::sync::Arc;

use super::command::CommandRegistry;
use crate::tree::PATH_SEPARATOR;

/// Registers all built-in commands with the registry.
pub fn register_all(registry: &mut CommandRegistry) {
    registry.register(Arc::new(AddCommand));
    registry.register(Arc::new(ListCommand));
    registry.register(Arc::new(GroupsCommand));
    registry.register(Arc::new(ShowCommand));
    registry.register(Arc::new(RemoveCommand));
    registry.register(Arc::new(GenerateCommand));
    registry.register(Arc::new(SaveCommand));
    registry.register(Arc::new(HelpCommand));
    registry.register(Arc::new(QuitCommand));
}

/// Turns a shell group argument into a group path.
///
/// Arguments cannot contain spaces, so `Work/Mail` stands for `Work / Mail`
/// and `-` stands for the root group.
pub fn group_arg(arg: &str) -> String {
    if arg == "-" {
        return String::new();
    }
    arg.split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR)
}

/// Shows a group path the way it is typed.
pub fn display_group(path: &str) -> String {
    if path.is_empty() {
        "-".to_string()
    } else {
        path.replace(PATH_SEPARATOR, "/")
    }
}
