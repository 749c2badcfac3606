//! Generate command implementation.

use crate::entropy::{Strength, entropy};
use crate::generator::{self, PasswordOptions};
use crate::shell::command::{Command, CommandResult, ShellContext};

/// Command to generate a random password and rate it.
pub struct GenerateCommand;

fn parse_options(args: &[&str]) -> Result<PasswordOptions, String> {
    let mut options = PasswordOptions::default();
    for arg in args {
        match *arg {
            "--no-lower" => options.lowercase = false,
            "--no-upper" => options.uppercase = false,
            "--no-digits" => options.digits = false,
            "--no-special" => options.special = false,
            "--no-ambiguous" => options.exclude_ambiguous = true,
            other => {
                options.length = other
                    .parse()
                    .map_err(|_| format!("Invalid length or flag: '{}'", other))?;
            }
        }
    }
    Ok(options)
}

impl Command for GenerateCommand {
    fn name(&self) -> &str {
        "generate"
    }

    fn aliases(&self) -> &[&str] {
        &["gen", "pw"]
    }

    fn description(&self) -> &str {
        "Generate a random password"
    }

    fn usage(&self) -> &str {
        "generate [length] [--no-lower] [--no-upper] [--no-digits] [--no-special] [--no-ambiguous]"
    }

    fn help(&self) -> &str {
        "Generate a password from the OS random source and report its\n\
         entropy. All character classes are used unless switched off, and\n\
         every enabled class appears at least once.\n\n\
         Options:\n  \
           [length]       - At least 8, default 20\n  \
           --no-lower     - No lowercase letters\n  \
           --no-upper     - No uppercase letters\n  \
           --no-digits    - No digits\n  \
           --no-special   - No special characters\n  \
           --no-ambiguous - Leave out i l 1 L o 0 O\n\n\
         Examples:\n  \
           generate\n  \
           gen 32 --no-special"
    }

    fn execute(&self, args: &[&str], _ctx: &mut ShellContext) -> CommandResult {
        let options = match parse_options(args) {
            Ok(o) => o,
            Err(msg) => return CommandResult::error(format!("{}\nUsage: {}", msg, self.usage())),
        };

        match generator::generate(&options) {
            Ok(password) => {
                let bits = entropy(&password, &options);
                log::debug!("Generated {}-character password", options.length);
                CommandResult::success(format!(
                    "{}\nEntropy: {:.2} bits ({})",
                    password.as_str(),
                    bits,
                    Strength::from_bits(bits)
                ))
            }
            Err(e) => CommandResult::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::commands::testing;

    #[test]
    fn test_parse_options() {
        let opts = parse_options(&["12", "--no-special", "--no-ambiguous"]).unwrap();
        assert_eq!(opts.length, 12);
        assert!(!opts.special);
        assert!(opts.exclude_ambiguous);
        assert!(opts.lowercase && opts.uppercase && opts.digits);

        assert!(parse_options(&["--bogus"]).is_err());
    }

    #[test]
    fn test_generate_command_default() {
        let mut db = testing::database();
        let mut ctx = ShellContext::new(&mut db);

        match GenerateCommand.execute(&[], &mut ctx) {
            CommandResult::Success(Some(msg)) => {
                let mut lines = msg.lines();
                assert_eq!(lines.next().map(str::len), Some(20));
                assert_eq!(lines.next(), Some("Entropy: 129.84 bits (excellent)"));
            }
            other => panic!("Expected success, got {:?}", other),
        }
        assert!(!ctx.modified);
    }

    #[test]
    fn test_generate_command_too_short() {
        let mut db = testing::database();
        let mut ctx = ShellContext::new(&mut db);

        let result = GenerateCommand.execute(&["7"], &mut ctx);
        assert!(matches!(result, CommandResult::Error(_)));
    }

    #[test]
    fn test_generate_command_no_classes() {
        let mut db = testing::database();
        let mut ctx = ShellContext::new(&mut db);

        let args = ["--no-lower", "--no-upper", "--no-digits", "--no-special"];
        let result = GenerateCommand.execute(&args, &mut ctx);
        assert!(matches!(result, CommandResult::Error(_)));
    }
}
