use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::process::ExitCode;
use zeroize::Zeroizing;

use keepvault::shell::ShellConfig;
use keepvault::{AppConfig, Database, SaveOptions, Shell, VaultError, init_logging};

const MAX_UNLOCK_ATTEMPTS: usize = 3;

fn prompt(label: &str) -> Result<Zeroizing<String>> {
    let password = rpassword::prompt_password(label).context("Error reading master password")?;
    Ok(Zeroizing::new(password))
}

fn is_new_database(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.len() == 0)
        .unwrap_or(true)
}

fn create_database(path: &Path) -> Result<Database> {
    println!("No database at {}. Creating a new one.", path.display());
    let password = prompt("New master password: ")?;
    if password.is_empty() {
        return Err(anyhow!("master password cannot be empty"));
    }
    let confirm = prompt("Repeat master password: ")?;
    if *password != *confirm {
        return Err(anyhow!("passwords do not match"));
    }

    let options = SaveOptions::new(path, password.as_str());
    let mut db = Database::create(&options)?;
    println!("Deriving key, this can take a few seconds...");
    db.save(&options)?;
    log::info!("Created new database at {}", path.display());
    Ok(db)
}

fn unlock_database(path: &Path) -> Result<Database> {
    for attempt in 1..=MAX_UNLOCK_ATTEMPTS {
        let password = prompt("Master password: ")?;
        match Database::open(path, &password) {
            Ok(db) => return Ok(db),
            Err(VaultError::Decryption) => {
                log::warn!("Failed unlock attempt {}", attempt);
                eprintln!("Wrong master password.");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(anyhow!("too many failed attempts"))
}

fn run() -> Result<()> {
    let mut config = AppConfig::load()?;
    if let Some(path) = std::env::args_os().nth(1) {
        config = config.with_database(path);
    }
    config.ensure_data_dir()?;

    if let Err(e) = init_logging(&config.log_config()) {
        eprintln!("Warning: logging disabled: {e:#}");
    }

    println!("Welcome to keepvault!");
    let path = config.database_path.clone();
    let mut db = if is_new_database(&path) {
        create_database(&path)?
    } else {
        unlock_database(&path)?
    };

    let shell = Shell::with_config(ShellConfig::from(&config));
    let result = shell.run_with_save(&mut db, |db| {
        let options = db.current_options();
        db.save(&options)?;
        Ok(())
    });

    db.close()?;
    result
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
