use std::io::{self, Write};

use queuectl_core::{ConfigDefaults, JobStore};

use crate::error::CliResult;

pub async fn set(store: &dyn JobStore, key: &str, value: &str) -> CliResult<()> {
    if !ConfigDefaults::KNOWN_KEYS.contains(&key) {
        eprintln!("Warning: '{key}' is not a standard config key.");
        eprintln!("Known keys: {}", ConfigDefaults::KNOWN_KEYS.join(", "));
        if !confirm("Set it anyway?") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.set_config(key, value).await?;

    println!("Configuration updated:");
    println!("  {key} = {value}");

    Ok(())
}

pub async fn get(store: &dyn JobStore, key: &str) -> CliResult<()> {
    let default = default_for(key);
    let value = store.get_config(key, default).await?;

    match value {
        Some(v) => {
            println!("{key} = {v}");
            if Some(v.as_str()) == default {
                println!("  (default value)");
            }
        }
        None => {
            println!("{key} is not set");
            if let Some(d) = default {
                println!("  Default would be: {d}");
            }
        }
    }

    Ok(())
}

pub async fn list(store: &dyn JobStore) -> CliResult<()> {
    let config = store.list_config().await?;

    if config.is_empty() {
        println!("No configuration values set.");
        println!();
        println!("Defaults:");
        println!("  max-retries = {}", ConfigDefaults::MAX_RETRIES);
        println!("  backoff-base = {}", ConfigDefaults::BACKOFF_BASE);
        println!("  backoff-initial-delay = {}", ConfigDefaults::BACKOFF_INITIAL_DELAY);
        return Ok(());
    }

    println!("Configuration:");
    println!("{}", "-".repeat(40));
    let mut keys: Vec<&String> = config.keys().collect();
    keys.sort();
    for key in keys {
        println!("  {key} = {}", config[key]);
    }

    Ok(())
}

fn default_for(key: &str) -> Option<&'static str> {
    match key {
        "max-retries" => Some("3"),
        "backoff-base" => Some("2"),
        "backoff-initial-delay" => Some("1"),
        _ => None,
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}
