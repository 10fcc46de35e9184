//! Config commands

use anyhow::{bail, Result};

use crate::config::{mask_secret, Config};
use crate::output::OutputFormat;
use crate::ConfigCommands;

const KEYS: &[&str] = &["api_url", "token", "default_format"];

pub fn handle(action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Init => {
            let path = Config::default().save()?;
            println!("Configuration initialized at {}", path.display());
        }
        ConfigCommands::Set { key, value } => {
            if key == "default_format" && OutputFormat::from_name(&value).is_none() {
                bail!("default_format must be `table` or `json`");
            }
            let mut config = Config::load()?;
            let Some(field) = config.field_mut(&key) else {
                bail!("Unknown config key: {}", key);
            };
            *field = Some(value);
            config.save()?;
            println!("Set {} successfully", key);
        }
        ConfigCommands::Get { key } => {
            let mut config = Config::load()?;
            let Some(value) = config.field_mut(&key).map(|v| v.clone()) else {
                bail!("Unknown config key: {}", key);
            };
            println!("{}: {}", key, display(&key, value));
        }
        ConfigCommands::List => {
            let mut config = Config::load()?;
            for key in KEYS {
                let value = config.field_mut(key).and_then(|v| v.clone());
                println!("{}: {}", key, display(key, value));
            }
        }
    }
    Ok(())
}

fn display(key: &str, value: Option<String>) -> String {
    match value {
        Some(token) if key == "token" => mask_secret(&token),
        Some(value) => value,
        None => "(not set)".into(),
    }
}
