mod config;

pub use config::{CoachingConfig, Config, RestConfig};

use std::path::PathBuf;

use crate::error::Result;

/// Returns the directory holding `config.toml`.
///
/// `RESTWELL_HOME` wins when set. Otherwise `~/.config/restwell[-dev]/`,
/// with `RESTWELL_ENV=dev` selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("RESTWELL_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("RESTWELL_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("restwell-dev")
            } else {
                base_dir.join("restwell")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
