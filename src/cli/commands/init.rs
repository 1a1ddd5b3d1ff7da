//! Write a starter config file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{config_template, resolve_config_path};
use crate::error::{Error, Result};

#[derive(Serialize)]
struct InitOutput {
    path: PathBuf,
    overwritten: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns [`Error::ConfigExists`] if the file is already there and `force`
/// is not set, or an IO error if it cannot be written.
pub fn execute(force: bool, config_path: Option<&Path>, json: bool) -> Result<()> {
    let path = resolve_config_path(config_path)?;

    let existed = path.exists();
    if existed && !force {
        return Err(Error::ConfigExists { path });
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, config_template())?;

    if json {
        let output = InitOutput {
            path,
            overwritten: existed,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
    } else {
        println!("Wrote config template to {}", path.display());
        println!();
        println!("Next: fill in jira.url, jira.username and jira.api_token, then run 'thira sync'.");
    }

    Ok(())
}
