//! Keyring integration for secure API key storage
//! Falls back to file storage if keyring is unavailable

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const SERVICE_NAME: &str = "roadmap-agent";
const API_KEY_USERNAME: &str = "groq-api-key";
const API_KEY_FILE: &str = "api_key.txt";

/// Environment variable that overrides any stored key
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Get the path for the fallback API key file
fn api_key_file_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "roadmap-agent", "roadmap-agent")
        .context("Failed to get project directories")?;
    let dir = base.config_dir();
    fs::create_dir_all(dir).context("Failed to create config directory")?;
    Ok(dir.join(API_KEY_FILE))
}

/// Set API key - tries keyring first, falls back to file
pub fn set_api_key(key: &str) -> Result<()> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        if entry.set_password(key).is_ok() {
            // Also save to file as backup in case keyring retrieval fails
            let _ = save_to_file(key);
            return Ok(());
        }
    }

    save_to_file(key)?;
    println!("Note: Using file-based storage (keyring unavailable)");
    Ok(())
}

fn save_to_file(key: &str) -> Result<()> {
    let path = api_key_file_path()?;
    fs::write(&path, key).context("Failed to write API key file")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
            .context("Failed to set file permissions")?;
    }

    Ok(())
}

/// Resolve the API key: environment, then keyring, then file.
///
/// `None` is a normal answer; it selects template generation.
pub fn get_api_key() -> Option<String> {
    if let Some(key) = non_empty(std::env::var(API_KEY_ENV).ok()) {
        debug!("Using API key from {}", API_KEY_ENV);
        return Some(key);
    }

    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        if let Some(key) = non_empty(entry.get_password().ok()) {
            return Some(key);
        }
    }

    let path = api_key_file_path().ok()?;
    non_empty(fs::read_to_string(path).ok())
}

/// Delete API key from both keyring and file
pub fn delete_api_key() -> Result<()> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        let _ = entry.delete_credential();
    }

    let path = api_key_file_path()?;
    if path.exists() {
        fs::remove_file(&path).context("Failed to delete API key file")?;
    }

    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
