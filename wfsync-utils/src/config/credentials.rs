//! Completion-service credentials from `.env`
//!
//! `.env` must exist in the project root and, when a `.gitignore` is present,
//! must be listed in it. A world-readable `.env` only triggers a warning.

use crate::string::mask_secret;
use crate::UtilError;
use std::path::{Path, PathBuf};

/// Names of the required environment variables
pub const REQUIRED_VARS: [&str; 3] = ["BASE_URL", "BASE_KEY", "BASE_MODEL"];

/// Endpoint, key and model for the completion service
#[derive(Clone)]
pub struct LlmCredentials {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for LlmCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmCredentials")
            .field("base_url", &self.base_url)
            .field("api_key", &mask_secret(&self.api_key))
            .field("model", &self.model)
            .finish()
    }
}

impl LlmCredentials {
    /// Check `.env`, load it into the process environment and read the
    /// required variables.
    pub fn load(project_root: &Path) -> crate::Result<Self> {
        tracing::info!("Loading LLM configuration from .env");
        let env_path = check_env_file(project_root)?;

        dotenvy::from_path(&env_path)
            .map_err(|e| UtilError::Config(format!("Failed to read {}: {e}", env_path.display())))?;

        let credentials = Self::from_lookup(|name| std::env::var(name).ok())?;
        tracing::info!(
            "LLM config loaded: {} at {}",
            credentials.model,
            credentials.base_url
        );
        tracing::debug!("API key (masked): {}", mask_secret(&credentials.api_key));
        Ok(credentials)
    }

    /// Build credentials from a variable lookup, listing every missing name
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let values: Vec<Option<String>> = REQUIRED_VARS
            .iter()
            .map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
            .collect();

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .zip(&values)
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(UtilError::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let mut values = values.into_iter().flatten();
        match (values.next(), values.next(), values.next()) {
            (Some(base_url), Some(api_key), Some(model)) => Ok(Self {
                base_url,
                api_key,
                model,
            }),
            _ => Err(UtilError::Config("Incomplete LLM configuration".to_string())),
        }
    }
}

/// Validate the `.env` file location and hygiene, returning its path
pub fn check_env_file(project_root: &Path) -> crate::Result<PathBuf> {
    let env_path = project_root.join(".env");
    if !env_path.exists() {
        return Err(UtilError::Config(format!(
            ".env file not found in {} (create it with BASE_URL, BASE_KEY, BASE_MODEL)",
            project_root.display()
        )));
    }

    let gitignore_path = project_root.join(".gitignore");
    if gitignore_path.exists() {
        let gitignore = std::fs::read_to_string(&gitignore_path)?;
        if !gitignore.contains(".env") {
            return Err(UtilError::Config(
                ".env is not listed in .gitignore; add it to prevent credential leaks".to_string(),
            ));
        }
    } else {
        tracing::warn!(".gitignore not found - cannot verify .env exclusion");
    }

    warn_if_world_readable(&env_path)?;
    Ok(env_path)
}

#[cfg(unix)]
fn warn_if_world_readable(path: &Path) -> crate::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)?.permissions().mode();
    if mode & 0o004 != 0 {
        tracing::warn!(
            ".env file is world-readable (permissions: {:o}); consider: chmod 600 .env",
            mode & 0o777
        );
    }
    Ok(())
}

#[cfg(not(unix))]
fn warn_if_world_readable(_path: &Path) -> crate::Result<()> {
    Ok(())
}
