//! Environment-driven enablement for ambient observers
//!
//! Observers are activated explicitly in code, but deployments usually want
//! to switch tracing on without touching the call sites. [`CallbacksConfig`]
//! reads the relevant flags from the environment once, and
//! [`tracing_from_env`](crate::activation::tracing_from_env) consults it.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `LANGGRAPH_TRACING` | enable the tracing session kind | off |
//! | `LANGGRAPH_PROJECT` | session label for traces | `default` |

use crate::error::{CallbackError, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Default environment prefix
pub const DEFAULT_ENV_PREFIX: &str = "LANGGRAPH_";

/// Default tracing session label
pub const DEFAULT_SESSION_NAME: &str = "default";

/// Load an environment variable as a string
///
/// # Returns
///
/// * `Ok(Some(value))` if variable exists
/// * `Ok(None)` if variable doesn't exist
/// * `Err` if variable exists but has invalid UTF-8
pub fn get_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(CallbackError::config(format!(
            "Environment variable {} contains invalid UTF-8",
            key
        ))),
    }
}

/// Load an environment variable with a default value
pub fn get_env_or(key: &str, default: impl Into<String>) -> Result<String> {
    Ok(get_env(key)?.unwrap_or_else(|| default.into()))
}

/// Check whether a flag variable is set to something truthy
///
/// A variable counts as set when it exists and is not one of `""`, `"0"`,
/// `"false"` or `"False"`. Non-UTF-8 values count as set.
pub fn env_var_is_set(key: &str) -> bool {
    match env::var(key) {
        Ok(val) => !matches!(val.as_str(), "" | "0" | "false" | "False"),
        Err(env::VarError::NotPresent) => false,
        Err(env::VarError::NotUnicode(_)) => true,
    }
}

/// Build a prefixed environment variable name
///
/// ```rust
/// use langgraph_callbacks::config::build_env_key;
///
/// assert_eq!(build_env_key("LANGGRAPH_", "tracing"), "LANGGRAPH_TRACING");
/// ```
pub fn build_env_key(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name.to_uppercase())
}

/// Enablement flags for ambient observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbacksConfig {
    /// Activate a tracing session around entry points that honor the config
    pub tracing_enabled: bool,

    /// Session label used for tracing
    pub project: String,
}

impl Default for CallbacksConfig {
    fn default() -> Self {
        Self {
            tracing_enabled: false,
            project: DEFAULT_SESSION_NAME.to_string(),
        }
    }
}

impl CallbacksConfig {
    /// Create a config with tracing disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the config from `LANGGRAPH_*` variables
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Read the config from variables with a custom prefix
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let config = Self {
            tracing_enabled: env_var_is_set(&build_env_key(prefix, "tracing")),
            project: get_env_or(&build_env_key(prefix, "project"), DEFAULT_SESSION_NAME)?,
        };
        config.validate()?;

        tracing::debug!(
            prefix,
            tracing_enabled = config.tracing_enabled,
            project = %config.project,
            "Loaded callbacks config"
        );
        Ok(config)
    }

    /// Enable or disable tracing
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.tracing_enabled = enabled;
        self
    }

    /// Set the session label
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    /// Validate the config
    pub fn validate(&self) -> Result<()> {
        if self.project.trim().is_empty() {
            return Err(CallbackError::config("Project name must not be empty"));
        }
        Ok(())
    }
}
