//! Environment variable substitution for configuration files
//!
//! Config values may reference environment variables with the `${VAR_NAME}`
//! syntax; references are expanded before the YAML is parsed.

use once_cell::sync::Lazy;
use regex::Regex;
use std::env;

use crate::config::ConfigError;

static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid pattern"));

/// Expand `${VAR_NAME}` references in a configuration string.
///
/// All missing variables are collected and reported in a single error so a
/// misconfigured deployment fails with the complete list.
pub fn substitute_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut missing: Vec<String> = Vec::new();

    let result = ENV_VAR_PATTERN.replace_all(input, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match env::var(name) {
            Ok(value) => value,
            Err(_) => {
                if !missing.iter().any(|m| m == name) {
                    missing.push(name.to_string());
                }
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "Missing environment variables: {}",
            missing.join(", ")
        )));
    }

    Ok(result.into_owned())
}
