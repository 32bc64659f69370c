//! Credential profile loading
//!
//! Reads the provider's INI config file (`~/.oci/config` by default). Keys
//! missing from the selected profile fall back to the `[DEFAULT]` section.
//! Values are taken literally: a backslash is an ordinary character, so
//! Windows paths such as `key_file=C:\Users\me\.oci\key.pem` survive.

use ::config::{File, FileFormat, Source, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Profile used when none is given on the command line
pub const DEFAULT_PROFILE: &str = "DEFAULT";

const REQUIRED_KEYS: [&str; 5] = ["user", "fingerprint", "key_file", "tenancy", "region"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ::config::ConfigError,
    },

    #[error("profile {0} not found in config file")]
    ProfileNotFound(String),

    #[error("profile {profile} is missing required key {key}")]
    MissingKey { profile: String, key: &'static str },

    #[error("could not determine home directory")]
    NoHomeDir,
}

/// Resolved credential profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OciConfig {
    pub profile: String,
    pub user: String,
    pub fingerprint: String,
    pub key_file: PathBuf,
    pub tenancy: String,
    pub region: String,
}

impl OciConfig {
    /// Load `profile` from the INI file at `path`
    pub fn load(path: &Path, profile: &str) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        // The INI parser treats `\` as an escape; double it to keep it literal
        let sections = File::from_str(&text.replace('\\', "\\\\"), FileFormat::Ini)
            .collect()
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let sections: HashMap<String, Value> = sections.into_iter().collect();

        let mut values = section(&sections, DEFAULT_PROFILE, path)?.unwrap_or_default();
        match section(&sections, profile, path)? {
            Some(selected) => values.extend(selected),
            None => return Err(ConfigError::ProfileNotFound(profile.to_string())),
        }

        for key in REQUIRED_KEYS {
            if values.get(key).map_or(true, |v| v.trim().is_empty()) {
                return Err(ConfigError::MissingKey {
                    profile: profile.to_string(),
                    key,
                });
            }
        }

        let mut take = |key: &str| values.remove(key).unwrap_or_default().trim().to_string();
        let config = Self {
            profile: profile.to_string(),
            user: take("user"),
            fingerprint: take("fingerprint"),
            key_file: expand_home(&take("key_file"))?,
            tenancy: take("tenancy"),
            region: take("region"),
        };

        debug!(profile = %config.profile, region = %config.region, "Loaded credential profile");
        Ok(config)
    }

    /// Key identifier used in request signatures
    pub fn key_id(&self) -> String {
        format!("{}/{}/{}", self.tenancy, self.user, self.fingerprint)
    }
}

/// Get the default config file path
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs_next::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".oci").join("config"))
}

/// Look up a section by name, ignoring case, with lower-cased keys
fn section(
    sections: &HashMap<String, Value>,
    name: &str,
    path: &Path,
) -> Result<Option<HashMap<String, String>>, ConfigError> {
    let Some(value) = sections
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.clone())
    else {
        return Ok(None);
    };

    let parse_err = |source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let table = value.into_table().map_err(parse_err)?;
    let mut entries = HashMap::with_capacity(table.len());
    for (key, value) in table {
        entries.insert(key.to_lowercase(), value.into_string().map_err(parse_err)?);
    }
    Ok(Some(entries))
}

fn expand_home(value: &str) -> Result<PathBuf, ConfigError> {
    if value == "~" {
        return dirs_next::home_dir().ok_or(ConfigError::NoHomeDir);
    }
    match value.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs_next::home_dir().ok_or(ConfigError::NoHomeDir)?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(value)),
    }
}
