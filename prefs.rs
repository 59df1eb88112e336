/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Shell preferences: a TOML file plus `PAGESHELL_*` environment overrides.
//!
//! ```toml
//! base_url = "/web"
//! settle_tick = true
//! log_filter = "pageshell=debug"
//! pages_dir = "pages"
//!
//! [[routes]]
//! path = "/home.html"
//! type = "home"
//! controller = "home/home"
//! ```

use std::path::{Path, PathBuf};
use std::{env, fs};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::shell::RouteDefinition;

pub const ENV_BASE_URL: &str = "PAGESHELL_BASE_URL";
pub const ENV_LOG: &str = "PAGESHELL_LOG";
pub const ENV_PAGES_DIR: &str = "PAGESHELL_PAGES_DIR";
pub const ENV_SETTLE_TICK: &str = "PAGESHELL_SETTLE_TICK";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellPrefs {
    pub base_url: String,
    /// Yield once after controller resolution before the view swaps.
    pub settle_tick: bool,
    pub log_filter: Option<String>,
    pub pages_dir: Option<PathBuf>,
    pub routes: Vec<RouteDefinition>,
}

impl Default for ShellPrefs {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            settle_tick: true,
            log_filter: None,
            pages_dir: None,
            routes: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub enum PrefsError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: Option<PathBuf>, source: toml::de::Error },
}

impl std::fmt::Display for PrefsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read prefs {}: {source}", path.display())
            }
            Self::Parse {
                path: Some(path),
                source,
            } => write!(f, "invalid prefs {}: {source}", path.display()),
            Self::Parse { path: None, source } => write!(f, "invalid prefs: {source}"),
        }
    }
}

impl std::error::Error for PrefsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

impl ShellPrefs {
    pub fn from_toml_str(raw: &str) -> Result<Self, PrefsError> {
        toml::from_str(raw).map_err(|source| PrefsError::Parse { path: None, source })
    }

    /// Reads prefs from `path` and applies environment overrides.
    pub fn load(path: &Path) -> Result<Self, PrefsError> {
        let raw = fs::read_to_string(path).map_err(|source| PrefsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut prefs: Self = toml::from_str(&raw).map_err(|source| PrefsError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })?;
        prefs.apply_env_overrides();
        Ok(prefs)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| env::var(key).ok());
    }

    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(filter) = lookup(ENV_LOG).filter(|value| !value.trim().is_empty()) {
            self.log_filter = Some(filter);
        }
        if let Some(dir) = lookup(ENV_PAGES_DIR).filter(|value| !value.trim().is_empty()) {
            self.pages_dir = Some(PathBuf::from(dir));
        }
        if let Some(value) = lookup(ENV_SETTLE_TICK) {
            match parse_flag(&value) {
                Some(enabled) => self.settle_tick = enabled,
                None => warn!(
                    "{ENV_SETTLE_TICK} invalid ('{value}'); keeping {}",
                    self.settle_tick
                ),
            }
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
