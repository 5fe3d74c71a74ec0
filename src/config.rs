// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The restart configuration, which remembers the active log file across restarts.
//!
//! The record is a small JSON object:
//!
//! ```json
//! {
//!   "LogFilePath": "data/20240810170209.log"
//! }
//! ```

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::ErrorKind;

/// Where the restart configuration is kept, relative to the working directory, by default.
pub const DEFAULT_CONFIG_PATH: &str = "data/loggerConfig.json";

/// The environment variable that overrides the configured log file path, by default.
pub const DEFAULT_ENV_VAR: &str = "LogFilePath";

/// The persisted restart configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartConfig {
    /// Path of the file that was active when the record was last written.
    #[serde(
        rename = "LogFilePath",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub log_file_path: Option<PathBuf>,
}

impl RestartConfig {
    /// Create a record pointing at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            log_file_path: Some(path.into()),
        }
    }

    /// Apply an override taken from the environment. An empty override is ignored.
    pub fn merge_env(mut self, value: Option<OsString>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.log_file_path = Some(PathBuf::from(value));
        }
        self
    }
}

/// Reads and writes the restart configuration file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    env_var: Option<String>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        ConfigStore::new(DEFAULT_CONFIG_PATH).env_var(DEFAULT_ENV_VAR)
    }
}

impl ConfigStore {
    /// Create a store backed by the file at `path`, without an environment override.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_var: None,
        }
    }

    /// Set the environment variable that takes precedence over the file.
    ///
    /// An empty name disables the override.
    pub fn env_var(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.env_var = if name.is_empty() { None } else { Some(name) };
        self
    }

    /// The path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The environment variable that overrides the file, if any.
    pub fn env_var_name(&self) -> Option<&str> {
        self.env_var.as_deref()
    }

    /// Read the configuration file. Returns `None` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Return an error if the file exists but cannot be read or is not a valid record.
    pub fn read(&self) -> Result<Option<RestartConfig>, Error> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(
                    Error::new(ErrorKind::Config, "failed to read restart config")
                        .with_context("path", self.path.display())
                        .with_source(err),
                );
            }
        };

        serde_json::from_slice(&content).map(Some).map_err(|err| {
            Error::new(ErrorKind::Config, "malformed restart config")
                .with_context("path", self.path.display())
                .with_source(err)
        })
    }

    /// Read the configuration file, then apply the environment override.
    ///
    /// Returns the effective record along with the record as stored in the file, if any.
    pub fn load(&self) -> Result<(RestartConfig, Option<RestartConfig>), Error> {
        let stored = self.read()?;
        let env = self.env_var.as_ref().and_then(std::env::var_os);
        let effective = stored.clone().unwrap_or_default().merge_env(env);
        Ok((effective, stored))
    }

    /// Write the configuration file, pretty-printed, creating its directory if needed.
    ///
    /// The record is written to a sibling temporary file first and renamed into place, so a
    /// crash never leaves a truncated record behind.
    pub fn store(&self, config: &RestartConfig) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(config).map_err(|err| {
            Error::new(ErrorKind::Config, "failed to serialize restart config").with_source(err)
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                Error::new(ErrorKind::Config, "failed to create restart config directory")
                    .with_context("path", parent.display())
                    .with_source(err)
            })?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|err| {
                Error::new(ErrorKind::Config, "failed to persist restart config")
                    .with_context("path", self.path.display())
                    .with_source(err)
            })
    }
}
