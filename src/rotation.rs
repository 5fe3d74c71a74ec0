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

use std::fs;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use jiff::Zoned;

use crate::Error;
use crate::ErrorKind;

/// Files grow past this many bytes before they are rotated, by default.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 4 * 1024 * 1024;

/// A configured log file path equal to this name is never resumed; a fresh file is picked
/// instead. Only the bare name matches, so `logs/app.log` is an ordinary file.
pub const PLACEHOLDER_FILENAME: &str = "app.log";

// how many disambiguating suffixes are tried before giving up on a second
pub(crate) const MAX_NAME_ATTEMPTS: usize = 1024;

/// What the sink should open when it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupPath {
    /// Keep appending to this existing file.
    Resume(PathBuf),
    /// Start a new file named by [`RotationPolicy::next_path`].
    Fresh,
}

/// Decides when the active file rolls over and what the next one is called.
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    log_dir: PathBuf,
    max_size: u64,
}

impl RotationPolicy {
    /// Create a policy that places new files in `log_dir` and rotates files larger than
    /// `max_size` bytes.
    pub fn new(log_dir: impl Into<PathBuf>, max_size: u64) -> Self {
        Self {
            log_dir: log_dir.into(),
            max_size,
        }
    }

    /// The directory new files are created in.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// The size cap in bytes.
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Whether a file of `current_size` bytes must be rotated before the next line is written.
    ///
    /// A file exactly at the cap is still written to.
    pub fn should_rotate(&self, current_size: u64) -> bool {
        current_size > self.max_size
    }

    /// The name of the file to rotate to at `now`, with second resolution.
    ///
    /// Attempt 0 yields `<dir>/yyyyMMddHHmmss.log`; attempt `n` yields
    /// `<dir>/yyyyMMddHHmmss.<n>.log`, for when the plain name is already taken within the
    /// same second.
    pub fn next_path(&self, now: &Zoned, attempt: usize) -> PathBuf {
        let stamp = now.strftime("%Y%m%d%H%M%S");
        let filename = match attempt {
            0 => format!("{stamp}.log"),
            n => format!("{stamp}.{n}.log"),
        };
        self.log_dir.join(filename)
    }

    /// Decide which file to open at startup, given the configured one.
    ///
    /// A configured path that does not exist yet is created empty and used.
    ///
    /// # Errors
    ///
    /// Return an error if the configured file cannot be inspected or created.
    pub fn resolve_startup_path(&self, configured: Option<&Path>) -> Result<StartupPath, Error> {
        let Some(path) = configured.filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(StartupPath::Fresh);
        };

        if path == Path::new(PLACEHOLDER_FILENAME) {
            return Ok(StartupPath::Fresh);
        }

        match fs::metadata(path) {
            Ok(metadata) if self.should_rotate(metadata.len()) => Ok(StartupPath::Fresh),
            Ok(_) => Ok(StartupPath::Resume(path.to_path_buf())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                create_empty(path)?;
                Ok(StartupPath::Resume(path.to_path_buf()))
            }
            Err(err) => Err(Error::new(ErrorKind::Io, "failed to inspect configured log file")
                .with_context("path", path.display())
                .with_source(err)),
        }
    }
}

impl Default for RotationPolicy {
    fn default() -> Self {
        RotationPolicy::new("data", DEFAULT_MAX_FILE_SIZE)
    }
}

fn create_empty(path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            Error::new(ErrorKind::Io, "failed to create log directory")
                .with_context("path", parent.display())
                .with_source(err)
        })?;
    }

    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map(drop)
        .map_err(|err| {
            Error::new(ErrorKind::Io, "failed to create log file")
                .with_context("path", path.display())
                .with_source(err)
        })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_should_rotate_only_past_the_cap() {
        let policy = RotationPolicy::default();
        assert_eq!(policy.max_size(), 4194304);
        assert!(!policy.should_rotate(0));
        assert!(!policy.should_rotate(4194304));
        assert!(policy.should_rotate(4194305));
    }

    #[test]
    fn test_next_path() {
        let policy = RotationPolicy::new("data", DEFAULT_MAX_FILE_SIZE);
        let now = Zoned::from_str("2024-08-10T07:02:09.999+08[+08]").unwrap();
        assert_eq!(
            policy.next_path(&now, 0),
            Path::new("data").join("20240810070209.log")
        );
        assert_eq!(
            policy.next_path(&now, 3),
            Path::new("data").join("20240810070209.3.log")
        );
    }

    #[test]
    fn test_startup_without_configured_path() {
        let policy = RotationPolicy::default();
        assert_eq!(policy.resolve_startup_path(None).unwrap(), StartupPath::Fresh);
        assert_eq!(
            policy.resolve_startup_path(Some(Path::new(""))).unwrap(),
            StartupPath::Fresh
        );
        assert_eq!(
            policy
                .resolve_startup_path(Some(Path::new("app.log")))
                .unwrap(),
            StartupPath::Fresh
        );
    }

    #[test]
    fn test_startup_creates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let policy = RotationPolicy::new(temp_dir.path(), 100);

        let path = temp_dir.path().join("nested").join("previous.log");
        let startup = policy.resolve_startup_path(Some(&path)).unwrap();
        assert_eq!(startup, StartupPath::Resume(path.clone()));
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_startup_resumes_or_abandons_by_size() {
        let temp_dir = TempDir::new().unwrap();
        let policy = RotationPolicy::new(temp_dir.path(), 100);

        let small = temp_dir.path().join("small.log");
        fs::write(&small, vec![b'x'; 100]).unwrap();
        assert_eq!(
            policy.resolve_startup_path(Some(&small)).unwrap(),
            StartupPath::Resume(small.clone())
        );

        let named_like_placeholder = temp_dir.path().join(PLACEHOLDER_FILENAME);
        fs::write(&named_like_placeholder, b"").unwrap();
        assert_eq!(
            policy
                .resolve_startup_path(Some(&named_like_placeholder))
                .unwrap(),
            StartupPath::Resume(named_like_placeholder.clone())
        );

        let large = temp_dir.path().join("large.log");
        fs::write(&large, vec![b'x'; 101]).unwrap();
        assert_eq!(
            policy.resolve_startup_path(Some(&large)).unwrap(),
            StartupPath::Fresh
        );
    }
}
