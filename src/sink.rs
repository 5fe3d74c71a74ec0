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
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;

use jiff::Zoned;

use crate::Error;
use crate::ErrorKind;
use crate::Layout;
use crate::LogRecord;
use crate::Trap;
use crate::clock::Clock;
use crate::config::ConfigStore;
use crate::config::RestartConfig;
use crate::gate::WriteGate;
use crate::layout::LineLayout;
use crate::rotation::DEFAULT_MAX_FILE_SIZE;
use crate::rotation::MAX_NAME_ATTEMPTS;
use crate::rotation::RotationPolicy;
use crate::rotation::StartupPath;
use crate::trap::DefaultTrap;

/// The file currently receiving log lines.
#[derive(Debug)]
struct ActiveFile {
    path: PathBuf,
    // none once the sink is closed
    file: Option<File>,
}

impl ActiveFile {
    fn write_line(&mut self, line: &[u8]) -> Result<(), Error> {
        let Some(file) = self.file.as_mut() else {
            return Err(Error::new(ErrorKind::Closed, "log sink is closed"));
        };

        file.write_all(line)
            .and_then(|()| file.flush())
            .map_err(|err| {
                Error::new(ErrorKind::Io, "failed to write log line")
                    .with_context("path", self.path.display())
                    .with_source(err)
            })
    }
}

/// A builder to configure and create a [`LogSink`].
#[derive(Debug)]
pub struct LogSinkBuilder {
    log_dir: PathBuf,
    max_size: u64,
    config: ConfigStore,
    layout: Box<dyn Layout>,
    clock: Clock,
    trap: Box<dyn Trap>,
}

impl Default for LogSinkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSinkBuilder {
    /// Create a new builder with the defaults: files under `data`, a 4 MiB cap, the restart
    /// config at `data/loggerConfig.json`, overridable by the `LogFilePath` environment
    /// variable.
    pub fn new() -> Self {
        Self {
            log_dir: PathBuf::from("data"),
            max_size: DEFAULT_MAX_FILE_SIZE,
            config: ConfigStore::default(),
            layout: Box::new(LineLayout::default()),
            clock: Clock::DefaultClock,
            trap: Box::new(DefaultTrap::default()),
        }
    }

    /// Set the directory newly rotated files are created in.
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Set the size in bytes a file may exceed before it is rotated.
    pub fn max_file_size(mut self, n: NonZeroUsize) -> Self {
        self.max_size = n.get() as u64;
        self
    }

    /// Set the path of the restart configuration file.
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = ConfigStore::new(path).env_var(self.config_env_var());
        self
    }

    /// Set the environment variable overriding the configured file path. An empty name
    /// disables the override.
    pub fn env_var(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.env_var(name);
        self
    }

    /// Set the layout for the log lines.
    ///
    /// Default to [`LineLayout`].
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Set the trap for errors that cannot be returned to a caller.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    #[cfg(test)]
    pub(crate) fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn config_env_var(&self) -> String {
        self.config.env_var_name().unwrap_or_default().to_string()
    }

    /// Build the [`LogSink`], resuming the file named by the restart configuration when it
    /// is still under the cap.
    ///
    /// # Errors
    ///
    /// Return an error if either:
    ///
    /// * The restart configuration exists but cannot be read or parsed.
    /// * The log file cannot be created or opened.
    /// * The restart configuration cannot be written.
    pub fn build(self) -> Result<LogSink, Error> {
        let LogSinkBuilder {
            log_dir,
            max_size,
            config,
            layout,
            clock,
            trap,
        } = self;

        let policy = RotationPolicy::new(log_dir, max_size);
        let (restart, stored) = config.load()?;
        let configured = restart.log_file_path.as_deref();

        let (path, file) = match policy.resolve_startup_path(configured)? {
            StartupPath::Resume(path) => {
                let file = open_append(&path)?;
                (path, file)
            }
            StartupPath::Fresh => create_next_file(&policy, &clock.now())?,
        };

        let recorded = stored.as_ref().and_then(|c| c.log_file_path.as_deref());
        if recorded != Some(path.as_path()) {
            config.store(&RestartConfig::new(&path))?;
        }

        let active = ActiveFile {
            path,
            file: Some(file),
        };
        Ok(LogSink {
            gate: WriteGate::new(active),
            policy,
            config,
            layout,
            clock,
            trap,
        })
    }
}

/// Owns the single active log file and appends formatted records to it.
///
/// Every append takes the sink's write gate, so lines from concurrent callers never
/// interleave, and a rotation is never observed half done.
#[derive(Debug)]
pub struct LogSink {
    gate: WriteGate<ActiveFile>,
    policy: RotationPolicy,
    config: ConfigStore,
    layout: Box<dyn Layout>,
    clock: Clock,
    trap: Box<dyn Trap>,
}

impl LogSink {
    /// Create a new [`LogSinkBuilder`].
    pub fn builder() -> LogSinkBuilder {
        LogSinkBuilder::new()
    }

    /// Format `record` as one line and append it, rotating first if the active file is over
    /// the cap.
    ///
    /// The size of the active file is read from the file system on every call, so external
    /// truncation is honored. A file that vanished is recreated.
    ///
    /// # Errors
    ///
    /// Return an error if the sink is closed, or if formatting, rotating or writing fails. The
    /// failed line is lost; the sink stays usable.
    pub fn append(&self, record: &LogRecord) -> Result<(), Error> {
        let mut line = self.layout.format(record)?;
        line.push(b'\n');

        let mut active = self.gate.acquire();
        if active.file.is_none() {
            return Err(Error::new(ErrorKind::Closed, "log sink is closed"));
        }

        let size = self.current_size(&mut active)?;
        if self.policy.should_rotate(size) {
            self.rotate(&mut active)?;
        }

        active.write_line(&line)
    }

    /// Flush the active file.
    pub fn flush(&self) -> Result<(), Error> {
        let mut active = self.gate.acquire();
        match active.file.as_mut() {
            Some(file) => file.flush().map_err(Error::from_io_error),
            None => Ok(()),
        }
    }

    /// Flush the active file to disk and close it. Later appends fail with
    /// [`ErrorKind::Closed`]. Closing a closed sink does nothing.
    pub fn close(&self) -> Result<(), Error> {
        let mut active = self.gate.acquire();
        match active.file.take() {
            Some(mut file) => file
                .flush()
                .and_then(|()| file.sync_all())
                .map_err(|err| {
                    Error::new(ErrorKind::Io, "failed to close log file")
                        .with_context("path", active.path.display())
                        .with_source(err)
                }),
            None => Ok(()),
        }
    }

    /// Whether [`LogSink::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.gate.acquire().file.is_none()
    }

    /// The path of the active file.
    pub fn current_path(&self) -> PathBuf {
        self.gate.acquire().path.clone()
    }

    /// The rotation policy in effect.
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// The path of the restart configuration file.
    pub fn config_path(&self) -> &Path {
        self.config.path()
    }

    /// How many times the write gate has been acquired.
    pub fn gate_acquisitions(&self) -> u64 {
        self.gate.acquisitions()
    }

    pub(crate) fn now(&self) -> Zoned {
        self.clock.now()
    }

    pub(crate) fn trap(&self) -> &dyn Trap {
        self.trap.as_ref()
    }

    fn current_size(&self, active: &mut ActiveFile) -> Result<u64, Error> {
        match fs::metadata(&active.path) {
            Ok(metadata) => Ok(metadata.len()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                // removed behind our back; our handle points at an unlinked file
                create_parent_dir(&active.path)?;
                active.file = Some(open_append(&active.path)?);
                Ok(0)
            }
            Err(err) => Err(Error::new(ErrorKind::Io, "failed to inspect log file")
                .with_context("path", active.path.display())
                .with_source(err)),
        }
    }

    fn rotate(&self, active: &mut ActiveFile) -> Result<(), Error> {
        // the old handle stays active if the new file cannot be created
        let (path, file) = create_next_file(&self.policy, &self.clock.now())?;

        if let Some(mut old) = active.file.replace(file)
            && let Err(err) = old.flush()
        {
            let err = Error::new(ErrorKind::Io, "failed to flush previous log file")
                .with_context("path", active.path.display())
                .with_source(err);
            self.trap.trap(&err);
        }
        active.path = path;

        if let Err(err) = self.config.store(&RestartConfig::new(&active.path)) {
            self.trap.trap(&err);
        }
        Ok(())
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        let active = self.gate.get_mut();
        if let Some(file) = active.file.as_mut()
            && let Err(err) = file.flush()
        {
            let err =
                Error::new(ErrorKind::Io, "failed to flush log file on drop").with_source(err);
            self.trap.trap(&err);
        }
    }
}

fn create_parent_dir(path: &Path) -> Result<(), Error> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => fs::create_dir_all(parent).map_err(|err| {
            Error::new(ErrorKind::Io, "failed to create log directory")
                .with_context("path", parent.display())
                .with_source(err)
        }),
        None => Ok(()),
    }
}

fn open_append(path: &Path) -> Result<File, Error> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|err| {
            Error::new(ErrorKind::Io, "failed to open log file")
                .with_context("path", path.display())
                .with_source(err)
        })
}

// never reuses an existing file: a taken name moves on to the next suffix
fn create_next_file(policy: &RotationPolicy, now: &Zoned) -> Result<(PathBuf, File), Error> {
    let log_dir = policy.log_dir();
    fs::create_dir_all(log_dir).map_err(|err| {
        Error::new(ErrorKind::Io, "failed to create log directory")
            .with_context("path", log_dir.display())
            .with_source(err)
    })?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = policy.next_path(now, attempt);
        match OpenOptions::new().append(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(Error::new(ErrorKind::Io, "failed to create log file")
                    .with_context("path", path.display())
                    .with_source(err));
            }
        }
    }

    Err(Error::new(ErrorKind::Io, "no free log file name left")
        .with_context("path", policy.next_path(now, 0).display())
        .with_context("attempts", MAX_NAME_ATTEMPTS))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use tempfile::TempDir;

    use super::*;
    use crate::Severity;
    use crate::clock::ManualClock;

    const START: &str = "2024-08-10T17:12:52+08[+08]";

    fn builder(temp_dir: &TempDir) -> LogSinkBuilder {
        LogSink::builder()
            .log_dir(temp_dir.path().join("logs"))
            .config_path(temp_dir.path().join("loggerConfig.json"))
            .env_var("")
            .clock(Clock::ManualClock(ManualClock::new(
                Zoned::from_str(START).unwrap(),
            )))
    }

    fn record(message: &str) -> LogRecord<'_> {
        let time = Zoned::from_str(START).unwrap();
        LogRecord::new(time, "sink::tests", Severity::Info, message)
    }

    fn grow_past_cap(path: &Path, cap: u64) {
        let file = OpenOptions::new().write(true).open(path).unwrap();
        file.set_len(cap + 1).unwrap();
    }

    #[test]
    fn test_fresh_start_persists_path() {
        let temp_dir = TempDir::new().unwrap();
        let sink = builder(&temp_dir).build().unwrap();

        let expected = temp_dir.path().join("logs").join("20240810171252.log");
        assert_eq!(sink.current_path(), expected);
        assert_eq!(fs::metadata(&expected).unwrap().len(), 0);

        let persisted = ConfigStore::new(sink.config_path()).read().unwrap();
        assert_eq!(persisted, Some(RestartConfig::new(&expected)));
    }

    #[test]
    fn test_rotates_before_writing_when_over_cap() {
        let temp_dir = TempDir::new().unwrap();
        let sink = builder(&temp_dir).build().unwrap();
        let first = sink.current_path();

        sink.append(&record("before")).unwrap();
        grow_past_cap(&first, DEFAULT_MAX_FILE_SIZE);

        sink.clock.set_now(Zoned::from_str("2024-08-10T17:13:05+08[+08]").unwrap());
        let rec = record("after");
        sink.append(&rec).unwrap();

        let second = sink.current_path();
        assert_eq!(second, temp_dir.path().join("logs").join("20240810171305.log"));
        assert_eq!(fs::metadata(&first).unwrap().len(), DEFAULT_MAX_FILE_SIZE + 1);

        let mut expected = sink.layout.format(&rec).unwrap();
        expected.push(b'\n');
        let content = fs::read(&second).unwrap();
        assert_eq!(content, expected);
        assert_eq!(fs::metadata(&second).unwrap().len(), expected.len() as u64);

        let persisted = ConfigStore::new(sink.config_path()).read().unwrap();
        assert_eq!(persisted, Some(RestartConfig::new(&second)));
    }

    #[test]
    fn test_rotation_within_the_same_second_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let sink = builder(&temp_dir)
            .max_file_size(NonZeroUsize::new(16).unwrap())
            .build()
            .unwrap();
        let logs = temp_dir.path().join("logs");
        assert_eq!(sink.policy().max_size(), 16);
        assert_eq!(sink.policy().log_dir(), logs);

        let mut paths = vec![sink.current_path()];
        for i in 0..4 {
            sink.append(&record(&format!("line number {i} is long enough")))
                .unwrap();
            let path = sink.current_path();
            if paths.last() != Some(&path) {
                paths.push(path);
            }
        }

        assert_eq!(
            paths,
            vec![
                logs.join("20240810171252.log"),
                logs.join("20240810171252.1.log"),
                logs.join("20240810171252.2.log"),
                logs.join("20240810171252.3.log"),
            ]
        );
        for path in &paths {
            let content = fs::read_to_string(path).unwrap();
            assert_eq!(content.lines().count(), 1, "{}", path.display());
        }
    }

    #[test]
    fn test_vanished_file_is_recreated() {
        let temp_dir = TempDir::new().unwrap();
        let sink = builder(&temp_dir).build().unwrap();
        let path = sink.current_path();

        sink.append(&record("one")).unwrap();
        fs::remove_file(&path).unwrap();
        sink.append(&record("two")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.ends_with("- Info - two\n"), "{content}");
        assert_eq!(sink.current_path(), path);
    }

    #[test]
    fn test_vanished_log_dir_is_recreated() {
        let temp_dir = TempDir::new().unwrap();
        let sink = builder(&temp_dir).build().unwrap();
        let path = sink.current_path();

        sink.append(&record("one")).unwrap();
        fs::remove_dir_all(temp_dir.path().join("logs")).unwrap();
        sink.append(&record("two")).unwrap();
        sink.append(&record("three")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2, "{content}");
        assert!(content.ends_with("- Info - three\n"), "{content}");
    }

    #[test]
    fn test_failed_rotation_keeps_old_file_and_releases_gate() {
        let temp_dir = TempDir::new().unwrap();
        let current = temp_dir.path().join("current.log");
        ConfigStore::new(temp_dir.path().join("loggerConfig.json"))
            .store(&RestartConfig::new(&current))
            .unwrap();
        // a regular file where the log directory should be
        let logs = temp_dir.path().join("logs");
        fs::write(&logs, b"").unwrap();

        let sink = builder(&temp_dir).build().unwrap();
        assert_eq!(sink.current_path(), current);
        grow_past_cap(&current, DEFAULT_MAX_FILE_SIZE);

        let err = sink.append(&record("lost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(sink.current_path(), current);

        fs::remove_file(&logs).unwrap();
        sink.append(&record("kept")).unwrap();
        let rotated = sink.current_path();
        assert_eq!(rotated, logs.join("20240810171252.log"));
        assert!(fs::read_to_string(&rotated).unwrap().ends_with("- kept\n"));
    }

    #[test]
    fn test_closed_sink_rejects_appends() {
        let temp_dir = TempDir::new().unwrap();
        let sink = builder(&temp_dir).build().unwrap();

        sink.append(&record("open")).unwrap();
        sink.close().unwrap();
        assert!(sink.is_closed());
        sink.close().unwrap();

        let err = sink.append(&record("closed")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
        sink.flush().unwrap();

        let content = fs::read_to_string(sink.current_path()).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
