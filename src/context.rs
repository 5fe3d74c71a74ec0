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

use std::any::type_name;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::Error;
use crate::LogHandle;
use crate::LogRecord;
use crate::LogSink;
use crate::Severity;
use crate::level::AtomicSeverity;

/// The long-lived logging state of a process: the single sink and the global threshold.
///
/// Share it through [`Arc`]; every [`LogHandle`] keeps a reference to its context.
///
/// # Examples
///
/// ```no_run
/// use rollog::HandleRegistry;
/// use rollog::LogContext;
/// use rollog::LogSink;
/// use rollog::Severity;
///
/// let ctx = LogContext::new(LogSink::builder().build().unwrap());
/// ctx.set_global_threshold(Severity::Debug);
///
/// let registry = HandleRegistry::new(ctx.clone());
/// let log = registry.handle("billing::Invoice", None);
/// log.info("invoice issued").unwrap();
///
/// ctx.shutdown().unwrap();
/// ```
#[derive(Debug)]
pub struct LogContext {
    sink: LogSink,
    global: AtomicSeverity,
}

impl LogContext {
    /// Create a context around `sink`, with the global threshold at [`Severity::Info`].
    pub fn new(sink: LogSink) -> Arc<LogContext> {
        Arc::new(LogContext {
            sink,
            global: AtomicSeverity::default(),
        })
    }

    /// The sink all handles of this context write to.
    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    /// The process-wide threshold.
    pub fn global_threshold(&self) -> Severity {
        self.global.load()
    }

    /// Replace the process-wide threshold. Takes effect on the next write of every handle.
    pub fn set_global_threshold(&self, severity: Severity) {
        self.global.store(severity);
    }

    /// Whether a record at `severity` clears both `threshold` and the global threshold.
    pub fn enabled(&self, threshold: Severity, severity: Severity) -> bool {
        severity != Severity::Off
            && severity.passes(threshold)
            && severity.passes(self.global_threshold())
    }

    /// Filter, then stamp and append one record on behalf of `owner`.
    pub(crate) fn log(
        &self,
        owner: &str,
        threshold: Severity,
        severity: Severity,
        message: &str,
    ) -> Result<(), Error> {
        if !self.enabled(threshold, severity) {
            return Ok(());
        }

        let record = LogRecord::new(self.sink.now(), owner, severity, message);
        self.sink.append(&record)
    }

    /// Flush and close the active file. Writes after shutdown fail.
    pub fn shutdown(&self) -> Result<(), Error> {
        self.sink.close()
    }
}

/// Hands out one [`LogHandle`] per owner identity.
///
/// The first request for an owner creates its handle; later requests return the same handle,
/// whatever threshold they ask for.
#[derive(Debug)]
pub struct HandleRegistry {
    ctx: Arc<LogContext>,
    handles: Mutex<HashMap<String, LogHandle>>,
}

impl HandleRegistry {
    /// Create an empty registry over `ctx`.
    pub fn new(ctx: Arc<LogContext>) -> Self {
        Self {
            ctx,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// The context handles of this registry write through.
    pub fn context(&self) -> &Arc<LogContext> {
        &self.ctx
    }

    /// Get the handle of `owner`, creating it with `threshold` (default to
    /// [`Severity::Info`]) if it does not exist yet.
    pub fn handle(&self, owner: impl Into<String>, threshold: Option<Severity>) -> LogHandle {
        let owner = owner.into();
        self.handles()
            .entry(owner)
            .or_insert_with_key(|owner| {
                LogHandle::new(
                    self.ctx.clone(),
                    owner.as_str(),
                    threshold.unwrap_or(Severity::Info),
                )
            })
            .clone()
    }

    /// Like [`HandleRegistry::handle`], with the type name of `T` as the owner identity.
    pub fn handle_of<T: ?Sized>(&self, threshold: Option<Severity>) -> LogHandle {
        self.handle(type_name::<T>(), threshold)
    }

    /// Get the handle of `owner`, which must have been created before.
    ///
    /// # Errors
    ///
    /// Return an [`InvalidArgument`](crate::ErrorKind::InvalidArgument) error if no handle
    /// was created for `owner`.
    pub fn get(&self, owner: &str) -> Result<LogHandle, Error> {
        self.handles().get(owner).cloned().ok_or_else(|| {
            Error::invalid_argument(format!("unknown logger owner: {owner}"))
                .with_context("owner", owner)
        })
    }

    /// Like [`HandleRegistry::get`], with the type name of `T` as the owner identity.
    pub fn get_of<T: ?Sized>(&self) -> Result<LogHandle, Error> {
        self.get(type_name::<T>())
    }

    /// Number of handles created so far.
    pub fn len(&self) -> usize {
        self.handles().len()
    }

    /// Whether no handle was created yet.
    pub fn is_empty(&self) -> bool {
        self.handles().is_empty()
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<String, LogHandle>> {
        self.handles.lock().unwrap_or_else(|e| e.into_inner())
    }
}
