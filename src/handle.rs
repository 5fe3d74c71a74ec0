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

use std::sync::Arc;

use crate::Error;
use crate::LogContext;
use crate::Severity;

/// The per-owner facade log lines are written through.
///
/// A message is written only if its severity is at or above both the handle's threshold and
/// the context's global threshold. Filtered calls return `Ok(())` without touching the file.
///
/// Handles are cheap to clone; clones share the owner identity, threshold and context.
#[derive(Debug, Clone)]
pub struct LogHandle {
    ctx: Arc<LogContext>,
    owner: Arc<str>,
    threshold: Severity,
}

impl LogHandle {
    /// Create a handle for `owner` directly, bypassing any registry.
    pub fn new(ctx: Arc<LogContext>, owner: impl Into<Arc<str>>, threshold: Severity) -> Self {
        Self {
            ctx,
            owner: owner.into(),
            threshold,
        }
    }

    /// The owner identity stamped on every line of this handle.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The minimum severity this handle writes.
    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    /// The context this handle writes through.
    pub fn context(&self) -> &Arc<LogContext> {
        &self.ctx
    }

    /// Whether a message at `severity` would be written right now.
    pub fn enabled(&self, severity: Severity) -> bool {
        self.ctx.enabled(self.threshold, severity)
    }

    /// Write `message` at `severity`.
    ///
    /// # Errors
    ///
    /// Return an error if the message passes the filter but cannot be written.
    pub fn log(&self, severity: Severity, message: &str) -> Result<(), Error> {
        self.ctx.log(&self.owner, self.threshold, severity, message)
    }

    /// Write `message` at [`Severity::Trace`].
    pub fn trace(&self, message: &str) -> Result<(), Error> {
        self.log(Severity::Trace, message)
    }

    /// Write `message` at [`Severity::Debug`].
    pub fn debug(&self, message: &str) -> Result<(), Error> {
        self.log(Severity::Debug, message)
    }

    /// Write `message` at [`Severity::Info`].
    pub fn info(&self, message: &str) -> Result<(), Error> {
        self.log(Severity::Info, message)
    }

    /// Write `message` at [`Severity::Warning`].
    pub fn warning(&self, message: &str) -> Result<(), Error> {
        self.log(Severity::Warning, message)
    }

    /// Write `message` at [`Severity::Error`].
    pub fn error(&self, message: &str) -> Result<(), Error> {
        self.log(Severity::Error, message)
    }

    /// Write `message` at [`Severity::Fatal`].
    pub fn fatal(&self, message: &str) -> Result<(), Error> {
        self.log(Severity::Fatal, message)
    }

    /// Alias of [`LogHandle::fatal`].
    pub fn critical(&self, message: &str) -> Result<(), Error> {
        self.fatal(message)
    }
}
