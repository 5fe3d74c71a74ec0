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

//! Bridge from the [`log`] crate facade.
//!
//! Once installed, `log::info!` and friends are written through a [`LogContext`], with the
//! record target as the owner identity.

use std::borrow::Cow;
use std::sync::Arc;

use crate::Error;
use crate::ErrorKind;
use crate::LogContext;
use crate::Severity;

impl From<log::Level> for Severity {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warning,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

/// A [`log::Log`] implementation writing through a [`LogContext`].
///
/// Errors raised while writing are handed to the sink's trap, since `log` gives no way to
/// return them.
#[derive(Debug)]
pub struct LogBridge {
    ctx: Arc<LogContext>,
    threshold: Severity,
}

impl LogBridge {
    /// Create a bridge applying `threshold` on top of the context's global threshold.
    pub fn new(ctx: Arc<LogContext>, threshold: Severity) -> Self {
        Self { ctx, threshold }
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.ctx.enabled(self.threshold, metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        if !log::Log::enabled(self, record.metadata()) {
            return;
        }

        let message = match record.args().as_str() {
            Some(s) => Cow::Borrowed(s),
            None => Cow::Owned(record.args().to_string()),
        };
        let severity = record.level().into();
        if let Err(err) = self
            .ctx
            .log(record.target(), self.threshold, severity, &message)
        {
            self.ctx.sink().trap().trap(&err);
        }
    }

    fn flush(&self) {
        if let Err(err) = self.ctx.sink().flush() {
            self.ctx.sink().trap().trap(&err);
        }
    }
}

/// Install a [`LogBridge`] over `ctx` as the global `log` logger.
///
/// # Errors
///
/// Return an error if a global logger has already been set.
///
/// # Examples
///
/// ```no_run
/// use rollog::LogContext;
/// use rollog::LogSink;
/// use rollog::Severity;
///
/// let ctx = LogContext::new(LogSink::builder().build().unwrap());
/// rollog::bridge::setup_log_crate(ctx, Severity::Trace).unwrap();
///
/// log::warn!("written by the rollog sink");
/// ```
pub fn setup_log_crate(ctx: Arc<LogContext>, threshold: Severity) -> Result<(), Error> {
    log::set_boxed_logger(Box::new(LogBridge::new(ctx, threshold))).map_err(|err| {
        Error::new(ErrorKind::InvalidArgument, "failed to set up log crate bridge").with_source(err)
    })?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
