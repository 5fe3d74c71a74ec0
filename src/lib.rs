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

//! Rollog is a small embedded logging facility writing to a size-rotated file.
//!
//! # Overview
//!
//! All handles of a [`LogContext`] write through its single [`LogSink`], which owns the active
//! log file. Appends and rotations are serialized by a write gate, so lines never interleave.
//! Once the active file grows past 4 MiB, the next append first rotates to a new file named
//! after the current time. The active path is persisted to a small JSON record, so a restart
//! resumes the same file while it is under the cap.
//!
//! Each [`LogHandle`] carries an owner identity and a minimum [`Severity`]; a message is
//! written only if it clears both that threshold and the context's global one.
//!
//! # Examples
//!
//! ```no_run
//! use rollog::HandleRegistry;
//! use rollog::LogContext;
//! use rollog::LogSink;
//! use rollog::Severity;
//!
//! struct Billing;
//!
//! let sink = LogSink::builder().log_dir("logs").config_path("logs/loggerConfig.json").build()?;
//! let ctx = LogContext::new(sink);
//! let registry = HandleRegistry::new(ctx.clone());
//!
//! let log = registry.handle_of::<Billing>(Some(Severity::Debug));
//! log.debug("suppressed: the global threshold defaults to Info")?;
//! log.warning("payment gateway slow")?;
//!
//! ctx.set_global_threshold(Severity::Trace);
//! log.debug("written")?;
//!
//! ctx.shutdown()?;
//! # Ok::<(), rollog::Error>(())
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod bridge;
pub mod config;
pub mod gate;
pub mod layout;
pub mod level;
pub mod rotation;
pub mod trap;

mod clock;
mod context;
mod error;
mod handle;
mod record;
mod sink;

pub use self::context::HandleRegistry;
pub use self::context::LogContext;
pub use self::error::Error;
pub use self::error::ErrorKind;
pub use self::handle::LogHandle;
pub use self::layout::Layout;
pub use self::level::Severity;
pub use self::record::LogRecord;
pub use self::sink::LogSink;
pub use self::sink::LogSinkBuilder;
pub use self::trap::Trap;
