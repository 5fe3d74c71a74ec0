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

//! The log record struct.

use jiff::Zoned;

use crate::Severity;

/// One log event, built per write call and consumed by the sink.
#[derive(Clone, Debug)]
pub struct LogRecord<'a> {
    time: Zoned,
    owner: &'a str,
    severity: Severity,
    message: &'a str,
}

impl<'a> LogRecord<'a> {
    /// Create a new record.
    pub fn new(time: Zoned, owner: &'a str, severity: Severity, message: &'a str) -> Self {
        Self {
            time,
            owner,
            severity,
            message,
        }
    }

    /// The time the record was created.
    pub fn time(&self) -> &Zoned {
        &self.time
    }

    /// The identity of the handle that emitted the record.
    pub fn owner(&self) -> &'a str {
        self.owner
    }

    /// The severity of the record.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The message text.
    pub fn message(&self) -> &'a str {
        self.message
    }
}
