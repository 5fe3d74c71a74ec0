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

//! Layouts for formatting log records.

use std::fmt;
use std::fmt::Write;

use jiff::tz::TimeZone;

use crate::Error;
use crate::LogRecord;

/// A layout for formatting log records.
///
/// The sink appends the line terminator; a layout returns the text of the line only.
pub trait Layout: fmt::Debug + Send + Sync + 'static {
    /// Format a log record.
    fn format(&self, record: &LogRecord) -> Result<Vec<u8>, Error>;
}

impl<T: Layout> From<T> for Box<dyn Layout> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// The default layout of rollog.
///
/// Output format:
///
/// ```text
/// [2024-08-11 22:44:57.172] billing::Invoice - Info - invoice 42 issued
/// [2024-08-11 22:44:57.173] billing::Invoice - Warning - retrying payment gateway
/// [2024-08-11 22:44:57.175] storage::Pool - Fatal - pool exhausted
/// ```
///
/// Timestamps are rendered in the system time zone unless another one is set with
/// [`LineLayout::timezone`].
///
/// # Examples
///
/// ```
/// use rollog::layout::LineLayout;
///
/// let layout = LineLayout::default();
/// ```
#[derive(Debug, Clone)]
pub struct LineLayout {
    timezone: TimeZone,
}

impl Default for LineLayout {
    fn default() -> Self {
        Self {
            timezone: TimeZone::system(),
        }
    }
}

impl LineLayout {
    /// Set the time zone the timestamp is rendered in.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.timezone = tz;
        self
    }
}

impl Layout for LineLayout {
    fn format(&self, record: &LogRecord) -> Result<Vec<u8>, Error> {
        let time = record.time().with_time_zone(self.timezone.clone());
        let mut text = String::new();
        write!(
            &mut text,
            "[{}.{:03}] {} - {} - {}",
            time.strftime("%Y-%m-%d %H:%M:%S"),
            time.millisecond(),
            record.owner(),
            record.severity(),
            record.message()
        )
        .map_err(Error::from_fmt_error)?;
        Ok(text.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use jiff::Zoned;

    use super::*;
    use crate::Severity;

    fn format(layout: &LineLayout, time: &str, severity: Severity, message: &str) -> String {
        let time = Zoned::from_str(time).unwrap();
        let record = LogRecord::new(time, "billing::Invoice", severity, message);
        String::from_utf8(layout.format(&record).unwrap()).unwrap()
    }

    #[test]
    fn test_line_format() {
        let layout = LineLayout::default().timezone(TimeZone::UTC);
        let line = format(
            &layout,
            "2024-08-10T17:12:52.123456789[UTC]",
            Severity::Warning,
            "disk almost full",
        );
        insta::assert_snapshot!(line, @"[2024-08-10 17:12:52.123] billing::Invoice - Warning - disk almost full");
    }

    #[test]
    fn test_line_format_pads_milliseconds_and_converts_zone() {
        let layout = LineLayout::default().timezone(TimeZone::fixed(jiff::tz::offset(8)));
        let line = format(
            &layout,
            "2024-12-31T23:59:59.007[UTC]",
            Severity::Fatal,
            "bye",
        );
        insta::assert_snapshot!(line, @"[2025-01-01 07:59:59.007] billing::Invoice - Fatal - bye");
    }
}
