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

//! Severity levels and their total order.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;

use crate::Error;

/// The severity of a log record, ordered from the most verbose to the most critical.
///
/// `Off` sorts above every logging level. It is only meaningful as a threshold: since no
/// severity is ever at or above `Off` except `Off` itself, a threshold of `Off` silences
/// everything.
///
/// # Examples
///
/// ```
/// use rollog::Severity;
///
/// assert!(Severity::Trace < Severity::Info);
/// assert!(Severity::Fatal < Severity::Off);
/// assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warning);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    /// Most verbose level. Used for development and seldom enabled in production.
    Trace = 0,
    /// Debugging the application behavior from internal events of interest.
    Debug = 1,
    /// Information that highlights progress or application lifetime events.
    Info = 2,
    /// Validation issues or temporary failures that can be recovered.
    Warning = 3,
    /// Functionality has failed or an error has been caught.
    Error = 4,
    /// Most critical level. The application is about to abort.
    Fatal = 5,
    /// Threshold sentinel that filters out every record.
    Off = 6,
}

// normalized name -> severity; the last two rows are synonyms
const NAMES: [(&str, Severity); 9] = [
    ("Trace", Severity::Trace),
    ("Debug", Severity::Debug),
    ("Info", Severity::Info),
    ("Warning", Severity::Warning),
    ("Error", Severity::Error),
    ("Fatal", Severity::Fatal),
    ("Off", Severity::Off),
    ("Warn", Severity::Warning),
    ("Information", Severity::Info),
];

impl Severity {
    /// All severities, `Off` included, in ascending order.
    pub const ALL: [Severity; 7] = [
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
        Severity::Off,
    ];

    /// The severities a record may carry, in ascending order.
    pub const LOGGING: [Severity; 6] = [
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    /// The least severe logging level.
    pub const MIN: Severity = Severity::Trace;

    /// The most severe logging level.
    pub const MAX: Severity = Severity::Fatal;

    /// Return the name of the `Severity`, as written into log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Trace => "Trace",
            Severity::Debug => "Debug",
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Fatal => "Fatal",
            Severity::Off => "Off",
        }
    }

    /// Return the ordinal of the `Severity`, from 0 (`Trace`) to 6 (`Off`).
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    /// Get the `Severity` that corresponds to the given ordinal.
    ///
    /// # Errors
    ///
    /// Return an [`InvalidArgument`](crate::ErrorKind::InvalidArgument) error if the ordinal is
    /// outside `0..=6`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rollog::Severity;
    ///
    /// assert_eq!(Severity::from_ordinal(3).unwrap(), Severity::Warning);
    /// assert!(Severity::from_ordinal(7).is_err());
    /// ```
    pub fn from_ordinal(ordinal: i32) -> Result<Severity, Error> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|n| Severity::ALL.get(n).copied())
            .ok_or_else(|| {
                Error::invalid_argument(format!("unknown log level ordinal: {ordinal}"))
                    .with_context("ordinal", ordinal)
            })
    }

    /// Return whether a record at this severity clears the given threshold.
    pub fn passes(&self, threshold: Severity) -> bool {
        *self >= threshold
    }
}

impl fmt::Debug for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let normalized = match chars.next() {
            Some(first) => {
                let mut normalized: String = first.to_uppercase().collect();
                normalized.push_str(&chars.as_str().to_lowercase());
                normalized
            }
            None => return Err(Error::invalid_argument("empty log level name")),
        };

        NAMES
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, severity)| *severity)
            .ok_or_else(|| {
                Error::invalid_argument(format!("unknown log level: {s}")).with_context("name", s)
            })
    }
}

impl TryFrom<i32> for Severity {
    type Error = Error;

    fn try_from(ordinal: i32) -> Result<Self, Error> {
        Severity::from_ordinal(ordinal)
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.ordinal()
    }
}

/// A [`Severity`] cell that can be read and replaced from any thread without locking.
#[derive(Debug)]
pub struct AtomicSeverity(AtomicU8);

impl AtomicSeverity {
    /// Create a new cell holding `severity`.
    pub const fn new(severity: Severity) -> Self {
        AtomicSeverity(AtomicU8::new(severity as u8))
    }

    /// Read the current value.
    pub fn load(&self) -> Severity {
        // only valid ordinals are ever stored
        match self.0.load(Ordering::Relaxed) {
            0 => Severity::Trace,
            1 => Severity::Debug,
            2 => Severity::Info,
            3 => Severity::Warning,
            4 => Severity::Error,
            5 => Severity::Fatal,
            _ => Severity::Off,
        }
    }

    /// Replace the current value.
    pub fn store(&self, severity: Severity) {
        self.0.store(severity.ordinal(), Ordering::Relaxed);
    }
}

impl Default for AtomicSeverity {
    fn default() -> Self {
        AtomicSeverity::new(Severity::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_order_follows_ordinal() {
        for a in Severity::ALL {
            for b in Severity::ALL {
                assert_eq!(a < b, a.ordinal() < b.ordinal(), "{a} vs {b}");
                assert_eq!(a == b, a.ordinal() == b.ordinal(), "{a} vs {b}");
            }
        }
        for level in Severity::LOGGING {
            assert!(Severity::Off > level);
        }
        assert_eq!(Severity::MIN, Severity::Trace);
        assert_eq!(Severity::MAX, Severity::Fatal);
    }

    #[test]
    fn test_parse_round_trip() {
        for level in Severity::ALL {
            assert_eq!(level.name().parse::<Severity>().unwrap(), level);
            assert_eq!(level.to_string().parse::<Severity>().unwrap(), level);
        }
    }

    #[test]
    fn test_parse_normalizes_case_and_accepts_synonyms() {
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("WARN".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("information".parse::<Severity>().unwrap(), Severity::Info);
        assert_eq!("eRROR".parse::<Severity>().unwrap(), Severity::Error);
        assert_eq!("off".parse::<Severity>().unwrap(), Severity::Off);
    }

    #[test]
    fn test_parse_rejects_unknown_text() {
        let err = "bogus".parse::<Severity>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("bogus"), "{err}");

        let err = "".parse::<Severity>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        assert!("critical".parse::<Severity>().is_err());
    }

    #[test]
    fn test_ordinal_mapping() {
        for (i, level) in Severity::ALL.iter().enumerate() {
            assert_eq!(Severity::from_ordinal(i as i32).unwrap(), *level);
            assert_eq!(level.ordinal() as usize, i);
        }
        for ordinal in [-1, 7, 100, i32::MIN, i32::MAX] {
            let err = Severity::try_from(ordinal).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_atomic_severity() {
        let cell = AtomicSeverity::default();
        assert_eq!(cell.load(), Severity::Info);
        for level in Severity::ALL {
            cell.store(level);
            assert_eq!(cell.load(), level);
        }
    }
}
