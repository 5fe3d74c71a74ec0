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

//! The write gate that serializes rotations and appends.

use std::ops::Deref;
use std::ops::DerefMut;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// A mutual-exclusion gate around a value, counting how often it has been acquired.
///
/// At most one [`GateGuard`] exists at any time; the gate is released when the guard drops,
/// on every exit path. The gate is not reentrant: acquiring it again on a thread that already
/// holds the guard deadlocks.
///
/// A writer that panicked while holding the gate does not disable it; the next acquirer gets
/// the value as the panicking writer left it.
#[derive(Debug, Default)]
pub struct WriteGate<T> {
    inner: Mutex<T>,
    acquisitions: AtomicU64,
}

impl<T> WriteGate<T> {
    /// Create a new gate guarding `value`.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
            acquisitions: AtomicU64::new(0),
        }
    }

    /// Block until the gate is free, then hold it until the returned guard drops.
    pub fn acquire(&self) -> GateGuard<'_, T> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        GateGuard { guard }
    }

    /// Number of times the gate has been acquired so far.
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }

    /// Access the value through a unique reference, without locking.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut().unwrap_or_else(|e| e.into_inner())
    }
}

/// Proof of holding a [`WriteGate`].
#[derive(Debug)]
pub struct GateGuard<'a, T> {
    guard: MutexGuard<'a, T>,
}

impl<T> Deref for GateGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for GateGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use std::thread;

    use super::*;

    #[test]
    fn test_gate_is_exclusive() {
        let gate = Arc::new(WriteGate::new(Vec::new()));
        let inside = Arc::new(AtomicBool::new(false));

        let workers = (0..8)
            .map(|i| {
                let gate = gate.clone();
                let inside = inside.clone();
                thread::spawn(move || {
                    for j in 0..200 {
                        let mut guard = gate.acquire();
                        assert!(!inside.swap(true, Ordering::SeqCst), "two holders at once");
                        guard.push((i, j));
                        inside.store(false, Ordering::SeqCst);
                    }
                })
            })
            .collect::<Vec<_>>();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(gate.acquire().len(), 8 * 200);
        assert_eq!(gate.acquisitions(), 8 * 200 + 1);
    }

    #[test]
    fn test_gate_survives_panicking_holder() {
        let gate = Arc::new(WriteGate::new(0));

        let cloned = gate.clone();
        let result = thread::spawn(move || {
            let mut guard = cloned.acquire();
            *guard += 1;
            panic!("writer failed mid-write");
        })
        .join();
        assert!(result.is_err());

        let mut guard = gate.acquire();
        *guard += 1;
        assert_eq!(*guard, 2);
    }
}
