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

use jiff::Zoned;

#[derive(Debug)]
pub enum Clock {
    DefaultClock,
    #[cfg(test)]
    ManualClock(ManualClock),
}

impl Clock {
    pub fn now(&self) -> Zoned {
        match self {
            Clock::DefaultClock => Zoned::now(),
            #[cfg(test)]
            Clock::ManualClock(clock) => clock.now(),
        }
    }

    #[cfg(test)]
    pub fn set_now(&self, now: Zoned) {
        if let Clock::ManualClock(clock) = self {
            clock.set_now(now);
        }
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
#[cfg(test)]
pub struct ManualClock {
    now: std::sync::Mutex<Zoned>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(now: Zoned) -> ManualClock {
        ManualClock {
            now: std::sync::Mutex::new(now),
        }
    }

    fn now(&self) -> Zoned {
        self.now.lock().unwrap().clone()
    }

    pub fn set_now(&self, now: Zoned) {
        *self.now.lock().unwrap() = now;
    }
}
