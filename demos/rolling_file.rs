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

//! An example of logging to a size-rotated file, both through handles and the `log` crate.

use rollog::HandleRegistry;
use rollog::LogContext;
use rollog::LogSink;
use rollog::Severity;

struct Checkout;

fn main() -> Result<(), rollog::Error> {
    let sink = LogSink::builder()
        .log_dir("logs")
        .config_path("logs/loggerConfig.json")
        .build()?;
    let ctx = LogContext::new(sink);
    ctx.set_global_threshold(Severity::Trace);

    rollog::bridge::setup_log_crate(ctx.clone(), Severity::Info)?;
    let registry = HandleRegistry::new(ctx.clone());
    let checkout = registry.handle_of::<Checkout>(Some(Severity::Debug));

    let repeat = 1;

    for i in 0..repeat {
        checkout.fatal("Hello fatal!")?;
        checkout.error("Hello error!")?;
        checkout.warning("Hello warning!")?;
        checkout.info("Hello info!")?;
        checkout.debug("Hello debug!")?;
        checkout.trace("Hello trace!")?;

        log::info!("Hello from the log crate!");
        log::debug!("Filtered by the bridge threshold.");

        if i + 1 < repeat {
            std::thread::sleep(std::time::Duration::from_secs(10));
        }
    }

    println!("wrote to {}", ctx.sink().current_path().display());
    ctx.shutdown()
}
