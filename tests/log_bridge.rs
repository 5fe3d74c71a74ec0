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

use std::fs;

use rollog::LogContext;
use rollog::LogSink;
use rollog::Severity;
use tempfile::TempDir;

// the global logger can only be set once per process, so this file holds a single test
#[test]
fn test_log_crate_is_routed_through_the_sink() {
    let temp_dir = TempDir::new().unwrap();
    let sink = LogSink::builder()
        .log_dir(temp_dir.path().join("logs"))
        .config_path(temp_dir.path().join("loggerConfig.json"))
        .env_var("")
        .build()
        .unwrap();
    let ctx = LogContext::new(sink);
    ctx.set_global_threshold(Severity::Trace);
    rollog::bridge::setup_log_crate(ctx.clone(), Severity::Debug).unwrap();

    log::trace!(target: "bridge", "below the bridge threshold");
    log::debug!(target: "bridge", "debug {}", 42);
    log::warn!(target: "bridge", "careful");
    log::error!("untargeted");
    log::logger().flush();

    let err = rollog::bridge::setup_log_crate(ctx.clone(), Severity::Trace).unwrap_err();
    assert_eq!(err.kind(), rollog::ErrorKind::InvalidArgument);

    let content = fs::read_to_string(ctx.sink().current_path()).unwrap();
    let lines = content.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3, "{content}");
    assert!(lines[0].ends_with("] bridge - Debug - debug 42"));
    assert!(lines[1].ends_with("] bridge - Warning - careful"));
    assert!(lines[2].ends_with("] log_bridge - Error - untargeted"));
}
