// lib.rs - Lua language server session layer.
//
// The binary entry point lives in main.rs; benches/ and tests/ use the
// modules exported here.

pub mod backend;
pub mod config;
pub mod cursor_context;
pub mod diagnostics;
pub mod document_store;
pub mod error;
pub mod handlers;
pub mod line_scanner;
pub mod paths;
pub mod perf;
pub mod position;
pub mod project;
pub mod session;
pub mod state;
pub mod telemetry;
// test_utils is available in test builds and when the `test-support` feature is enabled.
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
