//! Wall-clock budgets for the session hot paths.
//!
//! Release builds only. Under `CI` every budget is scaled by
//! `SELENITE_PERF_CI_FACTOR` (default 3).
//!
//! Run with: `cargo test --release -p selenite --features test-support --test performance_budgets`

#![cfg(not(debug_assertions))]

use std::time::{Duration, Instant};

use tower_lsp::lsp_types::Position;

use selenite::cursor_context;
use selenite::paths::{self, IgnorePatterns};
use selenite::position::{self, EditOp};
use selenite::test_utils::fixture_workspace::{
    create_fixture_workspace, generate_lua_module, FixtureConfig,
};

/// Median of three runs of `f`.
fn median_of_3<F: FnMut()>(mut f: F) -> Duration {
    let mut times = [Duration::ZERO; 3];
    for t in &mut times {
        let start = Instant::now();
        f();
        *t = start.elapsed();
    }
    times.sort();
    times[1]
}

fn budget(budget_ms: u64) -> Duration {
    let factor = match std::env::var("CI") {
        Ok(ci) if !ci.is_empty() => std::env::var("SELENITE_PERF_CI_FACTOR")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|&f| f >= 1.0)
            .unwrap_or(3.0),
        _ => 1.0,
    };
    Duration::from_secs_f64(budget_ms as f64 * factor / 1000.0)
}

fn assert_within_budget(label: &str, measured: Duration, budget_ms: u64) {
    let threshold = budget(budget_ms);
    assert!(
        measured <= threshold,
        "{label}: measured {measured:.1?}, threshold {threshold:.1?} (base {budget_ms}ms)"
    );
}

/// A module of roughly `target_bytes`, built from fixture functions.
fn lua_code_of_size(target_bytes: usize) -> Vec<u8> {
    let config = FixtureConfig {
        file_count: 1,
        functions_per_file: target_bytes / 180 + 1,
        require_chain_depth: 0,
        annotated: true,
        extra_lines_per_file: 0,
    };
    generate_lua_module(0, &config).into_bytes()
}

#[test]
fn budget_offset_for_last_line_100kb() {
    let buffer = lua_code_of_size(102_400);
    assert!(buffer.len() >= 90_000, "got {} bytes", buffer.len());
    let last_line = buffer.iter().filter(|&&b| b == b'\n').count() as u32;

    let elapsed = median_of_3(|| {
        for _ in 0..100 {
            let _ = position::offset_for(&buffer, last_line, 0).expect("offset");
        }
    });

    assert_within_budget("offset_for_100kb_x100", elapsed, 50);
}

#[test]
fn budget_typing_burst_100kb() {
    let buffer = lua_code_of_size(102_400);
    let edits: Vec<EditOp> = (0..20)
        .map(|i| EditOp::Range {
            start: Position::new(100, i),
            end: Position::new(100, i),
            text: "a".to_string(),
        })
        .collect();

    let elapsed = median_of_3(|| {
        let _ = position::apply_edits(&buffer, &edits).expect("apply");
    });

    assert_within_budget("apply_edits_burst_100kb", elapsed, 50);
}

#[test]
fn budget_resolve_end_of_100kb() {
    let mut buffer = lua_code_of_size(102_400);
    buffer.extend_from_slice(b"local v = config.server.");
    let offset = buffer.len();

    let elapsed = median_of_3(|| {
        for _ in 0..100 {
            let _ = cursor_context::resolve(&buffer, offset).expect("resolve");
        }
    });

    assert_within_budget("resolve_100kb_x100", elapsed, 20);
}

#[test]
fn budget_workspace_scan_large() {
    let workspace = create_fixture_workspace(&FixtureConfig::large());
    let ignore = IgnorePatterns::default();

    let mut found = 0;
    let elapsed = median_of_3(|| {
        found = paths::collect_lua_files(workspace.path(), &[], &ignore).len();
    });

    assert_eq!(found, 200);
    assert_within_budget("workspace_scan_200", elapsed, 200);
}
