//! Deterministic fixture workspace generator for benchmarks and tests.
//!
//! Generates synthetic Lua workspaces with controlled characteristics:
//! module count, functions per module, `require` chains, annotated
//! parameters and filler statements.
//!
//! Output is deterministic so benchmarks are reproducible.

use std::fmt::Write;
use std::path::Path;
use tempfile::TempDir;

/// Directory holding the generated modules, relative to the workspace root.
pub const PACKAGE_DIR: &str = "pkg";

/// Configuration for generating a fixture workspace.
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    pub file_count: usize,
    pub functions_per_file: usize,
    pub require_chain_depth: usize,
    /// Add `---@param` annotations above every function
    pub annotated: bool,
    pub extra_lines_per_file: usize,
}

impl FixtureConfig {
    /// Small workspace: 10 modules, 5 functions each, require chain depth 3.
    pub fn small() -> Self {
        Self {
            file_count: 10,
            functions_per_file: 5,
            require_chain_depth: 3,
            annotated: true,
            extra_lines_per_file: 5,
        }
    }

    /// Medium workspace: 50 modules, 10 functions each, require chain depth 10.
    pub fn medium() -> Self {
        Self {
            file_count: 50,
            functions_per_file: 10,
            require_chain_depth: 10,
            annotated: true,
            extra_lines_per_file: 10,
        }
    }

    /// Large workspace: 200 modules, 20 functions each, require chain depth 15.
    pub fn large() -> Self {
        Self {
            file_count: 200,
            functions_per_file: 20,
            require_chain_depth: 15,
            annotated: true,
            extra_lines_per_file: 20,
        }
    }
}

/// File name of module `index`, relative to the workspace root.
pub fn module_path(index: usize) -> String {
    format!("{}/mod_{}.lua", PACKAGE_DIR, index)
}

/// Generate the content of one module.
///
/// Module `i` within the chain depth requires module `i + 1` and calls its
/// first function.
pub fn generate_lua_module(index: usize, config: &FixtureConfig) -> String {
    let mut content = String::new();
    let chained = index < config.require_chain_depth && index + 1 < config.file_count;

    if chained {
        writeln!(content, "local next_mod = require(\"{}.mod_{}\")", PACKAGE_DIR, index + 1).unwrap();
        content.push('\n');
    }
    writeln!(content, "local M = {{}}").unwrap();
    content.push('\n');

    for func_i in 0..config.functions_per_file {
        if config.annotated {
            writeln!(content, "---@param x number").unwrap();
            writeln!(content, "---@param y number").unwrap();
            writeln!(content, "---@return number").unwrap();
        }
        writeln!(content, "function M.func_{}_{}(x, y)", index, func_i).unwrap();
        writeln!(content, "    local result = x + y * {}", func_i + 1).unwrap();
        writeln!(content, "    if result ~= result then").unwrap();
        writeln!(content, "        return nil").unwrap();
        writeln!(content, "    end").unwrap();
        writeln!(content, "    return result").unwrap();
        writeln!(content, "end").unwrap();
        content.push('\n');
    }

    if chained && config.functions_per_file > 0 {
        writeln!(content, "M.chained = next_mod.func_{}_0(1, 2)", index + 1).unwrap();
    }
    for line_i in 0..config.extra_lines_per_file {
        writeln!(content, "M.var_{}_{} = {}", index, line_i, line_i + 1).unwrap();
    }

    content.push('\n');
    writeln!(content, "return M").unwrap();
    content
}

/// Create a temporary fixture workspace from the given configuration.
///
/// The directory is removed when the returned `TempDir` is dropped.
pub fn create_fixture_workspace(config: &FixtureConfig) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory for fixture workspace");
    write_fixture_workspace(temp_dir.path(), config);
    temp_dir
}

/// Write fixture modules into an existing directory.
pub fn write_fixture_workspace(dir: &Path, config: &FixtureConfig) {
    std::fs::create_dir_all(dir.join(PACKAGE_DIR))
        .unwrap_or_else(|e| panic!("Failed to create {}: {}", PACKAGE_DIR, e));
    for i in 0..config.file_count {
        let filename = module_path(i);
        std::fs::write(dir.join(&filename), generate_lua_module(i, config))
            .unwrap_or_else(|e| panic!("Failed to write fixture file {}: {}", filename, e));
    }
}
