//
// paths.rs
//
// Canonical file paths, workspace folder membership and ignore patterns
//

use std::path::Path;

use regex::Regex;
use tower_lsp::lsp_types::Url;
use walkdir::WalkDir;

/// Folder always excluded from error reporting (client-bundled definitions).
const BUNDLED_META_DIR: &str = "server/meta";

/// Canonical path for a document URI.
///
/// File URIs become filesystem paths with `/` separators; anything else is
/// kept as the raw URI text so it can still be used as a key.
pub fn uri_to_path(uri: &Url) -> String {
    match uri.to_file_path() {
        Ok(path) => path.to_string_lossy().replace('\\', "/"),
        Err(()) => uri.as_str().to_string(),
    }
}

/// URI for a canonical path. Non-absolute paths that parse as URIs are
/// accepted as-is.
pub fn path_to_uri(path: &str) -> Option<Url> {
    Url::from_file_path(path).ok().or_else(|| Url::parse(path).ok())
}

/// Whether `path` lies under `dir`.
pub fn is_within(path: &str, dir: &str) -> bool {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        return path.starts_with('/');
    }
    path == dir || (path.starts_with(dir) && path[dir.len()..].starts_with('/'))
}

pub fn within_any(path: &str, dirs: &[String]) -> bool {
    dirs.iter().any(|dir| is_within(path, dir))
}

/// Whether `path` names a Lua source, either by extension or through a
/// `files.associations` pattern mapped to Lua.
pub fn is_lua_file(path: &str, associations: &[String]) -> bool {
    if path.ends_with(".lua") {
        return true;
    }
    let name = path.rsplit('/').next().unwrap_or(path);
    associations.iter().any(|pattern| match pattern.strip_prefix('*') {
        Some(suffix) => !suffix.is_empty() && name.ends_with(suffix),
        None => name == pattern,
    })
}

/// Every Lua file under `dir`, skipping ignored files and folders.
pub fn collect_lua_files(dir: &Path, associations: &[String], ignore: &IgnorePatterns) -> Vec<String> {
    WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::trace!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().to_string_lossy().replace('\\', "/"))
        .filter(|path| is_lua_file(path, associations) && !ignore.matches(path))
        .collect()
}

// ============================================================================
// Ignore patterns
// ============================================================================

/// User-supplied file or folder patterns.
///
/// Each pattern is tried as a regular expression; patterns that do not
/// compile match as plain substrings.
#[derive(Debug, Clone, Default)]
pub struct IgnorePatterns {
    patterns: Vec<Pattern>,
}

#[derive(Debug, Clone)]
enum Pattern {
    Regex(Regex),
    Literal(String),
}

impl IgnorePatterns {
    pub fn new(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| match Regex::new(p) {
                Ok(re) => Pattern::Regex(re),
                Err(err) => {
                    log::warn!("Ignore pattern {:?} is not a valid regex ({}); matching literally", p, err);
                    Pattern::Literal(p.clone())
                }
            })
            .collect();
        Self { patterns }
    }

    /// Patterns for suppressing diagnostics; always covers the bundled
    /// definition folder.
    pub fn for_errors(patterns: &[String]) -> Self {
        let mut all = patterns.to_vec();
        all.push(BUNDLED_META_DIR.to_string());
        Self::new(&all)
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| match pattern {
            Pattern::Regex(re) => re.is_match(path),
            Pattern::Literal(text) => path.contains(text.as_str()),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
