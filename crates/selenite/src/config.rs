//
// config.rs
//
// Session configuration, read from initialization options and from
// workspace/didChangeConfiguration settings
//

use std::collections::HashSet;

use crate::diagnostics::DiagnosticKind;
use crate::paths::IgnorePatterns;

/// Which diagnostic kinds are reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    /// Master switch: when off nothing is reported
    pub all_enable: bool,
    /// Kinds switched off individually
    pub disabled: HashSet<DiagnosticKind>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            all_enable: true,
            disabled: HashSet::new(),
        }
    }
}

impl CheckConfig {
    pub fn is_enabled(&self, kind: DiagnosticKind) -> bool {
        self.all_enable && !self.disabled.contains(&kind)
    }

    /// Apply `AllEnable` and per-kind `Check*` toggles found in `section`.
    fn merge(&mut self, section: &serde_json::Value) {
        if let Some(v) = section.get("AllEnable").and_then(|v| v.as_bool()) {
            self.all_enable = v;
        }
        for kind in DiagnosticKind::ALL {
            let Some(key) = kind.setting_key() else {
                continue;
            };
            if let Some(enabled) = section.get(key).and_then(|v| v.as_bool()) {
                if enabled {
                    self.disabled.remove(&kind);
                } else {
                    self.disabled.insert(kind);
                }
            }
        }
    }
}

/// Typed session configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Client identifier reported by the editor plugin
    pub client: String,
    /// Install directory of the editor plugin
    pub plugin_path: Option<String>,
    /// Maximum number of references returned by one query
    pub reference_max_num: usize,
    /// Whether references include the definition itself
    pub reference_include_define: bool,
    /// Number of table fields shown in hover previews
    pub preview_fields_num: usize,
    /// Whether the periodic usage report runs
    pub enable_report: bool,
    /// Module separator in `require` names, rewritten to `/`
    pub require_path_separator: char,
    /// Files or folders excluded from analysis
    pub ignore_file_or_dir: Vec<String>,
    /// Files or folders whose diagnostics are suppressed
    pub ignore_file_or_dir_error: Vec<String>,
    /// File name patterns associated with Lua
    pub file_associations: Vec<String>,
    /// Extra include functions recognized besides `require` and `dofile`
    pub include_functions: Vec<String>,
    /// Quiet period after a clean edit during which highlights are skipped
    pub highlight_quiet_ms: u64,
    /// Interval of the usage report
    pub report_interval_secs: u64,
    pub checks: CheckConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client: "vsc".to_string(),
            plugin_path: None,
            reference_max_num: 3000,
            reference_include_define: true,
            preview_fields_num: 30,
            enable_report: false,
            require_path_separator: '.',
            ignore_file_or_dir: Vec::new(),
            ignore_file_or_dir_error: Vec::new(),
            file_associations: Vec::new(),
            include_functions: Vec::new(),
            highlight_quiet_ms: 3000,
            report_interval_secs: 300,
            checks: CheckConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Patterns of files whose diagnostics are dropped
    pub fn error_filter(&self) -> IgnorePatterns {
        IgnorePatterns::for_errors(&self.ignore_file_or_dir_error)
    }

    /// Patterns of files excluded from analysis
    pub fn analysis_filter(&self) -> IgnorePatterns {
        IgnorePatterns::new(&self.ignore_file_or_dir)
    }
}

fn string_list(value: Option<&serde_json::Value>) -> Option<Vec<String>> {
    let items = value?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
    )
}

/// Patterns of a `files.associations` object mapped to `lua`.
fn lua_associations(value: Option<&serde_json::Value>) -> Option<Vec<String>> {
    let map = value?.as_object()?;
    Some(
        map.iter()
            .filter(|(_, language)| {
                language
                    .as_str()
                    .is_some_and(|l| l.eq_ignore_ascii_case("lua"))
            })
            .map(|(pattern, _)| pattern.clone())
            .collect(),
    )
}

/// Build the configuration from `initializationOptions`.
///
/// Missing keys keep their defaults.
pub fn parse_initialization_options(options: &serde_json::Value) -> SessionConfig {
    let mut config = SessionConfig::default();

    if let Some(v) = options.get("client").and_then(|v| v.as_str()) {
        config.client = v.to_string();
    }
    if let Some(v) = options.get("PluginPath").and_then(|v| v.as_str()) {
        if !v.is_empty() {
            config.plugin_path = Some(v.to_string());
        }
    }
    if let Some(v) = options.get("referenceMaxNum").and_then(|v| v.as_u64()) {
        if v > 0 {
            config.reference_max_num = v as usize;
        }
    }
    if let Some(v) = options.get("referenceDefineFlag").and_then(|v| v.as_bool()) {
        config.reference_include_define = v;
    }
    if let Some(v) = lua_associations(options.get("FileAssociationsConfig")) {
        config.file_associations = v;
    }
    if let Some(v) = string_list(options.get("IgnoreFileOrDir")) {
        config.ignore_file_or_dir = v;
    }
    if let Some(v) = string_list(options.get("IgnoreFileOrDirError")) {
        config.ignore_file_or_dir_error = v;
    }
    if let Some(v) = string_list(options.get("IncludeFunctions")) {
        config.include_functions = v;
    }
    config.checks.merge(options);

    config
}

/// Apply `workspace/didChangeConfiguration` settings on top of `base`.
///
/// Reads `selenite.base.*`, `selenite.warn.*` and `files.associations`.
pub fn parse_settings(settings: &serde_json::Value, base: &SessionConfig) -> SessionConfig {
    let mut config = base.clone();

    if let Some(section) = settings.get("selenite") {
        if let Some(b) = section.get("base") {
            if let Some(v) = string_list(b.get("IgnoreFileOrDir")) {
                config.ignore_file_or_dir = v;
            }
            if let Some(v) = string_list(b.get("IgnoreFileOrDirError")) {
                config.ignore_file_or_dir_error = v;
            }
            if let Some(v) = string_list(b.get("IncludeFunctions")) {
                config.include_functions = v;
            }
            if let Some(v) = b.get("RequirePathSeparator").and_then(|v| v.as_str()) {
                if let Some(sep) = v.chars().next() {
                    config.require_path_separator = sep;
                }
            }
            if let Some(v) = b.get("ReferenceMaxNum").and_then(|v| v.as_u64()) {
                if v > 0 {
                    config.reference_max_num = v as usize;
                }
            }
            if let Some(v) = b.get("ReferenceIncludeDefine").and_then(|v| v.as_bool()) {
                config.reference_include_define = v;
            }
            if let Some(v) = b.get("PreviewFieldsNum").and_then(|v| v.as_u64()) {
                config.preview_fields_num = v as usize;
            }
            if let Some(v) = b.get("Report").and_then(|v| v.as_bool()) {
                config.enable_report = v;
            }
            if let Some(v) = b.get("HighlightQuietMs").and_then(|v| v.as_u64()) {
                config.highlight_quiet_ms = v;
            }
            if let Some(v) = b.get("ReportIntervalSecs").and_then(|v| v.as_u64()) {
                if v > 0 {
                    config.report_interval_secs = v;
                }
            }
        }
        if let Some(w) = section.get("warn") {
            config.checks.merge(w);
        }
    }

    if let Some(v) = lua_associations(settings.get("files").and_then(|f| f.get("associations"))) {
        config.file_associations = v;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_values() {
        let config = SessionConfig::default();
        assert_eq!(config.client, "vsc");
        assert!(config.plugin_path.is_none());
        assert_eq!(config.reference_max_num, 3000);
        assert!(config.reference_include_define);
        assert_eq!(config.preview_fields_num, 30);
        assert!(!config.enable_report);
        assert_eq!(config.require_path_separator, '.');
        assert!(config.ignore_file_or_dir.is_empty());
        assert!(config.ignore_file_or_dir_error.is_empty());
        assert!(config.file_associations.is_empty());
        assert!(config.include_functions.is_empty());
        assert_eq!(config.highlight_quiet_ms, 3000);
        assert_eq!(config.report_interval_secs, 300);
        for kind in DiagnosticKind::ALL {
            assert!(config.checks.is_enabled(kind));
        }
    }

    #[test]
    fn test_parse_initialization_options() {
        let options = json!({
            "client": "vim",
            "PluginPath": "/opt/plugin",
            "referenceMaxNum": 50,
            "referenceDefineFlag": false,
            "FileAssociationsConfig": { "*.script": "lua", "*.md": "markdown" },
            "IgnoreFileOrDir": ["build/"],
            "IgnoreFileOrDirError": ["third_party/"],
            "CheckFloatEq": false
        });
        let config = parse_initialization_options(&options);
        assert_eq!(config.client, "vim");
        assert_eq!(config.plugin_path.as_deref(), Some("/opt/plugin"));
        assert_eq!(config.reference_max_num, 50);
        assert!(!config.reference_include_define);
        assert_eq!(config.file_associations, vec!["*.script".to_string()]);
        assert_eq!(config.ignore_file_or_dir, vec!["build/".to_string()]);
        assert_eq!(config.ignore_file_or_dir_error, vec!["third_party/".to_string()]);
        assert!(!config.checks.is_enabled(DiagnosticKind::FloatEq));
        assert!(config.checks.is_enabled(DiagnosticKind::Syntax));
    }

    #[test]
    fn test_empty_options_are_defaults() {
        assert_eq!(parse_initialization_options(&json!({})), SessionConfig::default());
        assert_eq!(parse_initialization_options(&json!(null)), SessionConfig::default());
    }

    #[test]
    fn test_all_enable_is_master_switch() {
        let config = parse_initialization_options(&json!({ "AllEnable": false, "CheckSyntax": true }));
        for kind in DiagnosticKind::ALL {
            assert!(!config.checks.is_enabled(kind));
        }
    }

    #[test]
    fn test_parse_settings_overrides_base() {
        let base = SessionConfig {
            client: "vim".into(),
            ..Default::default()
        };
        let settings = json!({
            "selenite": {
                "base": {
                    "RequirePathSeparator": "/",
                    "ReferenceMaxNum": 10,
                    "ReferenceIncludeDefine": false,
                    "PreviewFieldsNum": 5,
                    "Report": true,
                    "IncludeFunctions": ["import"],
                    "HighlightQuietMs": 0
                },
                "warn": { "CheckLocalNoUse": false, "CheckAnnotateType": false }
            },
            "files": { "associations": { "*.luax": "Lua" } }
        });
        let config = parse_settings(&settings, &base);
        assert_eq!(config.client, "vim");
        assert_eq!(config.require_path_separator, '/');
        assert_eq!(config.reference_max_num, 10);
        assert!(!config.reference_include_define);
        assert_eq!(config.preview_fields_num, 5);
        assert!(config.enable_report);
        assert_eq!(config.include_functions, vec!["import".to_string()]);
        assert_eq!(config.highlight_quiet_ms, 0);
        assert!(!config.checks.is_enabled(DiagnosticKind::LocalNoUse));
        assert!(!config.checks.is_enabled(DiagnosticKind::Annotation));
        assert!(config.checks.is_enabled(DiagnosticKind::NoDefine));
        assert_eq!(config.file_associations, vec!["*.luax".to_string()]);
    }

    #[test]
    fn test_reenabling_a_kind() {
        let base = parse_initialization_options(&json!({ "CheckFloatEq": false }));
        let config = parse_settings(&json!({ "selenite": { "warn": { "CheckFloatEq": true } } }), &base);
        assert!(config.checks.is_enabled(DiagnosticKind::FloatEq));
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let settings = json!({
            "selenite": { "base": { "ReferenceMaxNum": "lots", "RequirePathSeparator": "" } }
        });
        let config = parse_settings(&settings, &SessionConfig::default());
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_error_filter_includes_configured_patterns() {
        let config = SessionConfig {
            ignore_file_or_dir_error: vec!["gen/".into()],
            ..Default::default()
        };
        let filter = config.error_filter();
        assert!(filter.matches("/w/gen/a.lua"));
        assert!(filter.matches("/x/server/meta/a.lua"));
        assert!(!config.analysis_filter().matches("/w/gen/a.lua"));
    }
}
