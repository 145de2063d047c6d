//
// diagnostics.rs
//
// Reconciles stable (whole project) and transient (unsaved edits)
// diagnostic sets with what the client is currently showing
//

use std::collections::HashSet;

use indexmap::IndexMap;
use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticRelatedInformation, DiagnosticSeverity, Location, Range,
};

use crate::paths;

/// Provenance value for diagnostics reached through the shared project.
pub const COMMON_PROJECT: &str = "common project";

// ============================================================================
// Entries
// ============================================================================

/// Warning kinds reported by the analysis engine. The discriminant is the
/// code shown in the message tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DiagnosticKind {
    Syntax = 1,
    NoDefine = 2,
    AfterDefine = 3,
    LocalNoUse = 4,
    TableDuplicateKey = 5,
    ReferNoFile = 6,
    AssignParamNum = 7,
    LocalDefineParamNum = 8,
    GotoLabel = 9,
    CallParam = 10,
    ImportModuleVar = 11,
    IfNotVar = 12,
    DuplicateParam = 13,
    DuplicateExpression = 14,
    OrAlwaysTrue = 15,
    AndAlwaysFalse = 16,
    NoUseAssign = 17,
    Annotation = 18,
    DuplicateIf = 19,
    SelfAssign = 20,
    FloatEq = 21,
    ClassField = 22,
    ConstAssign = 23,
    CallParamType = 24,
    FunctionReturnType = 25,
    AssignType = 26,
    BinaryOperatorType = 27,
    LocalFunctionNotCalled = 28,
}

impl DiagnosticKind {
    pub const ALL: [DiagnosticKind; 28] = [
        DiagnosticKind::Syntax,
        DiagnosticKind::NoDefine,
        DiagnosticKind::AfterDefine,
        DiagnosticKind::LocalNoUse,
        DiagnosticKind::TableDuplicateKey,
        DiagnosticKind::ReferNoFile,
        DiagnosticKind::AssignParamNum,
        DiagnosticKind::LocalDefineParamNum,
        DiagnosticKind::GotoLabel,
        DiagnosticKind::CallParam,
        DiagnosticKind::ImportModuleVar,
        DiagnosticKind::IfNotVar,
        DiagnosticKind::DuplicateParam,
        DiagnosticKind::DuplicateExpression,
        DiagnosticKind::OrAlwaysTrue,
        DiagnosticKind::AndAlwaysFalse,
        DiagnosticKind::NoUseAssign,
        DiagnosticKind::Annotation,
        DiagnosticKind::DuplicateIf,
        DiagnosticKind::SelfAssign,
        DiagnosticKind::FloatEq,
        DiagnosticKind::ClassField,
        DiagnosticKind::ConstAssign,
        DiagnosticKind::CallParamType,
        DiagnosticKind::FunctionReturnType,
        DiagnosticKind::AssignType,
        DiagnosticKind::BinaryOperatorType,
        DiagnosticKind::LocalFunctionNotCalled,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.code() == code)
    }

    /// Name of the `warn` setting that toggles this kind. Kinds without a
    /// toggle follow the master switch.
    pub fn setting_key(self) -> Option<&'static str> {
        let key = match self {
            DiagnosticKind::Syntax => "CheckSyntax",
            DiagnosticKind::NoDefine => "CheckNoDefine",
            DiagnosticKind::AfterDefine => "CheckAfterDefine",
            DiagnosticKind::LocalNoUse => "CheckLocalNoUse",
            DiagnosticKind::TableDuplicateKey => "CheckTableDuplicateKey",
            DiagnosticKind::ReferNoFile => "CheckReferNoFile",
            DiagnosticKind::AssignParamNum => "CheckAssignParamNum",
            DiagnosticKind::LocalDefineParamNum => "CheckLocalDefineParamNum",
            DiagnosticKind::GotoLabel => "CheckGotoLable",
            DiagnosticKind::CallParam => "CheckFuncParam",
            DiagnosticKind::ImportModuleVar => "CheckImportModuleVar",
            DiagnosticKind::IfNotVar => "CheckIfNotVar",
            DiagnosticKind::DuplicateParam => "CheckFunctionDuplicateParam",
            DiagnosticKind::DuplicateExpression => "CheckBinaryExpressionDuplicate",
            DiagnosticKind::OrAlwaysTrue => "CheckErrorOrAlwaysTrue",
            DiagnosticKind::AndAlwaysFalse => "CheckErrorAndAlwaysFalse",
            DiagnosticKind::NoUseAssign => "CheckNoUseAssign",
            DiagnosticKind::Annotation => "CheckAnnotateType",
            DiagnosticKind::DuplicateIf => "CheckDuplicateIf",
            DiagnosticKind::SelfAssign => "CheckSelfAssign",
            DiagnosticKind::FloatEq => "CheckFloatEq",
            DiagnosticKind::ClassField => "CheckClassField",
            DiagnosticKind::ConstAssign => "CheckConstAssign",
            DiagnosticKind::CallParamType
            | DiagnosticKind::FunctionReturnType
            | DiagnosticKind::AssignType
            | DiagnosticKind::BinaryOperatorType
            | DiagnosticKind::LocalFunctionNotCalled => return None,
        };
        Some(key)
    }

    pub fn severity(self) -> DiagnosticSeverity {
        match self {
            DiagnosticKind::Syntax => DiagnosticSeverity::ERROR,
            DiagnosticKind::Annotation => DiagnosticSeverity::INFORMATION,
            _ => DiagnosticSeverity::WARNING,
        }
    }
}

/// A secondary location attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedEntry {
    pub path: String,
    pub range: Range,
    pub message: String,
}

/// One diagnostic produced by the analysis engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEntry {
    pub kind: DiagnosticKind,
    pub message: String,
    pub range: Range,
    pub related: Vec<RelatedEntry>,
    /// Entry file through which the diagnostic's file was reached
    pub provenance: Option<String>,
}

impl DiagnosticEntry {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, range: Range) -> Self {
        Self {
            kind,
            message: message.into(),
            range,
            related: Vec::new(),
            provenance: None,
        }
    }

    pub fn with_related(mut self, related: RelatedEntry) -> Self {
        self.related.push(related);
        self
    }

    pub fn with_provenance(mut self, provenance: impl Into<String>) -> Self {
        self.provenance = Some(provenance.into());
        self
    }

    /// Identity used to decide whether a re-push is needed. Provenance is
    /// display-only and does not count.
    fn same_as(&self, other: &DiagnosticEntry) -> bool {
        self.kind == other.kind
            && self.message == other.message
            && self.range == other.range
            && self.related == other.related
    }
}

fn same_list(a: &[DiagnosticEntry], b: &[DiagnosticEntry]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
}

/// Convert an entry to its wire form.
///
/// # Arguments
/// * `entry` - The engine entry
/// * `show_provenance` - Append the entry file to the message (projects
///   with several entry points and no explicit entry file)
pub fn to_lsp_diagnostic(entry: &DiagnosticEntry, show_provenance: bool) -> Diagnostic {
    let prefix = format!("[Warn type:{}], ", entry.kind.code());
    let mut message = format!("{}{}", prefix, entry.message);
    if show_provenance {
        match entry.provenance.as_deref() {
            Some(COMMON_PROJECT) => message.push_str(&format!(". <{}>", COMMON_PROJECT)),
            Some(file) if !file.is_empty() => {
                message.push_str(&format!(". <process entry file: {}>", file))
            }
            _ => {}
        }
    }

    let related: Vec<DiagnosticRelatedInformation> = entry
        .related
        .iter()
        .filter_map(|rel| {
            Some(DiagnosticRelatedInformation {
                location: Location {
                    uri: paths::path_to_uri(&rel.path)?,
                    range: rel.range,
                },
                message: rel.message.clone(),
            })
        })
        .collect();

    Diagnostic {
        range: entry.range,
        severity: Some(entry.kind.severity()),
        message,
        related_information: if related.is_empty() {
            None
        } else {
            Some(related)
        },
        ..Default::default()
    }
}

// ============================================================================
// Reconciler
// ============================================================================

/// A notification the caller must deliver. Empty `entries` clears the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publish {
    pub path: String,
    pub entries: Vec<DiagnosticEntry>,
}

impl Publish {
    pub fn is_clear(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which set currently decides what a file shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDiagnosticState {
    Clean,
    Stable,
    Transient,
}

/// Keeps the stable and transient sets and what was last published.
///
/// Every operation returns the notifications needed to bring the client in
/// line; a file whose visible list did not change gets nothing.
#[derive(Debug, Default)]
pub struct DiagnosticsReconciler {
    stable: IndexMap<String, Vec<DiagnosticEntry>>,
    transient: IndexMap<String, Vec<DiagnosticEntry>>,
    /// Files whose latest single-file parse was syntax clean: stable
    /// `Syntax` entries are hidden for them
    syntax_hidden: HashSet<String>,
    published: IndexMap<String, Vec<DiagnosticEntry>>,
}

impl DiagnosticsReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// What the client should be showing for `path`.
    pub fn visible(&self, path: &str) -> Vec<DiagnosticEntry> {
        if let Some(entries) = self.transient.get(path) {
            return entries.clone();
        }
        let Some(entries) = self.stable.get(path) else {
            return Vec::new();
        };
        if self.syntax_hidden.contains(path) {
            entries
                .iter()
                .filter(|e| e.kind != DiagnosticKind::Syntax)
                .cloned()
                .collect()
        } else {
            entries.clone()
        }
    }

    pub fn state(&self, path: &str) -> FileDiagnosticState {
        if self.transient.contains_key(path) {
            FileDiagnosticState::Transient
        } else if self.stable.contains_key(path) {
            FileDiagnosticState::Stable
        } else {
            FileDiagnosticState::Clean
        }
    }

    /// Stable entries of the last full analysis
    pub fn stable(&self) -> &IndexMap<String, Vec<DiagnosticEntry>> {
        &self.stable
    }

    /// Publish `path` if its visible list differs from what was last sent.
    fn sync(&mut self, path: &str, out: &mut Vec<Publish>) {
        let visible = self.visible(path);
        let unchanged = match self.published.get(path) {
            Some(previous) => same_list(previous, &visible),
            None => visible.is_empty(),
        };
        if unchanged {
            return;
        }
        if visible.is_empty() {
            self.published.shift_remove(path);
        } else {
            self.published.insert(path.to_string(), visible.clone());
        }
        out.push(Publish {
            path: path.to_string(),
            entries: visible,
        });
    }

    /// Replace the stable set with the result of a full analysis.
    ///
    /// Files that disappeared get a clear, changed files get their new list
    /// and identical lists produce nothing. Files with transient entries keep
    /// showing those.
    pub fn replace_stable(&mut self, new_map: IndexMap<String, Vec<DiagnosticEntry>>) -> Vec<Publish> {
        let mut out = Vec::new();
        let old = std::mem::replace(&mut self.stable, new_map);

        for (path, old_entries) in &old {
            let changed = match self.stable.get(path) {
                Some(new_entries) => !same_list(old_entries, new_entries),
                None => true,
            };
            if changed {
                self.syntax_hidden.remove(path);
            }
        }

        let mut touched: Vec<String> = old.keys().cloned().collect();
        touched.extend(
            self.stable
                .keys()
                .filter(|p| !old.contains_key(*p))
                .cloned(),
        );
        for path in touched {
            self.sync(&path, &mut out);
        }
        out
    }

    /// Record errors of a fast single-file analysis.
    pub fn set_transient(&mut self, path: &str, entries: Vec<DiagnosticEntry>) -> Vec<Publish> {
        if entries.is_empty() {
            return self.clear_transient(path, false);
        }
        let mut out = Vec::new();
        self.transient.insert(path.to_string(), entries);
        self.sync(path, &mut out);
        out
    }

    /// Drop transient entries of `path` and fall back to its stable list.
    ///
    /// `syntax_clean` hides stable `Syntax` entries: a fresher parse has
    /// shown the file no longer has them. Nothing happens when the file had
    /// no transient entries and the syntax filter is unchanged.
    pub fn clear_transient(&mut self, path: &str, syntax_clean: bool) -> Vec<Publish> {
        let mut out = Vec::new();
        let had_transient = self.transient.shift_remove(path).is_some();
        let filter_changed = syntax_clean && self.syntax_hidden.insert(path.to_string());
        if had_transient || filter_changed {
            self.sync(path, &mut out);
        }
        out
    }

    /// The file was saved: transient entries and the syntax filter go away
    /// and the full stable list is shown again.
    pub fn save_file(&mut self, path: &str) -> Vec<Publish> {
        let mut out = Vec::new();
        self.transient.shift_remove(path);
        self.syntax_hidden.remove(path);
        self.sync(path, &mut out);
        out
    }

    /// Forget `path` entirely. Always emits a clear.
    pub fn remove_file(&mut self, path: &str) -> Vec<Publish> {
        self.stable.shift_remove(path);
        self.transient.shift_remove(path);
        self.syntax_hidden.remove(path);
        self.published.shift_remove(path);
        vec![Publish {
            path: path.to_string(),
            entries: Vec::new(),
        }]
    }

    /// Clear every published file and reset all state.
    pub fn clear_all(&mut self) -> Vec<Publish> {
        let out = self
            .published
            .keys()
            .map(|path| Publish {
                path: path.clone(),
                entries: Vec::new(),
            })
            .collect();
        self.stable.clear();
        self.transient.clear();
        self.syntax_hidden.clear();
        self.published.clear();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Position;

    fn range(line: u32) -> Range {
        Range::new(Position::new(line, 0), Position::new(line, 4))
    }

    fn warn(line: u32, msg: &str) -> DiagnosticEntry {
        DiagnosticEntry::new(DiagnosticKind::NoDefine, msg, range(line))
    }

    fn syntax(line: u32) -> DiagnosticEntry {
        DiagnosticEntry::new(DiagnosticKind::Syntax, "unexpected symbol", range(line))
    }

    fn map(items: &[(&str, Vec<DiagnosticEntry>)]) -> IndexMap<String, Vec<DiagnosticEntry>> {
        items
            .iter()
            .map(|(p, e)| (p.to_string(), e.clone()))
            .collect()
    }

    #[test]
    fn test_first_analysis_publishes_each_file() {
        let mut rec = DiagnosticsReconciler::new();
        let out = rec.replace_stable(map(&[
            ("a.lua", vec![warn(1, "x")]),
            ("b.lua", vec![warn(2, "y")]),
        ]));
        let paths: Vec<_> = out.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["a.lua", "b.lua"]);
        assert_eq!(rec.state("a.lua"), FileDiagnosticState::Stable);
    }

    #[test]
    fn test_identical_analysis_is_silent() {
        let mut rec = DiagnosticsReconciler::new();
        let diagnostics = map(&[("a.lua", vec![warn(1, "x"), warn(3, "z")])]);
        rec.replace_stable(diagnostics.clone());
        assert!(rec.replace_stable(diagnostics).is_empty());
    }

    #[test]
    fn test_fixed_file_gets_exactly_one_clear() {
        let mut rec = DiagnosticsReconciler::new();
        rec.replace_stable(map(&[("f.lua", vec![warn(1, "E1"), warn(2, "E2")])]));

        let out = rec.replace_stable(IndexMap::new());
        assert_eq!(
            out,
            vec![Publish {
                path: "f.lua".into(),
                entries: vec![]
            }]
        );
        assert_eq!(rec.state("f.lua"), FileDiagnosticState::Clean);
    }

    #[test]
    fn test_only_changed_files_are_republished() {
        let mut rec = DiagnosticsReconciler::new();
        rec.replace_stable(map(&[
            ("a.lua", vec![warn(1, "x")]),
            ("b.lua", vec![warn(2, "y")]),
        ]));
        let out = rec.replace_stable(map(&[
            ("a.lua", vec![warn(1, "x")]),
            ("b.lua", vec![warn(5, "y")]),
        ]));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].path, "b.lua");
        assert_eq!(out[0].entries, vec![warn(5, "y")]);
    }

    #[test]
    fn test_provenance_change_is_not_a_change() {
        let mut rec = DiagnosticsReconciler::new();
        rec.replace_stable(map(&[("a.lua", vec![warn(1, "x").with_provenance("main.lua")])]));
        let out = rec.replace_stable(map(&[(
            "a.lua",
            vec![warn(1, "x").with_provenance(COMMON_PROJECT)],
        )]));
        assert!(out.is_empty());
    }

    #[test]
    fn test_transient_wins_over_stable() {
        let mut rec = DiagnosticsReconciler::new();
        rec.replace_stable(map(&[("a.lua", vec![warn(1, "old")])]));

        let out = rec.set_transient("a.lua", vec![syntax(4)]);
        assert_eq!(out[0].entries, vec![syntax(4)]);
        assert_eq!(rec.visible("a.lua"), vec![syntax(4)]);
        assert_eq!(rec.state("a.lua"), FileDiagnosticState::Transient);

        // A new full analysis does not override unsaved-edit errors
        let out = rec.replace_stable(map(&[("a.lua", vec![warn(9, "new")])]));
        assert!(out.is_empty());
        assert_eq!(rec.visible("a.lua"), vec![syntax(4)]);
    }

    #[test]
    fn test_clear_transient_restores_stable() {
        let mut rec = DiagnosticsReconciler::new();
        rec.replace_stable(map(&[("a.lua", vec![warn(1, "x")])]));
        rec.set_transient("a.lua", vec![syntax(2)]);

        let out = rec.clear_transient("a.lua", false);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].entries, vec![warn(1, "x")]);
    }

    #[test]
    fn test_clear_transient_without_stable_clears() {
        let mut rec = DiagnosticsReconciler::new();
        rec.set_transient("a.lua", vec![syntax(2)]);

        let out = rec.clear_transient("a.lua", true);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_clear());
        assert_eq!(rec.state("a.lua"), FileDiagnosticState::Clean);
    }

    #[test]
    fn test_clear_transient_is_quiet_when_nothing_changes() {
        let mut rec = DiagnosticsReconciler::new();
        rec.replace_stable(map(&[("a.lua", vec![warn(1, "x")])]));
        assert!(rec.clear_transient("a.lua", false).is_empty());
        assert!(rec.clear_transient("never-seen.lua", false).is_empty());
    }

    #[test]
    fn test_syntax_clean_hides_stable_syntax_errors() {
        let mut rec = DiagnosticsReconciler::new();
        rec.replace_stable(map(&[("a.lua", vec![syntax(1), warn(2, "x")])]));

        let out = rec.clear_transient("a.lua", true);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].entries, vec![warn(2, "x")]);

        // Repeating the confirmation sends nothing
        assert!(rec.clear_transient("a.lua", true).is_empty());
    }

    #[test]
    fn test_save_restores_full_stable_list() {
        let mut rec = DiagnosticsReconciler::new();
        rec.replace_stable(map(&[("a.lua", vec![syntax(1), warn(2, "x")])]));
        rec.clear_transient("a.lua", true);

        let out = rec.save_file("a.lua");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].entries, vec![syntax(1), warn(2, "x")]);
    }

    #[test]
    fn test_save_of_clean_file_is_quiet() {
        let mut rec = DiagnosticsReconciler::new();
        assert!(rec.save_file("a.lua").is_empty());
    }

    #[test]
    fn test_save_drops_transient_errors() {
        let mut rec = DiagnosticsReconciler::new();
        rec.set_transient("a.lua", vec![syntax(1)]);
        let out = rec.save_file("a.lua");
        assert_eq!(out.len(), 1);
        assert!(out[0].is_clear());
    }

    #[test]
    fn test_empty_transient_behaves_like_clear() {
        let mut rec = DiagnosticsReconciler::new();
        rec.replace_stable(map(&[("a.lua", vec![warn(1, "x")])]));
        rec.set_transient("a.lua", vec![syntax(3)]);

        let out = rec.set_transient("a.lua", Vec::new());
        assert_eq!(out[0].entries, vec![warn(1, "x")]);
        assert_eq!(rec.state("a.lua"), FileDiagnosticState::Stable);
    }

    #[test]
    fn test_remove_file_always_clears() {
        let mut rec = DiagnosticsReconciler::new();
        let out = rec.remove_file("ghost.lua");
        assert_eq!(out.len(), 1);
        assert!(out[0].is_clear());

        rec.replace_stable(map(&[("a.lua", vec![warn(1, "x")])]));
        rec.remove_file("a.lua");
        assert_eq!(rec.state("a.lua"), FileDiagnosticState::Clean);
        assert!(rec.stable().is_empty());
    }

    #[test]
    fn test_clear_all_clears_published_files() {
        let mut rec = DiagnosticsReconciler::new();
        rec.replace_stable(map(&[
            ("a.lua", vec![warn(1, "x")]),
            ("b.lua", vec![warn(1, "y")]),
        ]));
        rec.set_transient("c.lua", vec![syntax(1)]);

        let out = rec.clear_all();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(Publish::is_clear));
        assert!(rec.clear_all().is_empty());
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(DiagnosticKind::Syntax.severity(), DiagnosticSeverity::ERROR);
        assert_eq!(
            DiagnosticKind::Annotation.severity(),
            DiagnosticSeverity::INFORMATION
        );
        assert_eq!(DiagnosticKind::FloatEq.severity(), DiagnosticSeverity::WARNING);
    }

    #[test]
    fn test_kind_codes() {
        for (i, kind) in DiagnosticKind::ALL.iter().enumerate() {
            assert_eq!(kind.code() as usize, i + 1);
            assert_eq!(DiagnosticKind::from_code(kind.code()), Some(*kind));
        }
        assert_eq!(DiagnosticKind::from_code(0), None);
        assert_eq!(DiagnosticKind::from_code(29), None);
        assert_eq!(DiagnosticKind::Annotation.code(), 18);
    }

    #[test]
    fn test_message_tag_and_provenance() {
        let entry = warn(1, "undefined variable foo").with_provenance("main.lua");
        let diag = to_lsp_diagnostic(&entry, false);
        assert_eq!(diag.message, "[Warn type:2], undefined variable foo");
        assert_eq!(diag.severity, Some(DiagnosticSeverity::WARNING));
        assert!(diag.related_information.is_none());

        let diag = to_lsp_diagnostic(&entry, true);
        assert_eq!(
            diag.message,
            "[Warn type:2], undefined variable foo. <process entry file: main.lua>"
        );

        let shared = warn(1, "x").with_provenance(COMMON_PROJECT);
        assert_eq!(
            to_lsp_diagnostic(&shared, true).message,
            "[Warn type:2], x. <common project>"
        );
    }

    #[test]
    fn test_related_information_conversion() {
        let entry = warn(1, "duplicate key").with_related(RelatedEntry {
            path: "/w/other.lua".into(),
            range: range(7),
            message: "first defined here".into(),
        });
        let diag = to_lsp_diagnostic(&entry, false);
        let related = diag.related_information.unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].message, "first defined here");
        assert_eq!(related[0].location.range, range(7));
        assert!(related[0].location.uri.as_str().ends_with("/w/other.lua"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use tower_lsp::lsp_types::Position;

    fn entry_strategy() -> impl Strategy<Value = DiagnosticEntry> {
        (0u8..3, 0u32..20, "[a-z]{1,8}").prop_map(|(kind, line, msg)| {
            let kind = match kind {
                0 => DiagnosticKind::Syntax,
                1 => DiagnosticKind::Annotation,
                _ => DiagnosticKind::LocalNoUse,
            };
            DiagnosticEntry::new(
                kind,
                msg,
                Range::new(Position::new(line, 0), Position::new(line, 3)),
            )
        })
    }

    fn map_strategy() -> impl Strategy<Value = IndexMap<String, Vec<DiagnosticEntry>>> {
        prop::collection::vec(
            (0usize..5, prop::collection::vec(entry_strategy(), 1..4)),
            0..5,
        )
        .prop_map(|items| {
            items
                .into_iter()
                .map(|(i, entries)| (format!("f{}.lua", i), entries))
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_replace_stable_is_idempotent(first in map_strategy(), second in map_strategy()) {
            let mut rec = DiagnosticsReconciler::new();
            rec.replace_stable(first);
            rec.replace_stable(second.clone());
            prop_assert!(rec.replace_stable(second).is_empty());
        }

        #[test]
        fn prop_transient_is_visible(
            stable in map_strategy(),
            next in map_strategy(),
            transient in prop::collection::vec(entry_strategy(), 1..4),
            syntax_clean in any::<bool>(),
        ) {
            let mut rec = DiagnosticsReconciler::new();
            rec.replace_stable(stable);
            rec.clear_transient("f0.lua", syntax_clean);
            rec.set_transient("f0.lua", transient.clone());
            rec.replace_stable(next);
            prop_assert_eq!(rec.visible("f0.lua"), transient);
        }

        #[test]
        fn prop_published_matches_visible(
            maps in prop::collection::vec(map_strategy(), 1..4),
        ) {
            // Replaying every publish yields exactly the visible lists
            let mut rec = DiagnosticsReconciler::new();
            let mut client: IndexMap<String, Vec<DiagnosticEntry>> = IndexMap::new();
            for m in maps {
                for publish in rec.replace_stable(m) {
                    client.insert(publish.path, publish.entries);
                }
            }
            for i in 0..5 {
                let path = format!("f{}.lua", i);
                let shown = client.get(&path).cloned().unwrap_or_default();
                prop_assert_eq!(shown, rec.visible(&path));
            }
        }
    }
}
