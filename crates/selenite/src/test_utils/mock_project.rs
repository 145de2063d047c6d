//! Scriptable [`Project`] for session tests.
//!
//! Answers are set up front; every query records what the session asked so
//! tests can check the resolved cursor contexts and reference modes.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use indexmap::IndexMap;

use crate::config::SessionConfig;
use crate::cursor_context::{ChainContext, CursorContext, ModuleCandidates};
use crate::diagnostics::DiagnosticEntry;
use crate::project::{
    CandidateItem, ColorGroup, FileAnalysis, FileEvent, FileEventKind, HoverText, Project, ReferenceMode,
    SignatureInfo, SourceLocation, SymbolEntry,
};

#[derive(Debug, Default)]
struct Answers {
    definitions: Vec<SourceLocation>,
    references: Vec<SourceLocation>,
    hover: Option<HoverText>,
    candidates: Vec<CandidateItem>,
    resolved: Option<CandidateItem>,
    signatures: Vec<SignatureInfo>,
    symbols: Vec<SymbolEntry>,
    colors: Vec<ColorGroup>,
    /// Candidate file name to resolved path
    modules: HashMap<String, String>,
    project_diagnostics: IndexMap<String, Vec<DiagnosticEntry>>,
    file_analysis: HashMap<String, FileAnalysis>,
}

#[derive(Debug, Default)]
struct Recorded {
    contexts: Vec<CursorContext>,
    callees: Vec<ChainContext>,
    modes: Vec<ReferenceMode>,
    events: Vec<FileEvent>,
    reanalyze_count: usize,
    config: Option<SessionConfig>,
}

#[derive(Debug, Default)]
pub struct MockProject {
    files: Mutex<BTreeSet<String>>,
    answers: Mutex<Answers>,
    recorded: Mutex<Recorded>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProject {
    pub fn set_definitions(&self, locations: Vec<SourceLocation>) {
        lock(&self.answers).definitions = locations;
    }

    pub fn set_references(&self, locations: Vec<SourceLocation>) {
        lock(&self.answers).references = locations;
    }

    pub fn set_hover(&self, hover: HoverText) {
        lock(&self.answers).hover = Some(hover);
    }

    pub fn set_candidates(&self, candidates: Vec<CandidateItem>) {
        lock(&self.answers).candidates = candidates;
    }

    pub fn set_resolved(&self, item: CandidateItem) {
        lock(&self.answers).resolved = Some(item);
    }

    pub fn set_signatures(&self, signatures: Vec<SignatureInfo>) {
        lock(&self.answers).signatures = signatures;
    }

    pub fn set_symbols(&self, symbols: Vec<SymbolEntry>) {
        lock(&self.answers).symbols = symbols;
    }

    pub fn set_colors(&self, colors: Vec<ColorGroup>) {
        lock(&self.answers).colors = colors;
    }

    /// Make `candidate` (e.g. `net/http.lua`) resolve to `path`.
    pub fn add_module(&self, candidate: &str, path: &str) {
        lock(&self.answers)
            .modules
            .insert(candidate.to_string(), path.to_string());
    }

    /// Result of the next full analyses.
    pub fn set_project_diagnostics(&self, diagnostics: Vec<(&str, Vec<DiagnosticEntry>)>) {
        lock(&self.answers).project_diagnostics = diagnostics
            .into_iter()
            .map(|(path, entries)| (path.to_string(), entries))
            .collect();
    }

    /// Result of single-file analyses of `path`; files not set are clean.
    pub fn set_file_analysis(&self, path: &str, analysis: FileAnalysis) {
        lock(&self.answers)
            .file_analysis
            .insert(path.to_string(), analysis);
    }

    pub fn recorded_contexts(&self) -> Vec<CursorContext> {
        lock(&self.recorded).contexts.clone()
    }

    pub fn recorded_callees(&self) -> Vec<ChainContext> {
        lock(&self.recorded).callees.clone()
    }

    pub fn recorded_modes(&self) -> Vec<ReferenceMode> {
        lock(&self.recorded).modes.clone()
    }

    pub fn recorded_events(&self) -> Vec<FileEvent> {
        lock(&self.recorded).events.clone()
    }

    pub fn reanalyze_count(&self) -> usize {
        lock(&self.recorded).reanalyze_count
    }

    /// Configuration passed to the latest `reconfigure`.
    pub fn last_config(&self) -> Option<SessionConfig> {
        lock(&self.recorded).config.clone()
    }
}

impl Project for MockProject {
    fn is_tracked(&self, path: &str) -> bool {
        path.ends_with(".lua")
    }

    fn knows_file(&self, path: &str) -> bool {
        lock(&self.files).contains(path)
    }

    fn known_files(&self) -> Vec<String> {
        lock(&self.files).iter().cloned().collect()
    }

    fn handle_file_events(&self, events: &[FileEvent]) -> bool {
        lock(&self.recorded).events.extend_from_slice(events);
        let mut files = lock(&self.files);
        let mut changed = false;
        for event in events {
            changed |= match event.kind {
                FileEventKind::Created => files.insert(event.path.clone()),
                FileEventKind::Changed => files.contains(&event.path),
                FileEventKind::Deleted => files.remove(&event.path),
            };
        }
        changed
    }

    fn find_definitions(&self, _path: &str, context: &CursorContext) -> Vec<SourceLocation> {
        lock(&self.recorded).contexts.push(context.clone());
        lock(&self.answers).definitions.clone()
    }

    fn find_module(&self, _from: &str, candidates: &ModuleCandidates) -> Option<String> {
        let answers = lock(&self.answers);
        answers.modules.get(&candidates.primary).cloned().or_else(|| {
            candidates
                .secondary
                .as_ref()
                .and_then(|secondary| answers.modules.get(secondary).cloned())
        })
    }

    fn find_references(
        &self,
        _path: &str,
        chain: &ChainContext,
        mode: ReferenceMode,
    ) -> Vec<SourceLocation> {
        {
            let mut recorded = lock(&self.recorded);
            recorded.contexts.push(CursorContext::Chain(chain.clone()));
            recorded.modes.push(mode);
        }
        lock(&self.answers).references.clone()
    }

    fn hover_text(&self, _path: &str, context: &CursorContext) -> Option<HoverText> {
        lock(&self.recorded).contexts.push(context.clone());
        lock(&self.answers).hover.clone()
    }

    fn complete(&self, _path: &str, context: &CursorContext) -> Vec<CandidateItem> {
        lock(&self.recorded).contexts.push(context.clone());
        lock(&self.answers).candidates.clone()
    }

    fn resolve_completion(&self, index: usize) -> Option<CandidateItem> {
        let answers = lock(&self.answers);
        answers
            .resolved
            .clone()
            .or_else(|| answers.candidates.get(index).cloned())
    }

    fn signature_help(&self, _path: &str, callee: &ChainContext) -> Vec<SignatureInfo> {
        lock(&self.recorded).callees.push(callee.clone());
        lock(&self.answers).signatures.clone()
    }

    fn document_symbols(&self, path: &str) -> Vec<SymbolEntry> {
        lock(&self.answers)
            .symbols
            .iter()
            .filter(|symbol| symbol.location.path == path)
            .cloned()
            .collect()
    }

    fn workspace_symbols(&self, query: &str) -> Vec<SymbolEntry> {
        lock(&self.answers)
            .symbols
            .iter()
            .filter(|symbol| symbol.name.contains(query))
            .cloned()
            .collect()
    }

    fn var_colors(&self, _path: &str) -> Vec<ColorGroup> {
        lock(&self.answers).colors.clone()
    }

    fn reanalyze_project(&self) -> IndexMap<String, Vec<DiagnosticEntry>> {
        lock(&self.recorded).reanalyze_count += 1;
        lock(&self.answers).project_diagnostics.clone()
    }

    fn reanalyze_file(&self, path: &str, _content: &[u8]) -> FileAnalysis {
        lock(&self.answers)
            .file_analysis
            .get(path)
            .cloned()
            .unwrap_or(FileAnalysis::Clean)
    }

    fn reconfigure(&self, config: &SessionConfig) {
        lock(&self.recorded).config = Some(config.clone());
    }

    fn file_count(&self) -> usize {
        lock(&self.files).len()
    }

    fn show_provenance(&self) -> bool {
        false
    }
}
