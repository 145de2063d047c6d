//
// handlers.rs
//
// Conversion of project answers into LSP response types
//

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::*;

use crate::cursor_context::AnnotationKeyword;
use crate::paths;
use crate::project::{
    CandidateItem, CandidateKind, ColorGroup, HoverText, SignatureInfo, SourceLocation, SymbolCategory,
    SymbolEntry,
};

pub fn location(loc: &SourceLocation) -> Option<Location> {
    Some(Location {
        uri: paths::path_to_uri(&loc.path)?,
        range: loc.range,
    })
}

/// Convert locations, keeping at most `limit` of them.
pub fn locations(locs: &[SourceLocation], limit: usize) -> Vec<Location> {
    locs.iter().filter_map(location).take(limit).collect()
}

// ============================================================================
// Hover
// ============================================================================

fn hover_at(contents: MarkupContent, position: Position) -> Hover {
    Hover {
        contents: HoverContents::Markup(contents),
        range: Some(Range {
            start: position,
            end: position,
        }),
    }
}

/// Hover naming the file an include literal resolves to.
pub fn module_hover(path: &str, position: Position) -> Hover {
    hover_at(
        MarkupContent {
            kind: MarkupKind::PlainText,
            value: format!("lua file : {}", path),
        },
        position,
    )
}

/// Hover over an annotation keyword: its syntax summary and sample.
pub fn annotation_hover(keyword: AnnotationKeyword, position: Position) -> Hover {
    hover_at(
        MarkupContent {
            kind: MarkupKind::PlainText,
            value: keyword.template().to_string(),
        },
        position,
    )
}

/// Format a project hover answer.
///
/// With a label, the label is shown as a Lua code block followed by a rule,
/// the documentation and the defining file. Without one, only plain text.
pub fn symbol_hover(text: &HoverText, position: Position) -> Option<Hover> {
    let file = text.provenance.as_deref().unwrap_or("");
    if text.label.is_empty() && text.doc.is_empty() && file.is_empty() {
        return None;
    }

    let contents = if text.label.is_empty() {
        let mut value = text.doc.clone();
        if !file.is_empty() {
            value.push('\n');
            value.push_str(file);
        }
        MarkupContent {
            kind: MarkupKind::PlainText,
            value,
        }
    } else {
        let mut value = format!("```lua\n{}\n```", text.label);
        if !text.doc.is_empty() || !file.is_empty() {
            value.push_str("\n---\n");
        }
        value.push_str(&text.doc);
        if !file.is_empty() {
            value.push_str("\n\r");
            value.push_str(file);
        }
        MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }
    };
    Some(hover_at(contents, position))
}

// ============================================================================
// Completion
// ============================================================================

fn completion_kind(kind: CandidateKind) -> CompletionItemKind {
    match kind {
        CandidateKind::Variable => CompletionItemKind::VARIABLE,
        CandidateKind::Function => CompletionItemKind::FUNCTION,
        CandidateKind::Field => CompletionItemKind::FIELD,
        CandidateKind::Module => CompletionItemKind::MODULE,
        CandidateKind::Keyword => CompletionItemKind::KEYWORD,
        CandidateKind::Class => CompletionItemKind::CLASS,
    }
}

fn documentation(text: &str) -> Documentation {
    Documentation::MarkupContent(MarkupContent {
        kind: MarkupKind::PlainText,
        value: text.to_string(),
    })
}

/// Completion list for project candidates. Each item carries its index as
/// `data` so completion resolve can ask the project for details.
pub fn completion_items(items: &[CandidateItem]) -> Vec<CompletionItem> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| CompletionItem {
            label: item.label.clone(),
            kind: Some(completion_kind(item.kind)),
            detail: item.detail.clone(),
            documentation: item.documentation.as_deref().map(documentation),
            data: Some(serde_json::json!(index)),
            ..Default::default()
        })
        .collect()
}

/// The annotation keyword list offered right after `---@`.
pub fn annotation_keyword_items() -> Vec<CompletionItem> {
    AnnotationKeyword::ALL
        .iter()
        .map(|keyword| CompletionItem {
            label: keyword.as_str().to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            detail: Some(keyword.detail().to_string()),
            documentation: Some(documentation(keyword.template())),
            ..Default::default()
        })
        .collect()
}

/// Index stored in a completion item's `data`.
pub fn completion_index(item: &CompletionItem) -> Option<usize> {
    item.data.as_ref()?.as_u64().map(|i| i as usize)
}

/// Fill in a completion item from the resolved candidate.
pub fn resolve_completion_item(mut item: CompletionItem, resolved: &CandidateItem) -> CompletionItem {
    if resolved.detail.is_some() {
        item.detail = resolved.detail.clone();
    }
    if let Some(doc) = resolved.documentation.as_deref() {
        item.documentation = Some(documentation(doc));
    }
    item
}

// ============================================================================
// Rename, highlight, signature help, symbols
// ============================================================================

pub fn rename_edit(locs: &[SourceLocation], new_name: &str) -> WorkspaceEdit {
    let mut changes: HashMap<Url, Vec<TextEdit>> = HashMap::new();
    for loc in locs {
        let Some(uri) = paths::path_to_uri(&loc.path) else {
            continue;
        };
        changes.entry(uri).or_default().push(TextEdit {
            range: loc.range,
            new_text: new_name.to_string(),
        });
    }
    WorkspaceEdit {
        changes: Some(changes),
        ..Default::default()
    }
}

pub fn highlights(locs: &[SourceLocation]) -> Vec<DocumentHighlight> {
    locs.iter()
        .map(|loc| DocumentHighlight {
            range: loc.range,
            kind: Some(DocumentHighlightKind::WRITE),
        })
        .collect()
}

pub fn signature_help(signatures: &[SignatureInfo], active_parameter: usize) -> Option<SignatureHelp> {
    if signatures.is_empty() {
        return None;
    }
    let signatures = signatures
        .iter()
        .map(|sig| SignatureInformation {
            label: sig.label.clone(),
            documentation: sig.documentation.as_deref().map(documentation),
            parameters: Some(
                sig.parameters
                    .iter()
                    .map(|p| ParameterInformation {
                        label: ParameterLabel::Simple(p.clone()),
                        documentation: None,
                    })
                    .collect(),
            ),
            active_parameter: None,
        })
        .collect();
    Some(SignatureHelp {
        signatures,
        active_signature: Some(0),
        active_parameter: Some(active_parameter as u32),
    })
}

fn symbol_kind(category: SymbolCategory) -> SymbolKind {
    match category {
        SymbolCategory::Function => SymbolKind::FUNCTION,
        SymbolCategory::Variable => SymbolKind::VARIABLE,
        SymbolCategory::Field => SymbolKind::FIELD,
        SymbolCategory::Class => SymbolKind::CLASS,
        SymbolCategory::Module => SymbolKind::MODULE,
    }
}

#[allow(deprecated)]
pub fn symbol_information(symbols: &[SymbolEntry]) -> Vec<SymbolInformation> {
    symbols
        .iter()
        .filter_map(|sym| {
            Some(SymbolInformation {
                name: sym.name.clone(),
                kind: symbol_kind(sym.category),
                tags: None,
                deprecated: None,
                location: location(&sym.location)?,
                container_name: sym.container.clone(),
            })
        })
        .collect()
}

// ============================================================================
// Variable coloring
// ============================================================================

/// Parameters of the `luahelper/getVarColor` request
#[derive(Debug, Deserialize)]
pub struct VarColorParams {
    pub uri: Url,
}

/// One coloring category and its ranges, as the editor extension expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VarColorAnnotator {
    pub uri: Url,
    pub ranges: Vec<Range>,
    pub annotator_type: i32,
}

pub fn var_color_annotators(uri: &Url, groups: &[ColorGroup]) -> Vec<VarColorAnnotator> {
    groups
        .iter()
        .map(|group| VarColorAnnotator {
            uri: uri.clone(),
            ranges: group.ranges.clone(),
            annotator_type: group.category.code(),
        })
        .collect()
}

/// `textDocument/documentColor` answer: every colored range in neutral grey.
pub fn color_information(groups: &[ColorGroup]) -> Vec<ColorInformation> {
    let grey = Color {
        red: 0.5,
        green: 0.5,
        blue: 0.5,
        alpha: 1.0,
    };
    groups
        .iter()
        .flat_map(|group| group.ranges.iter())
        .map(|&range| ColorInformation { range, color: grey })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(path: &str, line: u32) -> SourceLocation {
        SourceLocation {
            path: path.to_string(),
            range: Range::new(Position::new(line, 0), Position::new(line, 3)),
        }
    }

    fn hover_value(hover: &Hover) -> (&MarkupKind, &str) {
        match &hover.contents {
            HoverContents::Markup(m) => (&m.kind, m.value.as_str()),
            other => panic!("unexpected hover contents: {:?}", other),
        }
    }

    #[test]
    fn test_module_hover() {
        let hover = module_hover("/w/net/http.lua", Position::new(1, 4));
        let (kind, value) = hover_value(&hover);
        assert_eq!(*kind, MarkupKind::PlainText);
        assert_eq!(value, "lua file : /w/net/http.lua");
        assert_eq!(hover.range, Some(Range::new(Position::new(1, 4), Position::new(1, 4))));
    }

    #[test]
    fn test_symbol_hover_with_label() {
        let text = HoverText {
            label: "local x = 1".into(),
            doc: "the answer".into(),
            provenance: Some("/w/a.lua".into()),
        };
        let hover = symbol_hover(&text, Position::new(0, 0)).unwrap();
        let (kind, value) = hover_value(&hover);
        assert_eq!(*kind, MarkupKind::Markdown);
        assert_eq!(value, "```lua\nlocal x = 1\n```\n---\nthe answer\n\r/w/a.lua");
    }

    #[test]
    fn test_symbol_hover_label_only_has_no_rule() {
        let text = HoverText {
            label: "function f()".into(),
            doc: String::new(),
            provenance: None,
        };
        let hover = symbol_hover(&text, Position::new(0, 0)).unwrap();
        assert_eq!(hover_value(&hover).1, "```lua\nfunction f()\n```");
    }

    #[test]
    fn test_symbol_hover_without_label_is_plain() {
        let text = HoverText {
            label: String::new(),
            doc: "doc".into(),
            provenance: Some("/w/b.lua".into()),
        };
        let hover = symbol_hover(&text, Position::new(0, 0)).unwrap();
        let (kind, value) = hover_value(&hover);
        assert_eq!(*kind, MarkupKind::PlainText);
        assert_eq!(value, "doc\n/w/b.lua");

        let empty = HoverText {
            label: String::new(),
            doc: String::new(),
            provenance: None,
        };
        assert!(symbol_hover(&empty, Position::new(0, 0)).is_none());
    }

    #[test]
    fn test_annotation_keyword_items() {
        let items = annotation_keyword_items();
        assert_eq!(items.len(), 8);
        assert_eq!(items[0].label, "class");
        assert_eq!(items[0].detail.as_deref(), Some("class struct"));
        assert_eq!(items[1].detail.as_deref(), Some("class field"));
        assert_eq!(items[2].detail.as_deref(), Some("type"));
    }

    #[test]
    fn test_completion_items_carry_index() {
        let items = completion_items(&[
            CandidateItem {
                label: "print".into(),
                kind: CandidateKind::Function,
                detail: None,
                documentation: None,
            },
            CandidateItem {
                label: "pairs".into(),
                kind: CandidateKind::Function,
                detail: Some("function pairs(t)".into()),
                documentation: None,
            },
        ]);
        assert_eq!(completion_index(&items[0]), Some(0));
        assert_eq!(completion_index(&items[1]), Some(1));
        assert_eq!(items[1].kind, Some(CompletionItemKind::FUNCTION));
    }

    #[test]
    fn test_resolve_completion_item_fills_details() {
        let item = CompletionItem::new_simple("x".into(), String::new());
        let resolved = CandidateItem {
            label: "x".into(),
            kind: CandidateKind::Variable,
            detail: Some("local x".into()),
            documentation: Some("counter".into()),
        };
        let item = resolve_completion_item(item, &resolved);
        assert_eq!(item.detail.as_deref(), Some("local x"));
        assert!(item.documentation.is_some());
    }

    #[test]
    fn test_rename_groups_by_file() {
        let edit = rename_edit(&[loc("/w/a.lua", 0), loc("/w/a.lua", 2), loc("/w/b.lua", 1)], "y");
        let changes = edit.changes.unwrap();
        assert_eq!(changes.len(), 2);
        let a = Url::parse("file:///w/a.lua").unwrap();
        assert_eq!(changes[&a].len(), 2);
        assert!(changes[&a].iter().all(|e| e.new_text == "y"));
    }

    #[test]
    fn test_highlights_are_write() {
        let hl = highlights(&[loc("/w/a.lua", 0)]);
        assert_eq!(hl[0].kind, Some(DocumentHighlightKind::WRITE));
    }

    #[test]
    fn test_locations_are_capped() {
        let locs: Vec<_> = (0..10).map(|i| loc("/w/a.lua", i)).collect();
        assert_eq!(locations(&locs, 3).len(), 3);
        assert_eq!(locations(&locs, 100).len(), 10);
    }

    #[test]
    fn test_signature_help() {
        assert!(signature_help(&[], 0).is_none());
        let help = signature_help(
            &[SignatureInfo {
                label: "f(a, b)".into(),
                parameters: vec!["a".into(), "b".into()],
                documentation: None,
            }],
            1,
        )
        .unwrap();
        assert_eq!(help.active_parameter, Some(1));
        assert_eq!(help.signatures[0].parameters.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_symbol_information() {
        let symbols = symbol_information(&[
            SymbolEntry {
                name: "M.connect".into(),
                category: SymbolCategory::Function,
                container: Some("M".into()),
                location: loc("/w/net.lua", 4),
            },
            SymbolEntry {
                name: "timeout".into(),
                category: SymbolCategory::Variable,
                container: None,
                location: loc("relative/path.lua", 1),
            },
        ]);
        // relative paths have no URI
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].kind, SymbolKind::FUNCTION);
        assert_eq!(symbols[0].container_name.as_deref(), Some("M"));
        assert_eq!(symbols[0].location.range.start.line, 4);
    }

    #[test]
    fn test_var_color_annotators() {
        use crate::project::ColorCategory;

        let uri = Url::parse("file:///w/a.lua").unwrap();
        let line = |l: u32| Range::new(Position::new(l, 0), Position::new(l, 4));
        let groups = vec![
            ColorGroup {
                category: ColorCategory::GlobalVar,
                ranges: vec![line(0), line(2)],
            },
            ColorGroup {
                category: ColorCategory::Annotation,
                ranges: vec![line(5)],
            },
        ];

        let annotators = var_color_annotators(&uri, &groups);
        assert_eq!(annotators.len(), 2);
        assert_eq!(annotators[1].annotator_type, 2);
        let json = serde_json::to_value(&annotators[0]).unwrap();
        assert_eq!(json["uri"], "file:///w/a.lua");
        assert_eq!(json["annotatorType"], 0);
        assert_eq!(json["ranges"].as_array().unwrap().len(), 2);

        let colors = color_information(&groups);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[2].range, line(5));
        assert_eq!(colors[0].color.red, 0.5);
    }
}
