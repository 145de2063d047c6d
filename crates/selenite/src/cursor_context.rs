//
// cursor_context.rs
//
// Extracts the lexical context around a caret: the expression chain being
// queried, or the annotation being written, plus module-include detection.
//
// Every function here is a pure function of (buffer, offset).
//

use std::sync::OnceLock;

use regex::bytes::Regex;

use crate::error::{SessionError, SessionResult};
use crate::line_scanner::{self, line_end, line_start};

// ============================================================================
// Types
// ============================================================================

/// Context resolved at a caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorContext {
    Chain(ChainContext),
    Annotation(AnnotationContext),
}

/// One name in an expression chain such as `a.b:c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSegment {
    pub name: String,
    /// The segment is immediately followed by a call `(...)`
    pub is_call: bool,
    /// The segment came from a non-literal index such as `t[i]`; `name` holds
    /// the raw index text
    pub computed: bool,
}

impl ChainSegment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_call: false,
            computed: false,
        }
    }
}

/// Kind of the boundary before the final segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Separator {
    #[default]
    None,
    Dot,
    Colon,
}

/// First-character filter used to rank completion candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstCharFilter {
    pub primary: char,
    /// `primary` with its case flipped
    pub twin: char,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChainContext {
    pub segments: Vec<ChainSegment>,
    pub separator: Separator,
    /// The caret sits right after a separator: list members of the chain
    pub trailing_empty: bool,
    /// The caret was inside a `t["key"]` literal
    pub bracket_literal: bool,
    pub filter: Option<FirstCharFilter>,
    /// Set when the chain is the callee of the call enclosing the caret;
    /// holds the active argument index
    pub call_argument: Option<usize>,
}

impl ChainContext {
    pub fn names(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn is_colon(&self) -> bool {
        self.separator == Separator::Colon
    }

    /// Source-like rendering, e.g. `a.b:c`
    pub fn display(&self) -> String {
        let mut out = String::new();
        let last = self.segments.len().saturating_sub(1);
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                if i == last && self.is_colon() && !self.trailing_empty {
                    out.push(':');
                } else {
                    out.push('.');
                }
            }
            out.push_str(&segment.name);
        }
        if self.trailing_empty {
            out.push(if self.is_colon() { ':' } else { '.' });
        }
        out
    }
}

/// Annotation keywords understood after `---@`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKeyword {
    Class,
    Field,
    Type,
    Param,
    Return,
    Alias,
    Generic,
    Overload,
}

impl AnnotationKeyword {
    pub const ALL: [AnnotationKeyword; 8] = [
        AnnotationKeyword::Class,
        AnnotationKeyword::Field,
        AnnotationKeyword::Type,
        AnnotationKeyword::Param,
        AnnotationKeyword::Return,
        AnnotationKeyword::Alias,
        AnnotationKeyword::Generic,
        AnnotationKeyword::Overload,
    ];

    pub fn parse(word: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == word)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationKeyword::Class => "class",
            AnnotationKeyword::Field => "field",
            AnnotationKeyword::Type => "type",
            AnnotationKeyword::Param => "param",
            AnnotationKeyword::Return => "return",
            AnnotationKeyword::Alias => "alias",
            AnnotationKeyword::Generic => "generic",
            AnnotationKeyword::Overload => "overload",
        }
    }

    /// Short description shown next to the keyword in completion lists.
    pub fn detail(self) -> &'static str {
        match self {
            AnnotationKeyword::Class => "class struct",
            AnnotationKeyword::Field => "class field",
            other => other.as_str(),
        }
    }

    /// Syntax summary and sample shown on hover and completion resolve.
    pub fn template(self) -> &'static str {
        match self {
            AnnotationKeyword::Class => {
                "---@class TYPE[: PARENT_TYPE {, PARENT_TYPE}]  [@comment]\n\nsample:\n---@class People @People class"
            }
            AnnotationKeyword::Field => {
                "---@field [public|protected|private] field_name FIELD_TYPE{|OTHER_TYPE} [@comment]\n\nsample:\n---@field age number @age attr is number"
            }
            AnnotationKeyword::Type => {
                "---@type TYPE{|OTHER_TYPE} [@comment]\n\nsample:\n---@type string @type is string"
            }
            AnnotationKeyword::Param => {
                "---@param param_name TYPE{|OTHER_TYPE} [@comment]\n\nsample:\n---@param param1 string @param1 is string"
            }
            AnnotationKeyword::Return => {
                "---@return TYPE{|OTHER_TYPE} [@comment]\n\nsample:\n---@return string @return is string"
            }
            AnnotationKeyword::Alias => {
                "---@alias new_type TYPE{|OTHER_TYPE}\n\nsample:\n---@alias Man People @Man is People"
            }
            AnnotationKeyword::Generic => {
                "---@generic T [: PARENT_TYPE]\n\nsample:\n---@generic T1 @T1 is generic"
            }
            AnnotationKeyword::Overload => {
                "---@overload fun(param_name : PARAM_TYPE) : RETURN_TYPE\n\nsample:\n---@overload fun(param1 : string) : number"
            }
        }
    }
}

/// Context of a caret inside a `---@` annotation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationContext {
    /// Keyword following the last `---@` marker before the caret
    pub keyword: Option<AnnotationKeyword>,
    /// Word under the caret (identifier and `.` characters)
    pub word: String,
    /// The caret is on the keyword itself (`---@param`)
    pub on_keyword: bool,
    /// Line text after the `---` marker, starting at `@`
    pub text: String,
    /// Caret byte column within `text`
    pub column: usize,
}

/// A call whose argument list encloses the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    /// Offset of the unmatched `(`
    pub open_paren: usize,
    /// Offset of the last callee byte, if anything precedes the `(`
    pub callee_end: Option<usize>,
    /// Zero-based index of the argument holding the caret
    pub active_parameter: usize,
}

/// Module file names an include literal may refer to, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCandidates {
    pub primary: String,
    pub secondary: Option<String>,
}

/// Settings that shape include detection.
#[derive(Debug, Clone, Copy)]
pub struct ModuleReferenceOptions<'a> {
    /// Extra include functions besides `require` and `dofile`
    pub include_functions: &'a [String],
    /// Separator used in module names, rewritten to `/`
    pub separator: char,
}

impl Default for ModuleReferenceOptions<'_> {
    fn default() -> Self {
        Self {
            include_functions: &[],
            separator: '.',
        }
    }
}

// ============================================================================
// Byte classes and scans
// ============================================================================

pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_chain_byte(b: u8) -> bool {
    is_ident_byte(b) || matches!(b, b'.' | b':' | b'(' | b')' | b'[' | b']')
}

/// Leftmost offset of the expression ending at `anchor`.
///
/// Walks left over identifier characters, separators and brackets. A closing
/// bracket opens a balance looking backward; while any balance is open other
/// bytes are skipped too. An unmatched opening bracket or a line break ends
/// the expression.
pub fn chain_start(buffer: &[u8], anchor: usize) -> usize {
    if buffer.is_empty() {
        return 0;
    }
    let anchor = anchor.min(buffer.len() - 1);
    let mut start = anchor;
    let mut round: i32 = 0;
    let mut square: i32 = 0;
    for index in (0..=anchor).rev() {
        let ch = buffer[index];
        if ch == b'\r' || ch == b'\n' {
            break;
        }
        if is_chain_byte(ch) {
            match ch {
                b')' => round += 1,
                b']' => square += 1,
                b'(' => {
                    round -= 1;
                    if round < 0 {
                        break;
                    }
                }
                b'[' => {
                    square -= 1;
                    if square < 0 {
                        break;
                    }
                }
                _ => {}
            }
            start = index;
            continue;
        }
        if round > 0 || square > 0 {
            continue;
        }
        break;
    }
    start
}

/// Last offset of the identifier run starting at `anchor`.
fn ident_end(buffer: &[u8], anchor: usize) -> usize {
    let mut end = anchor;
    for (index, &ch) in buffer.iter().enumerate().skip(anchor) {
        if !is_ident_byte(ch) {
            break;
        }
        end = index;
    }
    end
}

/// Identifier byte the caret refers to: the byte at the caret, or the one
/// just before it.
fn identifier_anchor(buffer: &[u8], offset: usize) -> Option<usize> {
    if buffer.is_empty() {
        return None;
    }
    let mut anchor = offset.min(buffer.len() - 1);
    if !is_ident_byte(buffer[anchor]) && anchor > 0 {
        anchor -= 1;
    }
    is_ident_byte(buffer[anchor]).then_some(anchor)
}

/// Offset of the `]` closing a `["key"]` literal that holds the caret.
fn bracket_literal(buffer: &[u8], offset: usize) -> Option<usize> {
    let begin = line_start(buffer, offset);
    let end = line_end(buffer, offset);
    if offset <= begin {
        return None;
    }

    let open_quote = (begin..offset).rev().find(|&i| matches!(buffer[i], b'"' | b'\''))?;
    let quote = buffer[open_quote];
    let close_quote = (offset..end).find(|&i| matches!(buffer[i], b'"' | b'\''))?;
    if buffer[close_quote] != quote {
        return None;
    }

    let before = (begin..open_quote)
        .rev()
        .find(|&i| !buffer[i].is_ascii_whitespace())?;
    if buffer[before] != b'[' {
        return None;
    }
    let after = (close_quote + 1..end).find(|&i| !buffer[i].is_ascii_whitespace())?;
    (buffer[after] == b']').then_some(after)
}

/// Find the call whose argument list holds the caret.
///
/// Scans backward from the caret counting round brackets. Commas at the
/// outermost level advance the active argument; the first unmatched `(`
/// ends the scan.
pub fn enclosing_call(buffer: &[u8], offset: usize) -> Option<CallSite> {
    let offset = offset.min(buffer.len());
    let mut balance: i32 = 0;
    let mut active_parameter = 0;
    for index in (0..offset).rev() {
        match buffer[index] {
            b')' => balance += 1,
            b'(' => {
                balance -= 1;
                if balance < 0 {
                    let callee_end = (0..index)
                        .rev()
                        .find(|&i| !matches!(buffer[i], b' ' | b'\t'));
                    return Some(CallSite {
                        open_paren: index,
                        callee_end,
                        active_parameter,
                    });
                }
            }
            b',' if balance == 0 => active_parameter += 1,
            _ => {}
        }
    }
    None
}

// ============================================================================
// Chain parsing
// ============================================================================

/// Offset of the bracket matching the one at `open`.
fn matching_bracket(text: &[u8], open: usize, left: u8, right: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (index, &ch) in text.iter().enumerate().skip(open) {
        if ch == left {
            depth += 1;
        } else if ch == right {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
    }
    None
}

fn trim_ascii_space(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn index_segment(key: &[u8]) -> Option<ChainSegment> {
    let key = trim_ascii_space(key);
    if key.is_empty() {
        return None;
    }
    let quoted = key.len() >= 2
        && matches!(key[0], b'"' | b'\'')
        && key[key.len() - 1] == key[0];
    if quoted {
        let literal = &key[1..key.len() - 1];
        if literal.is_empty() {
            return None;
        }
        return Some(ChainSegment::new(String::from_utf8_lossy(literal)));
    }
    Some(ChainSegment {
        name: String::from_utf8_lossy(key).into_owned(),
        is_call: false,
        computed: true,
    })
}

/// Split chain text such as `a.b(x)["c"]:d` into segments.
fn parse_segments(text: &[u8]) -> Option<Vec<ChainSegment>> {
    let mut segments: Vec<ChainSegment> = Vec::new();
    let mut expect_name = true;
    let mut i = 0;
    while i < text.len() {
        if expect_name {
            let start = i;
            while i < text.len() && is_ident_byte(text[i]) {
                i += 1;
            }
            if start == i {
                return None;
            }
            segments.push(ChainSegment::new(String::from_utf8_lossy(&text[start..i])));
            expect_name = false;
            continue;
        }
        match text[i] {
            b'.' | b':' => {
                expect_name = true;
                i += 1;
            }
            b'(' => {
                let close = matching_bracket(text, i, b'(', b')')?;
                segments.last_mut()?.is_call = true;
                i = close + 1;
            }
            b'[' => {
                let close = matching_bracket(text, i, b'[', b']')?;
                segments.push(index_segment(&text[i + 1..close])?);
                i = close + 1;
            }
            _ => return None,
        }
    }
    if expect_name {
        return None;
    }
    Some(segments)
}

/// Whether the `]` at `close` ends a `["key"]` literal index.
fn closes_literal_index(text: &[u8], close: usize) -> bool {
    let mut depth = 0usize;
    for index in (0..=close).rev() {
        match text[index] {
            b']' => depth += 1,
            b'[' => {
                depth -= 1;
                if depth == 0 {
                    return index_segment(&text[index + 1..close])
                        .is_some_and(|segment| !segment.computed);
                }
            }
            _ => {}
        }
    }
    false
}

/// Separator decided by the rightmost byte that is not part of a name.
///
/// A literal index `t["k"]` counts as `t.k`.
fn boundary_separator(text: &[u8]) -> Separator {
    let Some(decisive) = text
        .iter()
        .rposition(|&b| !(is_ident_byte(b) || b == b' '))
    else {
        return Separator::None;
    };
    match text[decisive] {
        b':' => Separator::Colon,
        b'.' => Separator::Dot,
        b']' if closes_literal_index(text, decisive) => Separator::Dot,
        _ => Separator::None,
    }
}

fn first_char_filter(segments: &[ChainSegment]) -> Option<FirstCharFilter> {
    let [only] = segments else {
        return None;
    };
    let first = only.name.chars().next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    let twin = if first.is_ascii_lowercase() {
        first.to_ascii_uppercase()
    } else {
        first.to_ascii_lowercase()
    };
    Some(FirstCharFilter {
        primary: first,
        twin,
    })
}

fn starts_with_digit(text: &[u8]) -> bool {
    text.first().is_some_and(u8::is_ascii_digit)
}

/// Build a chain context from the raw expression text.
fn chain_from_text(text: &[u8], trailing: bool) -> SessionResult<ChainContext> {
    let text = match text.windows(2).rposition(|w| w == b"..") {
        Some(cut) => &text[cut + 2..],
        None => text,
    };
    if text.is_empty() {
        return Err(SessionError::Invalid);
    }

    let (body, separator) = if trailing {
        let separator = match text[text.len() - 1] {
            b':' => Separator::Colon,
            b'.' => Separator::Dot,
            _ => return Err(SessionError::Invalid),
        };
        (&text[..text.len() - 1], separator)
    } else {
        (text, boundary_separator(text))
    };
    if body.is_empty() || starts_with_digit(body) {
        return Err(SessionError::Invalid);
    }

    let segments = parse_segments(body).ok_or(SessionError::Invalid)?;
    let filter = if trailing {
        None
    } else {
        first_char_filter(&segments)
    };
    Ok(ChainContext {
        segments,
        separator,
        trailing_empty: trailing,
        bracket_literal: false,
        filter,
        call_argument: None,
    })
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the context at `offset`.
///
/// Returns [`SessionError::Invalid`] when the caret is in a comment or
/// string, or when nothing resolvable surrounds it.
pub fn resolve(buffer: &[u8], offset: usize) -> SessionResult<CursorContext> {
    let offset = offset.min(buffer.len());
    if let Some(annotation) = annotation_context(buffer, offset) {
        return Ok(CursorContext::Annotation(annotation));
    }

    let literal = bracket_literal(buffer, offset);
    let state = line_scanner::state_at(buffer, offset);
    if !(state.is_code() || (literal.is_some() && state.is_string())) {
        return Err(SessionError::Invalid);
    }

    resolve_chain(buffer, offset, literal).map(CursorContext::Chain)
}

fn resolve_chain(
    buffer: &[u8],
    offset: usize,
    literal: Option<usize>,
) -> SessionResult<ChainContext> {
    if let Some(close) = literal {
        let start = chain_start(buffer, close);
        let mut chain = chain_from_text(&buffer[start..=close], false)?;
        chain.bracket_literal = true;
        return Ok(chain);
    }

    let on_ident = buffer.get(offset).is_some_and(|&b| is_ident_byte(b));
    if !on_ident && offset > 0 && matches!(buffer[offset - 1], b'.' | b':') {
        let start = chain_start(buffer, offset - 1);
        return chain_from_text(&buffer[start..offset], true);
    }

    let Some(anchor) = identifier_anchor(buffer, offset) else {
        return resolve_call(buffer, offset);
    };
    let start = chain_start(buffer, anchor);
    let text = &buffer[start..=ident_end(buffer, anchor)];
    if starts_with_digit(text) {
        return resolve_call(buffer, offset);
    }
    chain_from_text(text, false)
}

/// Resolve the callee of the call enclosing the caret.
///
/// The last segment is marked as called and `call_argument` holds the
/// active argument index.
pub fn resolve_call(buffer: &[u8], offset: usize) -> SessionResult<ChainContext> {
    let site = enclosing_call(buffer, offset).ok_or(SessionError::Invalid)?;
    let callee_end = site.callee_end.ok_or(SessionError::Invalid)?;
    let last = buffer[callee_end];
    if !(is_ident_byte(last) || last == b']' || last == b')') {
        return Err(SessionError::Invalid);
    }

    let start = chain_start(buffer, callee_end);
    let mut chain = chain_from_text(&buffer[start..=callee_end], false)?;
    if let Some(segment) = chain.segments.last_mut() {
        segment.is_call = true;
    }
    chain.filter = None;
    chain.call_argument = Some(site.active_parameter);
    Ok(chain)
}

/// Word under the caret inside an annotation: identifier bytes and `.`.
fn annotation_word(buffer: &[u8], offset: usize) -> String {
    fn is_word_byte(b: u8) -> bool {
        is_ident_byte(b) || b == b'.'
    }
    if buffer.is_empty() {
        return String::new();
    }
    let mut anchor = offset.min(buffer.len() - 1);
    if !is_ident_byte(buffer[anchor]) && anchor > 0 {
        anchor -= 1;
    }
    if !is_word_byte(buffer[anchor]) {
        return String::new();
    }
    let start = (0..=anchor)
        .rev()
        .take_while(|&i| is_word_byte(buffer[i]))
        .last()
        .unwrap_or(anchor);
    let end = (anchor..buffer.len())
        .take_while(|&i| is_word_byte(buffer[i]))
        .last()
        .unwrap_or(anchor);
    String::from_utf8_lossy(&buffer[start..=end]).into_owned()
}

/// Annotation context when the line before the caret holds `---@`.
pub fn annotation_context(buffer: &[u8], offset: usize) -> Option<AnnotationContext> {
    let offset = offset.min(buffer.len());
    let begin = line_start(buffer, offset);
    let prefix = &buffer[begin..offset];
    let marker = prefix.windows(4).rposition(|w| w == b"---@")?;
    let line = &buffer[begin..line_end(buffer, offset)];

    let keyword_text: Vec<u8> = line[marker + 4..]
        .iter()
        .copied()
        .take_while(|b| b.is_ascii_alphanumeric())
        .collect();
    let keyword = std::str::from_utf8(&keyword_text)
        .ok()
        .and_then(AnnotationKeyword::parse);

    let word = annotation_word(buffer, offset);
    let on_keyword = !word.is_empty() && {
        let needle = format!("---@{}", word);
        line.windows(needle.len()).any(|w| w == needle.as_bytes())
    };

    let text_start = marker + 3;
    Some(AnnotationContext {
        keyword,
        word,
        on_keyword,
        text: String::from_utf8_lossy(&line[text_start..]).into_owned(),
        column: (offset - begin).saturating_sub(text_start),
    })
}

/// Whether the caret directly follows `---@`, which asks for the list of
/// annotation keywords.
pub fn at_annotation_marker(buffer: &[u8], offset: usize) -> bool {
    let offset = offset.min(buffer.len());
    if offset == 0 || buffer[offset - 1] != b'@' {
        return false;
    }
    let begin = line_start(buffer, offset);
    let dashes = buffer[begin..offset - 1]
        .iter()
        .rev()
        .take_while(|&&b| b == b'-')
        .count();
    dashes == 3
}

// ============================================================================
// Module references
// ============================================================================

fn dofile_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"dofile *\( *["']([0-9a-zA-Z_/\-]+\.lua)["'] *\)"#).ok())
        .as_ref()
}

fn require_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"require *\(? *["']([0-9a-zA-Z_/\-.]+)["'] *\)?"#).ok())
        .as_ref()
}

/// Literal spans captured by `re` on `line`, as (start, end, text).
fn literal_spans<'l>(re: Option<&Regex>, line: &'l [u8]) -> Vec<(usize, usize, &'l [u8])> {
    let Some(re) = re else {
        return Vec::new();
    };
    re.captures_iter(line)
        .filter_map(|caps| caps.get(1))
        .map(|m| (m.start(), m.end(), m.as_bytes()))
        .collect()
}

/// Candidate module files for an include literal under the caret.
///
/// `column` is the caret's byte column within its line. Recognized forms are
/// `dofile("x.lua")`, `require "a.b"`, `require("a.b")`, and the configured
/// include functions (with or without a `.lua` suffix).
pub fn resolve_open_file_reference(
    buffer: &[u8],
    offset: usize,
    column: usize,
    options: ModuleReferenceOptions<'_>,
) -> Option<ModuleCandidates> {
    let offset = offset.min(buffer.len());
    let line = &buffer[line_start(buffer, offset)..line_end(buffer, offset)];

    let mut strip_suffix = true;
    let mut is_require = false;
    let mut spans = literal_spans(dofile_regex(), line);
    if spans.is_empty() {
        spans = literal_spans(require_regex(), line);
        is_require = !spans.is_empty();
        strip_suffix = false;
    }
    if spans.is_empty() {
        for function in options.include_functions {
            let name = regex::escape(function);
            let with_suffix =
                Regex::new(&format!(r#"{name} *\(? *["']([0-9a-zA-Z_/.\-]+\.lua)["'] *\)?"#));
            if let Ok(re) = with_suffix {
                spans = literal_spans(Some(&re), line);
                if !spans.is_empty() {
                    strip_suffix = true;
                    break;
                }
            }
            let bare = Regex::new(&format!(r#"{name} *\(? *["']([0-9a-zA-Z_/.\-]+)["'] *\)?"#));
            if let Ok(re) = bare {
                spans = literal_spans(Some(&re), line);
                if !spans.is_empty() {
                    strip_suffix = false;
                    break;
                }
            }
        }
    }

    let (_, _, literal) = spans
        .into_iter()
        .find(|&(start, end, _)| column >= start && column <= end)?;

    // the patterns only admit ASCII inside the literal
    let literal = std::str::from_utf8(literal).ok()?;
    let mut name = literal;
    if strip_suffix {
        name = name.strip_suffix(".lua").unwrap_or(name);
    }
    let mut primary = name.replace(options.separator, "/");
    if !primary.ends_with(".lua") {
        primary.push_str(".lua");
    }
    let secondary = is_require.then(|| {
        let stem = primary.strip_suffix(".lua").unwrap_or(&primary);
        format!("{stem}/init.lua")
    });
    Some(ModuleCandidates { primary, secondary })
}
