//
// position.rs
//
// Mapping between editor positions and byte offsets in a document buffer,
// and application of incremental text edits.
//
// Characters are counted per Unicode scalar value. The width of a scalar is
// taken from the leading byte's bit pattern, so the scan never decodes UTF-8
// and tolerates malformed input. `\r` is an ordinary character; only `\n`
// starts a new line.
//

use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent};

use crate::error::{SessionError, SessionResult};

/// A single text edit sent by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    /// Replace the whole buffer.
    Full(String),
    /// Replace the text between two positions of the pre-edit buffer.
    Range {
        start: Position,
        end: Position,
        text: String,
    },
}

impl From<TextDocumentContentChangeEvent> for EditOp {
    fn from(change: TextDocumentContentChangeEvent) -> Self {
        match change.range {
            Some(range) => EditOp::Range {
                start: range.start,
                end: range.end,
                text: change.text,
            },
            None => EditOp::Full(change.text),
        }
    }
}

/// Number of bytes occupied by the scalar whose first byte is `lead`.
///
/// Bytes above 127 carry their width as the count of leading 1-bits. Stray
/// continuation bytes and truncated sequences are clamped so the scan always
/// makes progress and never runs past the buffer.
fn scalar_width(lead: u8, remaining: usize) -> usize {
    let width = if lead > 127 {
        lead.leading_ones() as usize
    } else {
        1
    };
    width.clamp(1, remaining.max(1))
}

/// Running scan state over a buffer.
struct Scan<'a> {
    buffer: &'a [u8],
    offset: usize,
    line: u32,
    character: u32,
}

impl<'a> Scan<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            offset: 0,
            line: 0,
            character: 0,
        }
    }

    fn is_done(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    fn at(&self, pos: Position) -> bool {
        self.line == pos.line && self.character == pos.character
    }

    fn past(&self, pos: Position) -> bool {
        self.line > pos.line || (self.line == pos.line && self.character > pos.character)
    }

    fn advance(&mut self) {
        let lead = self.buffer[self.offset];
        self.offset += scalar_width(lead, self.buffer.len() - self.offset);
        if lead == b'\n' {
            self.line += 1;
            self.character = 0;
        } else {
            self.character += 1;
        }
    }

    /// Error for a target the scan never reached before running out of input.
    fn exhausted(&self, pos: Position) -> SessionError {
        if self.line == 0 {
            SessionError::OutOfRange(format!(
                "character {} (zero-based) is beyond first line boundary",
                pos.character
            ))
        } else {
            SessionError::OutOfRange(format!("file only has {} lines", self.line + 1))
        }
    }
}

fn beyond_line(pos: Position) -> SessionError {
    SessionError::OutOfRange(format!(
        "character {} (zero-based) is beyond line {} boundary (zero-based)",
        pos.character, pos.line
    ))
}

/// Convert a zero-based (line, character) pair to a byte offset.
///
/// The position just past the last character of the buffer is valid and maps
/// to `buffer.len()`.
pub fn offset_for(buffer: &[u8], line: u32, character: u32) -> SessionResult<usize> {
    let target = Position::new(line, character);
    let mut scan = Scan::new(buffer);
    while !scan.is_done() {
        if scan.at(target) {
            return Ok(scan.offset);
        }
        if scan.past(target) {
            return Err(beyond_line(target));
        }
        scan.advance();
    }
    if scan.at(target) {
        return Ok(scan.offset);
    }
    Err(scan.exhausted(target))
}

/// Convert a byte offset back to a position.
///
/// An offset in the middle of a multi-byte scalar maps to the position right
/// after that scalar. Offsets past the end map to the end of the buffer.
pub fn position_for(buffer: &[u8], offset: usize) -> Position {
    let mut scan = Scan::new(buffer);
    while !scan.is_done() && scan.offset < offset {
        scan.advance();
    }
    Position::new(scan.line, scan.character)
}

/// Resolve both ends of a range in a single pass over the buffer.
pub fn range_offsets(buffer: &[u8], start: Position, end: Position) -> SessionResult<(usize, usize)> {
    if (end.line, end.character) < (start.line, start.character) {
        return Err(SessionError::OutOfRange(format!(
            "range end {}:{} precedes start {}:{}",
            end.line, end.character, start.line, start.character
        )));
    }

    let mut scan = Scan::new(buffer);
    let mut start_offset: Option<usize> = None;
    while !scan.is_done() {
        if start_offset.is_none() {
            if scan.at(start) {
                start_offset = Some(scan.offset);
            } else if scan.past(start) {
                return Err(beyond_line(start));
            }
        }
        if let Some(found) = start_offset {
            if scan.at(end) {
                return Ok((found, scan.offset));
            }
            if scan.past(end) {
                return Err(beyond_line(end));
            }
        }
        scan.advance();
    }

    match start_offset {
        Some(found) if scan.at(end) => Ok((found, scan.offset)),
        Some(_) => Err(scan.exhausted(end)),
        None if scan.at(start) && scan.at(end) => Ok((scan.offset, scan.offset)),
        None => Err(scan.exhausted(start)),
    }
}

/// Apply `edits` in order, each against the result of the previous one.
///
/// Nothing is applied when any edit fails: the caller keeps its old buffer.
pub fn apply_edits(buffer: &[u8], edits: &[EditOp]) -> SessionResult<Vec<u8>> {
    let mut current = buffer.to_vec();
    for edit in edits {
        current = match edit {
            EditOp::Full(text) => text.as_bytes().to_vec(),
            EditOp::Range { start, end, text } => {
                let (start_offset, end_offset) = range_offsets(&current, *start, *end)?;
                if end_offset < start_offset || end_offset > current.len() {
                    return Err(SessionError::OutOfRange(format!(
                        "edit range {}..{} is outside a buffer of {} bytes",
                        start_offset,
                        end_offset,
                        current.len()
                    )));
                }
                let mut next =
                    Vec::with_capacity(start_offset + text.len() + current.len() - end_offset);
                next.extend_from_slice(&current[..start_offset]);
                next.extend_from_slice(text.as_bytes());
                next.extend_from_slice(&current[end_offset..]);
                next
            }
        };
    }
    Ok(current)
}
