//
// line_scanner.rs
//
// Single-line lexical state machine for Lua comments and strings.
//
// The scan starts at the beginning of the caret's line, so a block comment or
// long string opened on an earlier line is not seen.
//

/// Lexical state reached after scanning part of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    /// Ordinary code
    Code,
    /// After `--` (to end of line)
    LineComment,
    /// Inside `--[[ ... ]]` or `--[==[ ... ]==]`
    BlockComment { level: usize },
    /// Inside `'...'`
    StringSingle,
    /// Inside `"..."`
    StringDouble,
    /// Inside `[[ ... ]]` or `[==[ ... ]==]`
    LongString { level: usize },
}

impl LineState {
    pub fn is_code(self) -> bool {
        self == LineState::Code
    }

    pub fn is_comment(self) -> bool {
        matches!(self, LineState::LineComment | LineState::BlockComment { .. })
    }

    pub fn is_string(self) -> bool {
        matches!(
            self,
            LineState::StringSingle | LineState::StringDouble | LineState::LongString { .. }
        )
    }
}

/// Match an opening long bracket `[`, `=`*, `[` at `i`.
///
/// # Returns
/// The bracket level and the number of bytes it spans
fn open_long_bracket(bytes: &[u8], i: usize) -> Option<(usize, usize)> {
    if bytes.get(i) != Some(&b'[') {
        return None;
    }
    let mut j = i + 1;
    while bytes.get(j) == Some(&b'=') {
        j += 1;
    }
    if bytes.get(j) == Some(&b'[') {
        Some((j - i - 1, j - i + 1))
    } else {
        None
    }
}

/// Match a closing long bracket of exactly `level` at `i`.
fn close_long_bracket(bytes: &[u8], i: usize, level: usize) -> Option<usize> {
    if bytes.get(i) != Some(&b']') {
        return None;
    }
    let mut j = i + 1;
    while bytes.get(j) == Some(&b'=') {
        j += 1;
    }
    if j - i - 1 == level && bytes.get(j) == Some(&b']') {
        Some(j - i + 1)
    } else {
        None
    }
}

/// Scan `line` from its first byte and return the state at its end.
pub fn scan_line(line: &[u8]) -> LineState {
    let mut state = LineState::Code;
    let mut i = 0;
    while i < line.len() {
        let ch = line[i];
        match state {
            LineState::Code => match ch {
                b'-' if line.get(i + 1) == Some(&b'-') => {
                    if let Some((level, width)) = open_long_bracket(line, i + 2) {
                        state = LineState::BlockComment { level };
                        i += 2 + width;
                        continue;
                    }
                    return LineState::LineComment;
                }
                b'\'' => state = LineState::StringSingle,
                b'"' => state = LineState::StringDouble,
                b'[' => {
                    if let Some((level, width)) = open_long_bracket(line, i) {
                        state = LineState::LongString { level };
                        i += width;
                        continue;
                    }
                }
                _ => {}
            },
            LineState::StringSingle | LineState::StringDouble => {
                let quote = if state == LineState::StringSingle {
                    b'\''
                } else {
                    b'"'
                };
                if ch == b'\\' {
                    i += 2;
                    continue;
                }
                if ch == quote {
                    state = LineState::Code;
                }
            }
            LineState::BlockComment { level } | LineState::LongString { level } => {
                if let Some(width) = close_long_bracket(line, i, level) {
                    state = LineState::Code;
                    i += width;
                    continue;
                }
            }
            LineState::LineComment => return state,
        }
        i += 1;
    }
    state
}

/// Start offset of the line containing `offset`.
pub fn line_start(buffer: &[u8], offset: usize) -> usize {
    let end = offset.min(buffer.len());
    buffer[..end]
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// End offset (exclusive, before any `\n`) of the line containing `offset`.
pub fn line_end(buffer: &[u8], offset: usize) -> usize {
    let start = offset.min(buffer.len());
    buffer[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|i| start + i)
        .unwrap_or(buffer.len())
}

/// Lexical state at `offset`, scanning from the start of its line.
pub fn state_at(buffer: &[u8], offset: usize) -> LineState {
    let end = offset.min(buffer.len());
    scan_line(&buffer[line_start(buffer, end)..end])
}
