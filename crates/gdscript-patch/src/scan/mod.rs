//! Line scanner for GDScript sources.
//!
//! GDScript delimits blocks by indentation, but indentation only means something
//! on lines that start a statement. A line that opens inside a bracket, inside a
//! multi-line string, or after a trailing backslash continues the previous
//! statement whatever its leading whitespace. The scanner tracks that state so
//! callers can find top-level declarations and where their blocks end.

#[cfg(test)]
mod tests;

use thiserror::Error;

/// What a physical line contains, ignoring continuation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Empty or whitespace only.
    Blank,
    /// Only a `#` comment after the indentation.
    Comment,
    /// Anything else.
    Code,
}

/// One physical line of a scanned source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset just past the content, before any `\r\n` or `\n`.
    pub content_end: usize,
    /// Byte offset just past the line terminator.
    pub end: usize,
    /// Leading spaces and tabs.
    pub indent: usize,
    /// Byte offset of a `#` comment outside string literals.
    pub comment_start: Option<usize>,
    pub kind: LineKind,
    /// The line begins inside an open bracket, an open string, or after a
    /// trailing backslash.
    pub continuation: bool,
}

impl Line {
    /// True when this line begins a new logical statement.
    pub fn starts_statement(&self) -> bool {
        !self.continuation && self.kind == LineKind::Code
    }

    /// True for a statement at column zero.
    pub fn is_top_level_statement(&self) -> bool {
        self.starts_statement() && self.indent == 0
    }

    /// True for a whitespace-only line that is not part of a literal.
    pub fn is_blank(&self) -> bool {
        !self.continuation && self.kind == LineKind::Blank
    }

    /// True when the line belongs to an enclosing indented block.
    fn is_block_content(&self) -> bool {
        self.continuation || (self.indent > 0 && self.kind != LineKind::Blank)
    }
}

/// Line terminator convention of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Structural defects that make block boundaries unreliable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },

    #[error("line {line}: unmatched closing '{bracket}'")]
    UnmatchedBracket { line: usize, bracket: char },

    #[error("line {line}: '{bracket}' is never closed")]
    UnclosedBracket { line: usize, bracket: char },
}

/// A buffer split into classified lines.
///
/// Scanning never fails; the first structural defect is kept and reported by
/// [`ScannedSource::check`]. Consumers that rewrite the buffer must check it,
/// read-only consumers can ignore it.
#[derive(Debug, Clone)]
pub struct ScannedSource<'a> {
    source: &'a str,
    lines: Vec<Line>,
    defect: Option<ScanError>,
}

impl<'a> ScannedSource<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Scanner::default();
        let mut lines = Vec::new();
        let mut offset = 0;

        for raw in source.split_inclusive('\n') {
            let number = lines.len() + 1;
            lines.push(scanner.line(offset, raw, number));
            offset += raw.len();
        }

        let defect = scanner.finish();
        Self {
            source,
            lines,
            defect,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Returns the first structural defect, if any.
    pub fn check(&self) -> Result<(), ScanError> {
        match &self.defect {
            Some(defect) => Err(defect.clone()),
            None => Ok(()),
        }
    }

    /// Line terminator used by the first terminated line; `Lf` when there is none.
    pub fn line_ending(&self) -> LineEnding {
        self.lines
            .iter()
            .find(|line| line.end > line.content_end)
            .map_or(LineEnding::Lf, |line| {
                if line.end - line.content_end == 2 {
                    LineEnding::CrLf
                } else {
                    LineEnding::Lf
                }
            })
    }

    /// Line text without its terminator.
    pub fn text(&self, index: usize) -> &'a str {
        let line = &self.lines[index];
        &self.source[line.start..line.content_end]
    }

    /// Code on the line: indentation, trailing comment and trailing whitespace removed.
    pub fn code(&self, index: usize) -> &'a str {
        let line = &self.lines[index];
        let end = line.comment_start.unwrap_or(line.content_end);
        self.source[line.start + line.indent..end].trim_end()
    }

    /// Index of the line containing byte `offset`.
    pub fn line_at(&self, offset: usize) -> Option<usize> {
        if offset >= self.source.len() {
            return None;
        }
        Some(self.lines.partition_point(|line| line.end <= offset))
    }

    /// Indices of statements at column zero, in order.
    pub fn top_level_statements(&self) -> impl Iterator<Item = usize> + '_ {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.is_top_level_statement())
            .map(|(index, _)| index)
    }

    /// Last physical line of the statement starting at `first`.
    pub fn statement_last_line(&self, first: usize) -> usize {
        first
            + self.lines[first + 1..]
                .iter()
                .take_while(|line| line.continuation)
                .count()
    }

    /// Last line of the top-level unit starting at `first`.
    ///
    /// The unit is the statement plus every indented or continued line after it,
    /// up to the next statement at column zero. Blank lines and column-zero
    /// comments are only included when more indented content follows them.
    pub fn unit_last_line(&self, first: usize) -> usize {
        let mut last = self.statement_last_line(first);
        for (index, line) in self.lines.iter().enumerate().skip(last + 1) {
            if line.is_block_content() {
                last = index;
            } else if line.is_top_level_statement() {
                break;
            }
        }
        last
    }
}

#[derive(Debug)]
struct OpenString {
    quote: u8,
    triple: bool,
    line: usize,
}

#[derive(Debug, Default)]
struct Scanner {
    brackets: Vec<(u8, usize)>,
    string: Option<OpenString>,
    backslash: bool,
    defect: Option<ScanError>,
}

impl Scanner {
    fn line(&mut self, offset: usize, raw: &str, number: usize) -> Line {
        let content = raw.strip_suffix('\n').unwrap_or(raw);
        let content = content.strip_suffix('\r').unwrap_or(content);

        let continuation = self.string.is_some() || !self.brackets.is_empty() || self.backslash;
        self.backslash = false;

        let indent = content
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        let comment = self.consume(content, number);

        let trimmed = content.trim();
        let kind = if trimmed.is_empty() {
            LineKind::Blank
        } else if !continuation && trimmed.starts_with('#') {
            LineKind::Comment
        } else {
            LineKind::Code
        };

        Line {
            start: offset,
            content_end: offset + content.len(),
            end: offset + raw.len(),
            indent,
            comment_start: comment.map(|at| offset + at),
            kind,
            continuation,
        }
    }

    /// Advances string and bracket state over one line; returns the comment offset.
    fn consume(&mut self, content: &str, number: usize) -> Option<usize> {
        let bytes = content.as_bytes();
        let mut escaped_newline = false;
        let mut i = 0;

        while i < bytes.len() {
            let byte = bytes[i];

            if let Some(open) = &self.string {
                if byte == b'\\' {
                    escaped_newline = i + 1 == bytes.len();
                    i += 2;
                    continue;
                }
                if byte == open.quote {
                    if !open.triple {
                        self.string = None;
                    } else if bytes[i..].starts_with(&[byte, byte, byte]) {
                        self.string = None;
                        i += 3;
                        continue;
                    }
                }
                i += 1;
                continue;
            }

            match byte {
                b'#' => return Some(i),
                b'"' | b'\'' => {
                    let triple = bytes[i..].starts_with(&[byte, byte, byte]);
                    self.string = Some(OpenString {
                        quote: byte,
                        triple,
                        line: number,
                    });
                    i += if triple { 3 } else { 1 };
                    continue;
                }
                b'(' | b'[' | b'{' => self.brackets.push((byte, number)),
                b')' | b']' | b'}' => match self.brackets.pop() {
                    Some((open, _)) if closes(open, byte) => {}
                    _ => self.record(ScanError::UnmatchedBracket {
                        line: number,
                        bracket: byte as char,
                    }),
                },
                b'\\' if i + 1 == bytes.len() => self.backslash = true,
                _ => {}
            }
            i += 1;
        }

        if let Some(open) = &self.string {
            if !open.triple && !escaped_newline {
                let line = open.line;
                self.string = None;
                self.record(ScanError::UnterminatedString { line });
            }
        }
        None
    }

    fn record(&mut self, defect: ScanError) {
        if self.defect.is_none() {
            self.defect = Some(defect);
        }
    }

    fn finish(mut self) -> Option<ScanError> {
        if let Some(open) = self.string.take() {
            self.record(ScanError::UnterminatedString { line: open.line });
        }
        if let Some(&(bracket, line)) = self.brackets.first() {
            self.record(ScanError::UnclosedBracket {
                line,
                bracket: bracket as char,
            });
        }
        self.defect
    }
}

fn closes(open: u8, close: u8) -> bool {
    matches!((open, close), (b'(', b')') | (b'[', b']') | (b'{', b'}'))
}
