//! Function replacement and insertion.
//!
//! A function block starts at a top-level `func name(` header and covers every
//! indented or continued line after it, up to the next statement at column zero.
//! Blank lines directly after the block are part of the replaced span so the
//! result always has exactly one blank line between the new block and whatever
//! follows. Annotation statements on the lines directly above a header, such as
//! `@rpc("any_peer")`, belong to the block. Patching with the same body twice is
//! a no-op.


use serde::Serialize;

use crate::analysis::{declared_function, is_standalone_annotation, validate_identifier};
use crate::error::PatchError;
use crate::scan::{LineEnding, ScannedSource};

/// A function replacement or insertion to apply to one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    pub target_name: String,
    pub new_body: String,
    pub anchor: Option<String>,
}

impl PatchRequest {
    pub fn new(target_name: impl Into<String>, new_body: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            new_body: new_body.into(),
            anchor: None,
        }
    }

    /// Inserts after the line containing `anchor` when the target does not exist yet.
    pub fn insert_after(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    pub fn with_anchor(mut self, anchor: Option<String>) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn apply(&self, buffer: &str) -> Result<Patched, PatchError> {
        patch(
            buffer,
            &self.target_name,
            &self.new_body,
            self.anchor.as_deref(),
        )
    }
}

/// Where the new function ended up. Lines are 1-based in the patched buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PatchOutcome {
    /// An existing definition was replaced.
    Replaced { line: usize },
    /// The function was new and went after the anchor's enclosing block.
    InsertedAfterAnchor { anchor_line: usize, line: usize },
    /// The function was new and went at the end of the buffer.
    /// `anchor_missing` is set when an anchor was given but not found.
    Appended { anchor_missing: bool, line: usize },
}

impl PatchOutcome {
    pub fn line(&self) -> usize {
        match *self {
            PatchOutcome::Replaced { line }
            | PatchOutcome::InsertedAfterAnchor { line, .. }
            | PatchOutcome::Appended { line, .. } => line,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            PatchOutcome::Replaced { .. } => "replaced",
            PatchOutcome::InsertedAfterAnchor { .. } => "inserted_after_anchor",
            PatchOutcome::Appended { .. } => "appended",
        }
    }
}

/// A patched buffer and how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patched {
    pub text: String,
    pub outcome: PatchOutcome,
}

/// Replaces or inserts the top-level function `target_name` in `buffer`.
///
/// An existing definition is replaced together with the annotation lines
/// directly above it. A new function goes after the block that contains the
/// first occurrence of `anchor`, which is not always the anchor's own line: an
/// anchor inside a function body or an annotated declaration places the new
/// function after the whole declaration, never in the middle of it. Without an
/// anchor, or when it does not occur, the function is appended.
///
/// # Arguments
/// * `buffer` - Current script contents
/// * `target_name` - Function to replace or add
/// * `new_body` - Complete definition, starting with its `func` header
/// * `anchor` - Text locating the insertion point when the function is new
///
/// # Errors
/// * `InvalidArgument` for a bad name or body, a malformed buffer, or an anchor
///   given for a function that already exists
/// * `AmbiguousTarget` when the function is defined more than once at top level
///
/// # Example
/// ```
/// use gdscript_patch::patch;
///
/// let buffer = "func a():\n  pass\nfunc b():\n  pass\n";
/// let patched = patch(buffer, "a", "func a():\n  return 1", None).unwrap();
/// assert_eq!(patched.text, "func a():\n  return 1\n\nfunc b():\n  pass\n");
/// ```
pub fn patch(
    buffer: &str,
    target_name: &str,
    new_body: &str,
    anchor: Option<&str>,
) -> Result<Patched, PatchError> {
    validate_identifier(target_name, "function name")?;

    let source = ScannedSource::new(buffer);
    source
        .check()
        .map_err(|e| PatchError::invalid(format!("script is not well-formed: {e}")))?;
    let newline = source.line_ending();
    let body = normalize_body(target_name, new_body, newline)?;
    let anchor = anchor.filter(|a| !a.trim().is_empty());

    let definitions: Vec<usize> = source
        .top_level_statements()
        .filter(|&index| declared_function(source.code(index)) == Some(target_name))
        .collect();

    match definitions.as_slice() {
        [] => {}
        [header] => {
            if anchor.is_some() {
                return Err(PatchError::invalid(format!(
                    "function '{target_name}' already exists at line {}; omit the anchor to replace it",
                    header + 1
                )));
            }
            return Ok(replace(&source, *header, &body, newline));
        }
        _ => {
            return Err(PatchError::AmbiguousTarget {
                name: target_name.to_string(),
                lines: definitions.iter().map(|index| index + 1).collect(),
            });
        }
    }

    let anchor_line = anchor.and_then(|a| {
        buffer
            .find(a)
            .and_then(|at| source.line_at(at + a.len() - 1))
    });

    Ok(match anchor_line {
        Some(line) => insert_after(&source, line, &body, newline),
        None => append(&source, &body, newline, anchor.is_some()),
    })
}

/// Validates the new definition and converts it to the buffer's line ending.
///
/// The body must be exactly one top-level block headed by `target_name`,
/// optionally preceded by its annotation lines, otherwise a second patch would
/// see a different span than the first wrote.
fn normalize_body(
    target_name: &str,
    raw: &str,
    newline: LineEnding,
) -> Result<String, PatchError> {
    let unix = raw.replace("\r\n", "\n");
    let trimmed = unix.trim_end();
    let leading: usize = trimmed
        .split_inclusive('\n')
        .take_while(|line| line.trim().is_empty())
        .map(str::len)
        .sum();
    let body = &trimmed[leading..];

    if body.is_empty() {
        return Err(PatchError::invalid("function body cannot be empty"));
    }

    let scanned = ScannedSource::new(body);
    scanned
        .check()
        .map_err(|e| PatchError::invalid(format!("function body is not well-formed: {e}")))?;

    let header = annotated_statement(&scanned, 0);
    if !scanned.lines()[header].is_top_level_statement()
        || declared_function(scanned.code(header)) != Some(target_name)
    {
        return Err(PatchError::invalid(format!(
            "function body must start with an unindented `func {target_name}(` header"
        )));
    }
    if scanned.unit_last_line(header) + 1 != scanned.lines().len() {
        return Err(PatchError::invalid(format!(
            "function body must contain only the definition of '{target_name}'"
        )));
    }

    Ok(match newline {
        LineEnding::Lf => body.to_string(),
        LineEnding::CrLf => body.replace('\n', "\r\n"),
    })
}

fn replace(source: &ScannedSource<'_>, header: usize, body: &str, newline: LineEnding) -> Patched {
    let buffer = source.source();
    let lines = source.lines();

    let first = block_start(source, header);
    let last = source.unit_last_line(header);
    let next = first_non_blank(source, last + 1);
    let start = lines[first].start;
    let end = lines.get(next).map_or(buffer.len(), |line| line.start);
    let rest = &buffer[end..];

    let mut text = String::with_capacity(buffer.len() + body.len());
    text.push_str(&buffer[..start]);
    text.push_str(body);
    text.push_str(newline.as_str());
    if !rest.is_empty() {
        text.push_str(newline.as_str());
        text.push_str(rest);
    }

    Patched {
        text,
        outcome: PatchOutcome::Replaced { line: first + 1 },
    }
}

fn insert_after(
    source: &ScannedSource<'_>,
    anchor_line: usize,
    body: &str,
    newline: LineEnding,
) -> Patched {
    let buffer = source.source();
    let lines = source.lines();

    // Never split a declaration: move past the block the anchor sits in.
    let owner = (0..=anchor_line)
        .rev()
        .find(|&index| lines[index].is_top_level_statement());
    let after = owner.map_or(anchor_line, |owner| {
        let owner = annotated_statement(source, owner);
        source.unit_last_line(owner).max(anchor_line)
    });

    let next = first_non_blank(source, after + 1);
    let had_blank = next > after + 1;
    let split = lines.get(next).map_or(buffer.len(), |line| line.start);
    let (head, rest) = buffer.split_at(split);

    let mut text = String::with_capacity(buffer.len() + body.len() + 8);
    text.push_str(head);
    if !head.ends_with('\n') {
        text.push_str(newline.as_str());
    }
    if !had_blank {
        text.push_str(newline.as_str());
    }
    let line = line_number_at_end(&text);
    text.push_str(body);
    text.push_str(newline.as_str());
    if !rest.is_empty() {
        text.push_str(newline.as_str());
        text.push_str(rest);
    }

    Patched {
        text,
        outcome: PatchOutcome::InsertedAfterAnchor {
            anchor_line: anchor_line + 1,
            line,
        },
    }
}

fn append(
    source: &ScannedSource<'_>,
    body: &str,
    newline: LineEnding,
    anchor_missing: bool,
) -> Patched {
    let buffer = source.source();
    let mut text = String::with_capacity(buffer.len() + body.len() + 4);
    text.push_str(buffer);

    if !buffer.is_empty() {
        if !buffer.ends_with('\n') {
            text.push_str(newline.as_str());
        }
        let ends_blank = source.lines().last().is_some_and(|line| line.is_blank());
        if !ends_blank {
            text.push_str(newline.as_str());
        }
    }
    let line = line_number_at_end(&text);
    text.push_str(body);
    text.push_str(newline.as_str());

    Patched {
        text,
        outcome: PatchOutcome::Appended {
            anchor_missing,
            line,
        },
    }
}

/// Comment-free text of the statement starting at `first`, lines joined by spaces.
fn statement_code(source: &ScannedSource<'_>, first: usize) -> String {
    (first..=source.statement_last_line(first))
        .map(|index| source.code(index))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_annotation_statement(source: &ScannedSource<'_>, index: usize) -> bool {
    source.lines()[index].is_top_level_statement()
        && is_standalone_annotation(&statement_code(source, index))
}

/// The statement annotated by the annotation run starting at `index`, or
/// `index` itself when it is not an annotation.
fn annotated_statement(source: &ScannedSource<'_>, mut index: usize) -> usize {
    while is_annotation_statement(source, index) {
        let next = source.statement_last_line(index) + 1;
        match source.lines().get(next) {
            Some(line) if line.is_top_level_statement() => index = next,
            _ => break,
        }
    }
    index
}

/// First line of the block headed at `header`, including the annotation
/// statements directly above it.
fn block_start(source: &ScannedSource<'_>, header: usize) -> usize {
    let lines = source.lines();
    let mut start = header;
    while start > 0 {
        let Some(first) = (0..start).rev().find(|&index| !lines[index].continuation) else {
            break;
        };
        if source.statement_last_line(first) + 1 != start
            || !is_annotation_statement(source, first)
        {
            break;
        }
        start = first;
    }
    start
}

fn first_non_blank(source: &ScannedSource<'_>, from: usize) -> usize {
    let lines = source.lines();
    let mut index = from;
    while index < lines.len() && lines[index].is_blank() {
        index += 1;
    }
    index
}

/// 1-based number of the line that text appended after `text` would start on.
fn line_number_at_end(text: &str) -> usize {
    text.matches('\n').count() + 1
}
