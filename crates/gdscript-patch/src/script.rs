//! Composition of new script files.

use crate::analysis::{classify, validate_identifier, Declaration};
use crate::error::PatchError;
use crate::scan::ScannedSource;

/// Base class used when the content does not declare one.
pub const DEFAULT_BASE: &str = "Node";

/// Builds the text of a new script from `content` and an optional class name.
///
/// Content without a top-level `extends` gets `extends Node` prepended. A requested
/// `class_name` goes directly after the `extends` line; it is skipped when the
/// content already declares the same name and rejected when it declares another.
/// The result ends with exactly one line terminator.
pub fn compose_script(content: &str, class_name: Option<&str>) -> Result<String, PatchError> {
    if let Some(name) = class_name {
        validate_identifier(name, "class name")?;
    }

    let scanned = ScannedSource::new(content);
    let newline = scanned.line_ending().as_str();

    let mut extends_line = None;
    let mut declared_class = None;
    for index in scanned.top_level_statements() {
        match classify(scanned.code(index)) {
            Some(Declaration::Extends(_)) => {
                extends_line.get_or_insert(index);
            }
            Some(Declaration::ClassName { name, extends }) => {
                declared_class.get_or_insert(name);
                if extends.is_some() {
                    extends_line.get_or_insert(index);
                }
            }
            _ => {}
        }
    }

    let class_line = match (class_name, declared_class) {
        (Some(wanted), Some(existing)) if wanted == existing => None,
        (Some(wanted), Some(existing)) => {
            return Err(PatchError::invalid(format!(
                "content already declares class_name {existing}; cannot also name it {wanted}"
            )));
        }
        (Some(wanted), None) => Some(format!("class_name {wanted}")),
        (None, _) => None,
    };

    let body = content.trim_end();
    let mut text = String::with_capacity(body.len() + 64);

    match extends_line {
        Some(index) => match class_line {
            Some(class_line) => {
                let split = scanned.lines()[scanned.statement_last_line(index)]
                    .end
                    .min(body.len());
                let (head, tail) = body.split_at(split);
                text.push_str(head);
                if !head.ends_with('\n') {
                    text.push_str(newline);
                }
                text.push_str(&class_line);
                text.push_str(newline);
                text.push_str(tail);
            }
            None => text.push_str(body),
        },
        None => {
            text.push_str("extends ");
            text.push_str(DEFAULT_BASE);
            text.push_str(newline);
            if let Some(class_line) = class_line {
                text.push_str(&class_line);
                text.push_str(newline);
            }
            let rest = body.trim_start_matches(|c: char| c == '\r' || c == '\n');
            if !rest.is_empty() {
                text.push_str(newline);
                text.push_str(rest);
            }
        }
    }

    let mut text = text.trim_end().to_string();
    text.push_str(newline);
    Ok(text)
}
