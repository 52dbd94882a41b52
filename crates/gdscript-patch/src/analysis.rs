//! Script summaries and top-level declaration recognition.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::PatchError;
use crate::scan::ScannedSource;

/// Identifier: a letter or underscore followed by letters, digits, or underscores.
const IDENTIFIER_PATTERN: &str = r"^[_\p{L}][_\p{L}\p{N}]*$";

/// `func name(`, optionally `static` and preceded by inline annotations such as `@rpc`.
const FUNCTION_PATTERN: &str =
    r"^(?:@[_\p{L}][_\p{L}\p{N}]*(?:\([^)]*\))?\s+)*(?:static\s+)?func\s+([_\p{L}][_\p{L}\p{N}]*)\s*\(";

/// `var name`, optionally `static` and annotated (`@export var speed`).
const VARIABLE_PATTERN: &str =
    r"^(?:@[_\p{L}][_\p{L}\p{N}]*(?:\([^)]*\))?\s+)*(?:static\s+)?var\s+([_\p{L}][_\p{L}\p{N}]*)";

/// A statement made only of annotations, such as `@rpc("any_peer")` on its own line.
/// Arguments may nest one level of parentheses.
const ANNOTATION_PATTERN: &str =
    r"^(?:@[_\p{L}][_\p{L}\p{N}]*\s*(?:\([^()]*(?:\([^()]*\)[^()]*)*\))?\s*)+$";

const SIGNAL_PATTERN: &str = r"^signal\s+([_\p{L}][_\p{L}\p{N}]*)";

const EXTENDS_PATTERN: &str = r"^extends\s+(\S.*)$";

/// `class_name Name`, with an optional icon path and inline `extends Base`.
const CLASS_NAME_PATTERN: &str =
    r"^class_name\s+([_\p{L}][_\p{L}\p{N}]*)(?:.*?\sextends\s+(\S.*))?";

static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();
static FUNCTION_REGEX: OnceLock<Regex> = OnceLock::new();
static VARIABLE_REGEX: OnceLock<Regex> = OnceLock::new();
static ANNOTATION_REGEX: OnceLock<Regex> = OnceLock::new();
static SIGNAL_REGEX: OnceLock<Regex> = OnceLock::new();
static EXTENDS_REGEX: OnceLock<Regex> = OnceLock::new();
static CLASS_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("invalid regex pattern"))
}

/// A declaration recognized on a top-level statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declaration<'a> {
    Extends(&'a str),
    ClassName {
        name: &'a str,
        extends: Option<&'a str>,
    },
    Function(&'a str),
    Variable(&'a str),
    Signal(&'a str),
}

/// Recognizes the declaration introduced by `code`, the comment-free text of a statement.
pub fn classify(code: &str) -> Option<Declaration<'_>> {
    if let Some(caps) = cached(&CLASS_NAME_REGEX, CLASS_NAME_PATTERN).captures(code) {
        return Some(Declaration::ClassName {
            name: caps.get(1)?.as_str(),
            extends: caps.get(2).map(|m| m.as_str()),
        });
    }
    if let Some(caps) = cached(&EXTENDS_REGEX, EXTENDS_PATTERN).captures(code) {
        return Some(Declaration::Extends(caps.get(1)?.as_str()));
    }
    if let Some(name) = declared_function(code) {
        return Some(Declaration::Function(name));
    }
    if let Some(caps) = cached(&VARIABLE_REGEX, VARIABLE_PATTERN).captures(code) {
        return Some(Declaration::Variable(caps.get(1)?.as_str()));
    }
    if let Some(caps) = cached(&SIGNAL_REGEX, SIGNAL_PATTERN).captures(code) {
        return Some(Declaration::Signal(caps.get(1)?.as_str()));
    }
    None
}

/// Name of the function whose header is `code`, if it is one.
pub fn declared_function(code: &str) -> Option<&str> {
    cached(&FUNCTION_REGEX, FUNCTION_PATTERN)
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// True when `code` holds annotations and nothing they apply to.
///
/// Such a statement annotates the declaration on the next statement.
pub fn is_standalone_annotation(code: &str) -> bool {
    cached(&ANNOTATION_REGEX, ANNOTATION_PATTERN).is_match(code)
}

/// Checks that `name` is a GDScript identifier.
pub fn validate_identifier(name: &str, what: &str) -> Result<(), PatchError> {
    if name.is_empty() {
        return Err(PatchError::invalid(format!("{what} cannot be empty")));
    }
    if !cached(&IDENTIFIER_REGEX, IDENTIFIER_PATTERN).is_match(name) {
        return Err(PatchError::invalid(format!(
            "{what} '{name}' is not a valid identifier"
        )));
    }
    Ok(())
}

/// Top-level overview of a script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScriptSummary {
    pub extends: Option<String>,
    pub class_name: Option<String>,
    pub functions: Vec<String>,
    pub variables: Vec<String>,
    pub signals: Vec<String>,
}

/// Summarizes the top-level declarations of `source`.
///
/// Members of inner classes, string contents, and continuation lines are not
/// reported. Malformed sources are summarized as far as the scanner can follow them.
pub fn analyze(source: &str) -> ScriptSummary {
    let scanned = ScannedSource::new(source);
    let mut summary = ScriptSummary::default();

    for index in scanned.top_level_statements() {
        match classify(scanned.code(index)) {
            Some(Declaration::Extends(base)) => {
                summary.extends.get_or_insert_with(|| base.to_string());
            }
            Some(Declaration::ClassName { name, extends }) => {
                summary.class_name.get_or_insert_with(|| name.to_string());
                if let Some(base) = extends {
                    summary.extends.get_or_insert_with(|| base.to_string());
                }
            }
            Some(Declaration::Function(name)) => summary.functions.push(name.to_string()),
            Some(Declaration::Variable(name)) => summary.variables.push(name.to_string()),
            Some(Declaration::Signal(name)) => summary.signals.push(name.to_string()),
            None => {}
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recognizes_standalone_annotations() {
        assert!(is_standalone_annotation("@rpc"));
        assert!(is_standalone_annotation("@rpc(\"any_peer\", \"call_local\")"));
        assert!(is_standalone_annotation("@warning_ignore(\"unused\") @onready"));
        assert!(is_standalone_annotation("@export_range(0, max(1, 2))"));

        assert!(!is_standalone_annotation("@export var speed = 10"));
        assert!(!is_standalone_annotation("@export_range(0, 10) var hp = clamp(x)"));
        assert!(!is_standalone_annotation("@rpc func sync():"));
        assert!(!is_standalone_annotation("func a():"));
    }

    #[test]
    fn classifies_declarations() {
        assert_eq!(classify("extends Node2D"), Some(Declaration::Extends("Node2D")));
        assert_eq!(
            classify("extends \"res://base.gd\""),
            Some(Declaration::Extends("\"res://base.gd\""))
        );
        assert_eq!(
            classify("class_name Player extends CharacterBody2D"),
            Some(Declaration::ClassName {
                name: "Player",
                extends: Some("CharacterBody2D"),
            })
        );
        assert_eq!(
            classify("class_name Enemy, \"res://enemy.svg\""),
            Some(Declaration::ClassName {
                name: "Enemy",
                extends: None,
            })
        );
        assert_eq!(
            classify("static func make() -> Player:"),
            Some(Declaration::Function("make"))
        );
        assert_eq!(
            classify("@rpc(\"any_peer\") func sync_state(state):"),
            Some(Declaration::Function("sync_state"))
        );
        assert_eq!(
            classify("@export var speed: float = 200.0"),
            Some(Declaration::Variable("speed"))
        );
        assert_eq!(
            classify("@onready var sprite = $Sprite2D"),
            Some(Declaration::Variable("sprite"))
        );
        assert_eq!(
            classify("signal health_changed(value)"),
            Some(Declaration::Signal("health_changed"))
        );
        assert_eq!(classify("const MAX = 3"), None);
        assert_eq!(classify("function_call()"), None);
    }

    #[test]
    fn function_names_are_whole_identifiers() {
        assert_eq!(declared_function("func run_fast():"), Some("run_fast"));
        assert_eq!(declared_function("func run ():"), Some("run"));
        assert_eq!(declared_function("funcrun():"), None);
    }

    #[test]
    fn identifiers() {
        assert!(validate_identifier("_ready", "function name").is_ok());
        assert!(validate_identifier("jump2", "function name").is_ok());
        assert!(validate_identifier("sprünge", "function name").is_ok());

        for bad in ["", "2fast", "run fast", "run-fast", "run("] {
            let err = validate_identifier(bad, "function name").unwrap_err();
            assert_eq!(err.code(), "P001", "expected rejection for {bad:?}");
        }
    }

    #[test]
    fn summarizes_top_level_declarations() {
        let source = r#"extends CharacterBody2D
class_name Player

signal died
@export var speed := 300.0
var health = 100 # starting health

func _ready():
	var local = 1
	print("func not_a_function():")

static func spawn():
	pass

class Inner:
	var hidden
	func inner_method():
		pass
"#;
        let summary = analyze(source);
        assert_eq!(
            summary,
            ScriptSummary {
                extends: Some("CharacterBody2D".into()),
                class_name: Some("Player".into()),
                functions: vec!["_ready".into(), "spawn".into()],
                variables: vec!["speed".into(), "health".into()],
                signals: vec!["died".into()],
            }
        );
    }

    #[test]
    fn ignores_declarations_inside_multiline_strings() {
        let source = "const HELP = \"\"\"\nfunc hidden():\nvar nope\n\"\"\"\nfunc shown():\n\tpass\n";
        let summary = analyze(source);
        assert_eq!(summary.functions, vec!["shown".to_string()]);
        assert!(summary.variables.is_empty());
    }

    #[test]
    fn summary_serializes_with_null_for_missing_fields() {
        let json = serde_json::to_value(analyze("func a():\n\tpass\n")).unwrap();
        assert_eq!(json["extends"], serde_json::Value::Null);
        assert_eq!(json["functions"], serde_json::json!(["a"]));
    }
}
