//! Scanner tests.

use super::*;

fn kinds(source: &str) -> Vec<(LineKind, bool, usize)> {
    ScannedSource::new(source)
        .lines()
        .iter()
        .map(|line| (line.kind, line.continuation, line.indent))
        .collect()
}

#[test]
fn classifies_plain_lines() {
    let source = "extends Node\n\n# note\nfunc _ready():\n\tpass\n";
    assert_eq!(
        kinds(source),
        vec![
            (LineKind::Code, false, 0),
            (LineKind::Blank, false, 0),
            (LineKind::Comment, false, 0),
            (LineKind::Code, false, 0),
            (LineKind::Code, false, 1),
        ]
    );
}

#[test]
fn tracks_line_offsets() {
    let scanned = ScannedSource::new("a\r\nbb\nccc");
    let lines = scanned.lines();
    assert_eq!(lines.len(), 3);
    assert_eq!((lines[0].start, lines[0].content_end, lines[0].end), (0, 1, 3));
    assert_eq!((lines[1].start, lines[1].content_end, lines[1].end), (3, 5, 6));
    assert_eq!((lines[2].start, lines[2].content_end, lines[2].end), (6, 9, 9));
    assert_eq!(scanned.text(1), "bb");
    assert_eq!(scanned.line_at(4), Some(1));
    assert_eq!(scanned.line_at(9), None);
}

#[test]
fn detects_line_endings() {
    assert_eq!(ScannedSource::new("a\r\nb\r\n").line_ending(), LineEnding::CrLf);
    assert_eq!(ScannedSource::new("a\nb\r\n").line_ending(), LineEnding::Lf);
    assert_eq!(ScannedSource::new("no newline").line_ending(), LineEnding::Lf);
}

#[test]
fn open_brackets_continue_at_any_indent() {
    let source = "var items = [\n1,\n\t2,\n]\nfunc f():\n\tpass\n";
    let scanned = ScannedSource::new(source);
    assert!(scanned.check().is_ok());
    let continued: Vec<bool> = scanned.lines().iter().map(|l| l.continuation).collect();
    assert_eq!(continued, vec![false, true, true, true, false, false]);
    assert_eq!(scanned.top_level_statements().collect::<Vec<_>>(), vec![0, 4]);
    assert_eq!(scanned.statement_last_line(0), 3);
}

#[test]
fn triple_quoted_strings_hide_declarations() {
    let source = "func doc():\n\tvar text = \"\"\"\nfunc fake():\n# not a comment\n\"\"\"\n\treturn text\n";
    let scanned = ScannedSource::new(source);
    assert!(scanned.check().is_ok());
    assert_eq!(scanned.top_level_statements().collect::<Vec<_>>(), vec![0]);
    assert_eq!(scanned.lines()[3].kind, LineKind::Code);
    assert_eq!(scanned.unit_last_line(0), 5);
}

#[test]
fn backslash_continues_statement() {
    let scanned = ScannedSource::new("var total = 1 + \\\n2\nvar next = 3\n");
    assert!(scanned.lines()[1].continuation);
    assert!(!scanned.lines()[2].continuation);
}

#[test]
fn hash_inside_string_is_not_a_comment() {
    let scanned = ScannedSource::new("var tag = \"#fff\" # colour\n");
    assert_eq!(scanned.code(0), "var tag = \"#fff\"");
    assert_eq!(scanned.lines()[0].comment_start, Some(17));
}

#[test]
fn escaped_quotes_stay_inside_string() {
    let scanned = ScannedSource::new("var s = \"say \\\"hi\\\" (\"\nvar t = 1\n");
    assert!(scanned.check().is_ok());
    assert!(!scanned.lines()[1].continuation);
}

#[test]
fn unit_ends_at_next_column_zero_statement() {
    let source = "func a():\n\tif true:\n\t\tpass\n\n# trailing\n\nfunc b():\n\tpass\n";
    let scanned = ScannedSource::new(source);
    assert_eq!(scanned.unit_last_line(0), 2);
    assert_eq!(scanned.unit_last_line(6), 7);
}

#[test]
fn column_zero_comment_inside_body_is_kept() {
    let source = "func a():\n\tvar x = 1\n#\tdisabled()\n\treturn x\nfunc b():\n\tpass\n";
    let scanned = ScannedSource::new(source);
    assert_eq!(scanned.unit_last_line(0), 3);
}

#[test]
fn reports_unterminated_string() {
    let source = "func a():\n\tprint(\"oops)\n\tpass\n";
    let scanned = ScannedSource::new(source);
    assert_eq!(
        scanned.check(),
        Err(ScanError::UnterminatedString { line: 2 })
    );
}

#[test]
fn reports_unterminated_triple_string() {
    let scanned = ScannedSource::new("var s = \"\"\"\nnever closed\n");
    assert_eq!(
        scanned.check(),
        Err(ScanError::UnterminatedString { line: 1 })
    );
}

#[test]
fn reports_bracket_problems() {
    assert_eq!(
        ScannedSource::new("var a = [1, 2)\n").check(),
        Err(ScanError::UnmatchedBracket {
            line: 1,
            bracket: ')'
        })
    );
    assert_eq!(
        ScannedSource::new("var a = {\n\t\"k\": 1,\n").check(),
        Err(ScanError::UnclosedBracket {
            line: 1,
            bracket: '{'
        })
    );
}

#[test]
fn empty_source_has_no_lines() {
    let scanned = ScannedSource::new("");
    assert!(scanned.lines().is_empty());
    assert!(scanned.check().is_ok());
}
