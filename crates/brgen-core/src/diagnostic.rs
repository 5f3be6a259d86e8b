//! Located diagnostics and the tolerant-mode error reporter

use std::fmt::Write;

use crate::lexer::{LineIndex, Loc};
use crate::parser::{ParseError, ParseResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
        })
    }
}

/// A message tied to a source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub loc: Loc,
    pub message: String,
    pub hint: Option<String>,
    /// Secondary locations, e.g. a previous definition
    pub related: Vec<(Loc, String)>,
}

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        Self {
            severity: Severity::Error,
            loc: err.loc,
            message: err.kind.to_string(),
            hint: err.hint.clone(),
            related: err
                .related()
                .map(|(loc, note)| (loc, note.to_string()))
                .into_iter()
                .collect(),
        }
    }
}

impl Diagnostic {
    /// Render with the offending line and a caret underline
    #[must_use]
    pub fn render(&self, source: &str, file_name: &str) -> String {
        let index = LineIndex::new(source);
        let mut out = format!("{}: {}\n", self.severity, self.message);
        write_snippet(&mut out, &index, source, file_name, self.loc);
        if let Some(hint) = &self.hint {
            let _ = writeln!(out, "  = hint: {hint}");
        }
        for (loc, note) in &self.related {
            let _ = writeln!(out, "note: {note}");
            write_snippet(&mut out, &index, source, file_name, *loc);
        }
        out
    }
}

fn write_snippet(out: &mut String, index: &LineIndex, source: &str, file_name: &str, loc: Loc) {
    let _ = writeln!(out, " --> {file_name}:{}:{}", loc.line, loc.column);
    let Some(text) = index.line_text(source, loc.line) else {
        return;
    };
    let gutter = loc.line.to_string().len();
    let width = if loc.span.is_dummy() {
        1
    } else {
        source
            .get(loc.span.as_range())
            .map_or(1, |s| s.chars().count().max(1))
    };
    let _ = writeln!(out, "{:gutter$} |", "");
    let _ = writeln!(out, "{} | {}", loc.line, text);
    let _ = writeln!(
        out,
        "{:gutter$} | {:pad$}{}",
        "",
        "",
        "^".repeat(width),
        pad = loc.column.saturating_sub(1) as usize
    );
}

/// Decides whether an error aborts the parse or is recorded
#[derive(Debug, Default)]
pub struct Reporter {
    tolerant: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Reporter {
    #[must_use]
    pub fn new(tolerant: bool) -> Self {
        Self {
            tolerant,
            diagnostics: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_tolerant(&self) -> bool {
        self.tolerant
    }

    /// Record `err` when tolerant and recoverable, otherwise hand it back
    pub fn recover(&mut self, err: ParseError) -> ParseResult<()> {
        if self.tolerant && err.is_recoverable() {
            self.record(&err);
            Ok(())
        } else {
            Err(err)
        }
    }

    pub fn record(&mut self, err: &ParseError) {
        log::debug!("[record parse error] {err}");
        self.diagnostics.push(Diagnostic::from(err));
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOp;
    use crate::lexer::{Location, Span};
    use crate::parser::ParseErrorKind;

    fn loc(line: u32, column: u32, start: u32, end: u32) -> Loc {
        Loc::new(0, Location::new(line, column), Span::new(start, end))
    }

    #[test]
    fn render_points_at_both_definitions() {
        let source = "x := 1\nx := 2\n";
        let err = ParseError::new(
            ParseErrorKind::DuplicateDefinition {
                name: "x".to_string(),
                previous: loc(1, 1, 0, 1),
            },
            loc(2, 1, 7, 8),
        );
        let text = Diagnostic::from(&err).render(source, "main.bgn");
        assert!(text.starts_with("error: duplicate definition of `x`\n --> main.bgn:2:1\n"));
        assert!(text.contains("2 | x := 2\n  | ^\n"));
        assert!(text.contains("note: previous definition is here\n --> main.bgn:1:1\n"));
    }

    #[test]
    fn tolerant_reporter_records_recoverable_errors() {
        let mut reporter = Reporter::new(true);
        let err = ParseError::new(
            ParseErrorKind::InvalidAssignmentTarget {
                op: BinaryOp::DefineAssign,
            },
            Loc::default(),
        );
        assert!(reporter.recover(err).is_ok());
        assert_eq!(reporter.diagnostics().len(), 1);

        let fatal = ParseError::new(ParseErrorKind::InvalidRangeChain, Loc::default());
        assert!(reporter.recover(fatal).is_err());
        assert_eq!(reporter.diagnostics().len(), 1);
    }

    #[test]
    fn strict_reporter_propagates() {
        let mut reporter = Reporter::new(false);
        let err = ParseError::new(
            ParseErrorKind::InvalidAssignmentTarget {
                op: BinaryOp::Assign,
            },
            Loc::default(),
        );
        assert!(reporter.recover(err).is_err());
        assert!(reporter.into_diagnostics().is_empty());
    }
}
