//!
//! Diagnostic Module - Rich Error Reporting
//!
//! This module renders collected type errors with source context using
//! miette. Reports display line numbers, column positions, and source code
//! snippets.
//!
//! Usage:
//!   let reporter = DiagnosticReporter::new("policy.sift", source);
//!   reporter.report_all(&result.errors);
//!
//! The checker records line/column locations; the reporter owns the source
//! text and maps them back to byte offsets for span labeling.
//!

use miette::{Diagnostic, LabeledSpan, NamedSource, Report, SourceSpan};
use thiserror::Error;

use crate::source::Location;
use crate::typechecker::TypeError;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct CheckDiagnostic {
    message: String,
    src: NamedSource<String>,
    span: SourceSpan,
    label: String,
    help_text: Option<String>,
}

impl Diagnostic for CheckDiagnostic {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some(self.label.clone()),
            self.span,
        ))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.help_text
            .as_ref()
            .map(|h| Box::new(h.clone()) as Box<dyn std::fmt::Display>)
    }
}

fn type_error_details(err: &TypeError) -> (String, String, Option<String>) {
    match err {
        TypeError::UndeclaredReference { container, name, .. } => (
            format!("undeclared reference to '{}'", name),
            if container.is_empty() {
                "not found in any scope".to_string()
            } else {
                format!("not found under container '{}'", container)
            },
            Some("declare the identifier or function in the environment".to_string()),
        ),
        TypeError::ExpressionDoesNotSelectField { .. } => (
            "expression does not select a field".to_string(),
            "qualified name, not a field access".to_string(),
            Some("has() requires a field selection".to_string()),
        ),
        TypeError::FieldDoesNotSupportPresenceCheck { field, .. } => (
            format!("field '{}' does not support presence checks", field),
            "cannot be tested with has()".to_string(),
            None,
        ),
        TypeError::TypeDoesNotSupportFieldSelection { ty, .. } => (
            format!("type '{}' does not support field selection", ty),
            "not an object or map".to_string(),
            None,
        ),
        TypeError::NoMatchingOverload { name, args, is_instance, .. } => (
            format!("found no matching overload for '{}' applied to '{}'", name, args),
            if *is_instance {
                "no instance overload accepts these types".to_string()
            } else {
                "no overload accepts these types".to_string()
            },
            None,
        ),
        TypeError::NotAType { ty, .. } => (
            format!("'{}' is not a type", ty),
            "expected a type name".to_string(),
            None,
        ),
        TypeError::NotAMessageType { ty, .. } => (
            format!("'{}' is not a message type", ty),
            "expected a message name".to_string(),
            None,
        ),
        TypeError::FieldTypeMismatch { field, expected, actual, .. } => (
            format!(
                "expected type of field '{}' is '{}' but provided type is '{}'",
                field, expected, actual
            ),
            format!("expected {}", expected),
            None,
        ),
        TypeError::UndefinedField { field, .. } => (
            format!("undefined field '{}'", field),
            "no such field".to_string(),
            Some("check spelling against the message definition".to_string()),
        ),
        TypeError::UnexpectedFailedResolution { name, .. } => (
            format!("unexpected failed resolution of '{}'", name),
            "declared but unknown to the type provider".to_string(),
            None,
        ),
        TypeError::AggregateTypeMismatch { previous, current, .. } => (
            format!(
                "type '{}' does not match previous type '{}' in aggregate",
                current, previous
            ),
            format!("expected {}", previous),
            None,
        ),
        TypeError::NotAComprehensionRange { ty, .. } => (
            format!("expression of type '{}' cannot be the range of a comprehension", ty),
            "not iterable".to_string(),
            Some("iterate a list, a map, or a dynamic value".to_string()),
        ),
        TypeError::TypeMismatch { expected, actual, .. } => (
            format!("expected type '{}' but found '{}'", expected, actual),
            format!("expected {}", expected),
            None,
        ),
    }
}

pub struct DiagnosticReporter<'a> {
    name: &'a str,
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> DiagnosticReporter<'a> {
    pub fn new(name: &'a str, source: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (idx, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self {
            name,
            source,
            line_starts,
        }
    }

    pub fn diagnostic(&self, err: &TypeError) -> CheckDiagnostic {
        let location = err.location();
        let offset = self.offset_of(location);
        let (message, label, help_text) = type_error_details(err);

        CheckDiagnostic {
            message: format!("{} at {}", message, location),
            src: NamedSource::new(self.name, self.source.to_string()),
            span: (offset, usize::from(offset < self.source.len())).into(),
            label,
            help_text,
        }
    }

    pub fn report(&self, err: &TypeError) {
        let report = Report::new(self.diagnostic(err));
        eprintln!("{:?}", report);
    }

    pub fn report_all(&self, errors: &[TypeError]) {
        for err in errors {
            self.report(err);
        }
    }

    pub fn has_errors(errors: &[TypeError]) -> bool {
        !errors.is_empty()
    }

    // Locations store the distance from the line start, which on the first
    // line is the raw offset.
    fn offset_of(&self, location: Location) -> usize {
        if location.is_none() {
            return 0;
        }
        let line_start = self
            .line_starts
            .get(location.line as usize - 1)
            .copied()
            .unwrap_or(0);
        (line_start + location.column as usize).min(self.source.len())
    }
}
