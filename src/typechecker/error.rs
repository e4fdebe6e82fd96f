///
/// Type Checker Error Types
///
/// This module defines the diagnostics the checker collects. Checking is
/// non-fatal: every error is recorded with a source location, the offending
/// node is typed as the error sentinel, and the walk continues.
///
/// Error categories:
/// - UndeclaredReference: identifier or function not found under the container
/// - ExpressionDoesNotSelectField: presence test applied to a qualified name
/// - FieldDoesNotSupportPresenceCheck: `has()` on a field without presence
/// - TypeDoesNotSupportFieldSelection: selection on a non-object, non-map type
/// - NoMatchingOverload: no declared overload accepts the argument types
/// - NotAType / NotAMessageType: struct literal name misuse
/// - FieldTypeMismatch: initializer not assignable to the declared field
/// - UndefinedField: object has no such field
/// - UnexpectedFailedResolution: provider could not produce a resolved object
/// - AggregateTypeMismatch: incompatible element in a list or map literal
/// - NotAComprehensionRange: loop range is not a list, map, or dynamic
/// - TypeMismatch: general expectation failure (loop condition, loop step)
///
/// Rendered type names are resolved to strings when the error is built, so
/// diagnostics stay readable without the interner at hand.
///

use thiserror::Error;

use crate::source::Location;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    #[error("undeclared reference to '{name}' (in container '{container}')")]
    UndeclaredReference {
        container: String,
        name: String,
        location: Location,
    },

    #[error("expression does not select a field")]
    ExpressionDoesNotSelectField { location: Location },

    #[error("field '{field}' does not support presence checks")]
    FieldDoesNotSupportPresenceCheck { field: String, location: Location },

    #[error("type '{ty}' does not support field selection")]
    TypeDoesNotSupportFieldSelection { ty: String, location: Location },

    #[error("found no matching overload for '{name}' applied to '{args}'")]
    NoMatchingOverload {
        name: String,
        args: String,
        is_instance: bool,
        location: Location,
    },

    #[error("'{ty}' is not a type")]
    NotAType { ty: String, location: Location },

    #[error("'{ty}' is not a message type")]
    NotAMessageType { ty: String, location: Location },

    #[error("expected type of field '{field}' is '{expected}' but provided type is '{actual}'")]
    FieldTypeMismatch {
        field: String,
        expected: String,
        actual: String,
        location: Location,
    },

    #[error("undefined field '{field}'")]
    UndefinedField { field: String, location: Location },

    #[error("unexpected failed resolution of '{name}'")]
    UnexpectedFailedResolution { name: String, location: Location },

    #[error("type '{current}' does not match previous type '{previous}' in aggregate")]
    AggregateTypeMismatch {
        previous: String,
        current: String,
        location: Location,
    },

    #[error("expression of type '{ty}' cannot be the range of a comprehension")]
    NotAComprehensionRange { ty: String, location: Location },

    #[error("expected type '{expected}' but found '{actual}'")]
    TypeMismatch {
        expected: String,
        actual: String,
        location: Location,
    },
}

impl TypeError {
    pub fn location(&self) -> Location {
        match self {
            TypeError::UndeclaredReference { location, .. } => *location,
            TypeError::ExpressionDoesNotSelectField { location } => *location,
            TypeError::FieldDoesNotSupportPresenceCheck { location, .. } => *location,
            TypeError::TypeDoesNotSupportFieldSelection { location, .. } => *location,
            TypeError::NoMatchingOverload { location, .. } => *location,
            TypeError::NotAType { location, .. } => *location,
            TypeError::NotAMessageType { location, .. } => *location,
            TypeError::FieldTypeMismatch { location, .. } => *location,
            TypeError::UndefinedField { location, .. } => *location,
            TypeError::UnexpectedFailedResolution { location, .. } => *location,
            TypeError::AggregateTypeMismatch { location, .. } => *location,
            TypeError::NotAComprehensionRange { location, .. } => *location,
            TypeError::TypeMismatch { location, .. } => *location,
        }
    }
}
