//!
//! Checked Expression Output
//!
//! This module defines the annotated tree a check produces: the original
//! expression plus two side tables keyed by node id, one mapping every
//! visited node to its resolved type and one mapping identifiers, struct
//! literals, and calls to what they resolved to.
//!
//! The tables are insertion-ordered so downstream passes see nodes in
//! traversal order, and writes are once-only up to structural equality;
//! the checker asserts that invariant rather than recovering from it.
//!

use indexmap::IndexMap;
use lasso::Spur;

use crate::ast::{Expr, ExprId, Literal};
use crate::source::SourceInfo;

use super::error::TypeError;
use super::types::Type;

/// What a node resolved to: a declared identifier (with its constant value
/// when the declaration carries one), or the overload ids a call may
/// dispatch to at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    Ident {
        name: Spur,
        value: Option<Literal>,
    },
    Function {
        overload_ids: Vec<Spur>,
    },
}

impl Reference {
    pub fn ident(name: Spur, value: Option<Literal>) -> Self {
        Reference::Ident { name, value }
    }

    pub fn function(overload_id: Spur) -> Self {
        Reference::Function {
            overload_ids: vec![overload_id],
        }
    }

    pub fn push_overload(&mut self, overload_id: Spur) {
        if let Reference::Function { overload_ids } = self {
            overload_ids.push(overload_id);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckedExpr {
    pub expr: Expr,
    pub source_info: SourceInfo,
    pub types: IndexMap<ExprId, Type>,
    pub references: IndexMap<ExprId, Reference>,
}

impl CheckedExpr {
    pub fn type_of(&self, id: ExprId) -> Option<&Type> {
        self.types.get(&id)
    }

    pub fn reference_of(&self, id: ExprId) -> Option<&Reference> {
        self.references.get(&id)
    }
}

#[derive(Debug)]
pub struct CheckResult {
    pub checked: CheckedExpr,
    pub errors: Vec<TypeError>,
}

impl CheckResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lasso::Rodeo;

    #[test]
    fn test_function_reference_accumulates_overloads() {
        let mut rodeo = Rodeo::default();
        let first = rodeo.get_or_intern("add_int64");
        let second = rodeo.get_or_intern("add_double");

        let mut reference = Reference::function(first);
        reference.push_overload(second);
        assert_eq!(
            reference,
            Reference::Function {
                overload_ids: vec![first, second]
            }
        );
    }

    #[test]
    fn test_push_overload_ignores_ident_references() {
        let mut rodeo = Rodeo::default();
        let name = rodeo.get_or_intern("x");
        let overload = rodeo.get_or_intern("f_string");

        let mut reference = Reference::ident(name, None);
        reference.push_overload(overload);
        assert_eq!(reference, Reference::ident(name, None));
    }

    #[test]
    fn test_checked_expr_accessors() {
        let mut rodeo = Rodeo::default();
        let x = rodeo.get_or_intern("x");

        let mut types = IndexMap::new();
        types.insert(1, Type::Int64);
        let checked = CheckedExpr {
            expr: Expr::ident(1, x),
            source_info: SourceInfo::new(),
            types,
            references: IndexMap::new(),
        };
        assert_eq!(checked.type_of(1), Some(&Type::Int64));
        assert_eq!(checked.type_of(2), None);
        assert!(checked.reference_of(1).is_none());
    }
}
