//!
//! Abstract Syntax Tree Module
//!
//! This module defines the expression tree the checker consumes. The parser
//! producing it is an external collaborator; the constructors here are the
//! contract for anything that builds sift expressions, including the test
//! suites.
//!
//! Every node carries a stable unique integer id. The checker keys its
//! output tables (types, references) and the parser keys source positions
//! by that id, so ids must not repeat within one expression tree.
//!
//! Identifier, field, and function names are interned `lasso` symbols;
//! the `Env` owns the interner they resolve against.
//!

use lasso::Spur;

use crate::source::SourceInfo;

pub type ExprId = i64;

/// A parsed expression together with the position table the parser built
/// for it. This is the unit of input to `typechecker::check`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExpr {
    pub expr: Expr,
    pub source_info: SourceInfo,
}

impl ParsedExpr {
    pub fn new(expr: Expr) -> Self {
        Self {
            expr,
            source_info: SourceInfo::new(),
        }
    }

    pub fn with_source_info(mut self, source_info: SourceInfo) -> Self {
        self.source_info = source_info;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Ident(Spur),
    Select(SelectExpr),
    Call(CallExpr),
    List(ListExpr),
    Struct(StructExpr),
    Comprehension(ComprehensionExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Bytes(Vec<u8>),
    Double(f64),
    Int64(i64),
    Null,
    String(String),
    Uint64(u64),
}

/// Field access `operand.field`. With `test_only` set the node is the
/// presence test form `has(operand.field)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpr {
    pub operand: Box<Expr>,
    pub field: Spur,
    pub test_only: bool,
}

/// A function call. `target` distinguishes instance style `x.f(y)` from
/// global style `f(x, y)`; a target that spells a qualified name may
/// instead resolve to a namespaced global function.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub target: Option<Box<Expr>>,
    pub function: Spur,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListExpr {
    pub elements: Vec<Expr>,
}

/// A struct literal: a message construction when `message_name` is set,
/// otherwise a map literal.
#[derive(Debug, Clone, PartialEq)]
pub struct StructExpr {
    pub message_name: Option<Spur>,
    pub entries: Vec<Entry>,
}

/// One initializer entry. Entries carry their own id so diagnostics can
/// point at the entry rather than the whole literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: ExprId,
    pub key: EntryKey,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryKey {
    Field(Spur),
    MapKey(Expr),
}

/// The desugared loop form: fold `iter_range` into `accu_var`, starting
/// from `accu_init`, stepping with `loop_step` while `loop_condition`
/// holds, then evaluate `result` with only the accumulator in scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ComprehensionExpr {
    pub iter_range: Box<Expr>,
    pub iter_var: Spur,
    pub accu_var: Spur,
    pub accu_init: Box<Expr>,
    pub loop_condition: Box<Expr>,
    pub loop_step: Box<Expr>,
    pub result: Box<Expr>,
}

impl Expr {
    pub fn new(id: ExprId, kind: ExprKind) -> Self {
        Self { id, kind }
    }

    pub fn literal(id: ExprId, value: Literal) -> Self {
        Self::new(id, ExprKind::Literal(value))
    }

    pub fn ident(id: ExprId, name: Spur) -> Self {
        Self::new(id, ExprKind::Ident(name))
    }

    pub fn select(id: ExprId, operand: Expr, field: Spur) -> Self {
        Self::new(
            id,
            ExprKind::Select(SelectExpr {
                operand: Box::new(operand),
                field,
                test_only: false,
            }),
        )
    }

    /// The `has(operand.field)` form.
    pub fn presence_test(id: ExprId, operand: Expr, field: Spur) -> Self {
        Self::new(
            id,
            ExprKind::Select(SelectExpr {
                operand: Box::new(operand),
                field,
                test_only: true,
            }),
        )
    }

    pub fn call(id: ExprId, function: Spur, args: Vec<Expr>) -> Self {
        Self::new(
            id,
            ExprKind::Call(CallExpr {
                target: None,
                function,
                args,
            }),
        )
    }

    pub fn member_call(id: ExprId, target: Expr, function: Spur, args: Vec<Expr>) -> Self {
        Self::new(
            id,
            ExprKind::Call(CallExpr {
                target: Some(Box::new(target)),
                function,
                args,
            }),
        )
    }

    pub fn list(id: ExprId, elements: Vec<Expr>) -> Self {
        Self::new(id, ExprKind::List(ListExpr { elements }))
    }

    pub fn map(id: ExprId, entries: Vec<Entry>) -> Self {
        Self::new(
            id,
            ExprKind::Struct(StructExpr {
                message_name: None,
                entries,
            }),
        )
    }

    pub fn message(id: ExprId, message_name: Spur, entries: Vec<Entry>) -> Self {
        Self::new(
            id,
            ExprKind::Struct(StructExpr {
                message_name: Some(message_name),
                entries,
            }),
        )
    }

    pub fn comprehension(id: ExprId, comp: ComprehensionExpr) -> Self {
        Self::new(id, ExprKind::Comprehension(comp))
    }
}

impl Entry {
    pub fn field(id: ExprId, field: Spur, value: Expr) -> Self {
        Self {
            id,
            key: EntryKey::Field(field),
            value,
        }
    }

    pub fn keyed(id: ExprId, key: Expr, value: Expr) -> Self {
        Self {
            id,
            key: EntryKey::MapKey(key),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lasso::Rodeo;

    #[test]
    fn test_constructors_assign_ids() {
        let mut rodeo = Rodeo::default();
        let x = rodeo.get_or_intern("x");
        let f = rodeo.get_or_intern("f");

        let expr = Expr::member_call(3, Expr::ident(1, x), f, vec![Expr::literal(2, Literal::Int64(1))]);
        assert_eq!(expr.id, 3);
        let ExprKind::Call(call) = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(call.target.as_ref().map(|t| t.id), Some(1));
        assert_eq!(call.args[0].id, 2);
    }

    #[test]
    fn test_presence_test_sets_flag() {
        let mut rodeo = Rodeo::default();
        let x = rodeo.get_or_intern("x");
        let field = rodeo.get_or_intern("field");

        let expr = Expr::presence_test(2, Expr::ident(1, x), field);
        let ExprKind::Select(select) = &expr.kind else {
            panic!("expected select");
        };
        assert!(select.test_only);
        assert_eq!(select.field, field);
    }

    #[test]
    fn test_parsed_expr_with_source_info() {
        let mut rodeo = Rodeo::default();
        let x = rodeo.get_or_intern("x");

        let mut info = SourceInfo::new();
        info.add_position(1, 7);
        let parsed = ParsedExpr::new(Expr::ident(1, x)).with_source_info(info);
        assert_eq!(parsed.source_info.position(1), Some(7));
    }
}
