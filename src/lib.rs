///
/// siftc - The sift Expression Type Checker
///
/// This crate provides static type checking for sift, a small
/// side-effect-free expression language used for policy, validation, and
/// attribute-based filtering. It includes:
///
/// - source: node positions, line/column resolution
/// - ast: expression tree definitions and construction helpers
/// - typechecker: the type system, declaration environment, unification,
///   overload resolution, and the checking walker
/// - diagnostic: miette-based rendering of collected errors
///
/// Entry points:
/// - `check`: type check a parsed expression against an environment
/// - `DiagnosticReporter`: render the collected errors with source context
///
/// Parsing and evaluation are external collaborators: the checker consumes
/// an already-built `ParsedExpr` and annotates it with types and resolved
/// references without executing anything.
///

pub mod ast;
pub mod diagnostic;
pub mod source;
pub mod typechecker;

// Interned symbols appear throughout the public API.
pub use lasso::Spur;

pub use ast::{Expr, ParsedExpr};
pub use diagnostic::DiagnosticReporter;
pub use source::{Location, SourceInfo};
pub use typechecker::{check, CheckResult, Env, Type, TypeError};

#[test]
fn test_check_condition_expression() {
    use ast::Literal;
    use typechecker::{Decl, MessageRegistry, Overload};

    // request.size >= 0u with `_>=_` declared over (uint, uint).
    let mut provider = MessageRegistry::new();
    provider.add_field("api.Request", "size", Type::Uint64, true);
    let mut env = Env::new(Box::new(provider));

    let request = env.intern("request");
    let request_type = env.intern("api.Request");
    let size = env.intern("size");
    let ge = env.intern("_>=_");
    let ge_uint64 = env.intern("greater_equals_uint64");

    env.add(Decl::ident(request, Type::Object(request_type)));
    env.add(Decl::function(
        ge,
        vec![Overload::new(ge_uint64, vec![Type::Uint64, Type::Uint64], Type::Bool)],
    ));

    let expr = Expr::call(
        3,
        ge,
        vec![
            Expr::select(2, Expr::ident(1, request), size),
            Expr::literal(4, Literal::Uint64(0)),
        ],
    );

    let result = check(&ParsedExpr::new(expr), &mut env, "");
    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    assert_eq!(result.checked.type_of(3), Some(&Type::Bool));
    assert_eq!(result.checked.type_of(2), Some(&Type::Uint64));
}
