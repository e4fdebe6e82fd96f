//!
//! Type Checker Module
//!
//! This module provides type checking for parsed sift expressions. The
//! checker:
//!
//! 1. Walks the expression tree depth-first, left to right
//! 2. Resolves identifiers and functions against the declaration
//!    environment under a container namespace
//! 3. Unifies argument and parameter types through a substitution store,
//!    instantiating overload type parameters per call site
//! 4. Records a type for every visited node and a reference for every
//!    resolved name, then collapses unresolved type variables to dyn
//! 5. Collects diagnostics with source locations; checking never aborts on
//!    a user error
//!
//! Entry point: the `check()` function takes a parsed expression, a mutable
//! environment (comprehensions push scopes onto it), and a container name,
//! and returns the annotated tree together with the collected diagnostics.
//!
//! All per-invocation state lives in the `Checker` value created by
//! `check()` and dropped at exit; the environment's root declarations are
//! only read. Concurrent checks need separate environments.
//!

pub mod error;
pub mod infer;
pub mod overload;
pub mod provider;
pub mod symbols;
pub mod typed_ast;
pub mod types;
pub mod unify;

use indexmap::IndexMap;
use lasso::Spur;

use crate::ast::{Expr, ExprId, ParsedExpr};
use crate::source::{Location, SourceInfo};

pub use error::TypeError;
pub use provider::{FieldType, MessageRegistry, ObjectType, TypeProvider};
pub use symbols::{Decl, Env, FunctionDecl, IdentDecl, Overload};
pub use typed_ast::{CheckResult, CheckedExpr, Reference};
pub use types::{Kind, Type, WellKnownKind};
pub use unify::Mapping;

use unify::{is_assignable, is_assignable_list, most_general, substitute};

pub struct Checker<'a> {
    env: &'a mut Env,
    container: String,
    mappings: Mapping,
    free_type_var_counter: u32,
    source_info: &'a SourceInfo,
    types: IndexMap<ExprId, Type>,
    references: IndexMap<ExprId, Reference>,
    errors: Vec<TypeError>,
}

/// Type check a parsed expression against the environment, resolving names
/// under `container` (a dotted namespace prefix, possibly empty).
pub fn check(parsed: &ParsedExpr, env: &mut Env, container: &str) -> CheckResult {
    let mut checker = Checker {
        env,
        container: container.to_string(),
        mappings: Mapping::new(),
        free_type_var_counter: 0,
        source_info: &parsed.source_info,
        types: IndexMap::new(),
        references: IndexMap::new(),
        errors: Vec::new(),
    };
    checker.check_expr(&parsed.expr);

    // Walk the recorded types substituting every type parameter by its
    // bound value, or by dyn when it never got one.
    let types = checker
        .types
        .iter()
        .map(|(id, ty)| (*id, substitute(&checker.mappings, ty, true)))
        .collect();

    CheckResult {
        checked: CheckedExpr {
            expr: parsed.expr.clone(),
            source_info: parsed.source_info.clone(),
            types,
            references: checker.references,
        },
        errors: checker.errors,
    }
}

impl<'a> Checker<'a> {
    fn set_type(&mut self, expr: &Expr, ty: Type) {
        if let Some(existing) = self.types.get(&expr.id) {
            // A rewrite to a different type is a walker bug, not a user
            // error.
            assert_eq!(
                existing, &ty,
                "conflicting type recorded for expression {}",
                expr.id
            );
        }
        self.types.insert(expr.id, ty);
    }

    fn get_type(&self, expr: &Expr) -> Type {
        self.types
            .get(&expr.id)
            .cloned()
            .expect("expression was not type-checked before use")
    }

    fn set_reference(&mut self, expr: &Expr, reference: Reference) {
        if let Some(existing) = self.references.get(&expr.id) {
            assert_eq!(
                existing, &reference,
                "conflicting reference recorded for expression {}",
                expr.id
            );
        }
        self.references.insert(expr.id, reference);
    }

    fn new_type_var(&mut self) -> Type {
        let id = self.free_type_var_counter;
        self.free_type_var_counter += 1;
        // User type parameters never begin with an underscore, so these
        // names cannot collide.
        Type::TypeParam(self.env.intern(&format!("_var{}", id)))
    }

    /// Assignability against the checker's store; a successful test commits
    /// the extended store.
    fn is_assignable(&mut self, src: &Type, dst: &Type) -> bool {
        match is_assignable(&self.mappings, src, dst) {
            Some(extended) => {
                self.mappings = extended;
                true
            }
            None => false,
        }
    }

    fn is_assignable_list(&mut self, src: &[Type], dst: &[Type]) -> bool {
        match is_assignable_list(&self.mappings, src, dst) {
            Some(extended) => {
                self.mappings = extended;
                true
            }
            None => false,
        }
    }

    fn assert_type(&mut self, expr: &Expr, expected: &Type) {
        let actual = self.get_type(expr);
        if !self.is_assignable(expected, &actual) {
            let location = self.location(expr);
            let error = TypeError::TypeMismatch {
                expected: self.format_type(expected),
                actual: self.format_type(&actual),
                location,
            };
            self.errors.push(error);
        }
    }

    /// Fold one more element type into an aggregate: the first element
    /// stands, later ones must be assignable to it and may widen it to the
    /// most general common type.
    fn join_types(&mut self, location: Location, previous: Option<Type>, current: Type) -> Type {
        let Some(previous) = previous else {
            return current;
        };
        if !self.is_assignable(&previous, &current) {
            let error = TypeError::AggregateTypeMismatch {
                previous: self.format_type(&previous),
                current: self.format_type(&current),
                location,
            };
            self.errors.push(error);
            return previous;
        }
        most_general(&previous, &current)
    }

    fn location(&self, expr: &Expr) -> Location {
        self.location_of(expr.id)
    }

    fn location_of(&self, id: ExprId) -> Location {
        self.source_info.location(id)
    }

    /// Field resolution through the provider. A message the provider cannot
    /// resolve at all means the declaration environment disagrees with the
    /// object system, which gets its own diagnostic.
    fn lookup_field_type(&mut self, location: Location, message: Spur, field: Spur) -> Option<FieldType> {
        let message_name = self.env.resolve(message).to_string();
        if self.env.provider().lookup_type(&message_name).is_none() {
            self.errors.push(TypeError::UnexpectedFailedResolution {
                name: message_name,
                location,
            });
            return None;
        }
        let field_name = self.env.resolve(field).to_string();
        if let Some(field_type) = self.env.provider().lookup_field_type(&message_name, &field_name) {
            return Some(field_type);
        }
        self.errors.push(TypeError::UndefinedField {
            field: field_name,
            location,
        });
        None
    }

    /// Render a type for diagnostics, resolving interned names.
    fn format_type(&self, ty: &Type) -> String {
        match ty {
            Type::Error => "*error*".to_string(),
            Type::Dyn => "dyn".to_string(),
            Type::Null => "null".to_string(),
            Type::Bool => "bool".to_string(),
            Type::Int64 => "int".to_string(),
            Type::Uint64 => "uint".to_string(),
            Type::Double => "double".to_string(),
            Type::String => "string".to_string(),
            Type::Bytes => "bytes".to_string(),
            Type::List(elem) => format!("list<{}>", self.format_type(elem)),
            Type::Map(key, value) => {
                format!("map<{}, {}>", self.format_type(key), self.format_type(value))
            }
            Type::Object(name) => self.env.resolve(*name).to_string(),
            Type::Type(inner) => format!("type<{}>", self.format_type(inner)),
            Type::TypeParam(name) => self.env.resolve(*name).to_string(),
            Type::Function(func) => {
                let params = func
                    .params
                    .iter()
                    .map(|p| self.format_type(p))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("fn({}) -> {}", params, self.format_type(&func.result))
            }
            Type::WellKnown(kind) => format!("wrapper<{}>", self.format_type(&kind.primitive())),
        }
    }
}
