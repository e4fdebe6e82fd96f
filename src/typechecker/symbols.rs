//!
//! Declarations and Environment
//!
//! This module manages the declaration environment for type checking. It
//! stores:
//!
//! - Identifier declarations (name, type, optional constant value)
//! - Function declarations, each a list of overloads
//!
//! The environment is a stack of scopes. The root scope holds everything
//! declared before a check begins and is only read while checking; inner
//! scopes exist solely for comprehension variables, pushed when the walker
//! enters a comprehension and popped when it leaves.
//!
//! Lookup is container-qualified: for name `N` under container `a.b.c` the
//! candidates `a.b.c.N`, `a.b.N`, `a.N`, `N` are tried in that order, and
//! each candidate is searched from the innermost scope outward. The first
//! hit wins.
//!
//! The environment also owns the string interner that every `Spur` in the
//! tree and the declaration tables resolve against, plus the type provider
//! consulted for object fields.
//!

use std::collections::HashMap;

use lasso::{Rodeo, Spur};

use crate::ast::Literal;

use super::provider::TypeProvider;
use super::types::Type;

#[derive(Debug, Clone, PartialEq)]
pub struct IdentDecl {
    pub name: Spur,
    pub ty: Type,
    pub value: Option<Literal>,
}

/// One concrete signature of a function. `type_params` lists the names the
/// overload quantifies over; by contract they never begin with `_`, which
/// is reserved for the checker's fresh variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Overload {
    pub id: Spur,
    pub type_params: Vec<Spur>,
    pub params: Vec<Type>,
    pub result: Type,
    pub is_instance: bool,
}

impl Overload {
    pub fn new(id: Spur, params: Vec<Type>, result: Type) -> Self {
        Self {
            id,
            type_params: Vec::new(),
            params,
            result,
            is_instance: false,
        }
    }

    pub fn generic(id: Spur, type_params: Vec<Spur>, params: Vec<Type>, result: Type) -> Self {
        Self {
            id,
            type_params,
            params,
            result,
            is_instance: false,
        }
    }

    /// Mark the overload as instance style; its first parameter is the
    /// receiver.
    pub fn instance(mut self) -> Self {
        self.is_instance = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Spur,
    pub overloads: Vec<Overload>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Ident(IdentDecl),
    Function(FunctionDecl),
}

impl Decl {
    pub fn ident(name: Spur, ty: Type) -> Self {
        Decl::Ident(IdentDecl {
            name,
            ty,
            value: None,
        })
    }

    pub fn constant(name: Spur, ty: Type, value: Literal) -> Self {
        Decl::Ident(IdentDecl {
            name,
            ty,
            value: Some(value),
        })
    }

    pub fn function(name: Spur, overloads: Vec<Overload>) -> Self {
        Decl::Function(FunctionDecl { name, overloads })
    }
}

#[derive(Default)]
struct Scope {
    idents: HashMap<Spur, IdentDecl>,
    functions: HashMap<Spur, FunctionDecl>,
}

pub struct Env {
    interner: Rodeo,
    provider: Box<dyn TypeProvider>,
    scopes: Vec<Scope>,
}

impl Env {
    pub fn new(provider: Box<dyn TypeProvider>) -> Self {
        Self {
            interner: Rodeo::default(),
            provider,
            scopes: vec![Scope::default()],
        }
    }

    pub fn intern(&mut self, name: &str) -> Spur {
        self.interner.get_or_intern(name)
    }

    pub fn resolve(&self, name: Spur) -> &str {
        self.interner.resolve(&name)
    }

    pub fn provider(&self) -> &dyn TypeProvider {
        self.provider.as_ref()
    }

    /// Install a declaration into the innermost scope. A function declared
    /// under a name already present in that scope contributes its overloads
    /// to the existing declaration.
    pub fn add(&mut self, decl: Decl) {
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        match decl {
            Decl::Ident(ident) => {
                scope.idents.insert(ident.name, ident);
            }
            Decl::Function(function) => match scope.functions.get_mut(&function.name) {
                Some(existing) => existing.overloads.extend(function.overloads),
                None => {
                    scope.functions.insert(function.name, function);
                }
            },
        }
    }

    pub fn lookup_ident(&self, container: &str, name: &str) -> Option<IdentDecl> {
        self.lookup(container, name, |scope, key| scope.idents.get(&key).cloned())
    }

    pub fn lookup_function(&self, container: &str, name: &str) -> Option<FunctionDecl> {
        self.lookup(container, name, |scope, key| scope.functions.get(&key).cloned())
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn lookup<T>(
        &self,
        container: &str,
        name: &str,
        select: impl Fn(&Scope, Spur) -> Option<T>,
    ) -> Option<T> {
        for candidate in candidates(container, name) {
            // A name never interned cannot have been declared.
            let Some(key) = self.interner.get(&candidate) else {
                continue;
            };
            for scope in self.scopes.iter().rev() {
                if let Some(found) = select(scope, key) {
                    return Some(found);
                }
            }
        }
        None
    }
}

/// Qualified-name search order: the container prefix is peeled one segment
/// at a time, ending with the bare name.
fn candidates(container: &str, name: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut prefix = container;
    while !prefix.is_empty() {
        out.push(format!("{}.{}", prefix, name));
        prefix = match prefix.rfind('.') {
            Some(dot) => &prefix[..dot],
            None => "",
        };
    }
    out.push(name.to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typechecker::provider::MessageRegistry;

    fn test_env() -> Env {
        Env::new(Box::new(MessageRegistry::new()))
    }

    #[test]
    fn test_candidate_order() {
        assert_eq!(
            candidates("a.b.c", "N"),
            vec!["a.b.c.N", "a.b.N", "a.N", "N"]
        );
        assert_eq!(candidates("", "N"), vec!["N"]);
    }

    #[test]
    fn test_qualified_lookup_prefers_deepest_container() {
        let mut env = test_env();
        let deep = env.intern("a.b.x");
        let shallow = env.intern("a.x");
        env.add(Decl::ident(deep, Type::Int64));
        env.add(Decl::ident(shallow, Type::String));

        let found = env.lookup_ident("a.b", "x").unwrap();
        assert_eq!(found.name, deep);
        assert_eq!(found.ty, Type::Int64);

        let found = env.lookup_ident("a", "x").unwrap();
        assert_eq!(found.name, shallow);
    }

    #[test]
    fn test_lookup_falls_back_to_bare_name() {
        let mut env = test_env();
        let x = env.intern("x");
        env.add(Decl::ident(x, Type::Bool));

        assert!(env.lookup_ident("a.b.c", "x").is_some());
        assert!(env.lookup_ident("a.b.c", "y").is_none());
    }

    #[test]
    fn test_candidate_order_dominates_scopes() {
        let mut env = test_env();
        let qualified = env.intern("a.x");
        let bare = env.intern("x");
        env.add(Decl::ident(qualified, Type::Int64));
        env.push_scope();
        env.add(Decl::ident(bare, Type::String));

        // The container-qualified root declaration wins over the scoped
        // bare name.
        let found = env.lookup_ident("a", "x").unwrap();
        assert_eq!(found.name, qualified);
    }

    #[test]
    fn test_scope_shadowing_and_exit() {
        let mut env = test_env();
        let x = env.intern("x");
        env.add(Decl::ident(x, Type::Int64));

        env.push_scope();
        env.add(Decl::ident(x, Type::String));
        assert_eq!(env.lookup_ident("", "x").unwrap().ty, Type::String);

        env.pop_scope();
        assert_eq!(env.lookup_ident("", "x").unwrap().ty, Type::Int64);
    }

    #[test]
    fn test_root_scope_never_pops() {
        let mut env = test_env();
        let x = env.intern("x");
        env.add(Decl::ident(x, Type::Int64));
        env.pop_scope();
        assert!(env.lookup_ident("", "x").is_some());
    }

    #[test]
    fn test_function_overloads_merge() {
        let mut env = test_env();
        let size = env.intern("size");
        let size_string = env.intern("size_string");
        let size_bytes = env.intern("size_bytes");

        env.add(Decl::function(
            size,
            vec![Overload::new(size_string, vec![Type::String], Type::Int64)],
        ));
        env.add(Decl::function(
            size,
            vec![Overload::new(size_bytes, vec![Type::Bytes], Type::Int64)],
        ));

        let decl = env.lookup_function("", "size").unwrap();
        assert_eq!(decl.overloads.len(), 2);
        assert_eq!(decl.overloads[0].id, size_string);
        assert_eq!(decl.overloads[1].id, size_bytes);
    }

    #[test]
    fn test_constant_keeps_value() {
        let mut env = test_env();
        let answer = env.intern("answer");
        env.add(Decl::constant(answer, Type::Int64, Literal::Int64(42)));

        let decl = env.lookup_ident("", "answer").unwrap();
        assert_eq!(decl.value, Some(Literal::Int64(42)));
    }
}
