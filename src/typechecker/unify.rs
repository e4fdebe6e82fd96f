//!
//! Assignability and Unification
//!
//! This module decides whether a source type is assignable to a target,
//! extending a substitution store as it goes. The store is threaded
//! functionally: callers get back an extended copy on success and keep
//! their original on failure, so a partially matched overload leaves no
//! trace.
//!
//! The rules:
//! 1. `Dyn` and `Error` are assignable in both directions, binding nothing
//! 2. Structurally equal types are assignable
//! 3. A type parameter resolves through its binding when bound, and binds
//!    to the other side when free (occurs check applies)
//! 4. Containers, reified types, and functions are assignable
//!    componentwise, sharing the evolving store; length mismatches fail
//! 5. A well-known wrapper is assignable with its underlying primitive in
//!    both directions
//!
//! The occurs check prevents infinite types like `T = list<T>`, which also
//! makes termination immediate.
//!

use indexmap::IndexMap;
use lasso::Spur;

use super::types::{FunctionType, Type};

/// The substitution store: type-parameter name to bound type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: IndexMap<Spur, Type>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a binding. Rebinding a name to a non-equal type is rejected;
    /// resolution paths always consult `find` before binding.
    pub fn bind(&mut self, name: Spur, ty: Type) -> bool {
        match self.entries.get(&name) {
            Some(existing) if *existing != ty => false,
            _ => {
                self.entries.insert(name, ty);
                true
            }
        }
    }

    pub fn find(&self, name: Spur) -> Option<&Type> {
        self.entries.get(&name)
    }

    /// Apply the store's bindings to a type, leaving unbound parameters in
    /// place.
    pub fn apply(&self, ty: &Type) -> Type {
        substitute(self, ty, false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Test whether `src` is assignable to `dst`, returning the extended store
/// on success.
pub fn is_assignable(mapping: &Mapping, src: &Type, dst: &Type) -> Option<Mapping> {
    let mut extended = mapping.clone();
    if internal_is_assignable(&mut extended, src, dst) {
        Some(extended)
    } else {
        None
    }
}

/// Pairwise assignability over two lists, threading one store through all
/// pairs. A length mismatch fails outright.
pub fn is_assignable_list(mapping: &Mapping, src: &[Type], dst: &[Type]) -> Option<Mapping> {
    if src.len() != dst.len() {
        return None;
    }
    let mut extended = mapping.clone();
    for (s, d) in src.iter().zip(dst.iter()) {
        if !internal_is_assignable(&mut extended, s, d) {
            return None;
        }
    }
    Some(extended)
}

fn internal_is_assignable(mapping: &mut Mapping, src: &Type, dst: &Type) -> bool {
    if matches!(src, Type::Dyn | Type::Error) || matches!(dst, Type::Dyn | Type::Error) {
        return true;
    }
    if src == dst {
        return true;
    }
    // Resolve the destination parameter first: overload parameters sit on
    // that side, and their fresh variables should pin to the argument.
    if let Type::TypeParam(name) = dst {
        return match mapping.find(*name).cloned() {
            Some(bound) => internal_is_assignable(mapping, src, &bound),
            None => not_referenced_in(mapping, *name, src) && mapping.bind(*name, src.clone()),
        };
    }
    if let Type::TypeParam(name) = src {
        return match mapping.find(*name).cloned() {
            Some(bound) => internal_is_assignable(mapping, &bound, dst),
            None => not_referenced_in(mapping, *name, dst) && mapping.bind(*name, dst.clone()),
        };
    }
    match (src, dst) {
        (Type::List(src_elem), Type::List(dst_elem)) => {
            internal_is_assignable(mapping, src_elem, dst_elem)
        }
        (Type::Map(src_key, src_value), Type::Map(dst_key, dst_value)) => {
            internal_is_assignable(mapping, src_key, dst_key)
                && internal_is_assignable(mapping, src_value, dst_value)
        }
        (Type::Type(src_inner), Type::Type(dst_inner)) => {
            internal_is_assignable(mapping, src_inner, dst_inner)
        }
        (Type::Function(src_fn), Type::Function(dst_fn)) => {
            if src_fn.params.len() != dst_fn.params.len() {
                return false;
            }
            if !internal_is_assignable(mapping, &src_fn.result, &dst_fn.result) {
                return false;
            }
            for (s, d) in src_fn.params.iter().zip(dst_fn.params.iter()) {
                if !internal_is_assignable(mapping, s, d) {
                    return false;
                }
            }
            true
        }
        (Type::WellKnown(wrapper), other) | (other, Type::WellKnown(wrapper)) => {
            wrapper.primitive() == *other
        }
        _ => false,
    }
}

/// Occurs check: `name` must not appear in `ty` once bound parameters are
/// chased through the store.
fn not_referenced_in(mapping: &Mapping, name: Spur, ty: &Type) -> bool {
    match ty {
        Type::TypeParam(other) => {
            if *other == name {
                return false;
            }
            match mapping.find(*other) {
                Some(bound) => not_referenced_in(mapping, name, bound),
                None => true,
            }
        }
        Type::List(elem) => not_referenced_in(mapping, name, elem),
        Type::Map(key, value) => {
            not_referenced_in(mapping, name, key) && not_referenced_in(mapping, name, value)
        }
        Type::Type(inner) => not_referenced_in(mapping, name, inner),
        Type::Function(func) => {
            not_referenced_in(mapping, name, &func.result)
                && func.params.iter().all(|p| not_referenced_in(mapping, name, p))
        }
        _ => true,
    }
}

/// Replace type-parameter leaves by their bindings, transitively. With
/// `typeparam_to_dyn` set, parameters still unbound collapse to `Dyn`.
pub fn substitute(mapping: &Mapping, ty: &Type, typeparam_to_dyn: bool) -> Type {
    match ty {
        Type::TypeParam(name) => match mapping.find(*name) {
            Some(bound) => substitute(mapping, bound, typeparam_to_dyn),
            None if typeparam_to_dyn => Type::Dyn,
            None => ty.clone(),
        },
        Type::List(elem) => Type::list(substitute(mapping, elem, typeparam_to_dyn)),
        Type::Map(key, value) => Type::map(
            substitute(mapping, key, typeparam_to_dyn),
            substitute(mapping, value, typeparam_to_dyn),
        ),
        Type::Type(inner) => Type::reified(substitute(mapping, inner, typeparam_to_dyn)),
        Type::Function(func) => Type::Function(FunctionType {
            result: Box::new(substitute(mapping, &func.result, typeparam_to_dyn)),
            params: func
                .params
                .iter()
                .map(|p| substitute(mapping, p, typeparam_to_dyn))
                .collect(),
        }),
        _ => ty.clone(),
    }
}

/// The most general of two types known to be bilaterally assignable: `Dyn`
/// wins, otherwise the first argument stands for both.
pub fn most_general(a: &Type, b: &Type) -> Type {
    if matches!(a, Type::Dyn) || matches!(b, Type::Dyn) {
        Type::Dyn
    } else {
        a.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typechecker::types::WellKnownKind;
    use lasso::Rodeo;

    #[test]
    fn test_same_primitives_assignable() {
        let mapping = Mapping::new();
        assert!(is_assignable(&mapping, &Type::Int64, &Type::Int64).is_some());
        assert!(is_assignable(&mapping, &Type::String, &Type::String).is_some());
        assert!(is_assignable(&mapping, &Type::Null, &Type::Null).is_some());
    }

    #[test]
    fn test_different_primitives_fail() {
        let mapping = Mapping::new();
        assert!(is_assignable(&mapping, &Type::Int64, &Type::String).is_none());
        assert!(is_assignable(&mapping, &Type::Uint64, &Type::Int64).is_none());
    }

    #[test]
    fn test_dyn_and_error_are_bilateral() {
        let mapping = Mapping::new();
        for ty in [Type::Int64, Type::list(Type::String), Type::Null] {
            assert!(is_assignable(&mapping, &Type::Dyn, &ty).is_some());
            assert!(is_assignable(&mapping, &ty, &Type::Dyn).is_some());
            assert!(is_assignable(&mapping, &Type::Error, &ty).is_some());
            assert!(is_assignable(&mapping, &ty, &Type::Error).is_some());
        }
    }

    #[test]
    fn test_dyn_binds_nothing() {
        let mut rodeo = Rodeo::default();
        let t = rodeo.get_or_intern("T");
        let mapping = Mapping::new();
        let extended = is_assignable(&mapping, &Type::Dyn, &Type::TypeParam(t)).unwrap();
        assert!(extended.is_empty());
    }

    #[test]
    fn test_param_binds_to_source() {
        let mut rodeo = Rodeo::default();
        let t = rodeo.get_or_intern("T");
        let mapping = Mapping::new();

        let extended = is_assignable(&mapping, &Type::Int64, &Type::TypeParam(t)).unwrap();
        assert_eq!(extended.find(t), Some(&Type::Int64));
        // The original store is untouched.
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_bound_param_resolves_through_store() {
        let mut rodeo = Rodeo::default();
        let t = rodeo.get_or_intern("T");
        let mut mapping = Mapping::new();
        assert!(mapping.bind(t, Type::Int64));

        assert!(is_assignable(&mapping, &Type::Int64, &Type::TypeParam(t)).is_some());
        assert!(is_assignable(&mapping, &Type::String, &Type::TypeParam(t)).is_none());
    }

    #[test]
    fn test_store_grows_monotonically() {
        let mut rodeo = Rodeo::default();
        let t = rodeo.get_or_intern("T");
        let u = rodeo.get_or_intern("U");
        let mapping = Mapping::new();

        let first = is_assignable(&mapping, &Type::Int64, &Type::TypeParam(t)).unwrap();
        let second = is_assignable(&first, &Type::String, &Type::TypeParam(u)).unwrap();
        assert_eq!(second.find(t), Some(&Type::Int64));
        assert_eq!(second.find(u), Some(&Type::String));
    }

    #[test]
    fn test_rebind_to_different_type_rejected() {
        let mut rodeo = Rodeo::default();
        let t = rodeo.get_or_intern("T");
        let mut mapping = Mapping::new();
        assert!(mapping.bind(t, Type::Int64));
        assert!(!mapping.bind(t, Type::String));
        assert!(mapping.bind(t, Type::Int64));
        assert_eq!(mapping.find(t), Some(&Type::Int64));
    }

    #[test]
    fn test_occurs_check() {
        let mut rodeo = Rodeo::default();
        let t = rodeo.get_or_intern("T");
        let mapping = Mapping::new();

        let list_of_t = Type::list(Type::TypeParam(t));
        assert!(is_assignable(&mapping, &list_of_t, &Type::TypeParam(t)).is_none());
        assert!(is_assignable(&mapping, &Type::TypeParam(t), &list_of_t).is_none());
    }

    #[test]
    fn test_list_and_map_componentwise() {
        let mut rodeo = Rodeo::default();
        let t = rodeo.get_or_intern("T");
        let mapping = Mapping::new();

        let extended = is_assignable(
            &mapping,
            &Type::list(Type::Int64),
            &Type::list(Type::TypeParam(t)),
        )
        .unwrap();
        assert_eq!(extended.find(t), Some(&Type::Int64));

        assert!(is_assignable(
            &mapping,
            &Type::map(Type::String, Type::Int64),
            &Type::map(Type::String, Type::Int64),
        )
        .is_some());
        assert!(is_assignable(
            &mapping,
            &Type::map(Type::String, Type::Int64),
            &Type::map(Type::String, Type::Bool),
        )
        .is_none());
    }

    #[test]
    fn test_map_components_share_store() {
        let mut rodeo = Rodeo::default();
        let t = rodeo.get_or_intern("T");
        let mapping = Mapping::new();

        // The key binds T, the value must then agree with it.
        let dst = Type::map(Type::TypeParam(t), Type::TypeParam(t));
        assert!(is_assignable(&mapping, &Type::map(Type::Int64, Type::Int64), &dst).is_some());
        assert!(is_assignable(&mapping, &Type::map(Type::Int64, Type::String), &dst).is_none());
    }

    #[test]
    fn test_function_assignability() {
        let mapping = Mapping::new();
        let f = Type::function(Type::Bool, vec![Type::Int64]);
        assert!(is_assignable(&mapping, &f, &f).is_some());

        let g = Type::function(Type::Bool, vec![Type::String]);
        assert!(is_assignable(&mapping, &f, &g).is_none());

        let h = Type::function(Type::Bool, vec![Type::Int64, Type::Int64]);
        assert!(is_assignable(&mapping, &f, &h).is_none());
    }

    #[test]
    fn test_reified_types() {
        let mut rodeo = Rodeo::default();
        let msg = rodeo.get_or_intern("pkg.Msg");
        let other = rodeo.get_or_intern("pkg.Other");
        let mapping = Mapping::new();

        let a = Type::reified(Type::Object(msg));
        let b = Type::reified(Type::Object(other));
        assert!(is_assignable(&mapping, &a, &a).is_some());
        assert!(is_assignable(&mapping, &a, &b).is_none());
    }

    #[test]
    fn test_wrapper_assignable_with_primitive() {
        let mapping = Mapping::new();
        let wrapped = Type::WellKnown(WellKnownKind::Int64);
        assert!(is_assignable(&mapping, &wrapped, &Type::Int64).is_some());
        assert!(is_assignable(&mapping, &Type::Int64, &wrapped).is_some());
        assert!(is_assignable(&mapping, &wrapped, &Type::String).is_none());
        assert!(is_assignable(&mapping, &wrapped, &Type::WellKnown(WellKnownKind::Bool)).is_none());
    }

    #[test]
    fn test_list_length_mismatch_fails() {
        let mapping = Mapping::new();
        assert!(is_assignable_list(&mapping, &[Type::Int64], &[Type::Int64, Type::Int64]).is_none());
        assert!(is_assignable_list(&mapping, &[], &[]).is_some());
    }

    #[test]
    fn test_assignable_list_threads_store() {
        let mut rodeo = Rodeo::default();
        let t = rodeo.get_or_intern("T");
        let mapping = Mapping::new();

        let dst = [Type::TypeParam(t), Type::TypeParam(t)];
        assert!(is_assignable_list(&mapping, &[Type::Int64, Type::Int64], &dst).is_some());
        assert!(is_assignable_list(&mapping, &[Type::Int64, Type::String], &dst).is_none());
    }

    #[test]
    fn test_substitute_collapses_unbound() {
        let mut rodeo = Rodeo::default();
        let t = rodeo.get_or_intern("T");
        let mapping = Mapping::new();

        let ty = Type::list(Type::TypeParam(t));
        assert_eq!(substitute(&mapping, &ty, false), ty);
        assert_eq!(substitute(&mapping, &ty, true), Type::list(Type::Dyn));
    }

    #[test]
    fn test_substitute_chases_bindings() {
        let mut rodeo = Rodeo::default();
        let t = rodeo.get_or_intern("T");
        let u = rodeo.get_or_intern("U");
        let mut mapping = Mapping::new();
        assert!(mapping.bind(t, Type::TypeParam(u)));
        assert!(mapping.bind(u, Type::Int64));

        assert_eq!(substitute(&mapping, &Type::TypeParam(t), false), Type::Int64);
    }

    #[test]
    fn test_apply_keeps_unbound_params() {
        let mut rodeo = Rodeo::default();
        let t = rodeo.get_or_intern("T");
        let u = rodeo.get_or_intern("U");
        let mut mapping = Mapping::new();
        assert!(mapping.bind(t, Type::Int64));

        let ty = Type::list(Type::TypeParam(t));
        assert_eq!(mapping.apply(&ty), Type::list(Type::Int64));
        assert_eq!(mapping.apply(&Type::TypeParam(u)), Type::TypeParam(u));
    }

    #[test]
    fn test_substitute_idempotent() {
        let mut rodeo = Rodeo::default();
        let t = rodeo.get_or_intern("T");
        let u = rodeo.get_or_intern("U");
        let mut mapping = Mapping::new();
        assert!(mapping.bind(t, Type::Int64));

        let ty = Type::map(Type::TypeParam(t), Type::TypeParam(u));
        let once = substitute(&mapping, &ty, false);
        assert_eq!(substitute(&mapping, &once, true), substitute(&mapping, &ty, true));
    }

    #[test]
    fn test_most_general() {
        assert_eq!(most_general(&Type::Int64, &Type::Int64), Type::Int64);
        assert_eq!(most_general(&Type::Dyn, &Type::Int64), Type::Dyn);
        assert_eq!(most_general(&Type::Int64, &Type::Dyn), Type::Dyn);
    }
}
