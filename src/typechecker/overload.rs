//!
//! Overload Resolution
//!
//! This module selects the overloads of a function declaration that accept
//! an already-typed argument list. Overloads with type parameters are
//! instantiated with fresh type variables through a mapping local to the
//! call site, so one call's bindings never constrain another's.
//!
//! The first matching overload fixes the call's result type. When more
//! than one overload matches, the result narrows to dyn while every
//! matching overload id is kept on the reference; the runtime dispatches
//! among them by the actual argument types.
//!

use crate::ast::Expr;
use crate::source::Location;

use super::symbols::FunctionDecl;
use super::typed_ast::Reference;
use super::types::Type;
use super::unify::{substitute, Mapping};
use super::{Checker, TypeError};

#[derive(Debug, Clone, PartialEq)]
pub struct OverloadResolution {
    pub reference: Reference,
    pub result: Type,
}

impl<'a> Checker<'a> {
    /// Resolve a call against a function declaration. `target` is the
    /// receiver of an instance-style call and participates as the first
    /// argument. Returns `None` when no overload matches, after recording
    /// the diagnostic.
    pub(super) fn resolve_overload(
        &mut self,
        location: Location,
        function: &FunctionDecl,
        target: Option<&Expr>,
        args: &[Expr],
    ) -> Option<OverloadResolution> {
        let mut arg_types = Vec::with_capacity(args.len() + 1);
        if let Some(target) = target {
            arg_types.push(self.get_type(target));
        }
        for arg in args {
            arg_types.push(self.get_type(arg));
        }

        let mut reference: Option<Reference> = None;
        let mut result_type: Option<Type> = None;

        for overload in &function.overloads {
            if overload.is_instance != target.is_some() {
                // Call style does not match this overload.
                continue;
            }

            let mut candidate_params = overload.params.clone();
            let mut candidate_result = overload.result.clone();
            if !overload.type_params.is_empty() {
                // Instantiate the declared parameters with variables private
                // to this call site.
                let mut instantiation = Mapping::new();
                for &type_param in &overload.type_params {
                    let fresh = self.new_type_var();
                    instantiation.bind(type_param, fresh);
                }
                candidate_params = candidate_params
                    .iter()
                    .map(|param| substitute(&instantiation, param, false))
                    .collect();
                candidate_result = substitute(&instantiation, &candidate_result, false);
            }

            if self.is_assignable_list(&arg_types, &candidate_params) {
                match &mut reference {
                    None => reference = Some(Reference::function(overload.id)),
                    Some(reference) => reference.push_overload(overload.id),
                }
                result_type = Some(match result_type {
                    // The first match determines the result type.
                    None => substitute(&self.mappings, &candidate_result, false),
                    // Further matches narrow it to dyn.
                    Some(_) => Type::Dyn,
                });
            }
        }

        match (reference, result_type) {
            (Some(reference), Some(result)) => Some(OverloadResolution { reference, result }),
            _ => {
                let args = self.format_call_signature(&arg_types, target.is_some());
                let error = TypeError::NoMatchingOverload {
                    name: self.env.resolve(function.name).to_string(),
                    args,
                    is_instance: target.is_some(),
                    location,
                };
                self.errors.push(error);
                None
            }
        }
    }

    fn format_call_signature(&self, arg_types: &[Type], is_instance: bool) -> String {
        if is_instance {
            let rest = arg_types[1..]
                .iter()
                .map(|ty| self.format_type(ty))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}.({})", self.format_type(&arg_types[0]), rest)
        } else {
            let rendered = arg_types
                .iter()
                .map(|ty| self.format_type(ty))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", rendered)
        }
    }
}
