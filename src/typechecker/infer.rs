//!
//! Expression Checking
//!
//! This module walks the expression tree and assigns types. Each expression
//! form has specific rules:
//!
//! - Literals: type follows the literal form
//! - Identifiers: container-qualified environment lookup
//! - Selections: qualified-name interpretation first, field access second
//! - Calls: arguments first, then overload resolution; a qualified target
//!   turns an instance call into a namespaced static call
//! - List and map literals: element types joined, empty aggregates get
//!   fresh type variables
//! - Message literals: field initializers checked against provider metadata
//! - Comprehensions: accumulator and iteration variables bound in nested
//!   scopes around the loop expressions
//!
//! Failed resolutions type the node as the error sentinel and record a
//! diagnostic; the walk always continues.
//!

use lasso::Spur;

use crate::ast::{
    CallExpr, ComprehensionExpr, EntryKey, Expr, ExprKind, ListExpr, Literal, SelectExpr,
    StructExpr,
};

use super::symbols::Decl;
use super::typed_ast::Reference;
use super::types::{Kind, Type};
use super::{Checker, TypeError};

impl<'a> Checker<'a> {
    pub(super) fn check_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(literal) => self.check_literal(expr, literal),
            ExprKind::Ident(name) => self.check_ident(expr, *name),
            ExprKind::Select(select) => self.check_select(expr, select),
            ExprKind::Call(call) => self.check_call(expr, call),
            ExprKind::List(list) => self.check_list(expr, list),
            ExprKind::Struct(struct_expr) => self.check_struct(expr, struct_expr),
            ExprKind::Comprehension(comp) => self.check_comprehension(expr, comp),
        }
    }

    fn check_literal(&mut self, expr: &Expr, literal: &Literal) {
        let ty = match literal {
            Literal::Bool(_) => Type::Bool,
            Literal::Bytes(_) => Type::Bytes,
            Literal::Double(_) => Type::Double,
            Literal::Int64(_) => Type::Int64,
            Literal::Null => Type::Null,
            Literal::String(_) => Type::String,
            Literal::Uint64(_) => Type::Uint64,
        };
        self.set_type(expr, ty);
    }

    fn check_ident(&mut self, expr: &Expr, name: Spur) {
        let name = self.env.resolve(name).to_string();
        if let Some(decl) = self.env.lookup_ident(&self.container, &name) {
            self.set_type(expr, decl.ty.clone());
            self.set_reference(expr, Reference::ident(decl.name, decl.value));
            return;
        }
        self.set_type(expr, Type::Error);
        let location = self.location(expr);
        self.errors.push(TypeError::UndeclaredReference {
            container: self.container.clone(),
            name,
            location,
        });
    }

    fn check_select(&mut self, expr: &Expr, select: &SelectExpr) {
        // Before descending, try to read the whole chain as one qualified
        // name; `pkg.Msg` is an identifier, not a field access on `pkg`.
        if let Some(qualified) = self.as_qualified_name(expr) {
            if let Some(decl) = self.env.lookup_ident(&self.container, &qualified) {
                if select.test_only {
                    let location = self.location(expr);
                    self.errors
                        .push(TypeError::ExpressionDoesNotSelectField { location });
                    self.set_type(expr, Type::Bool);
                } else {
                    self.set_type(expr, decl.ty.clone());
                    self.set_reference(expr, Reference::ident(decl.name, decl.value));
                }
                return;
            }
        }

        self.check_expr(&select.operand);
        let operand_type = self.get_type(&select.operand);
        let mut result_type = Type::Error;
        match &operand_type {
            Type::Error | Type::Dyn => result_type = Type::Dyn,
            Type::Object(message) => {
                let location = self.location(expr);
                if let Some(field_type) = self.lookup_field_type(location, *message, select.field) {
                    result_type = field_type.ty;
                    if select.test_only && !field_type.supports_presence {
                        let field = self.env.resolve(select.field).to_string();
                        self.errors
                            .push(TypeError::FieldDoesNotSupportPresenceCheck { field, location });
                    }
                }
            }
            Type::Map(_, value) => result_type = (**value).clone(),
            other => {
                let location = self.location(expr);
                let error = TypeError::TypeDoesNotSupportFieldSelection {
                    ty: self.format_type(other),
                    location,
                };
                self.errors.push(error);
            }
        }
        if select.test_only {
            result_type = Type::Bool;
        }
        self.set_type(expr, result_type);
    }

    fn check_call(&mut self, expr: &Expr, call: &CallExpr) {
        for arg in &call.args {
            self.check_expr(arg);
        }
        let location = self.location(expr);
        let function_name = self.env.resolve(call.function).to_string();

        let resolution = match &call.target {
            None => match self.env.lookup_function(&self.container, &function_name) {
                Some(function) => self.resolve_overload(location, &function, None, &call.args),
                None => {
                    self.errors.push(TypeError::UndeclaredReference {
                        container: self.container.clone(),
                        name: function_name,
                        location,
                    });
                    None
                }
            },
            Some(target) => {
                let target = target.as_ref();
                let mut static_function = None;
                if let Some(qualifier) = self.as_qualified_name(target) {
                    let qualified = format!("{}.{}", qualifier, function_name);
                    static_function = self.env.lookup_function(&self.container, &qualified);
                }
                match static_function {
                    // The target named a namespace; it is not a receiver and
                    // its subtree is discarded unchecked.
                    Some(function) => self.resolve_overload(location, &function, None, &call.args),
                    None => {
                        self.check_expr(target);
                        match self.env.lookup_function(&self.container, &function_name) {
                            Some(function) => {
                                self.resolve_overload(location, &function, Some(target), &call.args)
                            }
                            None => {
                                self.errors.push(TypeError::UndeclaredReference {
                                    container: self.container.clone(),
                                    name: function_name,
                                    location,
                                });
                                None
                            }
                        }
                    }
                }
            }
        };

        match resolution {
            Some(resolution) => {
                self.set_type(expr, resolution.result);
                self.set_reference(expr, resolution.reference);
            }
            None => self.set_type(expr, Type::Error),
        }
    }

    fn check_list(&mut self, expr: &Expr, list: &ListExpr) {
        let mut elem_type = None;
        for element in &list.elements {
            self.check_expr(element);
            let location = self.location(element);
            let current = self.get_type(element);
            elem_type = Some(self.join_types(location, elem_type, current));
        }
        // An empty list constrains nothing; its element type is free.
        let elem_type = match elem_type {
            Some(elem_type) => elem_type,
            None => self.new_type_var(),
        };
        self.set_type(expr, Type::list(elem_type));
    }

    fn check_struct(&mut self, expr: &Expr, struct_expr: &StructExpr) {
        match struct_expr.message_name {
            Some(message_name) => self.check_message(expr, struct_expr, message_name),
            None => self.check_map(expr, struct_expr),
        }
    }

    fn check_map(&mut self, expr: &Expr, struct_expr: &StructExpr) {
        let mut key_type = None;
        let mut value_type = None;
        for entry in &struct_expr.entries {
            if let EntryKey::MapKey(key) = &entry.key {
                self.check_expr(key);
                let location = self.location(key);
                let current = self.get_type(key);
                key_type = Some(self.join_types(location, key_type, current));
            }
            self.check_expr(&entry.value);
            let location = self.location(&entry.value);
            let current = self.get_type(&entry.value);
            value_type = Some(self.join_types(location, value_type, current));
        }
        let (key_type, value_type) = match (key_type, value_type) {
            (Some(key_type), Some(value_type)) => (key_type, value_type),
            _ => (self.new_type_var(), self.new_type_var()),
        };
        self.set_type(expr, Type::map(key_type, value_type));
    }

    fn check_message(&mut self, expr: &Expr, struct_expr: &StructExpr, message_name: Spur) {
        let location = self.location(expr);
        let name = self.env.resolve(message_name).to_string();
        let Some(decl) = self.env.lookup_ident(&self.container, &name) else {
            self.errors.push(TypeError::UndeclaredReference {
                container: self.container.clone(),
                name,
                location,
            });
            self.set_type(expr, Type::Error);
            return;
        };
        // The reference names the declaration; any constant it carries is
        // irrelevant to a construction.
        self.set_reference(expr, Reference::ident(decl.name, None));

        let mut message_type = Type::Error;
        match &decl.ty {
            Type::Error => {}
            Type::Type(inner) => {
                message_type = (**inner).clone();
                if message_type.kind() != Kind::Object {
                    let error = TypeError::NotAMessageType {
                        ty: self.format_type(&message_type),
                        location,
                    };
                    self.errors.push(error);
                    message_type = Type::Error;
                }
            }
            other => {
                let error = TypeError::NotAType {
                    ty: self.format_type(other),
                    location,
                };
                self.errors.push(error);
            }
        }
        self.set_type(expr, message_type.clone());

        for entry in &struct_expr.entries {
            self.check_expr(&entry.value);
            let EntryKey::Field(field) = &entry.key else {
                continue;
            };
            let entry_location = self.location_of(entry.id);
            let mut field_type = Type::Error;
            if let Type::Object(message) = &message_type {
                if let Some(found) = self.lookup_field_type(entry_location, *message, *field) {
                    field_type = found.ty;
                }
            }
            let value_type = self.get_type(&entry.value);
            if !self.is_assignable(&field_type, &value_type) {
                let error = TypeError::FieldTypeMismatch {
                    field: self.env.resolve(*field).to_string(),
                    expected: self.format_type(&field_type),
                    actual: self.format_type(&value_type),
                    location: entry_location,
                };
                self.errors.push(error);
            }
        }
    }

    fn check_comprehension(&mut self, expr: &Expr, comp: &ComprehensionExpr) {
        self.check_expr(&comp.iter_range);
        self.check_expr(&comp.accu_init);
        let accu_type = self.get_type(&comp.accu_init);
        let range_type = self.get_type(&comp.iter_range);

        let var_type = match &range_type {
            Type::List(elem) => Some((**elem).clone()),
            // A map range iterates over its keys.
            Type::Map(key, _) => Some((**key).clone()),
            Type::Dyn | Type::Error => Some(Type::Dyn),
            other => {
                let location = self.location(&comp.iter_range);
                let error = TypeError::NotAComprehensionRange {
                    ty: self.format_type(other),
                    location,
                };
                self.errors.push(error);
                None
            }
        };

        // An unsupported range declares neither variable; the body is still
        // walked so every node receives a type.
        if let Some(var_type) = &var_type {
            self.env.push_scope();
            self.env.add(Decl::ident(comp.accu_var, accu_type.clone()));
            // The iteration variable lives one scope deeper so the result
            // expression cannot observe it.
            self.env.push_scope();
            self.env.add(Decl::ident(comp.iter_var, var_type.clone()));
        }
        self.check_expr(&comp.loop_condition);
        self.assert_type(&comp.loop_condition, &Type::Bool);
        self.check_expr(&comp.loop_step);
        self.assert_type(&comp.loop_step, &accu_type);
        if var_type.is_some() {
            self.env.pop_scope();
        }
        self.check_expr(&comp.result);
        if var_type.is_some() {
            self.env.pop_scope();
        }
        let result_type = self.get_type(&comp.result);
        self.set_type(expr, result_type);
    }

    /// Flatten an ident/select chain into a dotted name. Anything else in
    /// the chain means the expression is a real field access.
    fn as_qualified_name(&self, expr: &Expr) -> Option<String> {
        match &expr.kind {
            ExprKind::Ident(name) => Some(self.env.resolve(*name).to_string()),
            ExprKind::Select(select) => {
                let qualifier = self.as_qualified_name(&select.operand)?;
                Some(format!("{}.{}", qualifier, self.env.resolve(select.field)))
            }
            _ => None,
        }
    }
}
