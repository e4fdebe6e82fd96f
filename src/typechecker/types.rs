//!
//! Type Representation
//!
//! This module defines the type algebra of the sift language:
//!
//! - Primitives (bool, int, uint, double, string, bytes) and null
//! - `Dyn`, assignable to and from every type
//! - `Error`, the sentinel for failed sub-derivations; it absorbs most
//!   operations so one mistake does not cascade
//! - Structural containers (lists, maps) and reified types
//! - `Object`, a named type whose fields live behind the type provider
//! - `TypeParam`, a free type variable resolved through the substitution
//!   store and collapsed to `Dyn` when still unbound at the end of a check
//! - `WellKnown`, the boxed primitives of the surrounding object system
//!
//! Equality is structural. `Type::kind` yields the outer tag for code that
//! dispatches without caring about component types.
//!

use std::fmt;

use lasso::Spur;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Error,
    Dyn,
    Null,
    Bool,
    Int64,
    Uint64,
    Double,
    String,
    Bytes,
    List,
    Map,
    Object,
    Type,
    TypeParam,
    Function,
    WellKnown,
}

/// The boxed primitive wrappers. A wrapper is bilaterally assignable with
/// its underlying primitive but keeps its own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownKind {
    Bool,
    Bytes,
    Double,
    Int64,
    String,
    Uint64,
}

impl WellKnownKind {
    pub fn primitive(&self) -> Type {
        match self {
            WellKnownKind::Bool => Type::Bool,
            WellKnownKind::Bytes => Type::Bytes,
            WellKnownKind::Double => Type::Double,
            WellKnownKind::Int64 => Type::Int64,
            WellKnownKind::String => Type::String,
            WellKnownKind::Uint64 => Type::Uint64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Error,
    Dyn,
    Null,
    Bool,
    Int64,
    Uint64,
    Double,
    String,
    Bytes,
    List(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Object(Spur),
    /// The reified type of a type, e.g. the value of a message name used
    /// as an expression.
    Type(Box<Type>),
    TypeParam(Spur),
    Function(FunctionType),
    WellKnown(WellKnownKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
    pub result: Box<Type>,
    pub params: Vec<Type>,
}

impl Type {
    pub fn list(elem: Type) -> Self {
        Type::List(Box::new(elem))
    }

    pub fn map(key: Type, value: Type) -> Self {
        Type::Map(Box::new(key), Box::new(value))
    }

    pub fn function(result: Type, params: Vec<Type>) -> Self {
        Type::Function(FunctionType {
            result: Box::new(result),
            params,
        })
    }

    pub fn reified(inner: Type) -> Self {
        Type::Type(Box::new(inner))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Type::Error => Kind::Error,
            Type::Dyn => Kind::Dyn,
            Type::Null => Kind::Null,
            Type::Bool => Kind::Bool,
            Type::Int64 => Kind::Int64,
            Type::Uint64 => Kind::Uint64,
            Type::Double => Kind::Double,
            Type::String => Kind::String,
            Type::Bytes => Kind::Bytes,
            Type::List(_) => Kind::List,
            Type::Map(_, _) => Kind::Map,
            Type::Object(_) => Kind::Object,
            Type::Type(_) => Kind::Type,
            Type::TypeParam(_) => Kind::TypeParam,
            Type::Function(_) => Kind::Function,
            Type::WellKnown(_) => Kind::WellKnown,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Type::Bool | Type::Int64 | Type::Uint64 | Type::Double | Type::String | Type::Bytes
        )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Error => write!(f, "*error*"),
            Type::Dyn => write!(f, "dyn"),
            Type::Null => write!(f, "null"),
            Type::Bool => write!(f, "bool"),
            Type::Int64 => write!(f, "int"),
            Type::Uint64 => write!(f, "uint"),
            Type::Double => write!(f, "double"),
            Type::String => write!(f, "string"),
            Type::Bytes => write!(f, "bytes"),
            Type::List(elem) => write!(f, "list<{}>", elem),
            Type::Map(key, value) => write!(f, "map<{}, {}>", key, value),
            Type::Object(name) => write!(f, "object:{:?}", name),
            Type::Type(inner) => write!(f, "type<{}>", inner),
            Type::TypeParam(name) => write!(f, "param:{:?}", name),
            Type::Function(func) => {
                write!(f, "fn(")?;
                for (i, p) in func.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", func.result)
            }
            Type::WellKnown(kind) => write!(f, "wrapper<{}>", kind.primitive()),
        }
    }
}
