//!
//! Type Provider Adapter
//!
//! Object types are opaque to the checker; their field metadata lives in
//! the embedding object system and is queried through the `TypeProvider`
//! trait. `MessageRegistry` is the in-memory implementation used by
//! embedders without an external object system, and by the test suites.
//!

use std::collections::HashMap;

use super::types::Type;

/// Opaque handle for a resolved object type.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldType {
    pub ty: Type,
    /// Whether `has(obj.field)` is answerable for this field.
    pub supports_presence: bool,
}

pub trait TypeProvider {
    /// Resolve a fully qualified object type name.
    fn lookup_type(&self, name: &str) -> Option<ObjectType>;

    /// Resolve a field on an object type known to this provider.
    fn lookup_field_type(&self, message: &str, field: &str) -> Option<FieldType>;
}

#[derive(Debug, Default)]
pub struct MessageRegistry {
    messages: HashMap<String, HashMap<String, FieldType>>,
}

impl MessageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str) {
        self.messages.entry(name.to_string()).or_default();
    }

    pub fn add_field(&mut self, message: &str, field: &str, ty: Type, supports_presence: bool) {
        self.messages
            .entry(message.to_string())
            .or_default()
            .insert(field.to_string(), FieldType { ty, supports_presence });
    }
}

impl TypeProvider for MessageRegistry {
    fn lookup_type(&self, name: &str) -> Option<ObjectType> {
        self.messages.contains_key(name).then(|| ObjectType {
            name: name.to_string(),
        })
    }

    fn lookup_field_type(&self, message: &str, field: &str) -> Option<FieldType> {
        self.messages.get(message)?.get(field).cloned()
    }
}
