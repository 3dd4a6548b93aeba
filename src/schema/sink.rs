//! Schema-description sink boundary.
//!
//! The core is write-only against this interface: it declares the types it
//! synthesizes and the deferred resolver bindings for relayed fields, and
//! never reads anything back.

use parking_lot::Mutex;

use super::objects::ObjectDescription;

/// A deferred resolver binding: resolving `field_name` on `owner` at query
/// time invokes the resolver registered under `resolver`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    pub owner: String,
    pub field_name: String,
    /// Key of the installed resolver (`"{Owner}.{field}"`)
    pub resolver: String,
    /// Name of the connection type the field returns
    pub return_type: String,
}

/// Sink accepting declarative schema descriptions.
pub trait SchemaSink: Send + Sync {
    fn declare_type(&self, object: &ObjectDescription);
    fn declare_field(&self, field: &FieldDeclaration);
}

/// Sink that records every declaration in memory, in order.
///
/// Useful as a test double and for inspecting what a configuration declared.
#[derive(Debug, Default)]
pub struct RecordingSink {
    types: Mutex<Vec<ObjectDescription>>,
    fields: Mutex<Vec<FieldDeclaration>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn types(&self) -> Vec<ObjectDescription> {
        self.types.lock().clone()
    }

    pub fn fields(&self) -> Vec<FieldDeclaration> {
        self.fields.lock().clone()
    }

    pub fn type_names(&self) -> Vec<String> {
        self.types.lock().iter().map(|t| t.name.clone()).collect()
    }
}

impl SchemaSink for RecordingSink {
    fn declare_type(&self, object: &ObjectDescription) {
        self.types.lock().push(object.clone());
    }

    fn declare_field(&self, field: &FieldDeclaration) {
        self.fields.lock().push(field.clone());
    }
}
