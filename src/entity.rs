//! Entity metadata consumed by schema synthesis and the query engine.
//!
//! These traits are implemented by the `#[derive(RelayEntity)]` macro from
//! `auto-relay-macros`, or by hand for entities that need full control.

/// GraphQL scalar kind of an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Id,
    String,
    Int,
    Float,
    Boolean,
}

/// Field definition for schema generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name, used both as the schema field name and as the key under
    /// which the value appears in fetched rows.
    pub name: &'static str,
    /// Scalar kind exposed in the schema
    pub kind: FieldKind,
    /// Whether the field can be null
    pub nullable: bool,
}

/// Metadata about an entity that can appear as a connection node, owner or
/// join record.
pub trait RelayEntity {
    /// The schema type name (e.g. "Film")
    const TYPE_NAME: &'static str;

    /// The unique key used as the ordering tie-break (e.g. "id")
    const PRIMARY_KEY: &'static str;

    /// All exposed field definitions for this entity
    fn fields() -> &'static [FieldDef];
}

/// Runtime mirror of [`RelayEntity`], used where entity types are only known
/// dynamically (pending bindings, page requests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityMeta {
    pub type_name: &'static str,
    pub primary_key: &'static str,
    pub fields: &'static [FieldDef],
}

impl EntityMeta {
    /// Capture the metadata of a statically known entity type.
    pub fn of<E: RelayEntity>() -> Self {
        Self {
            type_name: E::TYPE_NAME,
            primary_key: E::PRIMARY_KEY,
            fields: E::fields(),
        }
    }

    /// Look up a field definition by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}
