//! Declarative type descriptions handed to the schema sink.
//!
//! The core never builds executable schema machinery directly; it produces
//! these descriptions and declares them through a [`SchemaSink`]. The
//! `graphql` module renders them into an `async_graphql` dynamic schema;
//! other sinks can render SDL or feed a different server.
//!
//! [`SchemaSink`]: crate::schema::sink::SchemaSink

use serde::{Deserialize, Serialize};

use crate::entity::FieldKind;

/// Type of a described field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Id,
    String,
    Int,
    Float,
    Boolean,
    /// Reference to another described or externally known object type
    Object(String),
    /// List with non-null elements
    List(Box<FieldType>),
}

impl FieldType {
    /// Base type name, unwrapping lists.
    pub fn type_name(&self) -> String {
        match self {
            FieldType::Id => "ID".to_string(),
            FieldType::String => "String".to_string(),
            FieldType::Int => "Int".to_string(),
            FieldType::Float => "Float".to_string(),
            FieldType::Boolean => "Boolean".to_string(),
            FieldType::Object(name) => name.clone(),
            FieldType::List(of) => of.type_name(),
        }
    }

    fn render(&self) -> String {
        match self {
            FieldType::List(of) => format!("[{}!]", of.render()),
            other => other.type_name(),
        }
    }
}

impl From<FieldKind> for FieldType {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Id => FieldType::Id,
            FieldKind::String => FieldType::String,
            FieldKind::Int => FieldType::Int,
            FieldKind::Float => FieldType::Float,
            FieldKind::Boolean => FieldType::Boolean,
        }
    }
}

/// A single described field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub name: String,
    pub ty: FieldType,
    pub nullable: bool,
}

/// Whether a description is an output object or an input object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Output,
    Input,
}

/// A described object type. Field order is preserved; shape equality is what
/// collision detection compares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescription {
    pub name: String,
    pub kind: ObjectKind,
    pub fields: Vec<FieldDescription>,
}

impl ObjectDescription {
    /// Start an output object description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Output,
            fields: Vec::new(),
        }
    }

    /// Start an input object description.
    pub fn input(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Input,
            fields: Vec::new(),
        }
    }

    /// Append a non-null field.
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldDescription {
            name: name.into(),
            ty,
            nullable: false,
        });
        self
    }

    /// Append a nullable field.
    pub fn nullable_field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldDescription {
            name: name.into(),
            ty,
            nullable: true,
        });
        self
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Render the description as SDL, mostly for logs and debugging.
    pub fn to_sdl(&self) -> String {
        let keyword = match self.kind {
            ObjectKind::Output => "type",
            ObjectKind::Input => "input",
        };
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|f| {
                let suffix = if f.nullable { "" } else { "!" };
                format!("  {}: {}{}", f.name, f.ty.render(), suffix)
            })
            .collect();
        format!("{} {} {{\n{}\n}}", keyword, self.name, fields.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sdl_rendering() {
        let connection = ObjectDescription::new("UserFilmsConnection")
            .field(
                "edges",
                FieldType::List(Box::new(FieldType::Object("UserFilmsEdge".to_string()))),
            )
            .field("pageInfo", FieldType::Object("PageInfo".to_string()));

        assert_eq!(
            connection.to_sdl(),
            "type UserFilmsConnection {\n  edges: [UserFilmsEdge!]!\n  pageInfo: PageInfo!\n}"
        );
    }

    #[test]
    fn test_shape_equality_is_order_sensitive() {
        let a = ObjectDescription::new("Edge")
            .field("node", FieldType::Object("Film".to_string()))
            .field("cursor", FieldType::String);
        let b = ObjectDescription::new("Edge")
            .field("cursor", FieldType::String)
            .field("node", FieldType::Object("Film".to_string()));
        assert_ne!(a, b);
    }
}
