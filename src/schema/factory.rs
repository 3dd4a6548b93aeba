//! Dynamic Edge/Connection object synthesis.
//!
//! Schema-object identity is load-bearing: a schema cannot declare two
//! distinct types under one name, so the factory memoizes by derived
//! connection name and declares each pair into the sink exactly once.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::entity::EntityMeta;
use crate::error::{RelayError, RelayResult};

use super::objects::{FieldType, ObjectDescription};
use super::shared::SharedObjects;
use super::sink::{FieldDeclaration, SchemaSink};

/// Field names an edge always owns; through attributes must not shadow them.
const RESERVED_EDGE_FIELDS: &[&str] = &["node", "cursor"];

/// The Edge/Connection pair synthesized for one derived connection name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionObjects {
    pub edge: ObjectDescription,
    pub connection: ObjectDescription,
}

/// Memoizing factory for connection schema objects.
///
/// The cache only ever grows; entries are never removed or replaced during
/// normal operation. Creation for a given key is serialized under one lock,
/// so concurrent requests for the same name declare the objects once.
#[derive(Debug, Default)]
pub struct DynamicObjectFactory {
    cache: Mutex<HashMap<String, ConnectionObjects>>,
}

impl DynamicObjectFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the Edge/Connection pair for `name`.
    ///
    /// A repeat request with the same shape returns the cached pair
    /// unchanged; a repeat request with a different shape is a collision.
    pub fn make_edge_connection(
        &self,
        name: &str,
        node: &EntityMeta,
        through: Option<&EntityMeta>,
        shared: &SharedObjects,
        sink: &dyn SchemaSink,
    ) -> RelayResult<ConnectionObjects> {
        let candidate = build_objects(name, node, through, shared);

        let mut cache = self.cache.lock();
        if let Some(existing) = cache.get(name) {
            if *existing == candidate {
                return Ok(existing.clone());
            }
            return Err(RelayError::SchemaCollision {
                name: name.to_string(),
            });
        }

        sink.declare_type(&candidate.edge);
        sink.declare_type(&candidate.connection);
        cache.insert(name.to_string(), candidate.clone());
        tracing::debug!(connection = %name, "declared connection schema objects");

        Ok(candidate)
    }

    /// Register the deferred resolver binding for a relayed field.
    pub fn declare_field_as_connection(
        &self,
        sink: &dyn SchemaSink,
        owner: &str,
        field_name: &str,
        resolver: &str,
        connection: &ObjectDescription,
    ) {
        sink.declare_field(&FieldDeclaration {
            owner: owner.to_string(),
            field_name: field_name.to_string(),
            resolver: resolver.to_string(),
            return_type: connection.name.clone(),
        });
    }
}

fn build_objects(
    name: &str,
    node: &EntityMeta,
    through: Option<&EntityMeta>,
    shared: &SharedObjects,
) -> ConnectionObjects {
    let mut edge = ObjectDescription::new(format!("{name}Edge"))
        .field("node", FieldType::Object(node.type_name.to_string()))
        .field("cursor", FieldType::String);

    if let Some(through) = through {
        // Attributes of the join record itself, e.g. a joined-at timestamp.
        for field in through.fields {
            if field.name == through.primary_key
                || RESERVED_EDGE_FIELDS.contains(&field.name)
            {
                continue;
            }
            edge = if field.nullable {
                edge.nullable_field(field.name, FieldType::from(field.kind))
            } else {
                edge.field(field.name, FieldType::from(field.kind))
            };
        }
    }

    let connection = ObjectDescription::new(format!("{name}Connection"))
        .field(
            "edges",
            FieldType::List(Box::new(FieldType::Object(edge.name.clone()))),
        )
        .field(
            "pageInfo",
            FieldType::Object(shared.page_info.name.clone()),
        );

    ConnectionObjects { edge, connection }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{FieldDef, FieldKind};
    use crate::schema::shared::{connection_args_object, page_info_object};
    use crate::schema::sink::RecordingSink;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    const FILM_FIELDS: &[FieldDef] = &[
        FieldDef {
            name: "id",
            kind: FieldKind::Id,
            nullable: false,
        },
        FieldDef {
            name: "title",
            kind: FieldKind::String,
            nullable: false,
        },
    ];

    const MEMBERSHIP_FIELDS: &[FieldDef] = &[
        FieldDef {
            name: "id",
            kind: FieldKind::Id,
            nullable: false,
        },
        FieldDef {
            name: "joined_at",
            kind: FieldKind::String,
            nullable: true,
        },
    ];

    fn film() -> EntityMeta {
        EntityMeta {
            type_name: "Film",
            primary_key: "id",
            fields: FILM_FIELDS,
        }
    }

    fn membership() -> EntityMeta {
        EntityMeta {
            type_name: "Membership",
            primary_key: "id",
            fields: MEMBERSHIP_FIELDS,
        }
    }

    fn shared() -> SharedObjects {
        SharedObjects {
            page_info: page_info_object("", None),
            connection_args: connection_args_object(""),
        }
    }

    #[test]
    fn test_make_edge_connection_is_idempotent() {
        let factory = DynamicObjectFactory::new();
        let sink = RecordingSink::new();

        let first = factory
            .make_edge_connection("UserFilms", &film(), None, &shared(), &sink)
            .unwrap();
        let second = factory
            .make_edge_connection("UserFilms", &film(), None, &shared(), &sink)
            .unwrap();
        assert_eq!(first, second);

        // Unrelated factory activity must not disturb the cached pair.
        factory
            .make_edge_connection("OtherFilms", &film(), None, &shared(), &sink)
            .unwrap();
        let third = factory
            .make_edge_connection("UserFilms", &film(), None, &shared(), &sink)
            .unwrap();
        assert_eq!(first, third);

        // Declared once per pair, no matter how often requested.
        assert_eq!(
            sink.type_names(),
            [
                "UserFilmsEdge",
                "UserFilmsConnection",
                "OtherFilmsEdge",
                "OtherFilmsConnection"
            ]
        );
    }

    #[test]
    fn test_incompatible_shape_is_a_collision() {
        let factory = DynamicObjectFactory::new();
        let sink = RecordingSink::new();

        factory
            .make_edge_connection("UserFilms", &film(), None, &shared(), &sink)
            .unwrap();
        let err = factory
            .make_edge_connection("UserFilms", &film(), Some(&membership()), &shared(), &sink)
            .unwrap_err();
        assert_matches!(err, RelayError::SchemaCollision { name } if name == "UserFilms");

        // The collision declared nothing new.
        assert_eq!(sink.types().len(), 2);
    }

    #[test]
    fn test_through_attributes_land_on_the_edge() {
        let factory = DynamicObjectFactory::new();
        let sink = RecordingSink::new();

        let objects = factory
            .make_edge_connection("GroupMembers", &film(), Some(&membership()), &shared(), &sink)
            .unwrap();

        let names: Vec<&str> = objects.edge.fields.iter().map(|f| f.name.as_str()).collect();
        // The join's primary key stays off the edge; its attributes come along.
        assert_eq!(names, ["node", "cursor", "joined_at"]);
    }

    #[test]
    fn test_connection_references_the_shared_page_info() {
        let factory = DynamicObjectFactory::new();
        let sink = RecordingSink::new();
        let shared = SharedObjects {
            page_info: page_info_object("Billing", None),
            connection_args: connection_args_object("Billing"),
        };

        let objects = factory
            .make_edge_connection("UserFilms", &film(), None, &shared, &sink)
            .unwrap();
        let page_info = objects
            .connection
            .fields
            .iter()
            .find(|f| f.name == "pageInfo")
            .unwrap();
        assert_eq!(page_info.ty, FieldType::Object("BillingPageInfo".to_string()));
    }
}
