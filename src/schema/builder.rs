//! Two-phase binding of relayed fields.
//!
//! The original design attached behavior to a field before its owning type
//! was fully defined and relied on "run after the current task" scheduling
//! to finish the job. Here the two phases are explicit: declaring a relayed
//! connection only records intent; [`RelaySchemaBuilder::finalize`] performs
//! schema synthesis and resolver installation once the configuration and
//! every declaration are known-complete. A context is required up front, so
//! the old configure-before-binding ordering hazard cannot arise.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::config::RelayContext;
use crate::engine::{ConnectionResolver, RelayedConnectionOptions, RelayedField};
use crate::entity::{EntityMeta, RelayEntity};
use crate::error::{RelayError, RelayResult};
use crate::pagination::{Connection, ConnectionArgs};

struct PendingConnection {
    owner: EntityMeta,
    target: EntityMeta,
    through: Option<EntityMeta>,
    field_name: String,
    options: RelayedConnectionOptions,
}

/// Collects relayed-field declarations, then binds them all at once.
pub struct RelaySchemaBuilder {
    context: Arc<RelayContext>,
    pending: Vec<PendingConnection>,
}

impl RelaySchemaBuilder {
    pub fn new(context: Arc<RelayContext>) -> Self {
        Self {
            context,
            pending: Vec::new(),
        }
    }

    /// Declare `field_name` on `Owner` as a relayed connection of `Target`.
    pub fn relayed_connection<Owner, Target>(
        mut self,
        field_name: &str,
        options: RelayedConnectionOptions,
    ) -> Self
    where
        Owner: RelayEntity,
        Target: RelayEntity,
    {
        self.pending.push(PendingConnection {
            owner: EntityMeta::of::<Owner>(),
            target: EntityMeta::of::<Target>(),
            through: None,
            field_name: field_name.to_string(),
            options,
        });
        self
    }

    /// Declare a relayed connection that goes through a join entity whose
    /// own attributes are exposed on the edge.
    pub fn relayed_connection_through<Owner, Target, Through>(
        mut self,
        field_name: &str,
        options: RelayedConnectionOptions,
    ) -> Self
    where
        Owner: RelayEntity,
        Target: RelayEntity,
        Through: RelayEntity,
    {
        self.pending.push(PendingConnection {
            owner: EntityMeta::of::<Owner>(),
            target: EntityMeta::of::<Target>(),
            through: Some(EntityMeta::of::<Through>()),
            field_name: field_name.to_string(),
            options,
        });
        self
    }

    /// Bind every declared field: synthesize its schema objects, declare the
    /// field into the sink, instantiate an ORM connection and install the
    /// runtime resolver. Declaration order is preserved.
    pub fn finalize(self) -> RelayResult<ResolverRegistry> {
        let shared = self.context.shared_objects()?;
        let mut resolvers = HashMap::new();

        for pending in self.pending {
            let connection_name =
                derived_name(pending.owner.type_name, &pending.field_name);
            let objects = self.context.factory().make_edge_connection(
                &connection_name,
                &pending.target,
                pending.through.as_ref(),
                &shared,
                self.context.sink(),
            )?;

            let resolver_key =
                format!("{}.{}", pending.owner.type_name, pending.field_name);
            self.context.factory().declare_field_as_connection(
                self.context.sink(),
                pending.owner.type_name,
                &pending.field_name,
                &resolver_key,
                &objects.connection,
            );

            let orm = self.context.orm_connection();
            let field = RelayedField::new(
                pending.field_name,
                pending.owner,
                pending.target,
                pending.through,
                pending.options,
                orm,
            )?;

            tracing::debug!(connection = %connection_name, "bound relayed field");
            resolvers.insert(resolver_key, field.into_resolver());
        }

        Ok(ResolverRegistry { resolvers })
    }
}

/// The cache key for a connection's schema objects: owning type name plus
/// the capitalized field name.
fn derived_name(owner: &str, field: &str) -> String {
    let mut chars = field.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    format!("{owner}{capitalized}")
}

/// Installed resolvers, keyed by `"{Owner}.{field}"`.
pub struct ResolverRegistry {
    resolvers: HashMap<String, ConnectionResolver>,
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("keys", &self.resolvers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ResolverRegistry {
    pub fn get(&self, key: &str) -> Option<&ConnectionResolver> {
        self.resolvers.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.resolvers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Resolve a relayed field by key.
    pub async fn resolve(
        &self,
        key: &str,
        parent: Value,
        args: ConnectionArgs,
    ) -> RelayResult<Connection> {
        let resolver = self.get(key).ok_or_else(|| {
            RelayError::Configuration(format!(
                "no relayed resolver registered under `{key}`"
            ))
        })?;
        resolver(parent, args).await
    }
}
