//! Relay query engine: one cursor-paginated fetch per field resolution.
//!
//! No state persists across calls; cursors are the sole continuation carried
//! by the caller. Argument and cursor errors are detected before any query
//! is issued. ORM failures propagate unchanged.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::cursor::encode_cursor;
use crate::entity::EntityMeta;
use crate::error::{RelayError, RelayResult};
use crate::orm::{CursorRange, OrderClause, OrderDirection, OrmConnection, PageRequest};
use crate::pagination::{Connection, ConnectionArgs, Edge, PageInfo, Paging, PagingDirection};

/// Options bound to a relayed field, applied on every resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelayedConnectionOptions {
    /// How to order the returned results
    pub order: Vec<OrderClause>,
}

impl RelayedConnectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an ordering clause.
    pub fn order(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        self.order.push(OrderClause::new(field, direction));
        self
    }
}

/// Resolver installed for a relayed field: owner instance + connection
/// arguments in, connection value out.
pub type ConnectionResolver =
    Arc<dyn Fn(Value, ConnectionArgs) -> BoxFuture<'static, RelayResult<Connection>> + Send + Sync>;

/// A bound relayed field: everything needed to resolve one connection.
pub struct RelayedField {
    field_name: String,
    owner: EntityMeta,
    target: EntityMeta,
    through: Option<EntityMeta>,
    ordering: Vec<OrderClause>,
    orm: Arc<dyn OrmConnection>,
}

impl std::fmt::Debug for RelayedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayedField")
            .field("field_name", &self.field_name)
            .field("owner", &self.owner)
            .field("target", &self.target)
            .field("through", &self.through)
            .field("ordering", &self.ordering)
            .finish_non_exhaustive()
    }
}

impl RelayedField {
    /// Bind a field, fixing its ordering.
    ///
    /// The configured order (or the target's primary key ascending when none
    /// is given) always gets an explicit tie-break on the primary key, so
    /// any two distinct rows compare unequal and pagination is
    /// deterministic even when the primary sort key has duplicates.
    pub fn new(
        field_name: impl Into<String>,
        owner: EntityMeta,
        target: EntityMeta,
        through: Option<EntityMeta>,
        options: RelayedConnectionOptions,
        orm: Arc<dyn OrmConnection>,
    ) -> RelayResult<Self> {
        for clause in &options.order {
            if target.field(&clause.field).is_none() {
                return Err(RelayError::Configuration(format!(
                    "order field `{}` does not exist on `{}`",
                    clause.field, target.type_name
                )));
            }
        }

        let mut ordering = options.order;
        if !ordering.iter().any(|c| c.field == target.primary_key) {
            ordering.push(OrderClause::new(target.primary_key, OrderDirection::Asc));
        }

        Ok(Self {
            field_name: field_name.into(),
            owner,
            target,
            through,
            ordering,
            orm,
        })
    }

    /// The effective ordering, tie-break included.
    pub fn ordering(&self) -> &[OrderClause] {
        &self.ordering
    }

    /// Resolve one page of this field for `parent`.
    pub async fn resolve(
        &self,
        parent: &Value,
        args: &ConnectionArgs,
    ) -> RelayResult<Connection> {
        let paging = Paging::from_args(args, self.ordering.len())?;

        tracing::debug!(
            owner = %self.owner.type_name,
            field = %self.field_name,
            direction = ?paging.direction,
            count = ?paging.count,
            "resolving relayed connection"
        );

        let request = PageRequest {
            parent,
            parent_type: &self.owner,
            target: &self.target,
            through: self.through.as_ref(),
            ordering: &self.ordering,
            range: CursorRange {
                after: paging.after.as_deref(),
                before: paging.before.as_deref(),
            },
            // One extra row decides has-more without a second count query.
            limit: paging.count.map(|n| n + 1),
            direction: paging.direction,
        };

        let mut rows = self.orm.fetch_page(request).await?;

        // The over-fetch probes the scan direction; the opposite flag rests
        // on bound-argument presence: an `after` cursor points at a real row
        // before the page, a `before` cursor at one after it.
        let mut has_next_page = paging.before.is_some();
        let mut has_previous_page = paging.after.is_some();
        if let Some(count) = paging.count {
            let count = count as usize;
            if rows.len() > count {
                match paging.direction {
                    PagingDirection::Forward => {
                        has_next_page = true;
                        rows.truncate(count);
                    }
                    PagingDirection::Backward => {
                        has_previous_page = true;
                        let excess = rows.len() - count;
                        rows.drain(..excess);
                    }
                }
            }
        }

        let edges: Vec<Edge> = rows
            .into_iter()
            .map(|row| {
                let keys = self.ordering_keys(&row.node);
                Edge {
                    cursor: encode_cursor(&keys),
                    node: row.node,
                    through: row.through,
                }
            })
            .collect();

        let page_info = PageInfo {
            has_next_page,
            has_previous_page,
            start_cursor: edges.first().map(|e| e.cursor.clone()),
            end_cursor: edges.last().map(|e| e.cursor.clone()),
        };

        Ok(Connection { edges, page_info })
    }

    /// Wrap this field as an installable resolver closure.
    pub fn into_resolver(self) -> ConnectionResolver {
        let field = Arc::new(self);
        Arc::new(move |parent, args| {
            let field = Arc::clone(&field);
            Box::pin(async move { field.resolve(&parent, &args).await })
        })
    }

    fn ordering_keys(&self, node: &Value) -> Vec<Value> {
        self.ordering
            .iter()
            .map(|clause| node.get(&clause.field).cloned().unwrap_or(Value::Null))
            .collect()
    }
}
