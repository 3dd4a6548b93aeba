//! Abstract ORM capability consumed by the query engine.
//!
//! The engine never talks to a concrete driver; it hands an
//! [`OrmConnection`] a fully described [`PageRequest`] and gets rows back.
//! Storage and connectivity failures propagate unchanged — retry policy
//! belongs to the implementing layer.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::entity::EntityMeta;
use crate::pagination::PagingDirection;

/// Sort direction for an ordering clause.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum OrderDirection {
    /// Ascending order (A-Z, 1-9, oldest-newest)
    #[default]
    Asc,
    /// Descending order (Z-A, 9-1, newest-oldest)
    Desc,
}

impl OrderDirection {
    /// Conventional SQL spelling, for drivers that render ORDER BY clauses
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// One clause of a multi-key ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub field: String,
    pub direction: OrderDirection,
}

impl OrderClause {
    pub fn new(field: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Range bounds decoded from `after`/`before` cursors, expressed as
/// ordering-key tuples matching the request's ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct CursorRange<'a> {
    /// Only rows strictly after this key tuple
    pub after: Option<&'a [Value]>,
    /// Only rows strictly before this key tuple
    pub before: Option<&'a [Value]>,
}

/// One cursor-paginated fetch, scoped to a parent's relation.
#[derive(Debug)]
pub struct PageRequest<'a> {
    /// The owner instance whose relation is being paginated
    pub parent: &'a Value,
    pub parent_type: &'a EntityMeta,
    /// The node entity being fetched
    pub target: &'a EntityMeta,
    /// The join entity, for many-to-many relations
    pub through: Option<&'a EntityMeta>,
    /// Total ordering, tie-break key included
    pub ordering: &'a [OrderClause],
    pub range: CursorRange<'a>,
    /// Fetch limit. Includes the engine's one-row over-fetch, so
    /// implementations apply it verbatim.
    pub limit: Option<u64>,
    /// `Forward` takes rows from the start of the bounded set, `Backward`
    /// from its tail. Rows are returned in ascending configured order either
    /// way.
    pub direction: PagingDirection,
}

/// A fetched row: the node itself plus the join record it was reached
/// through, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRow {
    pub node: Value,
    pub through: Option<Value>,
}

/// Capability to fetch one ordered page of a relation.
#[async_trait]
pub trait OrmConnection: Send + Sync {
    async fn fetch_page(&self, request: PageRequest<'_>) -> anyhow::Result<Vec<FetchedRow>>;
}

/// Factory producing ORM connections, registered once at configuration time.
pub type OrmFactory = Arc<dyn Fn() -> Arc<dyn OrmConnection> + Send + Sync>;
