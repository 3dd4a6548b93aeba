//! In-memory ORM connection for tests and examples.
//!
//! Rows are stored per entity type; relations are explicit links from an
//! owner row to target rows, optionally carrying a join record. The store
//! implements the full [`OrmConnection`] contract: total ordering, cursor
//! range predicates and both scan directions.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::orm::{
    FetchedRow, OrderClause, OrderDirection, OrmConnection, PageRequest,
};
use crate::pagination::PagingDirection;

#[derive(Debug, Clone)]
struct Link {
    target_id: Value,
    through: Option<Value>,
}

/// An in-memory object/link store.
#[derive(Debug, Default, Clone)]
pub struct MemoryOrm {
    rows: HashMap<String, Vec<Value>>,
    links: HashMap<(String, String, String), Vec<Link>>,
}

impl MemoryOrm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a row under an entity type name.
    pub fn insert(&mut self, type_name: &str, row: Value) -> &mut Self {
        self.rows.entry(type_name.to_string()).or_default().push(row);
        self
    }

    /// Relate an owner row to a target row.
    pub fn link(
        &mut self,
        owner_type: &str,
        owner_id: impl Into<Value>,
        target_type: &str,
        target_id: impl Into<Value>,
    ) -> &mut Self {
        self.push_link(owner_type, owner_id.into(), target_type, target_id.into(), None)
    }

    /// Relate an owner row to a target row through a join record whose
    /// attributes surface on the edge.
    pub fn link_through(
        &mut self,
        owner_type: &str,
        owner_id: impl Into<Value>,
        target_type: &str,
        target_id: impl Into<Value>,
        through: Value,
    ) -> &mut Self {
        self.push_link(
            owner_type,
            owner_id.into(),
            target_type,
            target_id.into(),
            Some(through),
        )
    }

    fn push_link(
        &mut self,
        owner_type: &str,
        owner_id: Value,
        target_type: &str,
        target_id: Value,
        through: Option<Value>,
    ) -> &mut Self {
        let key = (
            owner_type.to_string(),
            owner_id.to_string(),
            target_type.to_string(),
        );
        self.links
            .entry(key)
            .or_default()
            .push(Link { target_id, through });
        self
    }

    fn find_row(&self, type_name: &str, pk_field: &str, id: &Value) -> Option<&Value> {
        self.rows
            .get(type_name)?
            .iter()
            .find(|row| row.get(pk_field) == Some(id))
    }
}

#[async_trait]
impl OrmConnection for MemoryOrm {
    async fn fetch_page(&self, request: PageRequest<'_>) -> anyhow::Result<Vec<FetchedRow>> {
        let parent_id = request
            .parent
            .get(request.parent_type.primary_key)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "parent row has no `{}` key",
                    request.parent_type.primary_key
                )
            })?;

        let key = (
            request.parent_type.type_name.to_string(),
            parent_id.to_string(),
            request.target.type_name.to_string(),
        );
        let links = self.links.get(&key).map(Vec::as_slice).unwrap_or_default();

        let mut rows: Vec<FetchedRow> = links
            .iter()
            .filter_map(|link| {
                self.find_row(
                    request.target.type_name,
                    request.target.primary_key,
                    &link.target_id,
                )
                .map(|node| FetchedRow {
                    node: node.clone(),
                    through: link.through.clone(),
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            compare_key_tuples(
                &ordering_keys(&a.node, request.ordering),
                &ordering_keys(&b.node, request.ordering),
                request.ordering,
            )
        });

        if let Some(after) = request.range.after {
            rows.retain(|row| {
                compare_key_tuples(
                    &ordering_keys(&row.node, request.ordering),
                    after,
                    request.ordering,
                ) == Ordering::Greater
            });
        }
        if let Some(before) = request.range.before {
            rows.retain(|row| {
                compare_key_tuples(
                    &ordering_keys(&row.node, request.ordering),
                    before,
                    request.ordering,
                ) == Ordering::Less
            });
        }

        if let Some(limit) = request.limit {
            let limit = limit as usize;
            match request.direction {
                PagingDirection::Forward => rows.truncate(limit),
                PagingDirection::Backward => {
                    if rows.len() > limit {
                        let excess = rows.len() - limit;
                        rows.drain(..excess);
                    }
                }
            }
        }

        Ok(rows)
    }
}

fn ordering_keys(node: &Value, ordering: &[OrderClause]) -> Vec<Value> {
    ordering
        .iter()
        .map(|clause| node.get(&clause.field).cloned().unwrap_or(Value::Null))
        .collect()
}

/// Compare two ordering-key tuples under the configured per-clause
/// directions. The first unequal key decides.
fn compare_key_tuples(a: &[Value], b: &[Value], ordering: &[OrderClause]) -> Ordering {
    for (index, clause) in ordering.iter().enumerate() {
        let left = a.get(index).unwrap_or(&Value::Null);
        let right = b.get(index).unwrap_or(&Value::Null);
        let mut ord = compare_values(left, right);
        if clause.direction == OrderDirection::Desc {
            ord = ord.reverse();
        }
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Total order over JSON scalars: null < booleans < numbers < strings,
/// composites by canonical text.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .unwrap_or_default()
                .total_cmp(&y.as_f64().unwrap_or_default()),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (x, y) if rank(x) == rank(y) => x.to_string().cmp(&y.to_string()),
        (x, y) => rank(x).cmp(&rank(y)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityMeta, FieldDef, FieldKind};
    use crate::orm::CursorRange;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const OWNER_FIELDS: &[FieldDef] = &[FieldDef {
        name: "id",
        kind: FieldKind::Id,
        nullable: false,
    }];

    const ITEM_FIELDS: &[FieldDef] = &[
        FieldDef {
            name: "id",
            kind: FieldKind::Id,
            nullable: false,
        },
        FieldDef {
            name: "rank",
            kind: FieldKind::Int,
            nullable: false,
        },
    ];

    fn owner() -> EntityMeta {
        EntityMeta {
            type_name: "Owner",
            primary_key: "id",
            fields: OWNER_FIELDS,
        }
    }

    fn item() -> EntityMeta {
        EntityMeta {
            type_name: "Item",
            primary_key: "id",
            fields: ITEM_FIELDS,
        }
    }

    fn seeded() -> MemoryOrm {
        let mut orm = MemoryOrm::new();
        orm.insert("Owner", json!({"id": 1}));
        for (id, rank) in [(1, 30), (2, 10), (3, 20)] {
            orm.insert("Item", json!({"id": id, "rank": rank}));
            orm.link("Owner", 1, "Item", id);
        }
        orm
    }

    fn ids(rows: &[FetchedRow]) -> Vec<i64> {
        rows.iter()
            .filter_map(|r| r.node.get("id").and_then(Value::as_i64))
            .collect()
    }

    #[tokio::test]
    async fn test_rows_come_back_in_configured_order() {
        let orm = seeded();
        let ordering = [
            OrderClause::new("rank", OrderDirection::Asc),
            OrderClause::new("id", OrderDirection::Asc),
        ];
        let parent = json!({"id": 1});

        let rows = orm
            .fetch_page(PageRequest {
                parent: &parent,
                parent_type: &owner(),
                target: &item(),
                through: None,
                ordering: &ordering,
                range: CursorRange::default(),
                limit: None,
                direction: PagingDirection::Forward,
            })
            .await
            .unwrap();
        assert_eq!(ids(&rows), [2, 3, 1]);
    }

    #[tokio::test]
    async fn test_range_bounds_are_strict() {
        let orm = seeded();
        let ordering = [
            OrderClause::new("rank", OrderDirection::Asc),
            OrderClause::new("id", OrderDirection::Asc),
        ];
        let parent = json!({"id": 1});
        let after = [json!(10), json!(2)];
        let before = [json!(30), json!(1)];

        let rows = orm
            .fetch_page(PageRequest {
                parent: &parent,
                parent_type: &owner(),
                target: &item(),
                through: None,
                ordering: &ordering,
                range: CursorRange {
                    after: Some(&after),
                    before: Some(&before),
                },
                limit: None,
                direction: PagingDirection::Forward,
            })
            .await
            .unwrap();
        // Only the middle row survives both strict bounds.
        assert_eq!(ids(&rows), [3]);
    }

    #[tokio::test]
    async fn test_backward_limit_keeps_the_tail_in_forward_order() {
        let orm = seeded();
        let ordering = [
            OrderClause::new("rank", OrderDirection::Asc),
            OrderClause::new("id", OrderDirection::Asc),
        ];
        let parent = json!({"id": 1});

        let rows = orm
            .fetch_page(PageRequest {
                parent: &parent,
                parent_type: &owner(),
                target: &item(),
                through: None,
                ordering: &ordering,
                range: CursorRange::default(),
                limit: Some(2),
                direction: PagingDirection::Backward,
            })
            .await
            .unwrap();
        assert_eq!(ids(&rows), [3, 1]);
    }

    #[tokio::test]
    async fn test_through_records_ride_along() {
        let mut orm = MemoryOrm::new();
        orm.insert("Owner", json!({"id": 1}));
        orm.insert("Item", json!({"id": 7, "rank": 1}));
        orm.link_through("Owner", 1, "Item", 7, json!({"joined_at": "2019-03-01"}));
        let ordering = [OrderClause::new("id", OrderDirection::Asc)];
        let parent = json!({"id": 1});

        let rows = orm
            .fetch_page(PageRequest {
                parent: &parent,
                parent_type: &owner(),
                target: &item(),
                through: None,
                ordering: &ordering,
                range: CursorRange::default(),
                limit: None,
                direction: PagingDirection::Forward,
            })
            .await
            .unwrap();
        assert_eq!(rows[0].through, Some(json!({"joined_at": "2019-03-01"})));
    }

    #[test]
    fn test_value_order_is_total_across_kinds() {
        let mut values = vec![
            json!("b"),
            json!(2),
            json!(null),
            json!(true),
            json!("a"),
            json!(1.5),
        ];
        values.sort_by(|a, b| compare_values(a, b));
        assert_eq!(
            values,
            [json!(null), json!(true), json!(1.5), json!(2), json!("a"), json!("b")]
        );
    }
}
