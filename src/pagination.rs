//! Runtime connection values and Relay connection arguments.
//!
//! [`Connection`]/[`Edge`]/[`PageInfo`] are the ephemeral values produced by
//! one field resolution; [`ConnectionArgs`] is the raw argument set a caller
//! supplies, validated into a [`Paging`] plan before any query is issued.

use serde::Deserialize;
use serde_json::Value;

use crate::cursor::decode_cursor;
use crate::error::{RelayError, RelayResult};

/// Information about pagination in a connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// When paginating forwards, are there more items?
    pub has_next_page: bool,
    /// When paginating backwards, are there more items?
    pub has_previous_page: bool,
    /// Cursor of the first edge in this page
    pub start_cursor: Option<String>,
    /// Cursor of the last edge in this page
    pub end_cursor: Option<String>,
}

/// An edge in a connection, pairing a node with its position cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// The item at the end of the edge
    pub node: Value,
    /// Attributes of the join record, when the connection goes through one
    pub through: Option<Value>,
    /// Opaque cursor marking this edge's absolute position
    pub cursor: String,
}

/// A paginated connection result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Connection {
    pub edges: Vec<Edge>,
    pub page_info: PageInfo,
}

impl Connection {
    /// Create an empty connection
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Raw Relay connection arguments as supplied by the caller.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ConnectionArgs {
    pub first: Option<i64>,
    pub after: Option<String>,
    pub last: Option<i64>,
    pub before: Option<String>,
}

/// Scan direction of a paginated fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingDirection {
    Forward,
    Backward,
}

/// Validated paging plan derived from [`ConnectionArgs`].
///
/// Cursors are decoded into ordering-key tuples here, before any query runs.
/// With neither `first` nor `last` the page is unbounded (`count: None`) and
/// scans forward.
#[derive(Debug, Clone)]
pub struct Paging {
    pub direction: PagingDirection,
    pub count: Option<u64>,
    pub after: Option<Vec<Value>>,
    pub before: Option<Vec<Value>>,
}

impl Paging {
    /// Validate raw arguments against the field's current ordering arity.
    pub fn from_args(args: &ConnectionArgs, key_len: usize) -> RelayResult<Self> {
        let (direction, count) = match (args.first, args.last) {
            (Some(_), Some(_)) => {
                return Err(RelayError::InvalidArgument(
                    "`first` and `last` are mutually exclusive".to_string(),
                ));
            }
            (Some(n), None) => (PagingDirection::Forward, Some(n)),
            (None, Some(n)) => (PagingDirection::Backward, Some(n)),
            (None, None) => (PagingDirection::Forward, None),
        };

        let count = match count {
            Some(n) if n < 0 => {
                return Err(RelayError::InvalidArgument(
                    "page size must not be negative".to_string(),
                ));
            }
            Some(n) => Some(n as u64),
            None => None,
        };

        let after = args
            .after
            .as_deref()
            .map(|cursor| decode_cursor(cursor, key_len))
            .transpose()?;
        let before = args
            .before
            .as_deref()
            .map(|cursor| decode_cursor(cursor, key_len))
            .transpose()?;

        Ok(Self {
            direction,
            count,
            after,
            before,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::encode_cursor;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_first_and_last_are_mutually_exclusive() {
        let args = ConnectionArgs {
            first: Some(2),
            last: Some(2),
            ..Default::default()
        };
        assert_matches!(
            Paging::from_args(&args, 1),
            Err(RelayError::InvalidArgument(_))
        );
    }

    #[test]
    fn test_negative_page_size_is_rejected() {
        for args in [
            ConnectionArgs {
                first: Some(-1),
                ..Default::default()
            },
            ConnectionArgs {
                last: Some(-5),
                ..Default::default()
            },
        ] {
            assert_matches!(
                Paging::from_args(&args, 1),
                Err(RelayError::InvalidArgument(_))
            );
        }
    }

    #[test]
    fn test_no_limit_scans_forward_unbounded() {
        let paging = Paging::from_args(&ConnectionArgs::default(), 2).unwrap();
        assert_eq!(paging.direction, PagingDirection::Forward);
        assert_eq!(paging.count, None);
        assert!(paging.after.is_none() && paging.before.is_none());
    }

    #[test]
    fn test_last_scans_backward() {
        let args = ConnectionArgs {
            last: Some(3),
            ..Default::default()
        };
        let paging = Paging::from_args(&args, 1).unwrap();
        assert_eq!(paging.direction, PagingDirection::Backward);
        assert_eq!(paging.count, Some(3));
    }

    #[test]
    fn test_cursors_are_decoded_before_any_query() {
        let args = ConnectionArgs {
            first: Some(2),
            after: Some(encode_cursor(&[json!(25), json!(2)])),
            ..Default::default()
        };
        let paging = Paging::from_args(&args, 2).unwrap();
        assert_eq!(paging.after, Some(vec![json!(25), json!(2)]));

        // Same cursor against a different ordering arity is stale.
        assert_matches!(
            Paging::from_args(&args, 3),
            Err(RelayError::InvalidCursor(_))
        );
    }
}
