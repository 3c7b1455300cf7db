use crate::ids::Uid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The ordered-child tables the engine manages.
///
/// Every variant is a disjoint table with identical columns and constraints;
/// a row never moves between tables. Headers are the canonical collection,
/// query parameters and form fields reuse the same linkage machinery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChildTable {
    Headers,
    QueryParams,
    FormFields,
}

impl ChildTable {
    pub const ALL: [ChildTable; 3] = [
        ChildTable::Headers,
        ChildTable::QueryParams,
        ChildTable::FormFields,
    ];

    /// SQL table name. Identifiers cannot be bound as parameters, so query
    /// text is assembled from this fixed set only.
    pub fn table_name(self) -> &'static str {
        match self {
            ChildTable::Headers => "headers",
            ChildTable::QueryParams => "query_params",
            ChildTable::FormFields => "form_fields",
        }
    }
}

/// One entry of an ordered per-example collection.
///
/// `prev`/`next` embed the row in its scope's doubly-linked list: `None` marks
/// the head / tail. `delta_parent_id` points into an override chain the engine
/// treats as opaque.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChildRow {
    pub id: Uid,
    pub example_id: Uid,
    pub key: String,
    pub value: String,
    pub description: String,
    pub enabled: bool,
    pub delta_parent_id: Option<Uid>,
    pub prev: Option<Uid>,
    pub next: Option<Uid>,
}

/// Caller-supplied portion of a row. Linkage is assigned by the inserting
/// operation, never by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildDraft {
    pub id: Uid,
    pub example_id: Uid,
    pub key: String,
    pub value: String,
    pub description: String,
    pub enabled: bool,
    pub delta_parent_id: Option<Uid>,
}

impl ChildDraft {
    pub fn new(id: Uid, example_id: Uid, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id,
            example_id,
            key: key.into(),
            value: value.into(),
            description: String::new(),
            enabled: true,
            delta_parent_id: None,
        }
    }

    pub fn into_row(self, prev: Option<Uid>, next: Option<Uid>) -> ChildRow {
        ChildRow {
            id: self.id,
            example_id: self.example_id,
            key: self.key,
            value: self.value,
            description: self.description,
            enabled: self.enabled,
            delta_parent_id: self.delta_parent_id,
            prev,
            next,
        }
    }
}

/// Row plus the dense zero-based position assigned by ordered traversal.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderedRow {
    pub position: i64,
    pub row: ChildRow,
}

/// Ordered view of one scope, together with the scope scan count observed in
/// the same call.
///
/// When the traversal covers fewer rows than the scan, part of the chain is
/// broken or not yet linked; the remainder is invisible until repaired by the
/// bulk relink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderedScope {
    pub rows: Vec<OrderedRow>,
    pub scope_len: usize,
}

impl OrderedScope {
    /// Rows present in the scope but unreachable from the head.
    pub fn missing(&self) -> usize {
        self.scope_len.saturating_sub(self.rows.len())
    }

    pub fn is_intact(&self) -> bool {
        self.missing() == 0
    }

    pub fn ids(&self) -> Vec<Uid> {
        self.rows.iter().map(|r| r.row.id).collect()
    }
}

/// Wire form of an ordered row for the RPC façade: payload, position, and the
/// creation instant recovered from the id.
#[cfg(feature = "serde")]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChildExport {
    pub id: Uid,
    pub example_id: Uid,
    pub key: String,
    pub value: String,
    pub description: String,
    pub enabled: bool,
    pub delta_parent_id: Option<Uid>,
    pub position: i64,
    pub created_at: String,
}

#[cfg(feature = "serde")]
impl OrderedScope {
    pub fn exports(&self) -> Vec<ChildExport> {
        self.rows
            .iter()
            .map(|r| {
                let millis = r.row.id.timestamp_millis();
                let created_at = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(
                    millis as i64,
                )
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
                ChildExport {
                    id: r.row.id,
                    example_id: r.row.example_id,
                    key: r.row.key.clone(),
                    value: r.row.value.clone(),
                    description: r.row.description.clone(),
                    enabled: r.row.enabled,
                    delta_parent_id: r.row.delta_parent_id,
                    position: r.position,
                    created_at,
                }
            })
            .collect()
    }
}
