//! Record and page types
//!
//! Upstream objects use camelCase keys. Missing or `null` keys decode to the
//! zero value of the field; a key holding the wrong JSON type is an error.

use crate::types::SchemaVariant;
use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::types::Value as SqlValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Separator between serialized `type:value` label pairs
pub const LABEL_SEPARATOR: &str = ",";

// ============================================================================
// Record Trait
// ============================================================================

/// A table column: name and DuckDB type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name
    pub name: &'static str,
    /// SQL type used when creating the table
    pub sql_type: &'static str,
}

impl Column {
    const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self { name, sql_type }
    }
}

/// An entity the pipeline can decode and upsert.
///
/// `columns()` and `values()` must line up one to one; the first column is
/// the primary key and holds `id()`.
pub trait Record: DeserializeOwned + Send + Sync + 'static {
    /// The table layout this record maps to
    const VARIANT: SchemaVariant;

    /// Column definitions in insert order
    fn columns() -> &'static [Column];

    /// Stable unique identifier (the primary key)
    fn id(&self) -> &str;

    /// Values to bind, in `columns()` order
    fn values(&self) -> Vec<SqlValue>;
}

// ============================================================================
// Nested Structures
// ============================================================================

/// Relationship flags between the requesting viewer and the follower
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    #[serde(default, deserialize_with = "null_as_default")]
    pub muted: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blocked_by: bool,
    /// Follow record URI when the viewer follows this account
    #[serde(default, deserialize_with = "null_as_default")]
    pub following: String,
}

/// Free-text label attached to an account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

impl Label {
    /// Create a label
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// Serialize labels as `type:value` pairs joined in input order.
///
/// An empty slice yields the empty string.
pub fn join_labels(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|label| format!("{}:{}", label.kind, label.value))
        .collect::<Vec<_>>()
        .join(LABEL_SEPARATOR)
}

// ============================================================================
// Minimal Shape
// ============================================================================

/// A follower with identity and display attributes only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowerSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub did: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub handle: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub indexed_at: Option<DateTime<Utc>>,
}

const SUMMARY_COLUMNS: &[Column] = &[
    Column::new("did", "TEXT PRIMARY KEY"),
    Column::new("handle", "TEXT"),
    Column::new("display_name", "TEXT"),
    Column::new("avatar", "TEXT"),
    Column::new("created_at", "TEXT"),
    Column::new("indexed_at", "TEXT"),
];

impl Record for FollowerSummary {
    const VARIANT: SchemaVariant = SchemaVariant::Minimal;

    fn columns() -> &'static [Column] {
        SUMMARY_COLUMNS
    }

    fn id(&self) -> &str {
        &self.did
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.did.clone()),
            SqlValue::Text(self.handle.clone()),
            SqlValue::Text(self.display_name.clone()),
            SqlValue::Text(self.avatar.clone()),
            timestamp_value(self.created_at),
            timestamp_value(self.indexed_at),
        ]
    }
}

// ============================================================================
// Extended Shape
// ============================================================================

/// A follower with viewer relationship flags, labels and description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowerProfile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub did: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub handle: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub viewer: Viewer,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub indexed_at: Option<DateTime<Utc>>,
}

const PROFILE_COLUMNS: &[Column] = &[
    Column::new("did", "TEXT PRIMARY KEY"),
    Column::new("handle", "TEXT"),
    Column::new("display_name", "TEXT"),
    Column::new("avatar", "TEXT"),
    Column::new("viewer_muted", "BOOLEAN"),
    Column::new("viewer_blocked_by", "BOOLEAN"),
    Column::new("viewer_following", "TEXT"),
    Column::new("labels", "TEXT"),
    Column::new("created_at", "TEXT"),
    Column::new("description", "TEXT"),
    Column::new("indexed_at", "TEXT"),
];

impl Record for FollowerProfile {
    const VARIANT: SchemaVariant = SchemaVariant::Extended;

    fn columns() -> &'static [Column] {
        PROFILE_COLUMNS
    }

    fn id(&self) -> &str {
        &self.did
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.did.clone()),
            SqlValue::Text(self.handle.clone()),
            SqlValue::Text(self.display_name.clone()),
            SqlValue::Text(self.avatar.clone()),
            SqlValue::Boolean(self.viewer.muted),
            SqlValue::Boolean(self.viewer.blocked_by),
            SqlValue::Text(self.viewer.following.clone()),
            SqlValue::Text(join_labels(&self.labels)),
            timestamp_value(self.created_at),
            SqlValue::Text(self.description.clone()),
            timestamp_value(self.indexed_at),
        ]
    }
}

// ============================================================================
// Page
// ============================================================================

/// One fetched batch of records plus the token for the next page
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    /// Records in upstream order
    pub records: Vec<R>,
    /// Token for the next page; `None` at the end of the collection
    pub cursor: Option<String>,
}

impl<R> Page<R> {
    /// Create a page, normalising an empty cursor to `None`
    pub fn new(records: Vec<R>, cursor: Option<String>) -> Self {
        Self {
            records,
            cursor: cursor.filter(|c| !c.is_empty()),
        }
    }

    /// Check if this is the final page
    pub fn is_last(&self) -> bool {
        self.cursor.is_none()
    }

    /// Number of records on the page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the page carries no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn timestamp_value(ts: Option<DateTime<Utc>>) -> SqlValue {
    ts.map_or(SqlValue::Null, |t| {
        SqlValue::Text(t.to_rfc3339_opts(SecondsFormat::Millis, true))
    })
}

/// Deserialize `null` as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
