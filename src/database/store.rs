//! DuckDB record store

use crate::error::{Error, Result, ResultExt};
use crate::record::{FollowerProfile, FollowerSummary, Record};
use crate::types::SchemaVariant;
use duckdb::{params_from_iter, Connection};
use std::path::{Path, PathBuf};

/// Table used when none is configured
pub const DEFAULT_TABLE: &str = "followers";

/// Destination for committed batches
pub trait RecordSink<R> {
    /// Apply one batch atomically and return the number of records written.
    ///
    /// On error nothing from the batch is visible.
    fn persist(&mut self, records: &[R]) -> Result<usize>;
}

/// Check that a table name is a plain SQL identifier.
///
/// Table names are interpolated into statements, so only
/// `[A-Za-z_][A-Za-z0-9_]*` is accepted.
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::invalid_value(
            "store.table",
            format!("'{name}' is not a plain identifier"),
        ))
    }
}

/// Follower table in a DuckDB database
pub struct RecordStore {
    /// DuckDB connection
    conn: Connection,
    /// Target table
    table: String,
    /// Database file, `None` when in memory
    path: Option<PathBuf>,
}

impl RecordStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>, table: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let table = table.into();
        validate_identifier(&table)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;

        Ok(Self {
            conn,
            table,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory(table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        validate_identifier(&table)?;

        let conn = Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?;

        Ok(Self {
            conn,
            table,
            path: None,
        })
    }

    /// Target table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Database file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Underlying connection, for inspection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for a record type
    pub fn create_table_sql<R: Record>(&self) -> String {
        let columns = R::columns()
            .iter()
            .map(|c| format!("{} {}", c.name, c.sql_type))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE IF NOT EXISTS {} ({columns})", self.table)
    }

    /// Upsert statement for a record type
    pub fn upsert_sql<R: Record>(&self) -> String {
        let columns = R::columns();
        let names = columns.iter().map(|c| c.name).collect::<Vec<_>>().join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT OR REPLACE INTO {} ({names}) VALUES ({placeholders})",
            self.table
        )
    }

    /// Create the table for a record type if it does not exist
    pub fn ensure_table<R: Record>(&self) -> Result<()> {
        let sql = self.create_table_sql::<R>();
        let variant = R::VARIANT;
        tracing::debug!(table = %self.table, %variant, "Ensuring table");
        self.conn
            .execute_batch(&sql)
            .with_context(|| format!("Failed to create table '{}'", self.table))
    }

    /// Create the table for a schema variant chosen at runtime
    pub fn ensure_schema(&self, variant: SchemaVariant) -> Result<()> {
        match variant {
            SchemaVariant::Minimal => self.ensure_table::<FollowerSummary>(),
            SchemaVariant::Extended => self.ensure_table::<FollowerProfile>(),
        }
    }

    /// Upsert a batch in one transaction.
    ///
    /// An empty batch commits nothing and returns 0. Any failing record rolls
    /// the whole batch back.
    pub fn upsert_batch<R: Record>(&mut self, records: &[R]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let sql = self.upsert_sql::<R>();
        let batch_size = records.len();
        let failure = |index: usize, message: String| Error::Persistence {
            batch_size,
            index,
            id: records
                .get(index.min(batch_size - 1))
                .map(|r| r.id().to_string())
                .unwrap_or_default(),
            message,
        };

        let tx = self.conn.transaction().map_err(|e| failure(0, e.to_string()))?;

        {
            // DuckDB binds the statement against the table here
            let mut stmt = tx.prepare(&sql).map_err(|e| failure(0, e.to_string()))?;
            for (index, record) in records.iter().enumerate() {
                if record.id().is_empty() {
                    return Err(failure(index, "record has an empty id".to_string()));
                }
                stmt.execute(params_from_iter(record.values()))
                    .map_err(|e| failure(index, e.to_string()))?;
            }
        }

        // Dropping `tx` on any early return above rolls the batch back
        tx.commit().map_err(|e| failure(batch_size, e.to_string()))?;
        Ok(batch_size)
    }

    /// Number of rows in the table
    pub fn count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// All ids in the table, sorted
    pub fn ids(&self) -> Result<Vec<String>> {
        let sql = format!("SELECT did FROM {} ORDER BY did", self.table);
        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

impl<R: Record> RecordSink<R> for RecordStore {
    fn persist(&mut self, records: &[R]) -> Result<usize> {
        self.upsert_batch(records)
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("table", &self.table)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
