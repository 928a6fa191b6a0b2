//! Storage layer for knowledgebank.
//!
//! This module provides `SQLite`-based persistent storage for the resource
//! catalog served by the backend, plus JSON import and export.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::resource::Resource;

/// Persistent resource catalog.
///
/// Resources are returned in insertion order, matching the order of the JSON
/// document they were imported from.
#[derive(Debug)]
pub struct Store {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Store {
    /// Open or create a store at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a resource and return its row id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert(&self, resource: &Resource) -> Result<i64> {
        Self::insert_with(&self.conn, resource)?;
        let id = self.conn.last_insert_rowid();
        debug!(id, title = %resource.title, "Inserted resource");
        Ok(id)
    }

    fn insert_with(conn: &Connection, resource: &Resource) -> Result<()> {
        let tags = serde_json::to_string(&resource.tags)?;
        conn.execute(
            r"
            INSERT INTO resources (title, description, resource_type, tags, url, file, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                resource.title,
                resource.description,
                resource.resource_type,
                tags,
                resource.url,
                resource.file,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Append many resources in one transaction.
    ///
    /// Returns the number of resources written.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is written in that case.
    pub fn import(&self, resources: &[Resource]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for resource in resources {
            Self::insert_with(&tx, resource)?;
        }
        tx.commit()?;

        info!("Imported {} resources", resources.len());
        Ok(resources.len())
    }

    /// Get every resource in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self) -> Result<Vec<Resource>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT title, description, resource_type, tags, url, file
            FROM resources ORDER BY id ASC
            ",
        )?;

        let resources = stmt
            .query_map([], Self::row_to_resource)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(resources)
    }

    /// Count resources in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM resources", [], |row| row.get(0))?;
        Ok(count)
    }

    /// When the most recently inserted resource was added, or `None` for an
    /// empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored timestamp is not RFC 3339.
    pub fn last_added(&self) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT created_at FROM resources ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|at| at.with_timezone(&Utc))
                .map_err(|e| Error::internal(format!("invalid created_at {raw:?}: {e}")))
        })
        .transpose()
    }

    /// Convert a database row to a Resource.
    fn row_to_resource(row: &rusqlite::Row) -> rusqlite::Result<Resource> {
        let tags_json: String = row.get(3)?;
        let tags = serde_json::from_str(&tags_json).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring malformed tags column");
            Vec::new()
        });

        Ok(Resource {
            title: row.get(0)?,
            description: row.get(1)?,
            resource_type: row.get(2)?,
            tags,
            url: row.get(4)?,
            file: row.get(5)?,
        })
    }
}
