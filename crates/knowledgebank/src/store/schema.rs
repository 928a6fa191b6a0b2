//! `SQLite` schema definitions for knowledgebank.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the resources table.
///
/// Tags are stored as a JSON array so their order survives a round trip.
pub const CREATE_RESOURCES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS resources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    resource_type TEXT NOT NULL DEFAULT '',
    tags TEXT NOT NULL DEFAULT '[]',
    url TEXT,
    file TEXT,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_RESOURCES_TABLE,
    CREATE_METADATA_TABLE,
];
