//! `SQLite` schema definitions for the contacts file.
//!
//! One row per record. Columns that only apply to one kind of record are
//! NULL for the other kind.

/// SQL statement to create the records table.
///
/// `position` is the record's zero-based place in the book.
pub const CREATE_RECORDS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS records (
    position INTEGER PRIMARY KEY,
    kind TEXT NOT NULL,
    phone_number TEXT NOT NULL,
    first_name TEXT,
    last_name TEXT,
    birth_date TEXT,
    gender TEXT,
    organization_name TEXT,
    address TEXT,
    time_created TEXT NOT NULL,
    time_last_edit TEXT NOT NULL
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
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_RECORDS_TABLE, CREATE_METADATA_TABLE];

/// Column list shared by the insert and select statements.
pub const RECORD_COLUMNS: &str = "position, kind, phone_number, first_name, last_name, \
     birth_date, gender, organization_name, address, time_created, time_last_edit";
