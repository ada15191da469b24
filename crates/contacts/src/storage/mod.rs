//! Storage layer for the contact book.
//!
//! This module provides `SQLite`-backed persistence for the record collection.
//! The whole collection is read at once and written at once; positions in
//! the `records` table keep the book's insertion order.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{Contact, ContactKind, Organization, Person, Record};

use self::schema::RECORD_COLUMNS;

/// On-disk timestamp format. Keeps sub-second precision so timestamps
/// survive a save/load cycle unchanged.
const STORED_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Storage engine for the contact book.
#[derive(Debug)]
pub struct Storage {
    /// Path to the contacts file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a contacts file at the given path.
    ///
    /// Creates the parent directories and the file if they don't exist, and
    /// initializes the schema if this is a new file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is not a contacts
    /// database, or schema initialization fails.
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

        debug!("Opening contacts file at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        info!("Contacts file opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
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

    /// Get the path to the contacts file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every stored record in book order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or any row cannot be turned back
    /// into a record; no partial collection is returned.
    pub fn load(&self) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM records ORDER BY position ASC"
        ))?;

        let rows = stmt
            .query_map([], RecordRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let records = rows
            .into_iter()
            .map(RecordRow::into_record)
            .collect::<Result<Vec<_>>>()?;

        info!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    /// Replace the stored collection with `records`.
    ///
    /// The old rows are removed and the new ones written in one transaction,
    /// so the file never holds a half-written collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; the stored
    /// collection is then left as it was.
    pub fn save(&mut self, records: &[Record]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM records", [])?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO records ({RECORD_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ))?;
            for (index, record) in records.iter().enumerate() {
                let position = i64::try_from(index)
                    .map_err(|_| Error::internal("record position out of range"))?;
                let row = RecordRow::from_record(position, record);
                stmt.execute(params![
                    row.position,
                    row.kind,
                    row.phone_number,
                    row.first_name,
                    row.last_name,
                    row.birth_date,
                    row.gender,
                    row.organization_name,
                    row.address,
                    row.time_created,
                    row.time_last_edit,
                ])?;
            }
        }
        tx.commit()?;

        debug!("Saved {} records to {}", records.len(), self.path.display());
        Ok(records.len())
    }
}

/// A record flattened into table columns.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RecordRow {
    position: i64,
    kind: String,
    phone_number: String,
    first_name: Option<String>,
    last_name: Option<String>,
    birth_date: Option<String>,
    gender: Option<String>,
    organization_name: Option<String>,
    address: Option<String>,
    time_created: String,
    time_last_edit: String,
}

impl RecordRow {
    fn from_record(position: i64, record: &Record) -> Self {
        let mut row = Self {
            position,
            kind: record.kind().as_str().to_string(),
            phone_number: record.phone_number().to_string(),
            first_name: None,
            last_name: None,
            birth_date: None,
            gender: None,
            organization_name: None,
            address: None,
            time_created: record
                .time_created()
                .format(STORED_TIMESTAMP_FORMAT)
                .to_string(),
            time_last_edit: record
                .time_last_edit()
                .format(STORED_TIMESTAMP_FORMAT)
                .to_string(),
        };

        match record.contact() {
            Contact::Person(person) => {
                row.first_name = Some(person.first_name().to_string());
                row.last_name = Some(person.last_name().to_string());
                row.birth_date = person.birth_date().map(str::to_string);
                row.gender = person.gender().map(|g| g.as_str().to_string());
            }
            Contact::Organization(organization) => {
                row.organization_name = Some(organization.name().to_string());
                row.address = Some(organization.address().to_string());
            }
        }
        row
    }

    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            position: row.get(0)?,
            kind: row.get(1)?,
            phone_number: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            birth_date: row.get(5)?,
            gender: row.get(6)?,
            organization_name: row.get(7)?,
            address: row.get(8)?,
            time_created: row.get(9)?,
            time_last_edit: row.get(10)?,
        })
    }

    fn into_record(self) -> Result<Record> {
        let position = self.position;
        let kind = ContactKind::from_name(&self.kind)
            .ok_or_else(|| Error::corrupt_record(position, format!("unknown kind '{}'", self.kind)))?;

        let contact = match kind {
            ContactKind::Person => {
                let mut person = Person::new(
                    required(position, "first_name", self.first_name)?,
                    required(position, "last_name", self.last_name)?,
                );
                if let Some(birth_date) = &self.birth_date {
                    person.set_birth_date(birth_date).map_err(|_| {
                        Error::corrupt_record(position, format!("bad birth date '{birth_date}'"))
                    })?;
                }
                if let Some(gender) = &self.gender {
                    person.set_gender(gender).map_err(|_| {
                        Error::corrupt_record(position, format!("bad gender '{gender}'"))
                    })?;
                }
                Contact::Person(person)
            }
            ContactKind::Organization => Contact::Organization(Organization::new(
                required(position, "organization_name", self.organization_name)?,
                required(position, "address", self.address)?,
            )),
        };

        let created = parse_timestamp(position, &self.time_created)?;
        let last_edit = parse_timestamp(position, &self.time_last_edit)?;
        Ok(Record::new(contact, self.phone_number).with_timestamps(created, last_edit))
    }
}

fn required(position: i64, column: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| Error::corrupt_record(position, format!("missing {column}")))
}

fn parse_timestamp(position: i64, value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, STORED_TIMESTAMP_FORMAT)
        .map_err(|_| Error::corrupt_record(position, format!("bad timestamp '{value}'")))
}
