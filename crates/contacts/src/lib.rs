//! `contacts` - A single-user contact book
//!
//! This library provides the record model, the ordered contact book with its
//! `SQLite` persistence, and the interactive menu that drives them.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod book;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod menu;
pub mod record;
pub mod storage;

pub use book::ContactBook;
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use menu::Menu;
pub use record::{Contact, ContactKind, Field, FieldError, Gender, Organization, Person, Record};
pub use storage::Storage;
