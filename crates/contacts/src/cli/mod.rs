//! Command-line interface for the contact book.
//!
//! The binary takes no subcommands: everything after startup happens in the
//! interactive menu. The flags here only pick the contacts file, the config
//! file, and how chatty logging is.

use std::path::PathBuf;

use clap::Parser;

use crate::logging::Verbosity;

/// contacts - A phone book in your terminal
///
/// Starts an interactive menu for adding, listing, searching, editing, and
/// deleting contacts. Give a FILE to keep the book between runs.
#[derive(Debug, Parser)]
#[command(name = "contacts")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Contacts file to load and save (created if missing)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Path to custom configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
