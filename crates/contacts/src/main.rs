//! `contacts` - CLI for the contact book
//!
//! This binary wires the command line, configuration, and logging to the
//! interactive menu.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io;

use anyhow::Context;
use clap::Parser;

use contacts::cli::Cli;
use contacts::{init_logging, Config, ContactBook, Menu};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    let target = config.persistence_target(cli.file);
    let book = ContactBook::open(target.as_deref(), config.storage.create_if_missing);

    let stdin = io::stdin();
    let mut menu = Menu::new(book, stdin.lock(), io::stdout());
    menu.run().context("console I/O failed")?;
    Ok(())
}
