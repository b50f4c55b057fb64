pub mod completion;
pub mod config;
pub mod export;
pub mod notes;

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::error::Error;
use crate::parser::{self, Deck};

pub fn print_version() {
    println!(
        "{} {}",
        env!("CARGO_PKG_NAME").bold(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
}

/// Read and parse a deck file, failing when it holds no slides.
pub fn load_deck(file: &Path) -> Result<Deck> {
    let content = std::fs::read_to_string(file).map_err(|source| Error::Read {
        path: file.to_path_buf(),
        source,
    })?;
    let deck = parser::build(&content);
    if deck.is_empty() {
        return Err(Error::EmptyDeck {
            path: file.to_path_buf(),
        }
        .into());
    }
    Ok(deck)
}
