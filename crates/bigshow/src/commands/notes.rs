use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::parser::Deck;

pub fn run(file: &Path) -> Result<()> {
    let deck = super::load_deck(file)?;
    print!("{}", render(&deck));
    Ok(())
}

/// One section per slide: its number and headline, then its notes.
fn render(deck: &Deck) -> String {
    let mut out = String::new();
    for slide in &deck.slides {
        let number = format!("{:>3}.", slide.index + 1);
        out.push_str(&format!("{} {}\n", number.dimmed(), slide.headline().bold()));
        if slide.notes.is_empty() {
            out.push_str(&format!("     {}\n", "(no notes)".dimmed()));
        }
        for note in &slide.notes {
            for line in note.lines() {
                out.push_str(&format!("     {line}\n"));
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    #[test]
    fn test_notes_listing() {
        colored::control::set_override(false);
        let deck = parser::build("# Intro\n\n^ Say hello\n---\nPlain slide\n");
        assert_eq!(
            render(&deck),
            "  1. Intro\n     Say hello\n\n  2. Plain slide\n     (no notes)\n\n"
        );
    }
}
