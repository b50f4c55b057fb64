use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::{self, Config};
use crate::presentation::Mode;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_or_default();
            config.set(&key, &value)?;
            let path = config.save()?;
            println!("{} {key} = {value}", "Set".green().bold());
            println!("  {}", path.display().to_string().dimmed());
            Ok(())
        }
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let config = Config::load_or_default();
    println!("{} {}", "Config:".bold(), path.display());
    if !path.exists() {
        println!("  {}", "(not created yet; showing defaults)".dimmed());
    }
    println!();

    let rows = [
        (
            "defaults.theme",
            config.theme().unwrap_or("dark").to_string(),
            config::theme_names(),
        ),
        (
            "defaults.aspect_ratio",
            config.aspect_ratio().unwrap_or_default().to_string(),
            "a positive number, false".to_string(),
        ),
        (
            "defaults.start_mode",
            config.start_mode().unwrap_or(Mode::Talk).to_string(),
            "talk, print, jump".to_string(),
        ),
        (
            "presenter.notes_display",
            config
                .notes_display()
                .unwrap_or_default()
                .as_str()
                .to_string(),
            "fit, scroll".to_string(),
        ),
    ];
    for (key, value, choices) in rows {
        println!(
            "  {} {value:<8} {}",
            format!("{key:<26}").cyan(),
            choices.dimmed()
        );
    }
    Ok(())
}
