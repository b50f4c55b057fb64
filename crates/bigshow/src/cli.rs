use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::presentation::{AspectRatio, Mode};

#[derive(Parser)]
#[command(name = "bigshow")]
#[command(author, version, about)]
#[command(long_about = "Present markdown slides in big type.\n\n\
    Every slide is set in the largest font that fits the window.\n\n\
    Examples:\n  \
    bigshow talk.md                 Present fullscreen\n  \
    bigshow talk.md --windowed      Present in a window\n  \
    bigshow talk.md --presenter     Also open the presenter view\n  \
    bigshow talk.md --mode print    Start with every slide and its notes\n  \
    bigshow notes talk.md           Print the speaker notes")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Markdown file to present
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub present: PresentArgs,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct PresentArgs {
    /// Launch in a window instead of fullscreen
    #[arg(long)]
    pub windowed: bool,

    /// Start on a specific slide (1-indexed)
    #[arg(long)]
    pub slide: Option<usize>,

    /// Mode to start in
    #[arg(long, value_enum)]
    pub mode: Option<StartMode>,

    /// Open the presenter view on start
    #[arg(long)]
    pub presenter: bool,

    /// Theme (dark, light, white); overrides the deck and the config
    #[arg(long)]
    pub theme: Option<String>,

    /// Talk box width to height ratio, or "false" to use the whole window
    #[arg(long)]
    pub aspect_ratio: Option<AspectRatio>,

    /// Window title; defaults to the first heading, then the file name
    #[arg(long)]
    pub title: Option<String>,

    /// Reload the deck when the file changes
    #[arg(long)]
    pub watch: bool,

    /// File holding the current slide position
    #[arg(long)]
    pub position_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Export slides as PNG images
    Export {
        /// Markdown file to export
        file: PathBuf,

        /// Output directory for PNG files
        #[arg(short, long, default_value = "export")]
        output_dir: PathBuf,

        /// Export width in pixels
        #[arg(long, default_value = "1600")]
        width: u32,

        /// Export height in pixels
        #[arg(long, default_value = "1000")]
        height: u32,
    },

    /// Print the speaker notes of every slide
    Notes {
        /// Markdown file to read
        file: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. defaults.theme, defaults.aspect_ratio)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StartMode {
    Talk,
    Print,
    Jump,
}

impl From<StartMode> for Mode {
    fn from(mode: StartMode) -> Self {
        match mode {
            StartMode::Talk => Mode::Talk,
            StartMode::Print => Mode::Print,
            StartMode::Jump => Mode::Jump,
        }
    }
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Export {
                file,
                output_dir,
                width,
                height,
            }) => crate::commands::export::run(file, output_dir, width, height),
            Some(Commands::Notes { file }) => crate::commands::notes::run(&file),
            Some(Commands::Version) => {
                crate::commands::print_version();
                Ok(())
            }
            None => {
                if let Some(file) = self.file {
                    if !file.exists() {
                        anyhow::bail!("File not found: {}", file.display());
                    }
                    crate::app::run(file, self.present)
                } else {
                    use clap::CommandFactory;
                    let mut cmd = Self::command();
                    cmd.print_help()?;
                    println!();
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_flags() {
        let cli = Cli::try_parse_from([
            "bigshow",
            "talk.md",
            "--slide",
            "3",
            "--mode",
            "jump",
            "--aspect-ratio",
            "false",
            "--presenter",
        ])
        .unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("talk.md")));
        assert_eq!(cli.present.slide, Some(3));
        assert_eq!(cli.present.mode, Some(StartMode::Jump));
        assert_eq!(cli.present.aspect_ratio, Some(AspectRatio::Free));
        assert!(cli.present.presenter);
        assert!(!cli.present.windowed);
    }

    #[test]
    fn test_bad_aspect_ratio_is_rejected() {
        assert!(Cli::try_parse_from(["bigshow", "talk.md", "--aspect-ratio", "wide"]).is_err());
    }

    #[test]
    fn test_subcommand_with_global_flags() {
        let cli = Cli::try_parse_from(["bigshow", "notes", "talk.md", "-vv"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Notes { .. })));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_command_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
