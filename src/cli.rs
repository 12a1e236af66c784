use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::diet::DietType;

#[derive(Parser, Debug)]
#[command(name = "greenscan")]
#[command(about = "Check food label ingredients against your diet", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Choose a diet type on first run
    Onboard { diet: DietType },

    Diet {
        #[command(subcommand)]
        action: Option<DietAction>,
    },

    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },

    /// Upload a label photo for analysis (Ctrl-C cancels)
    Scan { image: PathBuf },

    /// Progress of the last upload
    Status,

    /// Show the last analysis result and clear it
    Result,

    /// Print the ingredient candidates found in OCR text (`-` reads stdin)
    Extract { source: String },
}

#[derive(Subcommand, Debug)]
pub enum DietAction {
    Show,
    Set { diet: DietType },
    List,
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    Show,
    Rename { name: String },
    Avatar { image: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_diet_with_spaces_and_dashes() {
        let cli = Cli::try_parse_from(["greenscan", "diet", "set", "lacto-ovo-vegetarian"]).unwrap();
        match cli.command {
            Command::Diet {
                action: Some(DietAction::Set { diet }),
            } => assert_eq!(diet, DietType::LactoOvoVegetarian),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_diet() {
        assert!(Cli::try_parse_from(["greenscan", "onboard", "keto"]).is_err());
    }

    #[test]
    fn scan_takes_a_path() {
        let cli = Cli::try_parse_from(["greenscan", "scan", "label.jpg"]).unwrap();
        assert!(matches!(cli.command, Command::Scan { ref image } if image.ends_with("label.jpg")));
    }
}
