use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(name = "recall", version, about = "Recall spaced-repetition CLI")]
pub struct Cli {
    /// Store file (defaults to the app data dir)
    #[arg(long)]
    pub store_path: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Deck operations
    #[command(subcommand)]
    Deck(DeckCmd),
    /// Card operations
    #[command(subcommand)]
    Card(CardCmd),
    /// Interactive review loop over due cards
    Review(ReviewCmd),
    /// Review totals, accuracy, and streak
    Stats {
        #[arg(long)]
        deck: Option<String>,
    },
    /// Streak, XP, and level
    Progress,
}

#[derive(Debug, Subcommand, Clone)]
pub enum DeckCmd {
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    List,
    Rm {
        deck: String,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum CardCmd {
    Add(CardAdd),
    List {
        #[arg(long)]
        deck: Option<String>,
    },
    Rm {
        card_id: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct CardAdd {
    #[arg(long)]
    pub deck: String,
    #[arg(long)]
    pub question: String,
    #[arg(long)]
    pub answer: String,
}

#[derive(Debug, Args, Clone)]
pub struct ReviewCmd {
    #[arg(long)]
    pub deck: Option<String>,
    #[arg(long, default_value_t = 50)]
    pub max: usize,
}
