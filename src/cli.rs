use std::path::PathBuf;

use clap::{Parser, Subcommand};

use quickreply::SuggestionLimit;

#[derive(Parser)]
#[command(name = "quickreply")]
#[command(about = "quickreply - Prefix autocomplete suggestions for canned responses.")]
#[command(version = env!("VERSION"))]
pub struct Cli {
    /// Path to one or more config files (merged in order).
    #[arg(long, action = clap::ArgAction::Append)]
    pub config: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a sample config file.
    NewConfig {
        /// Output path for config file.
        #[arg(short, long, default_value = "config.toml")]
        path: PathBuf,
    },

    /// Build a model from a file of normalized responses and save it.
    Build {
        /// Responses file: one response per line, or a .json array of strings.
        #[arg(long)]
        input: PathBuf,

        /// Where to save the model. Overrides `model.path` from the config.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Max. no. of suggestions per prefix. Overrides the config.
        #[arg(long, allow_hyphen_values = true)]
        max_suggestions: Option<SuggestionLimit>,

        /// Min. no. of words in partial-phrase suggestions. Overrides the config.
        #[arg(long)]
        min_words_partial: Option<usize>,
    },

    /// Print completions for one or more prefixes as JSON lines.
    Query {
        /// Model file. Overrides `model.path` from the config.
        #[arg(long)]
        model: Option<PathBuf>,

        /// Prefixes to complete.
        #[arg(required = true)]
        prefixes: Vec<String>,
    },

    /// Print a summary of a model's shape as JSON.
    Stats {
        /// Model file. Overrides `model.path` from the config.
        #[arg(long)]
        model: Option<PathBuf>,
    },
}
