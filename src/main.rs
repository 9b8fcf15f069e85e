mod cli;
mod init;

use clap::Parser;
use serde::Serialize;

use cli::Commands;
use quickreply::{config, importer, persist, Autocomplete, Trie};

// Use mimalloc for musl builds (musl's default malloc is very slow).
#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// One line of `query` output.
#[derive(Serialize)]
struct QueryResult<'a> {
    prefix: &'a str,
    completions: Vec<String>,
}

fn main() {
    init::init_logger();

    let cli = cli::Cli::parse();

    match cli.command {
        // Generate a new config file.
        Commands::NewConfig { path } => match config::generate_sample(&path) {
            Ok(_) => {
                log::info!("config file generated: {}", path.display());
            }
            Err(e) => {
                log::error!("error generating config: {}", e);
                std::process::exit(1);
            }
        },

        // Build the model from a responses file and save it.
        Commands::Build {
            input,
            output,
            max_suggestions,
            min_words_partial,
        } => {
            let mut config = init::init_config(&cli.config);
            if max_suggestions.is_some() {
                config.trie.max_suggestions = max_suggestions;
            }
            if min_words_partial.is_some() {
                config.trie.min_words_partial = min_words_partial;
            }

            let mut trie = Trie::new(
                config.trie.max_suggestions(),
                config.trie.min_words_partial(),
            );
            log::info!(
                "max. suggestions: {}, min. words in partial suggestions: {}",
                trie.max_suggestions(),
                trie.min_words_partial()
            );

            if let Err(e) = importer::import_file(&input, &mut trie) {
                log::error!("error importing {}: {}", input.display(), e);
                std::process::exit(1);
            }

            let stats = trie.stats();
            log::info!(
                "trie has {} nodes ({} holding counts, {} branch points), max depth {}",
                stats.nodes,
                stats.decision_nodes,
                stats.branch_points,
                stats.max_depth
            );

            let (path, format) = init::model_location(&config, output);
            if let Err(e) = persist::save_file(&trie, &path, format) {
                log::error!("error saving model {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }

        // Print completions for each prefix.
        Commands::Query { model, prefixes } => {
            let config = init::init_config(&cli.config);
            let (path, format) = init::model_location(&config, model);
            let ac = Autocomplete::new(init::init_model(&path, format));

            for prefix in &prefixes {
                let out = QueryResult {
                    prefix,
                    completions: ac.query(prefix),
                };
                match serde_json::to_string(&out) {
                    Ok(s) => println!("{}", s),
                    Err(e) => {
                        log::error!("error encoding result: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        }

        // Print the model's shape.
        Commands::Stats { model } => {
            let config = init::init_config(&cli.config);
            let (path, format) = init::model_location(&config, model);
            let trie = init::init_model(&path, format);

            match serde_json::to_string_pretty(&trie.stats()) {
                Ok(s) => println!("{}", s),
                Err(e) => {
                    log::error!("error encoding stats: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
