use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::{
    persist::{Format, PersistError},
    trie::{SuggestionLimit, DEFAULT_MAX_SUGGESTIONS, DEFAULT_MIN_WORDS_PARTIAL},
};

const SAMPLE_CONFIG: &str = include_str!("../config.sample.toml");

const DEFAULT_MODEL_PATH: &str = "model.bin";

/// Application config. Every field is optional so that several files can be
/// layered; unset fields fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trie: TrieConfig,

    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrieConfig {
    /// Integer or float. A float is accepted here and rejected only when a
    /// ranking is computed.
    #[serde(default, deserialize_with = "de_limit")]
    pub max_suggestions: Option<SuggestionLimit>,

    #[serde(default)]
    pub min_words_partial: Option<usize>,
}

impl TrieConfig {
    pub fn max_suggestions(&self) -> SuggestionLimit {
        self.max_suggestions
            .unwrap_or(SuggestionLimit::Integer(DEFAULT_MAX_SUGGESTIONS))
    }

    pub fn min_words_partial(&self) -> usize {
        self.min_words_partial.unwrap_or(DEFAULT_MIN_WORDS_PARTIAL)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// "bincode" or "msgpack".
    #[serde(default)]
    pub format: Option<String>,
}

impl ModelConfig {
    pub fn path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH))
    }

    /// Configured format, or one guessed from `path`.
    pub fn format(&self, path: &Path) -> Result<Format, PersistError> {
        match &self.format {
            Some(f) => f.parse(),
            None => Ok(Format::from_path(path)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Integer(i64),
    Float(f64),
}

fn de_limit<'de, D>(d: D) -> Result<Option<SuggestionLimit>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Number>::deserialize(d)?.map(|n| match n {
        Number::Integer(v) => SuggestionLimit::Integer(v),
        Number::Float(v) => SuggestionLimit::Float(v),
    }))
}

/// Load and merge config files in order. No files yields the defaults.
pub fn load_all(paths: &[PathBuf]) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::default();

    for path in paths {
        log::info!("loading config: {}", path.display());
        let c = read_file(path).map_err(|e| format!("error loading config {}: {}", path.display(), e))?;
        merge(&mut config, c);
    }

    Ok(config)
}

/// Generate sample config file.
pub fn generate_sample(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        return Err("config file already exists".into());
    }
    std::fs::write(path, SAMPLE_CONFIG)?;
    Ok(())
}

/// Load configuration from a given TOML file.
fn read_file(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

fn parse(content: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let cfg: Config = toml::from_str(content)?;
    Ok(cfg)
}

/// Merge the given src config into the dest config struct.
fn merge(dest: &mut Config, src: Config) {
    if src.trie.max_suggestions.is_some() {
        dest.trie.max_suggestions = src.trie.max_suggestions;
    }
    if src.trie.min_words_partial.is_some() {
        dest.trie.min_words_partial = src.trie.min_words_partial;
    }

    if src.model.path.is_some() {
        dest.model.path = src.model.path;
    }
    if src.model.format.is_some() {
        dest.model.format = src.model.format;
    }
}
