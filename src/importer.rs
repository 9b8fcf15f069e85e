use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    time::Instant,
};

use serde::Serialize;

use crate::trie::{Trie, TrieError};

/// Log progress every this many responses.
const LOG_BATCH_SIZE: u64 = 5000;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response {index}: {err}")]
    Trie { index: u64, err: TrieError },
}

/// Summary of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub inserted: u64,
    /// Blank lines or blank JSON strings.
    pub skipped: u64,
}

/// Insert every response in the file at `path` into `trie`.
///
/// `.json` files must hold a JSON array of strings; anything else is read
/// as one response per line. Responses are expected to be normalized
/// already and are inserted as they are, minus blank entries.
pub fn import_file(path: &Path, trie: &mut Trie) -> Result<ImportStats, ImportError> {
    log::info!("importing responses from {} ...", path.display());
    let start = Instant::now();

    let file = BufReader::new(File::open(path)?);
    let stats = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let responses: Vec<String> = serde_json::from_reader(file)?;
            import_all(responses.iter().map(String::as_str), trie)?
        }
        _ => import_lines(file, trie)?,
    };

    log::info!(
        "finished. inserted {} responses ({} skipped) in {:.2?}",
        stats.inserted,
        stats.skipped,
        start.elapsed()
    );
    Ok(stats)
}

/// Insert one response per line from `r`.
pub fn import_lines<R: BufRead>(r: R, trie: &mut Trie) -> Result<ImportStats, ImportError> {
    let mut stats = ImportStats::default();
    let mut n = 0;

    for line in r.lines() {
        let line = line?;
        n += 1;
        insert_one(&line, n, trie, &mut stats)?;
    }

    Ok(stats)
}

/// Insert each response from an in-memory list.
pub fn import_all<'a, I>(responses: I, trie: &mut Trie) -> Result<ImportStats, ImportError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut stats = ImportStats::default();

    for (i, r) in responses.into_iter().enumerate() {
        insert_one(r, i as u64 + 1, trie, &mut stats)?;
    }

    Ok(stats)
}

fn insert_one(response: &str, n: u64, trie: &mut Trie, stats: &mut ImportStats) -> Result<(), ImportError> {
    if response.trim().is_empty() {
        stats.skipped += 1;
        return Ok(());
    }

    trie.insert(response)
        .map_err(|err| ImportError::Trie { index: n, err })?;
    stats.inserted += 1;

    if stats.inserted % LOG_BATCH_SIZE == 0 {
        log::info!("inserted {} responses", stats.inserted);
    }
    Ok(())
}
