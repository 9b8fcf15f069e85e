use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
    str::FromStr,
    time::Instant,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trie::{Counts, Label, Node, NodeId, SuggestionLimit, Trie, TrieError};

/// Bumped whenever the record layout changes.
const FORMAT_VERSION: u32 = 1;

const FORMAT_BINCODE: &str = "bincode";
const FORMAT_MSGPACK: &str = "msgpack";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("msgpack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    #[error("msgpack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    #[error("unsupported model version: {0}")]
    Version(u32),

    #[error("unknown model format: {0}")]
    UnknownFormat(String),

    #[error(transparent)]
    Trie(#[from] TrieError),
}

/// On-disk encoding of a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Bincode,
    MsgPack,
}

impl Format {
    /// Guess the format from a file extension, defaulting to bincode.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("msgpack") | Some("mp") => Format::MsgPack,
            _ => Format::Bincode,
        }
    }
}

impl FromStr for Format {
    type Err = PersistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            FORMAT_BINCODE => Ok(Format::Bincode),
            FORMAT_MSGPACK => Ok(Format::MsgPack),
            other => Err(PersistError::UnknownFormat(other.to_string())),
        }
    }
}

/// Serialized form of one node. Maps are flattened to pairs so that every
/// encoding can carry them.
#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    label: Label,
    children: Vec<(Label, u32)>,
    branched: bool,
    counts: Vec<(String, u64)>,
    suggestions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TrieRecord {
    version: u32,
    max_suggestions: SuggestionLimit,
    min_words_partial: u64,
    responses: u64,
    /// Arena order; the root comes first.
    nodes: Vec<NodeRecord>,
}

impl TrieRecord {
    fn from_trie(trie: &Trie) -> Self {
        let nodes = trie
            .nodes()
            .iter()
            .map(|n| NodeRecord {
                label: n.label,
                children: n.children().map(|(l, id)| (l, id.0)).collect(),
                branched: n.branched,
                counts: n.counts.iter().map(|(k, v)| (k.clone(), *v)).collect(),
                suggestions: n.suggestions.clone(),
            })
            .collect();

        Self {
            version: FORMAT_VERSION,
            max_suggestions: trie.max_suggestions(),
            min_words_partial: trie.min_words_partial() as u64,
            responses: trie.responses(),
            nodes,
        }
    }

    fn into_trie(self) -> Result<Trie, PersistError> {
        if self.version != FORMAT_VERSION {
            return Err(PersistError::Version(self.version));
        }

        let nodes = self
            .nodes
            .into_iter()
            .map(|r| Node {
                label: r.label,
                children: r.children.into_iter().map(|(l, id)| (l, NodeId(id))).collect(),
                branched: r.branched,
                counts: r.counts.into_iter().collect::<Counts>(),
                suggestions: r.suggestions,
            })
            .collect();

        let min_words = usize::try_from(self.min_words_partial).unwrap_or(usize::MAX);
        Ok(Trie::from_parts(nodes, self.max_suggestions, min_words, self.responses)?)
    }
}

/// Encode `trie` into `w`.
pub fn save<W: Write>(trie: &Trie, w: W, format: Format) -> Result<(), PersistError> {
    let record = TrieRecord::from_trie(trie);
    match format {
        Format::Bincode => bincode::serialize_into(w, &record)?,
        Format::MsgPack => {
            let mut w = w;
            rmp_serde::encode::write(&mut w, &record)?;
        }
    }
    Ok(())
}

/// Decode a trie from `r`. Malformed input fails without yielding a trie.
pub fn load<R: Read>(r: R, format: Format) -> Result<Trie, PersistError> {
    let record: TrieRecord = match format {
        Format::Bincode => bincode::deserialize_from(r)?,
        Format::MsgPack => rmp_serde::decode::from_read(r)?,
    };
    record.into_trie()
}

pub fn to_bytes(trie: &Trie, format: Format) -> Result<Vec<u8>, PersistError> {
    let mut out = Vec::new();
    save(trie, &mut out, format)?;
    Ok(out)
}

pub fn from_bytes(b: &[u8], format: Format) -> Result<Trie, PersistError> {
    load(b, format)
}

/// Save `trie` to a file.
pub fn save_file(trie: &Trie, path: &Path, format: Format) -> Result<(), PersistError> {
    let start = Instant::now();
    let mut w = BufWriter::new(File::create(path)?);
    save(trie, &mut w, format)?;
    w.flush()?;

    log::info!(
        "saved model ({} nodes) to {} in {:.2?}",
        trie.len(),
        path.display(),
        start.elapsed()
    );
    Ok(())
}

/// Load a trie from a file.
pub fn load_file(path: &Path, format: Format) -> Result<Trie, PersistError> {
    let start = Instant::now();
    let r = BufReader::new(File::open(path)?);
    let trie = load(r, format)?;

    log::info!(
        "loaded model ({} nodes) from {} in {:.2?}",
        trie.len(),
        path.display(),
        start.elapsed()
    );
    Ok(trie)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trie {
        let mut trie = Trie::new(5, 3);
        for r in [
            "what is your account number and address",
            "what is your account number",
            "what is the account number",
            "what is the issue you are facing",
            "what is the issue you are facing",
            "",
            "héllo",
        ] {
            trie.insert(r).unwrap();
        }
        trie
    }

    #[test]
    fn round_trip_both_formats() {
        let trie = sample();
        for format in [Format::Bincode, Format::MsgPack] {
            let blob = to_bytes(&trie, format).unwrap();
            let back = from_bytes(&blob, format).unwrap();
            assert_eq!(back, trie);
            assert_eq!(back.generate_completions("w"), trie.generate_completions("w"));
        }
    }

    #[test]
    fn round_trip_keeps_bad_limit() {
        // A float limit survives persistence and still fails lazily.
        let trie = Trie::new(2.5, 4);
        let mut back = from_bytes(&to_bytes(&trie, Format::Bincode).unwrap(), Format::Bincode).unwrap();
        assert_eq!(back.max_suggestions(), SuggestionLimit::Float(2.5));
        assert!(matches!(back.insert("x"), Err(TrieError::TypeMismatch(_))));
    }

    #[test]
    fn deep_chain_round_trip() {
        let long = "ab ".repeat(40_000);
        let mut trie = Trie::new(3, 4);
        trie.insert(&long).unwrap();
        trie.insert(&long[..long.len() / 2]).unwrap();

        let back = from_bytes(&to_bytes(&trie, Format::Bincode).unwrap(), Format::Bincode).unwrap();
        assert_eq!(back.len(), trie.len());
        assert_eq!(back.stats(), trie.stats());
    }

    #[test]
    fn truncated_blob_fails() {
        let blob = to_bytes(&sample(), Format::Bincode).unwrap();
        assert!(from_bytes(&blob[..blob.len() / 2], Format::Bincode).is_err());
        assert!(from_bytes(&[], Format::MsgPack).is_err());
    }

    fn record_with(edit: impl FnOnce(&mut TrieRecord)) -> Result<Trie, PersistError> {
        let mut record = TrieRecord::from_trie(&sample());
        edit(&mut record);
        let blob = bincode::serialize(&record).unwrap();
        from_bytes(&blob, Format::Bincode)
    }

    #[test]
    fn structural_corruption_is_rejected() {
        let malformed = |r: Result<Trie, PersistError>| {
            matches!(r, Err(PersistError::Trie(TrieError::Malformed(_))))
        };

        // Child index out of range.
        assert!(malformed(record_with(|r| {
            let n = r.nodes.len() as u32;
            r.nodes[0].children[0].1 = n + 7;
        })));

        // A cycle back to the root.
        assert!(malformed(record_with(|r| {
            let last = r.nodes.len() - 1;
            r.nodes[last].children.push((Label::Root, 0));
        })));

        // Shared child.
        assert!(malformed(record_with(|r| {
            let (l, id) = r.nodes[0].children[0];
            r.nodes[1].children.push((l, id));
        })));

        // Orphan node.
        assert!(malformed(record_with(|r| {
            r.nodes.push(NodeRecord {
                label: Label::Char('z'),
                children: Vec::new(),
                branched: false,
                counts: Vec::new(),
                suggestions: Vec::new(),
            });
        })));

        // Root missing.
        assert!(malformed(record_with(|r| {
            r.nodes[0].label = Label::Char('/');
        })));
        assert!(malformed(record_with(|r| r.nodes.clear())));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let r = record_with(|r| r.version = FORMAT_VERSION + 1);
        assert!(matches!(r, Err(PersistError::Version(v)) if v == FORMAT_VERSION + 1));
    }

    #[test]
    fn file_round_trip() {
        let dir = std::env::temp_dir().join(format!("quickreply-persist-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.msgpack");

        let trie = sample();
        let format = Format::from_path(&path);
        assert_eq!(format, Format::MsgPack);

        save_file(&trie, &path, format).unwrap();
        assert_eq!(load_file(&path, format).unwrap(), trie);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn parse_format() {
        assert_eq!("bincode".parse::<Format>().unwrap(), Format::Bincode);
        assert_eq!("MsgPack".parse::<Format>().unwrap(), Format::MsgPack);
        assert!(matches!("json".parse::<Format>(), Err(PersistError::UnknownFormat(_))));
        assert_eq!(Format::from_path(Path::new("model.bin")), Format::Bincode);
    }
}
