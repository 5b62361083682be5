//! Persisted corpus snapshot.
//!
//! The snapshot is the normalized record set in corpus order, written as
//! JSON together with its content hash. Similarity matrices store the same
//! hash in their header, which is how a matrix is tied to the exact corpus
//! ordering it was built from.

use crate::error::{CorpusError, Result};
use crate::index::compute_content_hash;
use crate::types::{Corpus, MovieRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;
use tracing::info;

/// Bumped whenever `MovieRecord` changes shape
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    format_version: u32,
    content_hash: &'a str,
    records: &'a [MovieRecord],
}

#[derive(Deserialize)]
struct CorpusSnapshot {
    format_version: u32,
    content_hash: String,
    records: Vec<MovieRecord>,
}

impl Corpus {
    /// Write the corpus snapshot to `path`
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(
            &mut writer,
            &SnapshotRef {
                format_version: SNAPSHOT_FORMAT_VERSION,
                content_hash: &self.content_hash,
                records: &self.records,
            },
        )?;
        writer.flush()?;

        info!(
            "Saved corpus snapshot ({} movies, hash {}) to {:?}",
            self.records.len(),
            &self.content_hash[..12],
            path
        );
        Ok(())
    }

    /// Load a snapshot written by `save_snapshot`.
    ///
    /// The stored hash is recomputed from the records; a mismatch means the
    /// file was edited or truncated and loading fails.
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CorpusError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => CorpusError::IoError(e),
        })?;

        let snapshot: CorpusSnapshot = serde_json::from_reader(BufReader::new(file))?;
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(CorpusError::SnapshotVersion {
                expected: SNAPSHOT_FORMAT_VERSION,
                found: snapshot.format_version,
            });
        }

        let computed = compute_content_hash(&snapshot.records);
        if computed != snapshot.content_hash {
            return Err(CorpusError::SnapshotHashMismatch {
                stored: snapshot.content_hash,
                computed,
            });
        }

        let corpus = Corpus::from_records(snapshot.records)?;
        info!("Loaded corpus snapshot with {} movies from {:?}", corpus.len(), path);
        Ok(corpus)
    }
}
