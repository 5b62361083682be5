//! Pairwise cosine similarity matrix and its on-disk format.
//!
//! ## File layout
//!
//! ```text
//! {"format_version":1,"corpus_hash":"…","feature":"tags","dimension":4803}\n
//! <dimension * dimension little-endian f32 values, row-major>
//! ```
//!
//! The header's `corpus_hash` is the content hash of the corpus snapshot
//! the matrix rows were built from. Loading checks it against the caller's
//! corpus so a matrix is never paired with a different row order.

use crate::error::{Result, SimilarityError};
use crate::vectorizer::CountMatrix;
use corpus::SimilarityFeature;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info, instrument};

pub const MATRIX_FORMAT_VERSION: u32 = 1;

/// Header line of a persisted matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixHeader {
    pub format_version: u32,
    pub corpus_hash: String,
    pub feature: SimilarityFeature,
    pub dimension: usize,
}

/// Dense, symmetric N x N similarity matrix in corpus row order
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    dimension: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Cosine similarity between every pair of count rows.
    ///
    /// Each row `i` accumulates dot products against rows `j >= i` through
    /// per-term postings, so every unordered pair is computed once. The
    /// upper triangle is then mirrored. A row with no terms has similarity
    /// 0 with every other row and 1 with itself.
    #[instrument(skip(counts), fields(rows = counts.n_rows(), terms = counts.n_terms()))]
    pub fn from_counts(counts: &CountMatrix) -> Self {
        let n = counts.n_rows();

        let squared_norms: Vec<u64> = (0..n)
            .map(|i| {
                counts
                    .row(i)
                    .iter()
                    .map(|&(_, c)| u64::from(c) * u64::from(c))
                    .sum()
            })
            .collect();

        // term column -> (row, count), rows ascending
        let mut postings: Vec<Vec<(usize, u32)>> = vec![Vec::new(); counts.n_terms()];
        for i in 0..n {
            for &(term, count) in counts.row(i) {
                postings[term].push((i, count));
            }
        }

        let upper: Vec<Vec<f32>> = (0..n)
            .into_par_iter()
            .map(|i| {
                let mut dots = vec![0u64; n - i];
                for &(term, count_i) in counts.row(i) {
                    let list = &postings[term];
                    let start = list.partition_point(|&(row, _)| row < i);
                    for &(j, count_j) in &list[start..] {
                        dots[j - i] += u64::from(count_i) * u64::from(count_j);
                    }
                }

                dots.iter()
                    .enumerate()
                    .map(|(offset, &dot)| {
                        if offset == 0 {
                            return 1.0;
                        }
                        cosine(dot, squared_norms[i], squared_norms[i + offset])
                    })
                    .collect()
            })
            .collect();

        let mut values = vec![0.0f32; n * n];
        for (i, row) in upper.into_iter().enumerate() {
            for (offset, value) in row.into_iter().enumerate() {
                let j = i + offset;
                values[i * n + j] = value;
                values[j * n + i] = value;
            }
        }

        debug!("Computed {} pairwise similarities", n * (n.saturating_sub(1)) / 2);
        Self {
            dimension: n,
            values,
        }
    }

    /// Number of rows (and columns)
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Similarity between rows `i` and `j`
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[i * self.dimension + j]
    }

    /// Similarities of row `i` against every row, in corpus order
    pub fn row(&self, i: usize) -> &[f32] {
        let start = i * self.dimension;
        &self.values[start..start + self.dimension]
    }

    /// Write the matrix tagged with the hash of the corpus it was built from
    pub fn save(&self, path: &Path, corpus_hash: &str, feature: SimilarityFeature) -> Result<()> {
        let header = MatrixHeader {
            format_version: MATRIX_FORMAT_VERSION,
            corpus_hash: corpus_hash.to_string(),
            feature,
            dimension: self.dimension,
        };

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, &header)?;
        writer.write_all(b"\n")?;
        for value in &self.values {
            writer.write_all(&value.to_le_bytes())?;
        }
        writer.flush()?;

        info!(
            "Saved {} similarity matrix ({}x{}) to {:?}",
            feature, self.dimension, self.dimension, path
        );
        Ok(())
    }

    /// Load a matrix, failing unless it was built from `expected_hash`
    pub fn load(path: &Path, expected_hash: &str) -> Result<Self> {
        Self::load_checked(path, expected_hash, None)
    }

    /// Like [`load`](Self::load), also requiring the matrix to hold `feature`
    pub fn load_feature(
        path: &Path,
        expected_hash: &str,
        feature: SimilarityFeature,
    ) -> Result<Self> {
        Self::load_checked(path, expected_hash, Some(feature))
    }

    /// Load a matrix and its header without checking the corpus hash
    pub fn load_with_header(path: &Path) -> Result<(MatrixHeader, Self)> {
        let (header, reader) = read_header(path)?;
        let matrix = read_body(&header, reader, path)?;
        Ok((header, matrix))
    }

    // the body is only read once the header matches
    fn load_checked(
        path: &Path,
        expected_hash: &str,
        feature: Option<SimilarityFeature>,
    ) -> Result<Self> {
        let (header, reader) = read_header(path)?;
        if header.corpus_hash != expected_hash {
            return Err(SimilarityError::CorpusMismatch {
                expected: expected_hash.to_string(),
                found: header.corpus_hash,
            });
        }
        match feature {
            Some(expected) if expected != header.feature => {
                return Err(SimilarityError::FeatureMismatch {
                    expected,
                    found: header.feature,
                });
            }
            _ => {}
        }
        read_body(&header, reader, path)
    }
}

/// Parse the header line and check that the rest of the file is exactly
/// `dimension * dimension` values long. Nothing is allocated for the body.
fn read_header(path: &Path) -> Result<(MatrixHeader, BufReader<File>)> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let mut line = String::new();
    reader.read_line(&mut line)?;
    if !line.ends_with('\n') {
        return Err(SimilarityError::Corrupt("missing header line".to_string()));
    }
    let header: MatrixHeader = serde_json::from_str(line.trim_end())?;
    if header.format_version != MATRIX_FORMAT_VERSION {
        return Err(SimilarityError::UnsupportedVersion {
            expected: MATRIX_FORMAT_VERSION,
            found: header.format_version,
        });
    }

    let body_len = file_len.saturating_sub(line.len() as u64);
    let expected_len = (header.dimension as u64)
        .checked_mul(header.dimension as u64)
        .and_then(|cells| cells.checked_mul(4));
    if expected_len != Some(body_len) {
        return Err(SimilarityError::Corrupt(format!(
            "{} body bytes do not hold a {}x{} matrix",
            body_len, header.dimension, header.dimension
        )));
    }
    Ok((header, reader))
}

fn read_body(
    header: &MatrixHeader,
    mut reader: BufReader<File>,
    path: &Path,
) -> Result<SimilarityMatrix> {
    let cells = header.dimension * header.dimension;
    let mut body = vec![0u8; cells * 4];
    reader.read_exact(&mut body)?;

    let values: Vec<f32> = body
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    info!(
        "Loaded {} similarity matrix ({}x{}) from {:?}",
        header.feature, header.dimension, header.dimension, path
    );
    Ok(SimilarityMatrix {
        dimension: header.dimension,
        values,
    })
}

/// Cosine of two count vectors from their dot product and squared norms
fn cosine(dot: u64, squared_norm_a: u64, squared_norm_b: u64) -> f32 {
    if squared_norm_a == 0 || squared_norm_b == 0 {
        return 0.0;
    }
    let value = dot as f64 / ((squared_norm_a as f64) * (squared_norm_b as f64)).sqrt();
    value.clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::vectorize;

    fn matrix_for(docs: &[&str]) -> SimilarityMatrix {
        SimilarityMatrix::from_counts(&vectorize(docs, 100).unwrap())
    }

    #[test]
    fn test_cosine_zero_norm() {
        assert_eq!(cosine(0, 0, 4), 0.0);
        assert_eq!(cosine(0, 4, 0), 0.0);
        assert_eq!(cosine(4, 4, 4), 1.0);
    }

    #[test]
    fn test_shared_term_ranks_higher() {
        let matrix = matrix_for(&["space hero", "space villain", "cooking recipe"]);

        assert_eq!(matrix.dimension(), 3);
        assert!((matrix.get(0, 1) - 0.5).abs() < 1e-6);
        assert_eq!(matrix.get(0, 2), 0.0);
        assert!(matrix.get(0, 1) > matrix.get(0, 2));
    }

    #[test]
    fn test_identical_documents_score_one() {
        let matrix = matrix_for(&["space hero hero", "space hero hero", "cook"]);
        assert_eq!(matrix.get(0, 1), 1.0);
        assert_eq!(matrix.get(1, 0), 1.0);
    }

    #[test]
    fn test_diagonal_and_zero_rows() {
        // second document has no surviving terms
        let matrix = matrix_for(&["space hero", "the and of", "space"]);

        for i in 0..3 {
            assert_eq!(matrix.get(i, i), 1.0);
        }
        assert_eq!(matrix.get(0, 1), 0.0);
        assert_eq!(matrix.get(2, 1), 0.0);
    }

    #[test]
    fn test_symmetric_and_bounded() {
        let docs = [
            "space hero pilot galaxy",
            "space villain galaxy empire",
            "cook recipe kitchen chef",
            "chef space kitchen",
            "hero hero hero villain",
        ];
        let matrix = matrix_for(&docs);

        for i in 0..docs.len() {
            assert_eq!(matrix.row(i).len(), docs.len());
            for j in 0..docs.len() {
                let value = matrix.get(i, j);
                assert!((0.0..=1.0).contains(&value));
                assert!((value - matrix.get(j, i)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity-tags.bin");
        let matrix = matrix_for(&["space hero", "space villain", "cooking recipe"]);

        matrix.save(&path, "abc123", SimilarityFeature::Tags).unwrap();
        let loaded = SimilarityMatrix::load(&path, "abc123").unwrap();
        assert_eq!(loaded, matrix);

        let (header, _) = SimilarityMatrix::load_with_header(&path).unwrap();
        assert_eq!(header.feature, SimilarityFeature::Tags);
        assert_eq!(header.dimension, 3);
    }

    #[test]
    fn test_load_rejects_other_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity-tags.bin");
        matrix_for(&["space hero", "space villain"])
            .save(&path, "abc123", SimilarityFeature::Tags)
            .unwrap();

        let result = SimilarityMatrix::load(&path, "def456");
        assert!(matches!(
            result,
            Err(SimilarityError::CorpusMismatch { ref found, .. }) if found == "abc123"
        ));
    }

    #[test]
    fn test_load_rejects_truncated_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity-tags.bin");
        matrix_for(&["space hero", "space villain"])
            .save(&path, "abc123", SimilarityFeature::Tags)
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 2]).unwrap();

        let result = SimilarityMatrix::load(&path, "abc123");
        assert!(matches!(result, Err(SimilarityError::Corrupt(_))));
    }

    fn write_raw(path: &Path, header: &str, body: &[u8]) {
        let mut bytes = header.as_bytes().to_vec();
        bytes.push(b'\n');
        bytes.extend_from_slice(body);
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_load_rejects_oversized_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity-tags.bin");
        write_raw(
            &path,
            r#"{"format_version":1,"corpus_hash":"abc123","feature":"tags","dimension":1000000000}"#,
            &1.0f32.to_le_bytes(),
        );

        let result = SimilarityMatrix::load(&path, "abc123");
        assert!(matches!(result, Err(SimilarityError::Corrupt(_))));
        assert!(matches!(
            SimilarityMatrix::load_with_header(&path),
            Err(SimilarityError::Corrupt(_))
        ));
    }

    #[test]
    fn test_load_rejects_overflowing_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity-tags.bin");
        let header = format!(
            r#"{{"format_version":1,"corpus_hash":"abc123","feature":"tags","dimension":{}}}"#,
            usize::MAX
        );
        write_raw(&path, &header, &[]);

        let result = SimilarityMatrix::load(&path, "abc123");
        assert!(matches!(result, Err(SimilarityError::Corrupt(_))));
    }

    #[test]
    fn test_load_rejects_trailing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity-tags.bin");
        matrix_for(&["space hero", "space villain"])
            .save(&path, "abc123", SimilarityFeature::Tags)
            .unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        std::fs::write(&path, bytes).unwrap();

        let result = SimilarityMatrix::load(&path, "abc123");
        assert!(matches!(result, Err(SimilarityError::Corrupt(_))));
    }

    #[test]
    fn test_load_feature_checks_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity-genres.bin");
        let matrix = matrix_for(&["space hero", "space villain"]);
        matrix.save(&path, "abc123", SimilarityFeature::Tags).unwrap();

        let result = SimilarityMatrix::load_feature(&path, "abc123", SimilarityFeature::Genres);
        assert!(matches!(
            result,
            Err(SimilarityError::FeatureMismatch {
                expected: SimilarityFeature::Genres,
                found: SimilarityFeature::Tags,
            })
        ));
        let loaded =
            SimilarityMatrix::load_feature(&path, "abc123", SimilarityFeature::Tags).unwrap();
        assert_eq!(loaded, matrix);
    }
}
