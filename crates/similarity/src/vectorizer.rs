//! Bag-of-words count vectorizer.
//!
//! Documents are tokenized on non-alphanumeric boundaries, lowercased and
//! stripped of English stop words. The `vocabulary_limit` most frequent
//! terms (total count over the corpus, ties broken alphabetically) form the
//! vocabulary, which is then ordered alphabetically so column `j` is always
//! the `j`-th term in sorted order.

use crate::error::{Result, SimilarityError};
use corpus::stopwords::is_stop_word;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Vocabulary size used when building artifacts
pub const DEFAULT_VOCABULARY_LIMIT: usize = 5000;

/// Sparse N x V term-count matrix, one row per document in input order.
///
/// Each row holds `(term, count)` pairs sorted by term column with no zero
/// counts.
#[derive(Debug, Clone, PartialEq)]
pub struct CountMatrix {
    rows: Vec<Vec<(usize, u32)>>,
    vocabulary: Vec<String>,
}

impl CountMatrix {
    /// Number of documents (N)
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of vocabulary terms (V)
    pub fn n_terms(&self) -> usize {
        self.vocabulary.len()
    }

    /// Non-zero `(term, count)` entries of row `i`
    pub fn row(&self, i: usize) -> &[(usize, u32)] {
        &self.rows[i]
    }

    /// Count of `term` in document `i` (0 when absent)
    pub fn get(&self, i: usize, term: usize) -> u32 {
        self.rows[i]
            .binary_search_by_key(&term, |&(t, _)| t)
            .map(|pos| self.rows[i][pos].1)
            .unwrap_or(0)
    }

    /// Alphabetically ordered vocabulary; index is the column
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }
}

/// Count vectorizer over a fixed-size vocabulary
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    vocabulary_limit: usize,
    vocabulary: Vec<String>,
    term_to_column: HashMap<String, usize>,
}

impl CountVectorizer {
    pub fn new(vocabulary_limit: usize) -> Self {
        Self {
            vocabulary_limit,
            vocabulary: Vec::new(),
            term_to_column: HashMap::new(),
        }
    }

    /// Fitted vocabulary in column order
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Learn the vocabulary from `documents`.
    #[instrument(skip(self, documents), fields(documents = documents.len(), limit = self.vocabulary_limit))]
    pub fn fit<S: AsRef<str> + Sync>(&mut self, documents: &[S]) -> Result<()> {
        if documents.is_empty() {
            return Err(SimilarityError::EmptyCorpus);
        }
        if self.vocabulary_limit == 0 {
            return Err(SimilarityError::InvalidVocabularyLimit);
        }

        let mut totals: HashMap<String, usize> = HashMap::new();
        for document in documents {
            for token in tokenize(document.as_ref()) {
                *totals.entry(token).or_insert(0) += 1;
            }
        }

        if totals.is_empty() {
            return Err(SimilarityError::EmptyVocabulary);
        }

        let distinct = totals.len();
        let mut ranked: Vec<(String, usize)> = totals.into_iter().collect();
        ranked.sort_by(|(term_a, count_a), (term_b, count_b)| {
            count_b.cmp(count_a).then_with(|| term_a.cmp(term_b))
        });
        ranked.truncate(self.vocabulary_limit);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        vocabulary.sort();

        self.term_to_column = vocabulary
            .iter()
            .enumerate()
            .map(|(column, term)| (term.clone(), column))
            .collect();
        self.vocabulary = vocabulary;

        info!(
            "Fitted vocabulary of {} terms ({} distinct in corpus)",
            self.vocabulary.len(),
            distinct
        );
        Ok(())
    }

    /// Encode `documents` as counts over the fitted vocabulary.
    ///
    /// Out-of-vocabulary terms are dropped.
    pub fn transform<S: AsRef<str> + Sync>(&self, documents: &[S]) -> CountMatrix {
        let rows: Vec<Vec<(usize, u32)>> = documents
            .par_iter()
            .map(|document| self.encode(document.as_ref()))
            .collect();

        let empty_rows = rows.iter().filter(|row| row.is_empty()).count();
        if empty_rows > 0 {
            debug!("{} documents have no in-vocabulary terms", empty_rows);
        }

        CountMatrix {
            rows,
            vocabulary: self.vocabulary.clone(),
        }
    }

    /// Fit on `documents`, then encode them
    pub fn fit_transform<S: AsRef<str> + Sync>(&mut self, documents: &[S]) -> Result<CountMatrix> {
        self.fit(documents)?;
        Ok(self.transform(documents))
    }

    fn encode(&self, document: &str) -> Vec<(usize, u32)> {
        let mut counts: HashMap<usize, u32> = HashMap::new();
        for token in tokenize(document) {
            if let Some(&column) = self.term_to_column.get(&token) {
                *counts.entry(column).or_insert(0) += 1;
            }
        }
        let mut row: Vec<(usize, u32)> = counts.into_iter().collect();
        row.sort_unstable_by_key(|&(column, _)| column);
        row
    }
}

/// Vectorize `documents` with a fresh `CountVectorizer`
pub fn vectorize<S: AsRef<str> + Sync>(documents: &[S], vocabulary_limit: usize) -> Result<CountMatrix> {
    CountVectorizer::new(vocabulary_limit).fit_transform(documents)
}

/// Lowercased tokens of at least two characters that are not stop words.
///
/// Tokens are runs of word characters: letters, digits and `_`. So
/// `sci_fi` stays one token while `x-wing` splits.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|token| !is_stop_word(token))
}
