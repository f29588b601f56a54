//! In-memory BM25 (Okapi) index over a point-in-time corpus snapshot.
//!
//! The index is built once and is read-only afterwards, so a single
//! instance can be shared across concurrent queries behind an `Arc`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::CorpusDocument;

/// BM25 tuning parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation
    pub k1: f64,

    /// Length normalization
    pub b: f64,

    /// Floor for negative IDF values, as a fraction of the mean IDF
    pub epsilon: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
        }
    }
}

/// A lexical match together with the document it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalHit {
    /// Raw (unnormalized) BM25 score, always positive
    pub score: f64,

    pub document: CorpusDocument,
}

/// Lowercase, whitespace-split tokenizer with edge punctuation trimmed.
///
/// Inner punctuation is kept so that "covid-19" stays a single token.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|raw| raw.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Keyword relevance index.
pub struct LexicalIndex {
    documents: Vec<CorpusDocument>,
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<usize>,
    avg_doc_len: f64,
    idf: HashMap<String, f64>,
    params: Bm25Params,
}

impl LexicalIndex {
    /// Build an index with default BM25 parameters.
    pub fn build(corpus: Vec<CorpusDocument>) -> Self {
        Self::with_params(corpus, Bm25Params::default())
    }

    /// Build an index with explicit BM25 parameters.
    pub fn with_params(corpus: Vec<CorpusDocument>, params: Bm25Params) -> Self {
        let mut term_freqs = Vec::with_capacity(corpus.len());
        let mut doc_lens = Vec::with_capacity(corpus.len());
        let mut doc_freq: HashMap<String, u32> = HashMap::new();
        let mut total_len = 0usize;

        for doc in &corpus {
            let tokens = tokenize(&doc.text);
            total_len += tokens.len();
            doc_lens.push(tokens.len());

            let mut freqs: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *freqs.entry(token).or_insert(0) += 1;
            }
            for term in freqs.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            term_freqs.push(freqs);
        }

        let avg_doc_len = if corpus.is_empty() {
            0.0
        } else {
            total_len as f64 / corpus.len() as f64
        };

        let idf = compute_idf(&doc_freq, corpus.len(), params.epsilon);

        info!(
            documents = corpus.len(),
            vocabulary = idf.len(),
            avg_doc_len,
            "Lexical index built"
        );

        Self {
            documents: corpus,
            term_freqs,
            doc_lens,
            avg_doc_len,
            idf,
            params,
        }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of distinct terms.
    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Mean document length in tokens.
    pub fn average_length(&self) -> f64 {
        self.avg_doc_len
    }

    /// Score every document against pre-tokenized query terms.
    ///
    /// Documents that share no term with the query score `0.0` and are
    /// still present in the map. Repeated query terms count once per repeat.
    pub fn score(&self, query_tokens: &[String]) -> BTreeMap<String, f64> {
        let mut scores = vec![0.0f64; self.documents.len()];

        for term in query_tokens {
            let Some(&idf) = self.idf.get(term) else {
                continue;
            };
            for (idx, freqs) in self.term_freqs.iter().enumerate() {
                let tf = f64::from(freqs.get(term).copied().unwrap_or(0));
                if tf == 0.0 {
                    continue;
                }
                scores[idx] += idf * self.saturate(tf, self.doc_lens[idx]);
            }
        }

        self.documents
            .iter()
            .zip(scores)
            .map(|(doc, score)| (doc.id.clone(), score))
            .collect()
    }

    /// Top `limit` positively-scored documents for a raw query string.
    ///
    /// Ordered by descending score, ties broken by ascending document id.
    pub fn search(&self, query: &str, limit: usize) -> Vec<LexicalHit> {
        let tokens = tokenize(query);
        let by_id = self.score(&tokens);

        let mut ranked: Vec<(usize, f64)> = self
            .documents
            .iter()
            .enumerate()
            .filter_map(|(idx, doc)| {
                let score = by_id.get(&doc.id).copied().unwrap_or(0.0);
                (score.is_finite() && score > 0.0).then_some((idx, score))
            })
            .collect();

        ranked.sort_by(|(li, ls), (ri, rs)| {
            rs.total_cmp(ls)
                .then_with(|| self.documents[*li].id.cmp(&self.documents[*ri].id))
        });
        ranked.truncate(limit);

        debug!(query_terms = tokens.len(), matches = ranked.len(), "Lexical search");

        ranked
            .into_iter()
            .map(|(idx, score)| LexicalHit {
                score,
                document: self.documents[idx].clone(),
            })
            .collect()
    }

    fn saturate(&self, tf: f64, doc_len: usize) -> f64 {
        let Bm25Params { k1, b, .. } = self.params;
        let length_ratio = if self.avg_doc_len > 0.0 {
            doc_len as f64 / self.avg_doc_len
        } else {
            1.0
        };
        tf * (k1 + 1.0) / (tf + k1 * (1.0 - b + b * length_ratio))
    }
}

fn compute_idf(doc_freq: &HashMap<String, u32>, corpus_size: usize, epsilon: f64) -> HashMap<String, f64> {
    let n = corpus_size as f64;
    let mut idf = HashMap::with_capacity(doc_freq.len());
    let mut idf_sum = 0.0;
    let mut negative = Vec::new();

    for (term, &freq) in doc_freq {
        let freq = f64::from(freq);
        let value = (n - freq + 0.5).ln() - (freq + 0.5).ln();
        idf_sum += value;
        if value < 0.0 {
            negative.push(term.clone());
        }
        idf.insert(term.clone(), value);
    }

    if !idf.is_empty() {
        let floor = epsilon * (idf_sum / idf.len() as f64);
        for term in negative {
            idf.insert(term, floor);
        }
    }

    idf
}
