use serde::{Deserialize, Serialize};

use crate::document::DocId;
use crate::error::{Error, Result};
use crate::index::IndexStore;
use crate::tokenizer::Tokenizer;

pub const DEFAULT_K1: f64 = 1.2;
pub const DEFAULT_B: f64 = 0.75;

/// BM25 parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term frequency saturation
    pub k1: f64,
    /// Length normalization
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: DEFAULT_K1,
            b: DEFAULT_B,
        }
    }
}

impl Bm25Params {
    pub fn new(k1: f64, b: f64) -> Result<Self> {
        if !(k1 >= 0.0 && (0.0..=1.0).contains(&b)) {
            return Err(Error::InvalidParameters { k1, b });
        }
        Ok(Self { k1, b })
    }
}

/// Read-only scoring over a loaded index.
///
/// Every method taking a `term` string normalizes it with the tokenizer first
/// and fails with `InvalidTerm` unless it yields exactly one index term. The
/// `*_of` variants take an already-normalized term.
pub struct Scorer<'a> {
    index: &'a IndexStore,
    tokenizer: &'a Tokenizer,
}

impl<'a> Scorer<'a> {
    pub fn new(index: &'a IndexStore, tokenizer: &'a Tokenizer) -> Self {
        Self { index, tokenizer }
    }

    /// Raw count of `term` in the document
    pub fn term_frequency(&self, doc_id: DocId, term: &str) -> Result<u32> {
        let term = self.tokenizer.single_term(term)?;
        Ok(self.index.term_count(doc_id, &term))
    }

    pub fn average_document_length(&self) -> f64 {
        self.index.average_doc_length()
    }

    /// ln((N + 1) / (df + 1))
    pub fn idf(&self, term: &str) -> Result<f64> {
        let term = self.tokenizer.single_term(term)?;
        Ok(self.idf_of(&term))
    }

    pub fn idf_of(&self, term: &str) -> f64 {
        let n = self.index.total_documents() as f64;
        let df = self.index.doc_frequency(term) as f64;
        ((n + 1.0) / (df + 1.0)).ln()
    }

    /// ln((N - df + 0.5) / (df + 0.5) + 1); the +1 keeps common terms
    /// non-negative.
    pub fn bm25_idf(&self, term: &str) -> Result<f64> {
        let term = self.tokenizer.single_term(term)?;
        Ok(self.bm25_idf_of(&term))
    }

    pub fn bm25_idf_of(&self, term: &str) -> f64 {
        let n = self.index.total_documents() as f64;
        let df = self.index.doc_frequency(term) as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Saturating, length-normalized term frequency
    pub fn bm25_term_weight(&self, doc_id: DocId, term: &str, params: Bm25Params) -> Result<f64> {
        let term = self.tokenizer.single_term(term)?;
        Ok(self.bm25_term_weight_of(doc_id, &term, params))
    }

    pub fn bm25_term_weight_of(&self, doc_id: DocId, term: &str, params: Bm25Params) -> f64 {
        let tf = self.index.term_count(doc_id, term) as f64;
        if tf == 0.0 {
            return 0.0;
        }
        let avg_len = self.index.average_doc_length();
        // neutral normalization only when the whole index is empty
        let norm = if avg_len > 0.0 {
            let len = self.index.doc_length(doc_id) as f64;
            1.0 - params.b + params.b * (len / avg_len)
        } else {
            1.0
        };
        tf * (params.k1 + 1.0) / (tf + params.k1 * norm)
    }

    pub fn tf_idf(&self, doc_id: DocId, term: &str) -> Result<f64> {
        let term = self.tokenizer.single_term(term)?;
        Ok(self.index.term_count(doc_id, &term) as f64 * self.idf_of(&term))
    }

    pub fn bm25(&self, doc_id: DocId, term: &str, params: Bm25Params) -> Result<f64> {
        let term = self.tokenizer.single_term(term)?;
        Ok(self.bm25_of(doc_id, &term, params))
    }

    pub fn bm25_of(&self, doc_id: DocId, term: &str, params: Bm25Params) -> f64 {
        self.bm25_term_weight_of(doc_id, term, params) * self.bm25_idf_of(term)
    }
}
