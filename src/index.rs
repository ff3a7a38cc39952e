use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::document::{DocId, Document};
use crate::tokenizer::Tokenizer;

/// Term -> ids of documents containing it
pub type Postings = HashMap<String, BTreeSet<DocId>>;
/// Document -> term -> raw occurrence count
pub type TermFrequencies = HashMap<DocId, HashMap<String, u32>>;
/// Document -> token count after filtering
pub type DocLengths = HashMap<DocId, usize>;
/// Document id -> document
pub type DocMap = BTreeMap<DocId, Document>;

/// In-memory inverted index over a full catalog.
///
/// Built once from the whole document set; there are no incremental updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexStore {
    pub(crate) postings: Postings,
    pub(crate) term_frequencies: TermFrequencies,
    pub(crate) doc_lengths: DocLengths,
    pub(crate) docmap: DocMap,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh index from the full catalog
    pub fn from_documents(documents: &[Document], tokenizer: &Tokenizer) -> Self {
        let mut index = Self::new();
        index.build(documents, tokenizer);
        index
    }

    /// Replace the contents of this index with the given catalog
    pub fn build(&mut self, documents: &[Document], tokenizer: &Tokenizer) {
        self.clear();
        for doc in documents {
            self.add_document(doc, tokenizer);
        }
        tracing::info!(
            documents = self.docmap.len(),
            terms = self.postings.len(),
            "built inverted index"
        );
    }

    fn add_document(&mut self, doc: &Document, tokenizer: &Tokenizer) {
        let tokens = tokenizer.tokenize(&doc.searchable_text());

        // a repeated id replaces the earlier entry instead of double counting
        if self.docmap.contains_key(&doc.id) {
            self.remove_document(doc.id);
        }

        let frequencies = self.term_frequencies.entry(doc.id).or_default();
        for token in &tokens {
            *frequencies.entry(token.clone()).or_insert(0) += 1;
            self.postings
                .entry(token.clone())
                .or_default()
                .insert(doc.id);
        }

        self.doc_lengths.insert(doc.id, tokens.len());
        self.docmap.insert(doc.id, doc.clone());
    }

    fn remove_document(&mut self, doc_id: DocId) {
        if let Some(frequencies) = self.term_frequencies.remove(&doc_id) {
            for term in frequencies.keys() {
                if let Some(ids) = self.postings.get_mut(term) {
                    ids.remove(&doc_id);
                    if ids.is_empty() {
                        self.postings.remove(term);
                    }
                }
            }
        }
        self.doc_lengths.remove(&doc_id);
        self.docmap.remove(&doc_id);
    }

    fn clear(&mut self) {
        self.postings.clear();
        self.term_frequencies.clear();
        self.doc_lengths.clear();
        self.docmap.clear();
    }

    /// Ids of documents containing `term`, ascending. Unknown terms yield an
    /// empty list.
    pub fn get_postings(&self, term: &str) -> Vec<DocId> {
        self.postings
            .get(term)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of documents containing `term`
    pub fn doc_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map(BTreeSet::len).unwrap_or(0)
    }

    /// Raw count of `term` in a document; 0 when absent
    pub fn term_count(&self, doc_id: DocId, term: &str) -> u32 {
        self.term_frequencies
            .get(&doc_id)
            .and_then(|terms| terms.get(term))
            .copied()
            .unwrap_or(0)
    }

    /// Token count of a document; 0 when absent
    pub fn doc_length(&self, doc_id: DocId) -> usize {
        self.doc_lengths.get(&doc_id).copied().unwrap_or(0)
    }

    /// Mean of the length table, recomputed on every call
    pub fn average_doc_length(&self) -> f64 {
        if self.doc_lengths.is_empty() {
            return 0.0;
        }
        self.doc_lengths.values().sum::<usize>() as f64 / self.doc_lengths.len() as f64
    }

    pub fn total_documents(&self) -> usize {
        self.docmap.len()
    }

    pub fn get_document(&self, doc_id: DocId) -> Option<&Document> {
        self.docmap.get(&doc_id)
    }

    /// Documents in ascending id order
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.docmap.values()
    }

    /// Whether every structure covers exactly the ids of the document map
    pub fn is_consistent(&self) -> bool {
        let ids: HashSet<DocId> = self.docmap.keys().copied().collect();
        let tf_ids: HashSet<DocId> = self.term_frequencies.keys().copied().collect();
        let length_ids: HashSet<DocId> = self.doc_lengths.keys().copied().collect();

        tf_ids == ids
            && length_ids == ids
            && self
                .postings
                .values()
                .flat_map(|posting| posting.iter())
                .all(|id| ids.contains(id))
    }

    /// Get index statistics
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_documents: self.docmap.len(),
            total_terms: self.postings.len(),
            avg_doc_length: self.average_doc_length(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_documents: usize,
    pub total_terms: usize,
    pub avg_doc_length: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new(["the", "a", "is", "to"].iter().map(|s| s.to_string()).collect())
    }

    fn catalog() -> Vec<Document> {
        vec![
            Document::new(1, "The Matrix", "A hacker discovers reality is simulated"),
            Document::new(2, "Matrix Reloaded", "The sequel to the matrix"),
        ]
    }

    #[test]
    fn test_every_distinct_term_is_posted() {
        let tokenizer = tokenizer();
        let index = IndexStore::from_documents(&catalog(), &tokenizer);

        for doc in catalog() {
            let tokens = tokenizer.tokenize(&doc.searchable_text());
            for token in &tokens {
                assert!(index.get_postings(token).contains(&doc.id));
            }
            assert_eq!(index.doc_length(doc.id), tokens.len());
        }
    }

    #[test]
    fn test_term_counts_every_occurrence() {
        let index = IndexStore::from_documents(&catalog(), &tokenizer());
        assert_eq!(index.term_count(1, "matrix"), 1);
        assert_eq!(index.term_count(2, "matrix"), 2);
        assert_eq!(index.term_count(2, "hacker"), 0);
        assert_eq!(index.doc_length(2), 4);
    }

    #[test]
    fn test_postings_sorted_and_unknown_is_empty() {
        let docs = vec![
            Document::new(9, "Matrix", ""),
            Document::new(3, "Matrix", ""),
            Document::new(5, "Matrix", ""),
        ];
        let index = IndexStore::from_documents(&docs, &tokenizer());
        assert_eq!(index.get_postings("matrix"), vec![3, 5, 9]);
        assert!(index.get_postings("nonexistent").is_empty());
        assert_eq!(index.doc_frequency("nonexistent"), 0);
    }

    #[test]
    fn test_rebuild_does_not_double_count() {
        let tokenizer = tokenizer();
        let mut index = IndexStore::new();
        index.build(&catalog(), &tokenizer);
        index.build(&catalog(), &tokenizer);

        assert_eq!(index, IndexStore::from_documents(&catalog(), &tokenizer));
        assert_eq!(index.term_count(2, "matrix"), 2);
    }

    #[test]
    fn test_duplicate_id_replaces_entry() {
        let docs = vec![
            Document::new(1, "Alien", "space horror"),
            Document::new(1, "Aliens", "space marines"),
        ];
        let index = IndexStore::from_documents(&docs, &tokenizer());
        assert_eq!(index.total_documents(), 1);
        assert!(index.get_postings("horror").is_empty());
        assert_eq!(index.get_postings("marin"), vec![1]);
        assert!(index.is_consistent());
    }

    #[test]
    fn test_average_doc_length() {
        assert_eq!(IndexStore::new().average_doc_length(), 0.0);

        let index = IndexStore::from_documents(&catalog(), &tokenizer());
        let expected = (index.doc_length(1) + index.doc_length(2)) as f64 / 2.0;
        assert_eq!(index.average_doc_length(), expected);
    }

    #[test]
    fn test_consistency_check() {
        let mut index = IndexStore::from_documents(&catalog(), &tokenizer());
        assert!(index.is_consistent());

        index.doc_lengths.remove(&2);
        assert!(!index.is_consistent());
    }
}
