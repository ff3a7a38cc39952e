use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use crate::document::{DocId, Document};
use crate::error::{Error, Result};
use crate::index::{IndexStats, IndexStore};
use crate::ranking::{Bm25Params, Scorer};
use crate::storage::Storage;
use crate::tokenizer::Tokenizer;

/// Ranking strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Sum of per-term BM25 scores over every document
    #[default]
    Bm25,
    /// First documents found in the query terms' posting lists (unranked)
    Union,
    /// Substring match of query words against title words (legacy linear scan)
    Title,
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bm25" => Ok(SearchMode::Bm25),
            "union" => Ok(SearchMode::Union),
            "title" => Ok(SearchMode::Title),
            other => Err(format!("unknown search mode `{other}` (bm25, union, title)")),
        }
    }
}

/// Search options
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub mode: SearchMode,
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            mode: SearchMode::Bm25,
            limit: 5,
        }
    }
}

/// One search result; `score` is set only by BM25 ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: DocId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl SearchHit {
    fn new(doc: &Document, score: Option<f64>) -> Self {
        Self {
            id: doc.id,
            title: doc.title.clone(),
            score,
        }
    }
}

/// Search orchestrator over a loaded, read-only index
pub struct SearchEngine {
    index: IndexStore,
    tokenizer: Tokenizer,
    params: Bm25Params,
}

impl SearchEngine {
    /// Wrap an already built index
    pub fn new(index: IndexStore, tokenizer: Tokenizer, params: Bm25Params) -> Self {
        Self {
            index,
            tokenizer,
            params,
        }
    }

    /// Rebuild the index from the full catalog and persist it
    pub fn build(
        storage: &Storage,
        documents: &[Document],
        tokenizer: Tokenizer,
        params: Bm25Params,
    ) -> Result<Self> {
        let index = IndexStore::from_documents(documents, &tokenizer);
        storage.save_index(&index)?;
        Ok(Self::new(index, tokenizer, params))
    }

    /// Load the persisted index. A missing cache is reported, never rebuilt.
    pub fn load(storage: &Storage, tokenizer: Tokenizer, params: Bm25Params) -> Result<Self> {
        let index = storage.load_index()?;
        Ok(Self::new(index, tokenizer, params))
    }

    /// Build an unpersisted engine (for testing and demos)
    pub fn in_memory(documents: &[Document]) -> Self {
        let tokenizer = Tokenizer::default();
        let index = IndexStore::from_documents(documents, &tokenizer);
        Self::new(index, tokenizer, Bm25Params::default())
    }

    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    pub fn scorer(&self) -> Scorer<'_> {
        Scorer::new(&self.index, &self.tokenizer)
    }

    /// Search for documents
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchHit>> {
        let hits = match options.mode {
            SearchMode::Bm25 => self.bm25_search(query, options.limit),
            SearchMode::Union => self.union_search(query, options.limit),
            SearchMode::Title => self.title_search(query, options.limit),
        };
        tracing::debug!(query, mode = ?options.mode, hits = hits.len(), "search");
        Ok(hits)
    }

    /// Walk each query term's posting list in ascending id order, collecting
    /// unseen documents until `limit` is reached
    fn union_search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let mut seen = HashSet::new();
        let mut hits = Vec::new();
        if limit == 0 {
            return hits;
        }

        for term in self.tokenizer.tokenize(query) {
            for doc_id in self.index.get_postings(&term) {
                if !seen.insert(doc_id) {
                    continue;
                }
                if let Some(doc) = self.index.get_document(doc_id) {
                    hits.push(SearchHit::new(doc, None));
                }
                if hits.len() >= limit {
                    return hits;
                }
            }
        }
        hits
    }

    /// Score every document against the query, highest first; ties go to the
    /// lower id. Zero-score documents are not filtered.
    fn bm25_search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let scorer = self.scorer();

        // each query token is itself a lookup key and must normalize to one term
        let terms: Vec<String> = self
            .tokenizer
            .tokenize(query)
            .iter()
            .filter_map(|token| match self.tokenizer.single_term(token) {
                Ok(term) => Some(term),
                Err(Error::InvalidTerm { term, .. }) => {
                    tracing::debug!(term = %term, "skipping query token");
                    None
                }
                Err(_) => None,
            })
            .collect();

        let mut scored: Vec<(f64, &Document)> = self
            .index
            .documents()
            .map(|doc| {
                let score = terms
                    .iter()
                    .map(|term| scorer.bm25_of(doc.id, term, self.params))
                    .sum::<f64>();
                (score, doc)
            })
            .collect();

        scored.sort_by(|(score_a, doc_a), (score_b, doc_b)| {
            score_b.total_cmp(score_a).then(doc_a.id.cmp(&doc_b.id))
        });

        scored
            .into_iter()
            .take(limit)
            .map(|(score, doc)| SearchHit::new(doc, Some(score)))
            .collect()
    }

    /// Legacy linear scan: any query word contained in any title word
    fn title_search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let query_words = Tokenizer::words(query);
        if query_words.is_empty() {
            return Vec::new();
        }

        self.index
            .documents()
            .filter(|doc| {
                let title_words = Tokenizer::words(&doc.title);
                query_words
                    .iter()
                    .any(|q| title_words.iter().any(|t| t.contains(q.as_str())))
            })
            .take(limit)
            .map(|doc| SearchHit::new(doc, None))
            .collect()
    }

    pub fn term_frequency(&self, doc_id: DocId, term: &str) -> Result<u32> {
        self.scorer().term_frequency(doc_id, term)
    }

    pub fn idf(&self, term: &str) -> Result<f64> {
        self.scorer().idf(term)
    }

    pub fn bm25_idf(&self, term: &str) -> Result<f64> {
        self.scorer().bm25_idf(term)
    }

    pub fn bm25_term_weight(&self, doc_id: DocId, term: &str) -> Result<f64> {
        self.scorer().bm25_term_weight(doc_id, term, self.params)
    }

    pub fn tf_idf(&self, doc_id: DocId, term: &str) -> Result<f64> {
        self.scorer().tf_idf(doc_id, term)
    }

    pub fn bm25(&self, doc_id: DocId, term: &str) -> Result<f64> {
        self.scorer().bm25(doc_id, term, self.params)
    }

    /// Get index statistics
    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }

    pub fn document_count(&self) -> usize {
        self.index.total_documents()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix_catalog() -> Vec<Document> {
        vec![
            Document::new(1, "The Matrix", "A hacker discovers reality is simulated"),
            Document::new(2, "Matrix Reloaded", "The sequel to the matrix"),
        ]
    }

    fn movie_catalog() -> Vec<Document> {
        vec![
            Document::new(10, "Heat", "A detective hunts a crew of professional thieves"),
            Document::new(4, "Alien", "A crew in deep space meets a deadly creature"),
            Document::new(7, "Aliens", "Marines return to fight the alien creatures"),
            Document::new(2, "The Thing", "An alien creature hides among researchers"),
            Document::new(5, "Paddington", "A bear moves to London"),
        ]
    }

    fn options(mode: SearchMode, limit: usize) -> SearchOptions {
        SearchOptions { mode, limit }
    }

    #[test]
    fn test_bm25_matrix_scenario() -> Result<()> {
        let engine = SearchEngine::in_memory(&matrix_catalog());
        let hits = engine.search("matrix", &options(SearchMode::Bm25, 2))?;

        let ids: HashSet<DocId> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, HashSet::from([1, 2]));

        // document 2 mentions matrix twice in a shorter text
        let score_1 = engine.bm25(1, "matrix")?;
        let score_2 = engine.bm25(2, "matrix")?;
        let expected_first = if score_2 > score_1 { 2 } else { 1 };
        assert_eq!(hits[0].id, expected_first);
        assert_eq!(hits[0].score, Some(score_1.max(score_2)));
        Ok(())
    }

    #[test]
    fn test_bm25_ordering_and_ties() -> Result<()> {
        let engine = SearchEngine::in_memory(&movie_catalog());
        let hits = engine.search("alien creature", &options(SearchMode::Bm25, 10))?;

        assert_eq!(hits.len(), 5);
        for pair in hits.windows(2) {
            let (a, b) = (pair[0].score.unwrap(), pair[1].score.unwrap());
            assert!(a > b || (a == b && pair[0].id < pair[1].id));
        }

        // no overlap at all: still returned, with zero score, lowest ids first
        let tail: Vec<&SearchHit> = hits.iter().filter(|h| h.score == Some(0.0)).collect();
        assert_eq!(tail.iter().map(|h| h.id).collect::<Vec<_>>(), vec![5, 10]);
        Ok(())
    }

    #[test]
    fn test_bm25_limit() -> Result<()> {
        let engine = SearchEngine::in_memory(&movie_catalog());
        assert_eq!(engine.search("alien", &options(SearchMode::Bm25, 2))?.len(), 2);
        assert!(engine.search("alien", &options(SearchMode::Bm25, 0))?.is_empty());
        assert_eq!(engine.search("alien", &options(SearchMode::Bm25, 50))?.len(), 5);
        Ok(())
    }

    #[test]
    fn test_bm25_empty_query_scores_zero() -> Result<()> {
        let engine = SearchEngine::in_memory(&movie_catalog());
        let hits = engine.search("the of", &options(SearchMode::Bm25, 3))?;
        assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![2, 4, 5]);
        assert!(hits.iter().all(|h| h.score == Some(0.0)));
        Ok(())
    }

    #[test]
    fn test_bm25_scores_stay_finite_at_parameter_bounds() -> Result<()> {
        let docs = vec![
            Document::new(1, "Matrix", "hacker"),
            Document::new(2, "Heat", "crew heist"),
            Document::new(3, "", "the of a"),
        ];
        for params in [Bm25Params::new(0.0, 0.75)?, Bm25Params::new(1.2, 1.0)?] {
            let tokenizer = Tokenizer::default();
            let index = IndexStore::from_documents(&docs, &tokenizer);
            let engine = SearchEngine::new(index, tokenizer, params);

            let hits = engine.search("matrix", &options(SearchMode::Bm25, 3))?;
            let scores: Vec<f64> = hits.iter().map(|h| h.score.unwrap()).collect();
            assert!(scores.iter().all(|s| s.is_finite()));
            assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![1, 2, 3]);
            assert!(scores[0] > 0.0);
            assert_eq!(&scores[1..], &[0.0, 0.0]);
        }
        Ok(())
    }

    #[test]
    fn test_union_search() -> Result<()> {
        let engine = SearchEngine::in_memory(&movie_catalog());

        let hits = engine.search("crew alien", &options(SearchMode::Union, 10))?;
        let ids: Vec<DocId> = hits.iter().map(|h| h.id).collect();
        // crew -> [4, 10], then alien -> [2, 4, 7] minus seen
        assert_eq!(ids, vec![4, 10, 2, 7]);
        assert!(hits.iter().all(|h| h.score.is_none()));

        let hits = engine.search("crew alien", &options(SearchMode::Union, 3))?;
        assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![4, 10, 2]);

        assert!(engine.search("zeppelin", &options(SearchMode::Union, 3))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_title_search() -> Result<()> {
        let engine = SearchEngine::in_memory(&movie_catalog());

        let hits = engine.search("ALIEN", &options(SearchMode::Title, 10))?;
        assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![4, 7]);

        let hits = engine.search("in", &options(SearchMode::Title, 1))?;
        assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![2]);
        Ok(())
    }

    #[test]
    fn test_persisted_engine_matches_built() -> Result<()> {
        let storage = Storage::in_memory()?;
        let built = SearchEngine::build(
            &storage,
            &movie_catalog(),
            Tokenizer::default(),
            Bm25Params::default(),
        )?;
        let loaded = SearchEngine::load(&storage, Tokenizer::default(), Bm25Params::default())?;

        let opts = options(SearchMode::Bm25, 5);
        assert_eq!(built.search("alien crew", &opts)?, loaded.search("alien crew", &opts)?);
        assert_eq!(loaded.index(), built.index());
        assert_eq!(loaded.document_count(), 5);
        Ok(())
    }

    #[test]
    fn test_load_without_build_fails() -> Result<()> {
        let storage = Storage::in_memory()?;
        let result = SearchEngine::load(&storage, Tokenizer::default(), Bm25Params::default());
        assert!(matches!(result, Err(Error::CacheUnavailable { .. })));
        Ok(())
    }

    #[test]
    fn test_diagnostics() -> Result<()> {
        let engine = SearchEngine::in_memory(&matrix_catalog());
        assert_eq!(engine.term_frequency(1, "matrix")?, 1);
        assert!(engine.idf("matrix")? <= engine.idf("hacker")?);
        assert!(engine.bm25_idf("matrix")? >= 0.0);
        assert!(engine.tf_idf(1, "hacker")? > 0.0);
        assert!(engine.bm25_term_weight(2, "matrix")? > engine.bm25_term_weight(1, "matrix")?);
        assert!(matches!(
            engine.idf("matrix reloaded"),
            Err(Error::InvalidTerm { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_search_mode_from_str() {
        assert_eq!("BM25".parse::<SearchMode>(), Ok(SearchMode::Bm25));
        assert_eq!("union".parse::<SearchMode>(), Ok(SearchMode::Union));
        assert!("fuzzy".parse::<SearchMode>().is_err());
    }
}
