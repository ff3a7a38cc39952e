// Re-export main components
pub mod api;
pub mod catalog;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod ranking;
pub mod storage;
pub mod tokenizer;

// Re-export commonly used types
pub use document::{DocId, Document};
pub use engine::{SearchEngine, SearchHit, SearchMode, SearchOptions};
pub use error::{Error, Result};
pub use index::{IndexStats, IndexStore};
pub use ranking::{Bm25Params, Scorer};
pub use storage::Storage;
pub use tokenizer::Tokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
