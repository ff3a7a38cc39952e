//! Loading the movie catalog and stopword list from disk.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use crate::document::Document;

// Wrapper for the catalog file: {"movies": [...]}
#[derive(Debug, Deserialize)]
struct Catalog {
    movies: Vec<Document>,
}

/// Load every movie from a JSON catalog
pub fn load_movies<P: AsRef<Path>>(path: P) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open catalog {}", path.display()))?;
    let catalog: Catalog = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse catalog {}", path.display()))?;
    Ok(catalog.movies)
}

/// Load a newline-separated stopword list
pub fn load_stopwords<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read stopwords {}", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}
