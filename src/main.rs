use anyhow::{Context, Result};
use cinedex::catalog::{load_movies, load_stopwords};
use cinedex::{
    api, Bm25Params, DocId, SearchEngine, SearchHit, SearchMode, SearchOptions, Storage, Tokenizer,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "BM25 movie search", long_about = None)]
struct Cli {
    /// Movie catalog ({"movies": [...]})
    #[arg(long, env = "CINEDEX_DATA", default_value = "data/movies.json", global = true)]
    data: PathBuf,

    /// Newline-separated stopword list; the built-in list is used if absent
    #[arg(long, env = "CINEDEX_STOPWORDS", default_value = "data/stopwords.txt", global = true)]
    stopwords: PathBuf,

    /// Index cache directory
    #[arg(long, env = "CINEDEX_CACHE", default_value = "cache", global = true)]
    cache: PathBuf,

    /// BM25 term frequency saturation
    #[arg(long, default_value_t = cinedex::ranking::DEFAULT_K1, global = true)]
    k1: f64,

    /// BM25 length normalization
    #[arg(long, default_value_t = cinedex::ranking::DEFAULT_B, global = true)]
    b: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the inverted index cache
    Build,
    /// Search movies
    Search {
        query: String,
        #[arg(default_value_t = 5)]
        limit: usize,
        /// bm25, union or title
        #[arg(long, default_value = "bm25")]
        mode: SearchMode,
    },
    /// Term frequency of a term in a document
    Tf { doc_id: DocId, term: String },
    /// Inverse document frequency of a term
    Idf { term: String },
    /// BM25 inverse document frequency of a term
    Bm25idf { term: String },
    /// BM25 term frequency weight of a term in a document
    Bm25tf { doc_id: DocId, term: String },
    /// TF-IDF of a term in a document
    Tfidf { doc_id: DocId, term: String },
    /// Index statistics
    Stats,
    /// Serve the loaded index over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let tokenizer = tokenizer(&cli)?;
    let params = Bm25Params::new(cli.k1, cli.b)?;

    match cli.command {
        Command::Build => {
            let start = Instant::now();
            let movies = load_movies(&cli.data)?;
            let storage = Storage::open(&cli.cache).context("Failed to open index cache")?;
            if storage.has_index()? {
                tracing::info!(cache = %cli.cache.display(), "replacing existing index snapshot");
                storage.clear()?;
            }
            let engine = SearchEngine::build(&storage, &movies, tokenizer, params)?;
            storage.close()?;
            println!(
                "Indexed {} documents in {:?}",
                engine.document_count(),
                start.elapsed()
            );
        }
        Command::Search { query, limit, mode } => {
            let engine = load_engine(&cli.cache, tokenizer, params)?;
            println!("Searching for: {query}");
            let hits = engine.search(&query, &SearchOptions { mode, limit })?;
            print_hits(&hits);
        }
        Command::Tf { doc_id, term } => {
            let engine = load_engine(&cli.cache, tokenizer, params)?;
            let tf = engine.term_frequency(doc_id, &term)?;
            println!("Term frequency of '{term}' in document '{doc_id}': {tf}");
        }
        Command::Idf { term } => {
            let engine = load_engine(&cli.cache, tokenizer, params)?;
            let idf = engine.idf(&term)?;
            println!("Inverse document frequency of '{term}': {idf:.2}");
        }
        Command::Bm25idf { term } => {
            let engine = load_engine(&cli.cache, tokenizer, params)?;
            let idf = engine.bm25_idf(&term)?;
            println!("BM25 IDF score of '{term}': {idf:.2}");
        }
        Command::Bm25tf { doc_id, term } => {
            let engine = load_engine(&cli.cache, tokenizer, params)?;
            let weight = engine.bm25_term_weight(doc_id, &term)?;
            println!("BM25 TF score of '{term}' in document '{doc_id}': {weight:.2}");
        }
        Command::Tfidf { doc_id, term } => {
            let engine = load_engine(&cli.cache, tokenizer, params)?;
            let score = engine.tf_idf(doc_id, &term)?;
            println!("TF-IDF score of '{term}' in document '{doc_id}': {score:.2}");
        }
        Command::Stats => {
            let engine = load_engine(&cli.cache, tokenizer, params)?;
            let stats = engine.stats();
            println!("Total documents: {}", stats.total_documents);
            println!("Total unique terms: {}", stats.total_terms);
            println!("Average document length: {:.2}", stats.avg_doc_length);
        }
        Command::Serve { addr } => {
            let engine = Arc::new(load_engine(&cli.cache, tokenizer, params)?);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(serve(engine, &addr))?;
        }
    }

    Ok(())
}

fn tokenizer(cli: &Cli) -> Result<Tokenizer> {
    if cli.stopwords.exists() {
        Ok(Tokenizer::new(load_stopwords(&cli.stopwords)?))
    } else {
        tracing::warn!(
            path = %cli.stopwords.display(),
            "stopword file not found, using built-in list"
        );
        Ok(Tokenizer::with_default_stopwords())
    }
}

fn load_engine(cache: &Path, tokenizer: Tokenizer, params: Bm25Params) -> Result<SearchEngine> {
    let storage = Storage::open_existing(cache)?;
    let engine = SearchEngine::load(&storage, tokenizer, params)?;
    storage.close()?;
    Ok(engine)
}

fn print_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No results");
    }
    for (i, hit) in hits.iter().enumerate() {
        match hit.score {
            Some(score) => println!("{}. ({}) {} - Score: {:.2}", i + 1, hit.id, hit.title, score),
            None => println!("{}. ({}) {}", i + 1, hit.id, hit.title),
        }
    }
}

async fn serve(engine: Arc<SearchEngine>, addr: &str) -> Result<()> {
    let app = api::create_router(engine);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
