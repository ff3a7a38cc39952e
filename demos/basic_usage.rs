use cinedex::{Bm25Params, Document, SearchEngine, SearchMode, SearchOptions, Storage, Tokenizer};

fn main() -> anyhow::Result<()> {
    println!("=== cinedex Basic Usage Example ===\n");

    let movies = vec![
        Document::new(1, "The Matrix", "A hacker discovers reality is simulated"),
        Document::new(2, "Matrix Reloaded", "The sequel to the matrix"),
        Document::new(3, "Heat", "A detective hunts a crew of professional thieves"),
        Document::new(4, "Alien", "A crew in deep space meets a deadly creature"),
        Document::new(5, "Aliens", "Marines return to fight the alien creatures"),
    ];

    // Build and persist into a temporary cache, then load it back
    let storage = Storage::in_memory()?;
    SearchEngine::build(&storage, &movies, Tokenizer::default(), Bm25Params::default())?;
    let engine = SearchEngine::load(&storage, Tokenizer::default(), Bm25Params::default())?;
    println!("Indexed {} movies\n", engine.document_count());

    println!("--- BM25 search for 'alien crew' ---");
    for (i, hit) in engine.search("alien crew", &SearchOptions::default())?.iter().enumerate() {
        println!("{}. ({}) {} - Score: {:.2}", i + 1, hit.id, hit.title, hit.score.unwrap_or(0.0));
    }

    println!("\n--- Posting-list union for 'matrix crew' ---");
    let options = SearchOptions {
        mode: SearchMode::Union,
        limit: 3,
    };
    for (i, hit) in engine.search("matrix crew", &options)?.iter().enumerate() {
        println!("{}. ({}) {}", i + 1, hit.id, hit.title);
    }

    println!("\n--- Term statistics ---");
    println!("tf(2, matrix)     = {}", engine.term_frequency(2, "matrix")?);
    println!("idf(matrix)       = {:.4}", engine.idf("matrix")?);
    println!("bm25idf(matrix)   = {:.4}", engine.bm25_idf("matrix")?);
    println!("bm25(2, matrix)   = {:.4}", engine.bm25(2, "matrix")?);

    match engine.idf("matrix reloaded") {
        Err(err) => println!("\nMulti-word key rejected: {err}"),
        Ok(value) => println!("\nUnexpected idf: {value}"),
    }

    let stats = engine.stats();
    println!("\nTotal unique terms: {}", stats.total_terms);
    println!("Average document length: {:.2}", stats.avg_doc_length);

    Ok(())
}
