//! End-to-end search over a persisted index.

use std::sync::Arc;

use quill::error::Result;
use quill::index::{InvertedIndex, ReverseIndex, Token};
use quill::persist::{PersistenceConfig, PersistenceManager};
use quill::search::search;
use quill::storage::MemoryDiskHandler;

fn tokens(words: &[&str]) -> Vec<Token> {
    words
        .iter()
        .enumerate()
        .map(|(position, word)| Token::new(*word, position as u64))
        .collect()
}

fn sample_corpus() -> [&'static [&'static str]; 4] {
    [
        &["hello", "world"],
        &[
            "guitar",
            "string",
            "instrument",
            "band",
            "important",
            "music",
            "instrument",
        ],
        &["love", "music", "chess", "science"],
        &["screwdriver", "hammer", "instrument", "drill", "wrench"],
    ]
}

fn build_index(config: PersistenceConfig) -> Result<InvertedIndex> {
    let handler = Arc::new(MemoryDiskHandler::new());
    let manager = Arc::new(PersistenceManager::new(config, handler));
    let index = InvertedIndex::new(manager);

    for words in sample_corpus() {
        index.store_new_document(&mut tokens(words).into_iter())?;
    }
    Ok(index)
}

fn matched_documents(index: &InvertedIndex, query: &str) -> Result<Vec<u64>> {
    let mut documents: Vec<u64> = search(index, query, 10)?
        .into_iter()
        .map(|result| result.doc_id)
        .collect();
    documents.sort_unstable();
    Ok(documents)
}

#[test]
fn test_boolean_queries_over_persisted_corpus() -> Result<()> {
    let index = build_index(PersistenceConfig::default())?;

    assert_eq!(matched_documents(&index, "hello AND world")?, vec![1]);
    assert_eq!(matched_documents(&index, "guitar AND music")?, vec![2]);
    assert_eq!(matched_documents(&index, "guitar OR music")?, vec![2, 3]);
    assert_eq!(matched_documents(&index, "music OR guitar")?, vec![2, 3]);
    assert!(matched_documents(&index, "hello AND guitar")?.is_empty());

    Ok(())
}

#[test]
fn test_proximity_queries() -> Result<()> {
    let index = build_index(PersistenceConfig::default())?;

    assert_eq!(matched_documents(&index, "love NEAR:1 music")?, vec![3]);
    assert!(matched_documents(&index, "guitar NEAR:4 music")?.is_empty());
    assert_eq!(matched_documents(&index, "guitar NEAR:5 music")?, vec![2]);

    Ok(())
}

#[test]
fn test_grouping_and_precedence() -> Result<()> {
    let index = build_index(PersistenceConfig::default())?;

    // hello OR (music AND chess): the standalone hello document still counts.
    assert_eq!(
        matched_documents(&index, "hello OR music AND chess")?,
        vec![1, 3]
    );
    // (hello OR music) AND chess: now hello alone is not enough.
    assert_eq!(
        matched_documents(&index, "(hello OR music) AND chess")?,
        vec![3]
    );

    Ok(())
}

#[test]
fn test_search_results_rank_by_term_frequency() -> Result<()> {
    let index = build_index(PersistenceConfig::default())?;

    let results = search(&index, "instrument", 10)?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].doc_id, 2);
    assert_eq!(results[0].score, 2.0);
    assert_eq!(results[1].doc_id, 4);
    assert_eq!(results[1].score, 1.0);

    Ok(())
}

#[test]
fn test_search_works_with_tiny_chunks_and_cache() -> Result<()> {
    // Force constant splitting and eviction; results must not change.
    let config = PersistenceConfig {
        max_cached_chunks: 2,
        max_chunk_size: 2,
    };
    let index = build_index(config)?;

    assert_eq!(matched_documents(&index, "guitar AND music")?, vec![2]);
    assert_eq!(matched_documents(&index, "guitar OR music")?, vec![2, 3]);
    assert_eq!(matched_documents(&index, "love NEAR:1 music")?, vec![3]);

    Ok(())
}

#[test]
fn test_malformed_queries_error_out() -> Result<()> {
    let index = build_index(PersistenceConfig::default())?;

    assert!(search(&index, "hello AND", 10).is_err());
    assert!(search(&index, "hello NOT world", 10).is_err());
    assert!(search(&index, "hello & world", 10).is_err());
    assert!(search(&index, "(hello AND world", 10).is_err());

    Ok(())
}
