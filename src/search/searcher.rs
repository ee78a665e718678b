//! The end-to-end search driver.

use ahash::AHashMap;

use crate::error::Result;
use crate::index::{DocumentId, ReverseIndex};
use crate::query::{parse_query, split_query};
use crate::search::{BoundedResultSet, SearchResult};

/// Execute `query_string` against `index` and return at most `limit` hits,
/// most relevant first.
///
/// The query tree is driven to exhaustion; each successful evaluation adds
/// one point to its document's score, so documents satisfying the query at
/// more cursor positions rank higher.
pub fn search(
    index: &dyn ReverseIndex,
    query_string: &str,
    limit: usize,
) -> Result<Vec<SearchResult>> {
    let fragments = split_query(query_string)?;
    let mut query = parse_query(&fragments)?;
    query.init(index);

    let mut scores: AHashMap<DocumentId, f64> = AHashMap::new();
    while !query.ended() {
        let result = query.run();
        if result.success {
            *scores.entry(result.doc_id).or_default() += 1.0;
        }
        query.advance();
    }
    query.close();

    let mut collected = BoundedResultSet::new(limit);
    for (doc_id, score) in scores {
        collected.store_new_result(SearchResult { doc_id, score });
    }
    Ok(collected.into_sorted_vec())
}
