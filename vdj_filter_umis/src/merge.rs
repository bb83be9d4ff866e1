//! Merge the statistics of all chunks into the final summary.
//!
//! Chunk N50s are never combined directly. The merged record keeps the full
//! read pairs per UMI distribution of every GEM group, and the N50 is computed
//! once over the union.

use crate::metrics::{FilterUmisSummary, Metric, UmiReadPairStats};

/// Merge the statistics of any number of chunks, in any order.
pub fn merge_chunk_stats(chunks: impl IntoIterator<Item = UmiReadPairStats>) -> UmiReadPairStats {
    UmiReadPairStats::from_chunks(chunks)
}

/// Merge the statistics of all chunks and compute the summary metrics.
pub fn summarize_chunks(chunks: impl IntoIterator<Item = UmiReadPairStats>) -> FilterUmisSummary {
    merge_chunk_stats(chunks).summary()
}
