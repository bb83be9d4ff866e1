//! Mergeable read-pair statistics and the final FILTER_UMIS summary.

use crate::GemGroup;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The pseudo-chain that accumulates the reads of all chains.
pub const MULTI_CHAIN: &str = "multi";

const LOW_SUPPORT_READS_FRAC: &str = "vdj_recombinome_low_support_reads_frac";
const READPAIRS_PER_UMI_N50: &str = "vdj_recombinome_readpairs_per_umi_n50";

/// A statistic computed over a chunk of data that can be combined with the
/// same statistic of another chunk. `merge` must be associative and
/// commutative, so that chunks can be merged in any grouping and order.
pub trait Metric {
    /// Combine two metrics, modifying self in place, consuming the `other`
    fn merge(&mut self, other: Self);

    /// Merge metrics from an iterator
    fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Self>,
        Self: Default + Sized,
    {
        chunks
            .into_iter()
            .fold(Default::default(), |mut merged, this| {
                merged.merge(this);
                merged
            })
    }
}

/// Read pairs of one chain, and those of them whose UMI is below the
/// minimum read pairs per UMI of its GEM group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowSupportReadPairs {
    pub low_support: u64,
    pub total: u64,
}

impl LowSupportReadPairs {
    pub fn observe(&mut self, read_pairs: u64, is_low_support: bool) {
        self.total += read_pairs;
        if is_low_support {
            self.low_support += read_pairs;
        }
    }

    /// Fraction of low support read pairs, NaN if there are no read pairs.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            f64::NAN
        } else {
            self.low_support as f64 / self.total as f64
        }
    }
}

impl Metric for LowSupportReadPairs {
    fn merge(&mut self, other: Self) {
        self.low_support += other.low_support;
        self.total += other.total;
    }
}

/// Histogram of read pairs per UMI: number of read pairs to number of UMIs.
/// Holds the whole distribution, so that the N50 of merged chunks can be
/// recomputed exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadPairsPerUmi(BTreeMap<u64, u64>);

impl ReadPairsPerUmi {
    pub fn observe(&mut self, read_pairs: u64) {
        *self.0.entry(read_pairs).or_default() += 1;
    }

    pub fn num_umis(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(read_pairs, num_umis)` in increasing order of read pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.0.iter().map(|(&k, &v)| (k, v))
    }

    /// N50 of read pairs per UMI, NaN if there are no UMIs.
    pub fn n50(&self) -> f64 {
        n50_or_nan(self.iter())
    }
}

impl Metric for ReadPairsPerUmi {
    fn merge(&mut self, other: Self) {
        for (read_pairs, num_umis) in other.0 {
            *self.0.entry(read_pairs).or_default() += num_umis;
        }
    }
}

impl FromIterator<u64> for ReadPairsPerUmi {
    fn from_iter<T: IntoIterator<Item = u64>>(iter: T) -> Self {
        let mut hist = ReadPairsPerUmi::default();
        for read_pairs in iter {
            hist.observe(read_pairs);
        }
        hist
    }
}

fn n50_or_nan(counts: impl IntoIterator<Item = (u64, u64)>) -> f64 {
    stats::n50_of_counts(counts).map_or(f64::NAN, |n50| n50 as f64)
}

/// The statistics of one chunk, or of several merged chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UmiReadPairStats {
    /// Keyed by chain, plus all chains together under [`MULTI_CHAIN`].
    pub low_support_read_pairs: BTreeMap<String, LowSupportReadPairs>,
    pub read_pairs_per_umi: BTreeMap<GemGroup, ReadPairsPerUmi>,
}

impl Metric for UmiReadPairStats {
    fn merge(&mut self, other: Self) {
        merge_maps(&mut self.low_support_read_pairs, other.low_support_read_pairs);
        merge_maps(&mut self.read_pairs_per_umi, other.read_pairs_per_umi);
    }
}

fn merge_maps<K: Ord, V: Metric + Default>(this: &mut BTreeMap<K, V>, other: BTreeMap<K, V>) {
    for (k, v) in other {
        this.entry(k).or_default().merge(v);
    }
}

impl UmiReadPairStats {
    /// N50 of read pairs per UMI over all GEM groups.
    pub fn readpairs_per_umi_n50(&self) -> f64 {
        n50_or_nan(self.read_pairs_per_umi.values().flat_map(|hist| hist.iter()))
    }

    pub fn summary(&self) -> FilterUmisSummary {
        FilterUmisSummary {
            readpairs_per_umi_n50: self.readpairs_per_umi_n50(),
            readpairs_per_umi_n50_by_gem_group: self
                .read_pairs_per_umi
                .iter()
                .map(|(&gem_group, hist)| (gem_group, hist.n50()))
                .collect(),
            low_support_reads_frac: self
                .low_support_read_pairs
                .iter()
                .map(|(chain, reads)| (chain.clone(), reads.fraction()))
                .collect(),
        }
    }
}

/// The metrics reported by FILTER_UMIS. Undefined values are NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterUmisSummary {
    pub readpairs_per_umi_n50: f64,
    pub readpairs_per_umi_n50_by_gem_group: BTreeMap<GemGroup, f64>,
    pub low_support_reads_frac: BTreeMap<String, f64>,
}

impl FilterUmisSummary {
    /// Flatten into the metric names of the summary JSON.
    /// NaN is written as null.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut metrics = Map::new();
        metrics.insert(
            format!("{MULTI_CHAIN}_{READPAIRS_PER_UMI_N50}"),
            Value::from(self.readpairs_per_umi_n50),
        );
        for (gem_group, &n50) in &self.readpairs_per_umi_n50_by_gem_group {
            metrics.insert(
                format!("{MULTI_CHAIN}_{gem_group}_{READPAIRS_PER_UMI_N50}"),
                Value::from(n50),
            );
        }
        for (chain, &frac) in &self.low_support_reads_frac {
            metrics.insert(format!("{chain}_{LOW_SUPPORT_READS_FRAC}"), Value::from(frac));
        }
        metrics
    }
}
