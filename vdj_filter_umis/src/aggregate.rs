//! Compute the read pair statistics of one chunk of the UMI info table.

use crate::barcode::gem_group_of;
use crate::errors::FilterUmisError;
use crate::group_by::GroupByContiguousExt;
use crate::metrics::{LowSupportReadPairs, Metric, ReadPairsPerUmi, UmiReadPairStats, MULTI_CHAIN};
use crate::umi_info::{check_barcode_idx, UmiInfoReader};
use crate::GemGroup;
use anyhow::Result;
use fxhash::FxHashMap;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::iter::once;
use std::ops::Range;

/// Aggregates chunks of the UMI info table, given the minimum number of read
/// pairs per UMI of each GEM group. The keys are GEM groups as strings.
pub struct ChunkAggregator<'a> {
    pub min_readpairs_per_umi: &'a HashMap<String, u64>,
}

impl ChunkAggregator<'_> {
    fn threshold(&self, gem_group: GemGroup) -> Result<u64> {
        self.min_readpairs_per_umi
            .get(&gem_group.to_string())
            .copied()
            .ok_or_else(|| FilterUmisError::MissingThreshold(gem_group).into())
    }

    /// Stream the rows of one chunk of GEM group `gem_group` once.
    ///
    /// The reads of each (barcode, UMI) are summed over all chains into the
    /// read pairs per UMI distribution. Each row on its own is counted towards
    /// its chain and [`MULTI_CHAIN`], and is low support if its reads are
    /// below the threshold of the GEM group.
    pub fn aggregate(
        &self,
        umi_info: &impl UmiInfoReader,
        gem_group: GemGroup,
        rows: Range<usize>,
    ) -> Result<UmiReadPairStats> {
        debug!("aggregating rows {rows:?} of GEM group {gem_group}");
        let barcodes = umi_info.barcodes();
        let chains = umi_info.chains();

        let mut chain_read_pairs = vec![LowSupportReadPairs::default(); chains.len()];
        let mut multi_read_pairs = LowSupportReadPairs::default();
        let mut read_pairs_per_umi = ReadPairsPerUmi::default();
        let mut umi_read_pairs: FxHashMap<u32, u64> = FxHashMap::default();
        // Looked up at the first barcode, so that an empty chunk needs no threshold.
        let mut min_read_pairs = None;

        let numbered_rows = umi_info.rows(rows.clone())?.zip(rows.start..);
        for (barcode_idx, bc_rows) in numbered_rows.group_by_contiguous(|(r, _)| r.barcode_idx) {
            check_barcode_idx(bc_rows[0].1, barcode_idx, barcodes.len())?;
            let bc_gem_group = gem_group_of(barcodes, barcode_idx as usize)?;
            if bc_gem_group != gem_group {
                return Err(FilterUmisError::GemGroupMismatch {
                    barcode: barcodes[barcode_idx as usize].clone(),
                    found: bc_gem_group,
                    expected: gem_group,
                }
                .into());
            }
            let threshold = match min_read_pairs {
                Some(threshold) => threshold,
                None => *min_read_pairs.insert(self.threshold(gem_group)?),
            };

            for (row, row_idx) in bc_rows {
                let reads = u64::from(row.reads);
                *umi_read_pairs.entry(row.umi_idx).or_default() += reads;

                let chain_reads = chain_read_pairs.get_mut(row.chain_idx as usize).ok_or(
                    FilterUmisError::ChainIndexOutOfRange {
                        row: row_idx,
                        chain_idx: row.chain_idx as usize,
                        num_chains: chains.len(),
                    },
                )?;
                let is_low_support = reads < threshold;
                chain_reads.observe(reads, is_low_support);
                multi_read_pairs.observe(reads, is_low_support);
            }

            for (_umi, read_pairs) in umi_read_pairs.drain() {
                read_pairs_per_umi.observe(read_pairs);
            }
        }

        let mut low_support_read_pairs = BTreeMap::<String, LowSupportReadPairs>::new();
        for (chain, reads) in chains
            .iter()
            .map(String::as_str)
            .zip(chain_read_pairs)
            .chain(once((MULTI_CHAIN, multi_read_pairs)))
        {
            low_support_read_pairs
                .entry(chain.to_string())
                .or_default()
                .merge(reads);
        }

        Ok(UmiReadPairStats {
            low_support_read_pairs,
            read_pairs_per_umi: BTreeMap::from([(gem_group, read_pairs_per_umi)]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::umi_info::test_utils::{row, strings};
    use crate::umi_info::{UmiInfo, UmiInfoRow};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn thresholds(pairs: &[(&str, u64)]) -> HashMap<String, u64> {
        pairs.iter().map(|&(gg, n)| (gg.to_string(), n)).collect()
    }

    fn reads(low_support: u64, total: u64) -> LowSupportReadPairs {
        LowSupportReadPairs { low_support, total }
    }

    #[test]
    fn test_aggregate_single_barcode() -> Result<()> {
        let umi_info = UmiInfo::from_rows(
            strings(&["ACGT-1"]),
            strings(&["TRA", "TRB"]),
            [row(0, 0, 0, 5), row(0, 0, 1, 3), row(0, 1, 0, 10)],
        )?;
        let thresholds = thresholds(&[("1", 4)]);
        let aggregator = ChunkAggregator {
            min_readpairs_per_umi: &thresholds,
        };
        let stats = aggregator.aggregate(&umi_info, 1, 0..3)?;

        assert_eq!(
            stats.read_pairs_per_umi[&1],
            [8, 10].into_iter().collect::<ReadPairsPerUmi>()
        );
        assert_eq!(stats.low_support_read_pairs["TRA"], reads(0, 15));
        assert_eq!(stats.low_support_read_pairs["TRB"], reads(3, 3));
        assert_eq!(stats.low_support_read_pairs[MULTI_CHAIN], reads(3, 18));
        assert_eq!(stats.summary().readpairs_per_umi_n50, 10.0);
        Ok(())
    }

    #[test]
    fn test_umis_are_per_barcode() -> Result<()> {
        // UMI 0 of two barcodes are two different molecules.
        let umi_info = UmiInfo::from_rows(
            strings(&["AAAA-2", "CCCC-2"]),
            strings(&["IGH"]),
            [row(0, 0, 0, 2), row(0, 0, 0, 2), row(1, 0, 0, 7)],
        )?;
        let thresholds = thresholds(&[("2", 5)]);
        let stats = ChunkAggregator {
            min_readpairs_per_umi: &thresholds,
        }
        .aggregate(&umi_info, 2, 0..3)?;
        assert_eq!(
            stats.read_pairs_per_umi[&2].iter().collect::<Vec<_>>(),
            vec![(4, 1), (7, 1)]
        );
        // Low support is judged per row, not per UMI total.
        assert_eq!(stats.low_support_read_pairs["IGH"], reads(4, 11));
        Ok(())
    }

    #[test]
    fn test_reads_at_threshold_are_supported() -> Result<()> {
        let umi_info = UmiInfo::from_rows(
            strings(&["ACGT-1"]),
            strings(&["TRA", "TRB"]),
            [row(0, 0, 0, 3), row(0, 1, 0, 4), row(0, 2, 0, 5), row(0, 3, 1, 4)],
        )?;
        let thresholds = thresholds(&[("1", 4)]);
        let stats = ChunkAggregator {
            min_readpairs_per_umi: &thresholds,
        }
        .aggregate(&umi_info, 1, 0..4)?;
        assert_eq!(stats.low_support_read_pairs["TRA"], reads(3, 12));
        assert_eq!(stats.low_support_read_pairs["TRB"], reads(0, 4));
        assert_eq!(stats.low_support_read_pairs[MULTI_CHAIN], reads(3, 16));
        Ok(())
    }

    #[test]
    fn test_empty_chunk() -> Result<()> {
        let umi_info = UmiInfo::from_rows(strings(&[]), strings(&["TRA"]), Vec::<UmiInfoRow>::new())?;
        let thresholds = HashMap::new();
        let stats = ChunkAggregator {
            min_readpairs_per_umi: &thresholds,
        }
        .aggregate(&umi_info, 3, 0..0)?;
        assert!(stats.read_pairs_per_umi[&3].is_empty());
        assert_eq!(stats.low_support_read_pairs["TRA"], reads(0, 0));
        let summary = stats.summary();
        assert!(summary.readpairs_per_umi_n50.is_nan());
        assert!(summary.readpairs_per_umi_n50_by_gem_group[&3].is_nan());
        assert!(summary.low_support_reads_frac[MULTI_CHAIN].is_nan());
        Ok(())
    }

    #[test]
    fn test_missing_threshold_is_fatal() {
        let umi_info =
            UmiInfo::from_rows(strings(&["ACGT-1"]), strings(&["TRA"]), [row(0, 0, 0, 1)])
                .unwrap();
        let thresholds = thresholds(&[("2", 1)]);
        let err = ChunkAggregator {
            min_readpairs_per_umi: &thresholds,
        }
        .aggregate(&umi_info, 1, 0..1)
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<FilterUmisError>(),
            Some(&FilterUmisError::MissingThreshold(1))
        );
    }

    #[test]
    fn test_gem_group_mismatch_is_fatal() {
        let umi_info = UmiInfo::from_rows(
            strings(&["ACGT-1", "TTTT-2"]),
            strings(&["TRA"]),
            [row(0, 0, 0, 1), row(1, 0, 0, 1)],
        )
        .unwrap();
        let thresholds = thresholds(&[("1", 1), ("2", 1)]);
        let err = ChunkAggregator {
            min_readpairs_per_umi: &thresholds,
        }
        .aggregate(&umi_info, 1, 0..2)
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FilterUmisError>(),
            Some(FilterUmisError::GemGroupMismatch {
                found: 2,
                expected: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_corrupt_chain_index_is_fatal() {
        // Skip UmiInfo::from_rows, which would reject this table.
        let umi_info = UmiInfo {
            barcode_idx: vec![0, 0],
            umi_idx: vec![0, 1],
            chain_idx: vec![0, 4],
            reads: vec![1, 1],
            barcodes: strings(&["ACGT-1"]),
            chains: strings(&["TRA"]),
        };
        let thresholds = thresholds(&[("1", 1)]);
        let err = ChunkAggregator {
            min_readpairs_per_umi: &thresholds,
        }
        .aggregate(&umi_info, 1, 0..2)
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<FilterUmisError>(),
            Some(&FilterUmisError::ChainIndexOutOfRange {
                row: 1,
                chain_idx: 4,
                num_chains: 1
            })
        );
    }

    /// Rows of up to 4 barcodes with random UMIs, chains and reads.
    fn barcode_rows() -> impl Strategy<Value = Vec<Vec<(u32, u8, u32)>>> {
        prop::collection::vec(
            prop::collection::vec((0u32..6, 0u8..3, 1u32..20), 1..12),
            0..4,
        )
    }

    fn table(groups: &[Vec<(u32, u8, u32)>]) -> UmiInfo {
        let rows = groups.iter().enumerate().flat_map(|(bc, rows)| {
            rows.iter()
                .map(move |&(umi, chain, reads)| row(bc as u32, umi, chain, reads))
        });
        let barcodes = (0..groups.len()).map(|i| format!("BC{i}-1")).collect();
        UmiInfo::from_rows(barcodes, strings(&["TRA", "TRB", "IGK"]), rows).unwrap()
    }

    proptest! {
        #[test]
        fn prop_reordering_within_barcode_is_invisible(groups in barcode_rows()) {
            let thresholds = thresholds(&[("1", 5)]);
            let aggregator = ChunkAggregator { min_readpairs_per_umi: &thresholds };

            let reordered: Vec<_> = groups
                .iter()
                .map(|rows| {
                    let mut rows = rows.clone();
                    rows.reverse();
                    rows.sort_by_key(|&(_, chain, reads)| (reads, chain));
                    rows
                })
                .collect();

            let umi_info = table(&groups);
            let n = umi_info.barcode_idx.len();
            let expected = aggregator.aggregate(&umi_info, 1, 0..n).unwrap();
            let observed = aggregator.aggregate(&table(&reordered), 1, 0..n).unwrap();
            prop_assert_eq!(expected, observed);
        }

        #[test]
        fn prop_read_pairs_are_conserved(groups in barcode_rows()) {
            let thresholds = thresholds(&[("1", 5)]);
            let umi_info = table(&groups);
            let n = umi_info.barcode_idx.len();
            let stats = ChunkAggregator { min_readpairs_per_umi: &thresholds }
                .aggregate(&umi_info, 1, 0..n)
                .unwrap();
            let total: u64 = umi_info.reads.iter().map(|&r| u64::from(r)).sum();
            let hist_total: u64 = stats.read_pairs_per_umi[&1].iter().map(|(v, n)| v * n).sum();
            prop_assert_eq!(hist_total, total);
            prop_assert_eq!(stats.low_support_read_pairs[MULTI_CHAIN].total, total);
            let chain_total: u64 = ["TRA", "TRB", "IGK"]
                .iter()
                .map(|chain| stats.low_support_read_pairs[*chain].total)
                .sum();
            prop_assert_eq!(chain_total, total);
        }
    }
}
