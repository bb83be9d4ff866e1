//! Split the UMI info table into chunks of whole GEM groups.

use crate::barcode::gem_group_of;
use crate::errors::FilterUmisError;
use crate::umi_info::{check_barcode_idx, UmiInfoReader};
use crate::GemGroup;
use anyhow::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::ops::Range;

const BYTES_PER_GB: f64 = 1e9;

/// A contiguous range of table rows that all belong to one GEM group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UmiInfoChunk {
    pub gem_group: GemGroup,
    pub start_row: usize,
    pub end_row: usize,
    pub mem_gb: isize,
}

impl UmiInfoChunk {
    pub fn rows(&self) -> Range<usize> {
        self.start_row..self.end_row
    }
}

/// Map the estimated in-memory size of a chunk to the GB to reserve for it.
pub trait MemEstimator {
    fn mem_gb(&self, estimated_bytes: u64) -> isize;
}

impl<F: Fn(u64) -> isize> MemEstimator for F {
    fn mem_gb(&self, estimated_bytes: u64) -> isize {
        self(estimated_bytes)
    }
}

/// Reserve `scale` GB per started GB of data, and never less than `min_mem_gb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledMemEstimator {
    pub scale: isize,
    pub min_mem_gb: isize,
}

impl Default for ScaledMemEstimator {
    fn default() -> Self {
        ScaledMemEstimator {
            scale: 2,
            min_mem_gb: 1,
        }
    }
}

impl ScaledMemEstimator {
    /// Read the scale and the floor from parameters.toml.
    pub fn from_parameters() -> Result<Self> {
        Ok(ScaledMemEstimator {
            scale: *parameters_toml::umi_info_mem_gb_scale()?,
            min_mem_gb: *parameters_toml::umi_info_min_mem_gb()?,
        })
    }
}

impl MemEstimator for ScaledMemEstimator {
    fn mem_gb(&self, estimated_bytes: u64) -> isize {
        let gb = (estimated_bytes as f64 / BYTES_PER_GB).ceil() as isize;
        (self.scale * gb).max(self.min_mem_gb)
    }
}

/// Plans the chunks of one UMI info table.
pub struct ChunkPlanner<'a, E> {
    /// The GEM groups of the sample, in order. The first one is assigned to
    /// the single chunk of an empty table.
    pub gem_groups: &'a [GemGroup],
    pub estimator: E,
    /// Warn when the table has more rows than this.
    pub max_rows_warning: usize,
}

impl<E: MemEstimator> ChunkPlanner<'_, E> {
    /// Partition the rows of `umi_info` into chunks.
    ///
    /// A new chunk starts wherever the GEM group of the barcode changes, so
    /// the chunks cover every row exactly once, in order. An empty table
    /// yields a single empty chunk for the first GEM group.
    pub fn plan(&self, umi_info: &impl UmiInfoReader) -> Result<Vec<UmiInfoChunk>> {
        let num_rows = umi_info.num_rows();
        if num_rows > self.max_rows_warning {
            warn!(
                "There are {num_rows} > {} entries in the UMI info table, \
                 this could potentially cause an out-of-memory error.",
                self.max_rows_warning
            );
        }

        let barcodes = umi_info.barcodes();
        let mut chunks = Vec::new();
        let mut start_row = 0;
        let mut prev_gem_group = None;
        let mut prev_barcode_idx = None;

        for (row, &barcode_idx) in umi_info.barcode_idx(0..num_rows)?.iter().enumerate() {
            if prev_barcode_idx == Some(barcode_idx) {
                continue;
            }
            check_barcode_idx(row, barcode_idx, barcodes.len())?;
            let gem_group = gem_group_of(barcodes, barcode_idx as usize)?;

            if let Some(prev) = prev_gem_group {
                if prev != gem_group {
                    chunks.push(self.make_chunk(umi_info, prev, start_row..row));
                    start_row = row;
                }
            }
            prev_gem_group = Some(gem_group);
            prev_barcode_idx = Some(barcode_idx);
        }

        let gem_group = match prev_gem_group {
            Some(gem_group) => gem_group,
            None => *self.gem_groups.first().ok_or(FilterUmisError::NoGemGroups)?,
        };
        chunks.push(self.make_chunk(umi_info, gem_group, start_row..num_rows));

        info!("split {num_rows} UMI info rows into {} chunks", chunks.len());
        Ok(chunks)
    }

    fn make_chunk(
        &self,
        umi_info: &impl UmiInfoReader,
        gem_group: GemGroup,
        rows: Range<usize>,
    ) -> UmiInfoChunk {
        UmiInfoChunk {
            gem_group,
            start_row: rows.start,
            end_row: rows.end,
            mem_gb: self.estimator.mem_gb(umi_info.estimate_mem_bytes(rows)),
        }
    }
}
