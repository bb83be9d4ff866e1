//! The per-UMI read count table.
//!
//! Rows are sorted so that all rows of a barcode are contiguous. Each row
//! refers to its barcode and chain through indices into the `barcodes` and
//! `chains` lookup tables.

use crate::errors::FilterUmisError;
use anyhow::Result;
use martian_derive::martian_filetype;
use martian_filetypes::bin_file::BinaryFormat;
use serde::{Deserialize, Serialize};
use std::mem::size_of;
use std::ops::Range;

martian_filetype!(_UmiInfoFile, "umi_info");
/// The UMI info table, stored as bincode.
pub type UmiInfoFile = BinaryFormat<_UmiInfoFile, UmiInfo>;

/// One row of the table: the reads of one UMI of one barcode assigned to one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UmiInfoRow {
    pub barcode_idx: u32,
    pub umi_idx: u32,
    pub chain_idx: u8,
    pub reads: u32,
}

/// Bytes held in memory per row of the table.
const BYTES_PER_ROW: usize =
    size_of::<u32>() + size_of::<u32>() + size_of::<u8>() + size_of::<u32>();

/// Read access to a UMI info table.
pub trait UmiInfoReader {
    /// Total number of rows.
    fn num_rows(&self) -> usize;

    /// Barcode strings, indexed by `barcode_idx`.
    fn barcodes(&self) -> &[String];

    /// Chain names, indexed by `chain_idx`.
    fn chains(&self) -> &[String];

    /// The `barcode_idx` column over the given rows.
    fn barcode_idx(&self, rows: Range<usize>) -> Result<&[u32]>;

    /// Stream the given rows in table order.
    fn rows(&self, rows: Range<usize>) -> Result<impl Iterator<Item = UmiInfoRow> + '_>;

    /// Estimated number of bytes needed to hold the given rows in memory.
    fn estimate_mem_bytes(&self, rows: Range<usize>) -> u64;
}

/// In-memory columnar UMI info table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UmiInfo {
    pub barcode_idx: Vec<u32>,
    pub umi_idx: Vec<u32>,
    pub chain_idx: Vec<u8>,
    pub reads: Vec<u32>,
    pub barcodes: Vec<String>,
    pub chains: Vec<String>,
}

impl UmiInfo {
    /// Build a table from rows, checking that every index resolves.
    pub fn from_rows(
        barcodes: Vec<String>,
        chains: Vec<String>,
        rows: impl IntoIterator<Item = UmiInfoRow>,
    ) -> Result<Self> {
        let mut umi_info = UmiInfo {
            barcodes,
            chains,
            ..Default::default()
        };
        for row in rows {
            umi_info.barcode_idx.push(row.barcode_idx);
            umi_info.umi_idx.push(row.umi_idx);
            umi_info.chain_idx.push(row.chain_idx);
            umi_info.reads.push(row.reads);
        }
        umi_info.validate()?;
        Ok(umi_info)
    }

    /// Check that the columns have equal length and that every barcode and
    /// chain index is in range of its lookup table.
    pub fn validate(&self) -> Result<()> {
        let expected = self.barcode_idx.len();
        for (column, len) in [
            ("umi_idx", self.umi_idx.len()),
            ("chain_idx", self.chain_idx.len()),
            ("reads", self.reads.len()),
        ] {
            if len != expected {
                return Err(FilterUmisError::ColumnLengthMismatch {
                    column,
                    len,
                    expected,
                }
                .into());
            }
        }
        for (row, (&barcode_idx, &chain_idx)) in
            self.barcode_idx.iter().zip(&self.chain_idx).enumerate()
        {
            check_barcode_idx(row, barcode_idx, self.barcodes.len())?;
            if chain_idx as usize >= self.chains.len() {
                return Err(FilterUmisError::ChainIndexOutOfRange {
                    row,
                    chain_idx: chain_idx as usize,
                    num_chains: self.chains.len(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn check_range(&self, rows: &Range<usize>) -> Result<()> {
        if rows.start > rows.end || rows.end > self.num_rows() {
            return Err(FilterUmisError::RowRangeOutOfBounds {
                start_row: rows.start,
                end_row: rows.end,
                num_rows: self.num_rows(),
            }
            .into());
        }
        Ok(())
    }
}

pub(crate) fn check_barcode_idx(row: usize, barcode_idx: u32, num_barcodes: usize) -> Result<()> {
    if barcode_idx as usize >= num_barcodes {
        return Err(FilterUmisError::BarcodeIndexOutOfRange {
            row,
            barcode_idx: barcode_idx as usize,
            num_barcodes,
        }
        .into());
    }
    Ok(())
}

impl UmiInfoReader for UmiInfo {
    fn num_rows(&self) -> usize {
        self.barcode_idx.len()
    }

    fn barcodes(&self) -> &[String] {
        &self.barcodes
    }

    fn chains(&self) -> &[String] {
        &self.chains
    }

    fn barcode_idx(&self, rows: Range<usize>) -> Result<&[u32]> {
        self.check_range(&rows)?;
        Ok(&self.barcode_idx[rows])
    }

    fn rows(&self, rows: Range<usize>) -> Result<impl Iterator<Item = UmiInfoRow> + '_> {
        self.check_range(&rows)?;
        Ok(rows.map(|i| UmiInfoRow {
            barcode_idx: self.barcode_idx[i],
            umi_idx: self.umi_idx[i],
            chain_idx: self.chain_idx[i],
            reads: self.reads[i],
        }))
    }

    fn estimate_mem_bytes(&self, rows: Range<usize>) -> u64 {
        let lookup_bytes: usize = self
            .barcodes
            .iter()
            .chain(&self.chains)
            .map(|s| size_of::<String>() + s.len())
            .sum();
        (rows.len() * BYTES_PER_ROW + lookup_bytes) as u64
    }
}
