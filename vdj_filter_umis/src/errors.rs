//! Fatal input conditions of FILTER_UMIS.
//!
//! These abort the planning phase or the current chunk. They are wrapped in
//! `anyhow::Error` by the callers, so use `downcast_ref::<FilterUmisError>()`
//! to match on a specific kind.

use crate::GemGroup;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FilterUmisError {
    #[error("invalid barcode at index {barcode_idx}: '{barcode}'")]
    InvalidBarcode { barcode_idx: usize, barcode: String },

    #[error("row {row} refers to barcode index {barcode_idx} but only {num_barcodes} barcodes exist")]
    BarcodeIndexOutOfRange {
        row: usize,
        barcode_idx: usize,
        num_barcodes: usize,
    },

    #[error("row {row} refers to chain index {chain_idx} but only {num_chains} chains exist")]
    ChainIndexOutOfRange {
        row: usize,
        chain_idx: usize,
        num_chains: usize,
    },

    #[error("column {column} has {len} rows, expected {expected}")]
    ColumnLengthMismatch {
        column: &'static str,
        len: usize,
        expected: usize,
    },

    #[error("rows {start_row}..{end_row} are out of bounds for a table of {num_rows} rows")]
    RowRangeOutOfBounds {
        start_row: usize,
        end_row: usize,
        num_rows: usize,
    },

    #[error("no minimum read pairs per UMI configured for GEM group {0}")]
    MissingThreshold(GemGroup),

    #[error("barcode '{barcode}' belongs to GEM group {found} but the chunk is GEM group {expected}")]
    GemGroupMismatch {
        barcode: String,
        found: GemGroup,
        expected: GemGroup,
    },

    #[error("the UMI info table is empty and no GEM groups were provided")]
    NoGemGroups,
}
