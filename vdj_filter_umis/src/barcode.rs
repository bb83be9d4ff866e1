//! Decode the GEM group suffix of a barcode string, "AACCGGTT-1".

use crate::errors::FilterUmisError;
use crate::GemGroup;
use anyhow::Result;

/// Split a barcode into its sequence and GEM group.
/// Fails if the `-<gem group>` suffix is missing or not a number.
pub fn split_barcode_seq(barcode: &str) -> Result<(&str, GemGroup)> {
    barcode
        .split_once('-')
        .and_then(|(seq, gg)| Some((seq, gg.parse().ok()?)))
        .filter(|(seq, _)| !seq.is_empty())
        .ok_or_else(|| anyhow::anyhow!("invalid barcode: '{barcode}'"))
}

/// Decode the GEM group of the barcode at `barcode_idx` of the lookup table.
pub(crate) fn gem_group_of(barcodes: &[String], barcode_idx: usize) -> Result<GemGroup> {
    let barcode = &barcodes[barcode_idx];
    match split_barcode_seq(barcode) {
        Ok((_, gem_group)) => Ok(gem_group),
        Err(_) => Err(FilterUmisError::InvalidBarcode {
            barcode_idx,
            barcode: barcode.clone(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_barcode_seq() {
        assert_eq!(split_barcode_seq("AACCGGTT-1").unwrap(), ("AACCGGTT", 1));
        assert_eq!(split_barcode_seq("AACCGGTT-12").unwrap(), ("AACCGGTT", 12));
    }

    #[test]
    fn test_split_barcode_seq_invalid() {
        for bc in ["AACCGGTT", "AACCGGTT-", "AACCGGTT-x", "-1", "AACC-1-2", "AACC--1"] {
            assert!(split_barcode_seq(bc).is_err(), "{bc}");
        }
    }

    #[test]
    fn test_gem_group_of_reports_index() {
        let barcodes = vec!["AC-1".to_string(), "GT".to_string()];
        assert_eq!(gem_group_of(&barcodes, 0).unwrap(), 1);
        let err = gem_group_of(&barcodes, 1).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FilterUmisError>(),
            Some(&FilterUmisError::InvalidBarcode {
                barcode_idx: 1,
                barcode: "GT".to_string()
            })
        );
    }
}
