//! Read pair per UMI statistics of the V(D)J UMI info table.
//!
//! The FILTER_UMIS stage runs in three phases: [`chunk`] splits the sorted
//! table into GEM-group aligned row ranges, [`aggregate`] streams one range
//! into a [`UmiReadPairStats`], and [`merge`] combines the chunk records into
//! the final [`FilterUmisSummary`].

// Warning groups (as of rust 1.55)
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]
// Other warnings (as of rust 1.55)
#![deny(
    asm_sub_register,
    bad_asm_style,
    bindings_with_variant_name,
    clashing_extern_declarations,
    confusable_idents,
    const_item_mutation,
    deprecated,
    deref_nullptr,
    drop_bounds,
    dyn_drop,
    elided_lifetimes_in_paths,
    exported_private_dependencies,
    function_item_references,
    improper_ctypes,
    improper_ctypes_definitions,
    incomplete_features,
    inline_no_sanitize,
    invalid_value,
    irrefutable_let_patterns,
    large_assignments,
    mixed_script_confusables,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overlapping_range_endpoints,
    renamed_and_removed_lints,
    stable_features,
    dangling_pointers_from_temporaries,
    trivial_bounds,
    type_alias_bounds,
    uncommon_codepoints,
    unconditional_recursion,
    unknown_lints,
    unnameable_test_items,
    unused_comparisons,
    while_true
)]

pub mod aggregate;
pub mod barcode;
pub mod chunk;
pub mod errors;
pub mod group_by;
pub mod merge;
pub mod metrics;
pub mod stages;
pub mod umi_info;

/// The GEM group of a barcode, the numeric suffix after `-`.
pub type GemGroup = u16;

pub use aggregate::ChunkAggregator;
pub use chunk::{ChunkPlanner, MemEstimator, ScaledMemEstimator, UmiInfoChunk};
pub use errors::FilterUmisError;
pub use merge::{merge_chunk_stats, summarize_chunks};
pub use metrics::{FilterUmisSummary, UmiReadPairStats};
pub use umi_info::{UmiInfo, UmiInfoFile, UmiInfoReader, UmiInfoRow};
