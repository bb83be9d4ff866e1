//! stats
#![deny(missing_docs)]

mod nx;
pub use nx::{n50_of_counts, nx_of_counts};
