mod filter_umis;

pub use filter_umis::{FilterUmis, SummaryFile};
