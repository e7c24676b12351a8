//! Row transforms between extraction and persistence: forward fill of
//! trustee/scheme labels, the post-fill structural check, and the two
//! groupings derived from a filled sheet.

pub mod fill;
pub mod group;

pub use fill::forward_fill;
pub use group::{ensure_labelled, group_by_scheme, unique_pairs};
