// vim: tw=80

//! Storage-engine core primitives
//!
//! Two tightly-related subsystems live here.  The `raid` module generates
//! declustered-RAID permutation maps and quantifies the reconstruction load
//! that device failures induce on the surviving population.  The `checksum`
//! module computes Fletcher-family block checksums and selects the fastest
//! available implementation at runtime.

pub mod checksum;
pub mod raid;
pub mod types;

pub use crate::types::*;
