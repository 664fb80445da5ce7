// vim: tw=80

//! Declustered-RAID permutation layouts
//!
//! Traditional RAID is *fully clustered*: each parity group spans the entire
//! array, so a rebuild reads every surviving disk at full tilt.  A
//! *declustered* array spreads many narrow groups across a larger device
//! population, which lets reconstruction after a failure draw a little I/O
//! from many disks instead of a lot from a few.  The layouts here are
//! permutation-based: each row of a map assigns every device to either a
//! group slot or a spare slot, successive rows being pseudo-random
//! permutations of the device set.  Developing a base map through all cyclic
//! shifts completes it into a Latin-square-like layout in which every device
//! occupies every slot position equally often.
//!
//! The evaluators measure how well a candidate map spreads reconstruction
//! load: [`eval_resilver`] counts the reads and writes each device absorbs
//! for a given failure set, and [`eval_decluster`] sweeps single or double
//! failures across the whole array to produce a worst/mean/RMS hotspot
//! figure, normalized per group-row so that differently-shaped maps are
//! comparable.
//!
//! # References
//!
//! Holland, Mark, and Garth A. Gibson. Parity declustering for continuous
//! operation in redundant disk arrays. Vol. 27. No. 9.  ACM, 1992.
//!
//! Muntz, Richard R., and John CS Lui. Performance analysis of disk arrays
//! under failure. Computer Science Department, University of California,
//! 1990.

mod eval;
mod perm_map;
mod rand48;

pub use self::eval::{
    eval_decluster,
    eval_resilver,
    DeclusterEval,
    EvalMethod,
    ResilverIo,
};
pub use self::perm_map::{
    PermMap,
    MAX_DEVS,
    MAX_GROUPS,
    MAX_GROUPSIZE,
    MAX_ROWS,
    MAX_SPARES,
};
pub use self::rand48::Rand48;
