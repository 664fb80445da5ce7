// vim: tw=80

//! Fletcher-family block checksums
//!
//! A Fletcher checksum is a position-weighted running sum: order 2 keeps two
//! 64-bit accumulators per lane, order 4 keeps four, so word `i` of the
//! input contributes with coefficients `1`, `i`, `i(i+1)/2` and
//! `i(i+1)(i+2)/6`.  All arithmetic is mod 2^64.  For Fletcher-4 the third
//! and fourth accumulators can overflow on large buffers, but the lowest set
//! bit of the coefficients stays below 2^15 for block sizes up to 128 KiB,
//! so every input bit still affects every accumulator.  These are corruption
//! fingerprints, not MACs: there is no key and no authentication.
//!
//! Fletcher-4 ships several interchangeable kernels; [`fletcher_4_init`]
//! benchmarks them and routes the hot path through the fastest one.  The
//! scalar kernel doubles as the incremental API, since its intermediate
//! state is exactly the four accumulators.

mod dispatch;
mod fletcher2;
mod fletcher4;

use serde_derive::{Deserialize, Serialize};

pub use self::dispatch::{
    fletcher_4_bench_results,
    fletcher_4_byteswap,
    fletcher_4_fini,
    fletcher_4_impl_set,
    fletcher_4_incremental_byteswap,
    fletcher_4_incremental_native,
    fletcher_4_init,
    fletcher_4_native,
    Fletcher4Stat,
};
pub use self::fletcher2::{fletcher_2_byteswap, fletcher_2_native};

/// A checksum fingerprint: four 64-bit words in host byte order.
///
/// Fletcher-4 fills it with `(a, b, c, d)`; Fletcher-2 with
/// `(a0, a1, b0, b1)`.  Consumers that need a canonical byte order use the
/// byteswap variants of the checksum functions.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Checksum(pub [u64; 4]);

impl Checksum {
    pub const fn new(w0: u64, w1: u64, w2: u64, w3: u64) -> Self {
        Checksum([w0, w1, w2, w3])
    }
}

// LCOV_EXCL_STOP
