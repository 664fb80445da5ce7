// vim: tw=80

//! The `drand48` family of 48-bit linear congruential generators
//!
//! Map construction must be reproducible from a seed, so the generator is a
//! concrete, stable algorithm rather than whatever `thread_rng` happens to
//! be this year.  It implements [`RngCore`] and [`SeedableRng`] so it
//! composes with the rest of the `rand` ecosystem.  It is emphatically not
//! cryptographic; its only job is to diffuse failure load across rows.

use rand::{RngCore, SeedableRng};

const MUL: u64 = 0x5DEE_CE66D;
const ADD: u64 = 0xB;
const MASK: u64 = (1 << 48) - 1;

/// A 48-bit linear congruential generator with `drand48` semantics
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rand48(u64);

impl Rand48 {
    fn step(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(MUL).wrapping_add(ADD) & MASK;
        self.0
    }
}

impl RngCore for Rand48 {
    /// The high 32 bits of the next state, like `mrand48`
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 16) as u32
    }

    fn next_u64(&mut self) -> u64 {
        u64::from(self.next_u32()) << 32 | u64::from(self.next_u32())
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8])
        -> std::result::Result<(), rand::Error>
    {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Rand48 {
    type Seed = [u8; 8];

    /// Only the low 48 bits of the seed are retained.
    fn from_seed(seed: Self::Seed) -> Self {
        Rand48(u64::from_le_bytes(seed) & MASK)
    }

    /// `srand48` semantics: the seed value becomes the high 32 bits of the
    /// state and the low 16 bits are `0x330E`.
    fn seed_from_u64(state: u64) -> Self {
        Rand48((state & 0xffff_ffff) << 16 | 0x330E)
    }
}

// LCOV_EXCL_STOP
