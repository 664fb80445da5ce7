// vim: tw=80

//! Fletcher-4 compute kernels
//!
//! The scalar kernel is the reference and the only one whose intermediate
//! state equals the true accumulator values, which is what makes it usable
//! for incremental checksumming.  The superscalar kernels split the input
//! into independent accumulator streams so the additions can retire in
//! parallel, then fold the streams back together in `fini`.

use byteorder::{ByteOrder, NativeEndian};

use super::Checksum;

/// In-flight accumulator state for one Fletcher-4 computation.
///
/// Stream `s` keeps its `(a, b, c, d)` in `streams[s]`.  The scalar kernel
/// uses stream 0 only.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct Fletcher4Ctx {
    streams: [[u64; 4]; 4],
}

/// A Fletcher-4 implementation descriptor.
///
/// Dispatch acquires one of these through a publication-barrier read and
/// runs `init`/`compute`/`fini` on it, so every field must describe the
/// same kernel.
pub(super) struct Fletcher4Impl {
    pub name: &'static str,
    pub init: fn() -> Fletcher4Ctx,
    pub compute: fn(&mut Fletcher4Ctx, &[u8]),
    pub compute_byteswap: fn(&mut Fletcher4Ctx, &[u8]),
    pub fini: fn(&Fletcher4Ctx) -> Checksum,
    /// Availability probe; `None` means always usable
    pub valid: Option<fn() -> bool>,
}

fn ctx_init() -> Fletcher4Ctx {
    Fletcher4Ctx::default()
}

fn load_native(word: &[u8]) -> u32 {
    NativeEndian::read_u32(word)
}

fn load_swapped(word: &[u8]) -> u32 {
    NativeEndian::read_u32(word).swap_bytes()
}

fn scalar_mix(acc: &mut [u64; 4], buf: &[u8], load: fn(&[u8]) -> u32) {
    debug_assert_eq!(buf.len() % 4, 0);
    let [mut a, mut b, mut c, mut d] = *acc;
    for word in buf.chunks_exact(4) {
        a = a.wrapping_add(u64::from(load(word)));
        b = b.wrapping_add(a);
        c = c.wrapping_add(b);
        d = d.wrapping_add(c);
    }
    *acc = [a, b, c, d];
}

/// The scalar kernel, operating directly on a fingerprint's words.
///
/// This is the incremental entry point: state in `zcp` carries over between
/// calls, so splitting a buffer on any 4-byte boundary yields the same
/// result as one pass.
pub(super) fn fletcher_4_scalar_native(buf: &[u8], zcp: &mut Checksum) {
    scalar_mix(&mut zcp.0, buf, load_native);
}

/// Byteswapping variant of [`fletcher_4_scalar_native`]
pub(super) fn fletcher_4_scalar_byteswap(buf: &[u8], zcp: &mut Checksum) {
    scalar_mix(&mut zcp.0, buf, load_swapped);
}

fn scalar_compute(ctx: &mut Fletcher4Ctx, buf: &[u8]) {
    scalar_mix(&mut ctx.streams[0], buf, load_native);
}

fn scalar_compute_byteswap(ctx: &mut Fletcher4Ctx, buf: &[u8]) {
    scalar_mix(&mut ctx.streams[0], buf, load_swapped);
}

fn scalar_fini(ctx: &Fletcher4Ctx) -> Checksum {
    Checksum(ctx.streams[0])
}

pub(super) static FLETCHER_4_SCALAR: Fletcher4Impl = Fletcher4Impl {
    name: "scalar",
    init: ctx_init,
    compute: scalar_compute,
    compute_byteswap: scalar_compute_byteswap,
    fini: scalar_fini,
    valid: None,
};

fn superscalar2_mix(ctx: &mut Fletcher4Ctx, buf: &[u8],
                    load: fn(&[u8]) -> u32)
{
    debug_assert_eq!(buf.len() % 8, 0);
    let [mut a0, mut b0, mut c0, mut d0] = ctx.streams[0];
    let [mut a1, mut b1, mut c1, mut d1] = ctx.streams[1];
    for pair in buf.chunks_exact(8) {
        a0 = a0.wrapping_add(u64::from(load(&pair[..4])));
        a1 = a1.wrapping_add(u64::from(load(&pair[4..])));
        b0 = b0.wrapping_add(a0);
        b1 = b1.wrapping_add(a1);
        c0 = c0.wrapping_add(b0);
        c1 = c1.wrapping_add(b1);
        d0 = d0.wrapping_add(c0);
        d1 = d1.wrapping_add(c1);
    }
    ctx.streams[0] = [a0, b0, c0, d0];
    ctx.streams[1] = [a1, b1, c1, d1];
}

fn superscalar2_compute(ctx: &mut Fletcher4Ctx, buf: &[u8]) {
    superscalar2_mix(ctx, buf, load_native);
}

fn superscalar2_compute_byteswap(ctx: &mut Fletcher4Ctx, buf: &[u8]) {
    superscalar2_mix(ctx, buf, load_swapped);
}

// Stream 0 saw words 0, 2, 4, ... and stream 1 saw words 1, 3, 5, ...  The
// true accumulators are fixed linear combinations of the per-stream ones;
// the coefficients fall out of rewriting the position weights n-i in terms
// of each stream's local positions, and don't depend on the input length.
fn superscalar2_fini(ctx: &Fletcher4Ctx) -> Checksum {
    let [a0, b0, c0, d0] = ctx.streams[0];
    let [a1, b1, c1, d1] = ctx.streams[1];
    let a = a0.wrapping_add(a1);
    let b = b0.wrapping_add(b1)
        .wrapping_mul(2)
        .wrapping_sub(a1);
    let c = c0.wrapping_add(c1)
        .wrapping_mul(4)
        .wrapping_sub(b0)
        .wrapping_sub(b1.wrapping_mul(3));
    let d = d0.wrapping_add(d1)
        .wrapping_mul(8)
        .wrapping_sub(c0.wrapping_mul(4))
        .wrapping_sub(c1.wrapping_mul(8))
        .wrapping_add(b1);
    Checksum([a, b, c, d])
}

pub(super) static FLETCHER_4_SUPERSCALAR: Fletcher4Impl = Fletcher4Impl {
    name: "superscalar",
    init: ctx_init,
    compute: superscalar2_compute,
    compute_byteswap: superscalar2_compute_byteswap,
    fini: superscalar2_fini,
    valid: None,
};

fn superscalar4_mix(ctx: &mut Fletcher4Ctx, buf: &[u8],
                    load: fn(&[u8]) -> u32)
{
    debug_assert_eq!(buf.len() % 16, 0);
    let [mut a0, mut b0, mut c0, mut d0] = ctx.streams[0];
    let [mut a1, mut b1, mut c1, mut d1] = ctx.streams[1];
    let [mut a2, mut b2, mut c2, mut d2] = ctx.streams[2];
    let [mut a3, mut b3, mut c3, mut d3] = ctx.streams[3];
    for quad in buf.chunks_exact(16) {
        a0 = a0.wrapping_add(u64::from(load(&quad[..4])));
        a1 = a1.wrapping_add(u64::from(load(&quad[4..8])));
        a2 = a2.wrapping_add(u64::from(load(&quad[8..12])));
        a3 = a3.wrapping_add(u64::from(load(&quad[12..])));
        b0 = b0.wrapping_add(a0);
        b1 = b1.wrapping_add(a1);
        b2 = b2.wrapping_add(a2);
        b3 = b3.wrapping_add(a3);
        c0 = c0.wrapping_add(b0);
        c1 = c1.wrapping_add(b1);
        c2 = c2.wrapping_add(b2);
        c3 = c3.wrapping_add(b3);
        d0 = d0.wrapping_add(c0);
        d1 = d1.wrapping_add(c1);
        d2 = d2.wrapping_add(c2);
        d3 = d3.wrapping_add(c3);
    }
    ctx.streams[0] = [a0, b0, c0, d0];
    ctx.streams[1] = [a1, b1, c1, d1];
    ctx.streams[2] = [a2, b2, c2, d2];
    ctx.streams[3] = [a3, b3, c3, d3];
}

fn superscalar4_compute(ctx: &mut Fletcher4Ctx, buf: &[u8]) {
    superscalar4_mix(ctx, buf, load_native);
}

fn superscalar4_compute_byteswap(ctx: &mut Fletcher4Ctx, buf: &[u8]) {
    superscalar4_mix(ctx, buf, load_swapped);
}

// The four-stream analogue of superscalar2_fini
fn superscalar4_fini(ctx: &Fletcher4Ctx) -> Checksum {
    let [a0, b0, c0, d0] = ctx.streams[0];
    let [a1, b1, c1, d1] = ctx.streams[1];
    let [a2, b2, c2, d2] = ctx.streams[2];
    let [a3, b3, c3, d3] = ctx.streams[3];
    let a = a0.wrapping_add(a1)
        .wrapping_add(a2)
        .wrapping_add(a3);
    let b = b0.wrapping_add(b1)
        .wrapping_add(b2)
        .wrapping_add(b3)
        .wrapping_mul(4)
        .wrapping_sub(a1)
        .wrapping_sub(a2.wrapping_mul(2))
        .wrapping_sub(a3.wrapping_mul(3));
    let c = c0.wrapping_add(c1)
        .wrapping_add(c2)
        .wrapping_add(c3)
        .wrapping_mul(16)
        .wrapping_sub(b0.wrapping_mul(6))
        .wrapping_sub(b1.wrapping_mul(10))
        .wrapping_sub(b2.wrapping_mul(14))
        .wrapping_sub(b3.wrapping_mul(18))
        .wrapping_add(a2)
        .wrapping_add(a3.wrapping_mul(3));
    let d = d0.wrapping_add(d1)
        .wrapping_add(d2)
        .wrapping_add(d3)
        .wrapping_mul(64)
        .wrapping_sub(c0.wrapping_mul(48))
        .wrapping_sub(c1.wrapping_mul(64))
        .wrapping_sub(c2.wrapping_mul(80))
        .wrapping_sub(c3.wrapping_mul(96))
        .wrapping_add(b0.wrapping_mul(4))
        .wrapping_add(b1.wrapping_mul(10))
        .wrapping_add(b2.wrapping_mul(20))
        .wrapping_add(b3.wrapping_mul(34))
        .wrapping_sub(a3);
    Checksum([a, b, c, d])
}

pub(super) static FLETCHER_4_SUPERSCALAR4: Fletcher4Impl = Fletcher4Impl {
    name: "superscalar4",
    init: ctx_init,
    compute: superscalar4_compute,
    compute_byteswap: superscalar4_compute_byteswap,
    fini: superscalar4_fini,
    valid: None,
};

// LCOV_EXCL_STOP
