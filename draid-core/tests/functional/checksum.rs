// vim: tw=80

use std::sync::Mutex;

use draid_core::checksum::{
    fletcher_2_byteswap,
    fletcher_2_native,
    fletcher_4_bench_results,
    fletcher_4_byteswap,
    fletcher_4_fini,
    fletcher_4_impl_set,
    fletcher_4_incremental_native,
    fletcher_4_init,
    fletcher_4_native,
    Checksum,
};
use draid_core::Error;
use pretty_assertions::assert_eq;
use rand::{RngCore, SeedableRng};
use rand_xorshift::XorShiftRng;

// The implementation selector is process-wide state
static SELECTOR_LOCK: Mutex<()> = Mutex::new(());

fn random_buf(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = XorShiftRng::seed_from_u64(seed);
    let mut buf = vec![0u8; len];
    rng.fill_bytes(&mut buf);
    buf
}

/// The full dispatch lifecycle: benchmark, select, compute, tear down
#[test_log::test]
fn dispatch_lifecycle() {
    let _guard = SELECTOR_LOCK.lock().unwrap();
    fletcher_4_init();

    let stats = fletcher_4_bench_results();
    assert!(stats.len() >= 2);
    assert!(stats.iter().any(|s| s.name == "scalar"));
    assert!(stats.iter().all(|s| s.mb_per_sec > 0));

    // every selectable implementation produces the same fingerprint
    let buf = random_buf(128 * 1024, 0xf1e7);
    fletcher_4_impl_set("scalar").unwrap();
    let want = fletcher_4_native(&buf);
    let want_swap = fletcher_4_byteswap(&buf);
    for stat in &stats {
        fletcher_4_impl_set(stat.name).unwrap();
        assert_eq!(fletcher_4_native(&buf), want);
        assert_eq!(fletcher_4_byteswap(&buf), want_swap);
    }
    fletcher_4_impl_set("fastest").unwrap();
    assert_eq!(fletcher_4_native(&buf), want);

    assert_eq!(fletcher_4_impl_set("neon"), Err(Error::InvalidArgument));

    fletcher_4_fini();
    assert!(fletcher_4_bench_results().is_empty());
    // dispatch still works after fini, through the scalar fallback
    assert_eq!(fletcher_4_native(&buf), want);
}

/// Native-of-byte-reversed-buffer equals byteswap-of-buffer, for both word
/// sizes.
#[test]
fn byteswap_duality() {
    let _guard = SELECTOR_LOCK.lock().unwrap();
    fletcher_4_impl_set("scalar").unwrap();
    let buf = random_buf(256, 0xd0a1);

    let swapped32 = buf.chunks_exact(4)
        .flat_map(|w| w.iter().rev().copied())
        .collect::<Vec<_>>();
    assert_eq!(fletcher_4_native(&swapped32), fletcher_4_byteswap(&buf));

    let swapped64 = buf.chunks_exact(8)
        .flat_map(|w| w.iter().rev().copied())
        .collect::<Vec<_>>();
    assert_eq!(fletcher_2_native(&swapped64), fletcher_2_byteswap(&buf));
}

/// Fletcher-2 test vector: two 16-byte pairs of `[1, 2]`
#[test]
fn fletcher2_vector() {
    let buf = [1u64, 2, 1, 2].iter()
        .flat_map(|w| w.to_ne_bytes())
        .collect::<Vec<_>>();
    assert_eq!(fletcher_2_native(&buf), Checksum::new(2, 4, 3, 6));
}

/// Fletcher-4 test vector: words `[1, 2, 3, 4]`
#[test]
fn fletcher4_vector() {
    let _guard = SELECTOR_LOCK.lock().unwrap();
    fletcher_4_impl_set("scalar").unwrap();
    let buf = [1u32, 2, 3, 4].iter()
        .flat_map(|w| w.to_ne_bytes())
        .collect::<Vec<_>>();
    assert_eq!(fletcher_4_native(&buf), Checksum::new(10, 20, 35, 56));
}

/// An incremental checksum over a split buffer equals one dispatch call,
/// no matter which kernel the dispatcher prefers.
#[test]
fn incremental_equals_whole() {
    let _guard = SELECTOR_LOCK.lock().unwrap();
    let buf = random_buf(8192, 3);
    fletcher_4_impl_set("superscalar4").unwrap();
    let want = fletcher_4_native(&buf);

    let mut cksum = Checksum::default();
    for chunk in buf.chunks(1000) {
        fletcher_4_incremental_native(chunk, &mut cksum);
    }
    assert_eq!(cksum, want);
    fletcher_4_impl_set("scalar").unwrap();
}
