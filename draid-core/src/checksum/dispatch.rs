// vim: tw=80

//! Runtime selection of the Fletcher-4 implementation
//!
//! The hot path is called from many concurrent contexts and must stay
//! reentrant and lock-free: readers acquire the chosen descriptor with a
//! single `Acquire` load.  Writers (selector changes, the startup
//! benchmark) serialize on a mutex and publish with `Release` stores, so a
//! reader always sees a fully-initialised descriptor.

use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Mutex,
};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::types::{Error, Result};
use super::Checksum;
use super::fletcher4::{
    fletcher_4_scalar_byteswap,
    fletcher_4_scalar_native,
    Fletcher4Impl,
    FLETCHER_4_SCALAR,
    FLETCHER_4_SUPERSCALAR,
    FLETCHER_4_SUPERSCALAR4,
};

const NALGOS: usize = 3;

/// Every known implementation.  Scalar must come first; it is the fallback
/// and the incremental reference.
static FLETCHER_4_ALGOS: [&Fletcher4Impl; NALGOS] = [
    &FLETCHER_4_SCALAR,
    &FLETCHER_4_SUPERSCALAR,
    &FLETCHER_4_SUPERSCALAR4,
];

/// User-facing selector names.  Entries 1..=NALGOS name the registry in
/// order; "fastest" and "cycle" bracket them.
static SELECTOR_NAMES: [&str; NALGOS + 2] =
    ["fastest", "scalar", "superscalar", "superscalar4", "cycle"];

const SEL_FASTEST: usize = 0;
const SEL_SCALAR: usize = 1;
const SEL_CYCLE: usize = NALGOS + 1;

const SCALAR_IDX: usize = 0;

/// Multi-stream kernels consume whole blocks of this many bytes; any tail
/// is finished by the scalar kernel.
const KERNEL_ALIGN: usize = 64;

const BENCH_INTERVAL: Duration = Duration::from_millis(50);
const BENCH_BUFSIZE: usize = 4096;

/// One row of the benchmark results table
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Fletcher4Stat {
    pub name: &'static str,
    pub mb_per_sec: u64,
}

/// Process-wide dispatch state.
///
/// `selector` and `chosen` are written only under `selector_lock`; the
/// read path loads them with `Acquire` and never blocks.
struct Fletcher4Module {
    selector_lock: Mutex<()>,
    /// Index into `SELECTOR_NAMES`: the user-facing preference
    selector: AtomicUsize,
    /// Index into `FLETCHER_4_ALGOS`: what the hot path actually runs
    chosen: AtomicUsize,
    /// Index into `FLETCHER_4_ALGOS`: winner of the startup benchmark
    fastest: AtomicUsize,
    /// Advances on every dispatch in cycle mode
    cycle: AtomicU64,
    /// Benchmark results; read-only between `init` and `fini`
    stats: Mutex<Vec<Fletcher4Stat>>,
}

static MODULE: Fletcher4Module = Fletcher4Module {
    selector_lock: Mutex::new(()),
    selector: AtomicUsize::new(SEL_SCALAR),
    chosen: AtomicUsize::new(SCALAR_IDX),
    fastest: AtomicUsize::new(SCALAR_IDX),
    cycle: AtomicU64::new(0),
    stats: Mutex::new(Vec::new()),
};

/// Benchmark every available kernel and route dispatch through the winner.
///
/// Each valid kernel runs against a 4 KiB buffer for 50 ms of wall time;
/// only the iteration counts are compared, so clock overhead (which hits
/// all kernels alike) cannot change the ordering.  Publishes the
/// `{name, mb_per_sec}` table readable via [`fletcher_4_bench_results`]
/// and then selects `"fastest"`.
///
/// Dispatch is also safe before this runs; it just uses the scalar kernel.
pub fn fletcher_4_init() {
    let mut databuf = vec![0u8; BENCH_BUFSIZE];
    for (i, byte) in databuf.iter_mut().enumerate() {
        *byte = i as u8;
    }

    let mut best_run_count = 0u64;
    let mut best_idx = SCALAR_IDX;
    let mut stats = Vec::with_capacity(FLETCHER_4_ALGOS.len());
    for (i, algo) in FLETCHER_4_ALGOS.iter().enumerate() {
        if let Some(valid) = algo.valid {
            if !valid() {
                continue;
            }
        }

        let mut ctx = (algo.init)();
        let mut run_count = 0u64;
        let start = Instant::now();
        while start.elapsed() < BENCH_INTERVAL {
            (algo.compute)(&mut ctx, &databuf);
            run_count += 1;
        }
        let elapsed = start.elapsed();
        std::hint::black_box((algo.fini)(&ctx));

        let mb_per_sec = ((BENCH_BUFSIZE as u64 * run_count) as f64 /
                          elapsed.as_secs_f64()) as u64 >> 20;
        debug!(name = algo.name, run_count, mb_per_sec, "benchmarked");
        stats.push(Fletcher4Stat { name: algo.name, mb_per_sec });
        if run_count > best_run_count {
            best_run_count = run_count;
            best_idx = i;
        }
    }

    MODULE.fastest.store(best_idx, Ordering::Release);
    *MODULE.stats.lock().unwrap() = stats;
    fletcher_4_impl_set("fastest")
        .expect("the fastest selector is always recognized");
    info!(fastest = FLETCHER_4_ALGOS[best_idx].name,
          "selected fletcher4 implementation");
}

/// Select the implementation that dispatch will use.
///
/// `selector` matches the names `fastest`, `scalar`, the other registered
/// kernels, and `cycle`, case-sensitively: an exact match wins, otherwise
/// the first table entry that prefixes `selector` does.  `cycle` routes
/// every call to a different kernel in turn, which exists to exercise all
/// of them under test loads.
pub fn fletcher_4_impl_set(selector: &str) -> Result<()> {
    let idx = SELECTOR_NAMES.iter()
        .position(|name| *name == selector)
        .or_else(|| {
            SELECTOR_NAMES.iter()
                .position(|name| selector.starts_with(name))
        }).ok_or(Error::InvalidArgument)?;

    let _guard = MODULE.selector_lock.lock().unwrap();
    let algo = match idx {
        SEL_FASTEST => MODULE.fastest.load(Ordering::Acquire),
        // the read path handles the actual cycling
        SEL_CYCLE => SCALAR_IDX,
        _ => idx - 1,
    };
    MODULE.chosen.store(algo, Ordering::Release);
    MODULE.selector.store(idx, Ordering::Release);
    debug!(selector = SELECTOR_NAMES[idx],
           algo = FLETCHER_4_ALGOS[algo].name,
           "fletcher4 selector changed");
    Ok(())
}

fn fletcher_4_impl_get() -> &'static Fletcher4Impl {
    if MODULE.selector.load(Ordering::Acquire) == SEL_CYCLE {
        loop {
            let index = MODULE.cycle.fetch_add(1, Ordering::Relaxed) as usize;
            let algo = FLETCHER_4_ALGOS[index % FLETCHER_4_ALGOS.len()];
            if algo.valid.map_or(true, |valid| valid()) {
                return algo;
            }
        }
    }
    FLETCHER_4_ALGOS[MODULE.chosen.load(Ordering::Acquire)]
}

/// Checksum `buf` with the currently selected implementation, reading
/// 32-bit words in host order.
///
/// The buffer length must be a multiple of 4 bytes.
pub fn fletcher_4_native(buf: &[u8]) -> Checksum {
    assert_eq!(buf.len() % 4, 0,
        "buffer length must be a multiple of 4 bytes");
    let algo = fletcher_4_impl_get();
    let aligned = buf.len() & !(KERNEL_ALIGN - 1);
    let mut ctx = (algo.init)();
    (algo.compute)(&mut ctx, &buf[..aligned]);
    let mut cksum = (algo.fini)(&ctx);
    if aligned < buf.len() {
        fletcher_4_scalar_native(&buf[aligned..], &mut cksum);
    }
    cksum
}

/// Like [`fletcher_4_native`], but byte-reverse each word first
pub fn fletcher_4_byteswap(buf: &[u8]) -> Checksum {
    assert_eq!(buf.len() % 4, 0,
        "buffer length must be a multiple of 4 bytes");
    let algo = fletcher_4_impl_get();
    let aligned = buf.len() & !(KERNEL_ALIGN - 1);
    let mut ctx = (algo.init)();
    (algo.compute_byteswap)(&mut ctx, &buf[..aligned]);
    let mut cksum = (algo.fini)(&ctx);
    if aligned < buf.len() {
        fletcher_4_scalar_byteswap(&buf[aligned..], &mut cksum);
    }
    cksum
}

/// Continue a checksum across `buf`, carrying state in `cksum`.
///
/// Always runs the scalar kernel: its intermediate state is the true
/// accumulator values, which multi-stream kernels cannot expose.
pub fn fletcher_4_incremental_native(buf: &[u8], cksum: &mut Checksum) {
    assert_eq!(buf.len() % 4, 0,
        "buffer length must be a multiple of 4 bytes");
    fletcher_4_scalar_native(buf, cksum);
}

/// Byteswapping variant of [`fletcher_4_incremental_native`]
pub fn fletcher_4_incremental_byteswap(buf: &[u8], cksum: &mut Checksum) {
    assert_eq!(buf.len() % 4, 0,
        "buffer length must be a multiple of 4 bytes");
    fletcher_4_scalar_byteswap(buf, cksum);
}

/// The benchmark results table published by [`fletcher_4_init`].
///
/// Empty before `init` and after [`fletcher_4_fini`].
pub fn fletcher_4_bench_results() -> Vec<Fletcher4Stat> {
    MODULE.stats.lock().unwrap().clone()
}

/// Tear down the dispatch state: forget the benchmark results and fall
/// back to the scalar kernel.
pub fn fletcher_4_fini() {
    let _guard = MODULE.selector_lock.lock().unwrap();
    MODULE.chosen.store(SCALAR_IDX, Ordering::Release);
    MODULE.fastest.store(SCALAR_IDX, Ordering::Release);
    MODULE.selector.store(SEL_SCALAR, Ordering::Release);
    MODULE.stats.lock().unwrap().clear();
}

// LCOV_EXCL_STOP
