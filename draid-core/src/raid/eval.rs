// vim: tw=80

//! Resilver-load evaluation
//!
//! Quantifies the I/O hotspot that a failure set induces on a permutation
//! map.  Reconstructing a degraded group reads every healthy member and
//! writes the rebuilt column to a spare, so a poorly-diffused map
//! concentrates that traffic on a few devices.

use std::str::FromStr;

use itertools::Itertools;
use tracing::debug;

use crate::types::{DevT, Error, Result};
use super::perm_map::PermMap;

/// How [`eval_decluster`] aggregates per-failure hotspot figures
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EvalMethod {
    /// Maximum over all injected failure sets
    Worst,
    /// Arithmetic mean
    Mean,
    /// Root mean square
    Rms,
}

impl FromStr for EvalMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "worst" => Ok(EvalMethod::Worst),
            "mean" => Ok(EvalMethod::Mean),
            "rms" => Ok(EvalMethod::Rms),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// Per-device I/O counts induced by resilvering one failure set
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResilverIo {
    /// Reconstruction reads per device
    pub reads: Vec<u32>,
    /// Reconstruction writes per device
    pub writes: Vec<u32>,
    pub max_read: u32,
    pub max_write: u32,
    /// `max(reads[d] + writes[d])` over all devices: the hotspot figure
    pub max_ios: u32,
}

/// Result of a full failure sweep by [`eval_decluster`]
#[derive(Clone, Debug, PartialEq)]
pub struct DeclusterEval {
    /// The aggregate, normalized to I/O per group-row
    pub value: f64,
    /// Hotspot figure of the worst failure set
    pub max_ios: u32,
    /// The failure set that produced `max_ios`
    pub worst: (DevT, Option<DevT>),
}

/// Count the reads and writes needed to resilver every degraded group in
/// every row of `map`, given its current failure set.
///
/// Within a row, each degraded group reads its healthy members and writes
/// one reconstructed column per broken member to the next healthy spare
/// slot.  The spare cursor is local to the row: it starts at the first
/// spare slot and only moves right, so distinct broken slots always land on
/// distinct spares.  A cursor that runs off the end of the row means the
/// map carries more failures than its spares can mask, which
/// [`PermMap::fail_device`] makes unreachable; the check stays because the
/// cost of an incorrect layout here is silent corruption of the statistics.
pub fn eval_resilver(map: &PermMap) -> Result<ResilverIo> {
    let nd = usize::from(map.ndevs());
    let groupsz = usize::from(map.groupsz());
    let mut reads = vec![0u32; nd];
    let mut writes = vec![0u32; nd];

    for r in 0..map.nrows() {
        let row = map.row(r);
        let mut spare = map.first_spare_slot();
        let mut index = 0;
        for _ in 0..map.ngroups() {
            let group = &row[index..index + groupsz];
            index += groupsz;
            if !group.iter().any(|&dev| map.is_broken(dev)) {
                continue;
            }
            for &dev in group {
                if !map.is_broken(dev) {
                    reads[usize::from(dev)] += 1;
                } else {
                    while spare < nd && map.is_broken(row[spare]) {
                        spare += 1;
                    }
                    if spare >= nd {
                        return Err(Error::Exhausted);
                    }
                    writes[usize::from(row[spare])] += 1;
                    spare += 1;
                }
            }
        }
    }

    let max_read = reads.iter().copied().max().unwrap_or(0);
    let max_write = writes.iter().copied().max().unwrap_or(0);
    let max_ios = reads.iter()
        .zip(writes.iter())
        .map(|(r, w)| r + w)
        .max()
        .unwrap_or(0);
    Ok(ResilverIo { reads, writes, max_read, max_write, max_ios })
}

/// Sweep failures across the whole array and aggregate the hotspot figures.
///
/// `faults` must be 1 or 2.  Single-fault mode injects each device in turn;
/// double-fault mode injects every unordered device pair.  The aggregate
/// chosen by `how` is normalized to `(value / nrows) * ngroups`, i.e. I/O
/// per group-row, a unit comparable across map shapes.  The map's failure
/// set is clear on return, whether or not the sweep succeeded.
#[tracing::instrument(skip(map))]
pub fn eval_decluster(map: &mut PermMap, how: EvalMethod, faults: u8)
    -> Result<DeclusterEval>
{
    let result = sweep_faults(map, how, faults);
    map.clear_failures();
    if let Ok(eval) = &result {
        debug!(value = eval.value, max_ios = eval.max_ios, "sweep complete");
    }
    result
}

fn sweep_faults(map: &mut PermMap, how: EvalMethod, faults: u8)
    -> Result<DeclusterEval>
{
    let ndevs = map.ndevs();
    let mut sum = 0u64;
    let mut sum_sq = 0u64;
    let mut max_ios = 0u32;
    let mut worst = (0, None);
    let mut iterations = 0u64;

    let inject = |map: &mut PermMap, f1: DevT, f2: Option<DevT>|
        -> Result<u32>
    {
        map.clear_failures();
        map.fail_device(f1)?;
        if let Some(f2) = f2 {
            map.fail_device(f2)?;
        }
        Ok(eval_resilver(map)?.max_ios)
    };

    match faults {
        1 => {
            for f1 in 0..ndevs {
                let ios = inject(map, f1, None)?;
                iterations += 1;
                sum += u64::from(ios);
                sum_sq += u64::from(ios) * u64::from(ios);
                if ios > max_ios {
                    max_ios = ios;
                    worst = (f1, None);
                }
            }
        }
        2 => {
            if ndevs < 2 {
                return Err(Error::InvalidArgument);
            }
            for (f1, f2) in (0..ndevs).tuple_combinations() {
                let ios = inject(map, f1, Some(f2))?;
                iterations += 1;
                sum += u64::from(ios);
                sum_sq += u64::from(ios) * u64::from(ios);
                if ios > max_ios {
                    max_ios = ios;
                    worst = (f1, Some(f2));
                }
            }
        }
        _ => return Err(Error::InvalidArgument),
    }

    let value = match how {
        EvalMethod::Worst => f64::from(max_ios),
        EvalMethod::Mean => sum as f64 / iterations as f64,
        EvalMethod::Rms => (sum_sq as f64 / iterations as f64).sqrt(),
    };
    let value = value / map.nrows() as f64 * f64::from(map.ngroups());
    Ok(DeclusterEval { value, max_ios, worst })
}

// LCOV_EXCL_STOP
