// vim: tw=80

//! Permutation map construction and development

use fixedbitset::FixedBitSet;
use rand::{RngCore, SeedableRng};

use crate::types::{DevT, Error, Result};
use super::rand48::Rand48;

/// Largest permitted RAID group width
pub const MAX_GROUPSIZE: DevT = 32;

/// Largest permitted number of RAID groups
pub const MAX_GROUPS: DevT = 128;

/// Largest permitted number of hot spares
pub const MAX_SPARES: DevT = 100;

/// Largest permitted device population
pub const MAX_DEVS: DevT = MAX_GROUPSIZE * MAX_GROUPS + MAX_SPARES;

/// Largest permitted number of base rows
pub const MAX_ROWS: usize = 16384;

/// Write one permutation of `prev` to `out`.
///
/// Two-device arrays simply swap; anything larger gets a fresh 31-bit tag
/// per slot and a stable sort, so tied tags preserve the original slot
/// order.
fn permute_devs(prev: &[DevT], out: &mut [DevT], rng: &mut Rand48) {
    if prev.len() == 2 {
        out[0] = prev[1];
        out[1] = prev[0];
        return;
    }

    let mut tagged = prev.iter()
        .map(|&dev| (rng.next_u32() >> 1, dev))
        .collect::<Vec<_>>();
    tagged.sort_by_key(|&(tag, _)| tag);
    for (slot, (_, dev)) in out.iter_mut().zip(tagged) {
        *slot = dev;
    }
}

/// A declustered-RAID permutation map
///
/// A map describes a pool of `ndevs` physical devices organized into
/// `ngroups` RAID groups of uniform width `groupsz`, plus `nspares` hot
/// spares, with `ngroups * groupsz + nspares == ndevs`.  It owns `nrows`
/// rows, each a permutation of `[0, ndevs)`.  Within a row, slots
/// `[0, ngroups * groupsz)` partition into contiguous group-slot ranges and
/// the remaining slots hold the spares.  Rows are immutable after
/// construction; only the failure set may change.
#[derive(Clone, Debug, PartialEq)]
pub struct PermMap {
    ndevs: DevT,
    ngroups: DevT,
    nspares: DevT,
    groupsz: DevT,
    nrows: usize,
    /// `nrows * ndevs` device ids, row-major
    rows: Box<[DevT]>,
    /// Currently-failed devices.  At most `nspares` entries.
    broken: FixedBitSet,
    nbroken: usize,
}

impl PermMap {
    /// Construct a map with pseudo-random rows.
    ///
    /// Row 0 is the identity permutation; each subsequent row permutes its
    /// predecessor using the 48-bit LCG stream, so equal seeds yield equal
    /// maps.
    pub fn new(ndevs: DevT, ngroups: DevT, nspares: DevT, nrows: usize,
               seed: u64) -> Result<Self>
    {
        if ngroups < 1 || ngroups > MAX_GROUPS ||
            nspares > MAX_SPARES ||
            ndevs > MAX_DEVS || ndevs <= nspares ||
            nrows < 1 || nrows > MAX_ROWS
        {
            return Err(Error::InvalidArgument);
        }
        let data = ndevs - nspares;
        if data % ngroups != 0 {
            return Err(Error::InvalidArgument);
        }
        let groupsz = data / ngroups;
        if groupsz < 1 || groupsz > MAX_GROUPSIZE {
            return Err(Error::InvalidArgument);
        }

        let nd = usize::from(ndevs);
        let mut rows = Vec::new();
        rows.try_reserve_exact(nrows * nd)
            .map_err(|_| Error::AllocationFailed)?;
        rows.resize(nrows * nd, 0);
        for (j, slot) in rows[..nd].iter_mut().enumerate() {
            *slot = j as DevT;
        }
        let mut rng = Rand48::seed_from_u64(seed);
        for i in 1..nrows {
            let (prev, rest) = rows.split_at_mut(i * nd);
            permute_devs(&prev[(i - 1) * nd..], &mut rest[..nd], &mut rng);
        }

        Ok(PermMap {
            ndevs,
            ngroups,
            nspares,
            groupsz,
            nrows,
            rows: rows.into_boxed_slice(),
            broken: FixedBitSet::with_capacity(nd),
            nbroken: 0,
        })
    }

    /// Expand this map into its fully-developed form.
    ///
    /// The developed map has `nrows * ndevs` rows: one cyclic shift of each
    /// base row per device.  Shifting preserves the permutation property,
    /// and the completion guarantees that every device occupies every slot
    /// position exactly `nrows` times.  No randomness is consumed.
    pub fn develop(&self) -> Result<PermMap> {
        let nd = usize::from(self.ndevs);
        let nrows = self.nrows * nd;
        let mut rows = Vec::new();
        rows.try_reserve_exact(nrows * nd)
            .map_err(|_| Error::AllocationFailed)?;
        for base in 0..self.nrows {
            let row = self.row(base);
            for shift in 0..self.ndevs {
                rows.extend(row.iter().map(|&dev| (dev + shift) % self.ndevs));
            }
        }
        Ok(PermMap {
            ndevs: self.ndevs,
            ngroups: self.ngroups,
            nspares: self.nspares,
            groupsz: self.groupsz,
            nrows,
            rows: rows.into_boxed_slice(),
            broken: FixedBitSet::with_capacity(nd),
            nbroken: 0,
        })
    }

    /// Mark a device as failed.
    ///
    /// Fails with [`Error::InvalidArgument`] if the device id is out of
    /// range, already failed, or if the map already carries `nspares`
    /// failures.
    pub fn fail_device(&mut self, dev: DevT) -> Result<()> {
        if dev >= self.ndevs ||
            self.broken.contains(usize::from(dev)) ||
            self.nbroken >= usize::from(self.nspares)
        {
            return Err(Error::InvalidArgument);
        }
        self.broken.insert(usize::from(dev));
        self.nbroken += 1;
        Ok(())
    }

    /// Return the map to a fully-healthy state
    pub fn clear_failures(&mut self) {
        self.broken.clear();
        self.nbroken = 0;
    }

    pub fn is_broken(&self, dev: DevT) -> bool {
        self.broken.contains(usize::from(dev))
    }

    pub fn nbroken(&self) -> usize {
        self.nbroken
    }

    pub fn ndevs(&self) -> DevT {
        self.ndevs
    }

    pub fn ngroups(&self) -> DevT {
        self.ngroups
    }

    pub fn nspares(&self) -> DevT {
        self.nspares
    }

    /// Uniform RAID group width
    pub fn groupsz(&self) -> DevT {
        self.groupsz
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// One row of the map: a permutation of `[0, ndevs)`
    pub fn row(&self, r: usize) -> &[DevT] {
        let nd = usize::from(self.ndevs);
        &self.rows[r * nd..(r + 1) * nd]
    }

    /// Index of the first spare slot within any row
    pub fn first_spare_slot(&self) -> usize {
        usize::from(self.ngroups) * usize::from(self.groupsz)
    }
}

// LCOV_EXCL_STOP
