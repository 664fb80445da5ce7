// vim: tw=80

use draid_core::raid::{
    eval_decluster,
    eval_resilver,
    EvalMethod,
    PermMap,
};
use draid_core::{DevT, Error};
use pretty_assertions::assert_eq;

/// Generate, develop, and evaluate a 12-device map end to end
#[test_log::test]
fn generate_and_evaluate() {
    let map = PermMap::new(12, 2, 2, 100, 0).unwrap();

    // every row is a permutation
    for r in 0..map.nrows() {
        let mut row = map.row(r).to_vec();
        row.sort_unstable();
        assert_eq!(row, (0..12).collect::<Vec<DevT>>());
    }

    // development multiplies the row count by the device count and fills
    // every slot position evenly
    let dmap = map.develop().unwrap();
    assert_eq!(dmap.nrows(), 1200);
    for j in 0..12usize {
        for dev in 0..12 as DevT {
            let occupancy = (0..dmap.nrows())
                .filter(|&r| dmap.row(r)[j] == dev)
                .count();
            assert_eq!(occupancy, map.nrows());
        }
    }

    // worst-case single-fault hotspot, normalized per group-row
    let mut dmap = dmap;
    let eval = eval_decluster(&mut dmap, EvalMethod::Worst, 1).unwrap();
    assert_eq!(eval.value,
               f64::from(eval.max_ios) / dmap.nrows() as f64 * 2.0);
    assert!(eval.value > 0.0);
    assert!(eval.worst.1.is_none());
    assert!(eval.worst.0 < 12);
    assert_eq!(dmap.nbroken(), 0);

    // the developed map diffuses load at least as well as the base map
    let mut base = map;
    let base_eval = eval_decluster(&mut base, EvalMethod::Mean, 1).unwrap();
    let dev_eval = eval_decluster(&mut dmap, EvalMethod::Mean, 1).unwrap();
    assert!(dev_eval.value <= base_eval.value * 1.5);
}

/// A map with an injected failure reports the resilver I/O for exactly the
/// degraded group-rows.
#[test]
fn resilver_counts() {
    let mut map = PermMap::new(12, 2, 2, 50, 1).unwrap();
    map.fail_device(3).unwrap();
    let io = eval_resilver(&map).unwrap();

    // each degraded group-row contributes groupsz - 1 reads and 1 write;
    // rows whose failed device lands in a spare slot contribute nothing
    let degraded_rows = (0..map.nrows())
        .filter(|&r| {
            map.row(r).iter().position(|&dev| dev == 3).unwrap() <
                map.first_spare_slot()
        })
        .count() as u32;
    let total = io.reads.iter().sum::<u32>() + io.writes.iter().sum::<u32>();
    assert_eq!(total, degraded_rows * u32::from(map.groupsz()));
    assert_eq!(io.writes.iter().sum::<u32>(), degraded_rows);

    // the failed device itself absorbs no I/O
    assert_eq!(io.reads[3], 0);
    assert_eq!(io.writes[3], 0);
}

/// Double-fault sweeps report the argmax pair and leave the map healthy
#[test]
fn double_fault_sweep() {
    let mut map = PermMap::new(12, 2, 2, 20, 2).unwrap();
    let eval = eval_decluster(&mut map, EvalMethod::Rms, 2).unwrap();
    assert!(eval.value > 0.0);
    let (f1, f2) = (eval.worst.0, eval.worst.1.unwrap());
    assert!(f1 < f2);
    assert!(f2 < 12);
    assert_eq!(map.nbroken(), 0);
}

#[test]
fn method_parsing() {
    assert_eq!("worst".parse(), Ok(EvalMethod::Worst));
    assert_eq!("gibberish".parse::<EvalMethod>(),
               Err(Error::InvalidArgument));
}
