//! Region I/O Tests
//!
//! Randomized regions written into a payload must read back exactly, and
//! must leave every element outside the region untouched. Runs against
//! both the in-memory and the on-disk store.

use std::sync::Arc;

use ndblock::datatype::{decode_into, encode_all, DataType};
use ndblock::shape::{flatten, unflatten, Hyperslab, NdSize};
use ndblock::store::{LocalStore, MemoryStore, PersistentStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn random_shape(rng: &mut StdRng) -> NdSize {
    let rank = rng.gen_range(1..=4);
    NdSize::new((0..rank).map(|_| rng.gen_range(1..=6)).collect())
}

fn random_region(rng: &mut StdRng, shape: &NdSize) -> (NdSize, NdSize) {
    let mut offset = Vec::with_capacity(shape.rank());
    let mut count = Vec::with_capacity(shape.rank());
    for &extent in shape.iter() {
        let o = rng.gen_range(0..extent);
        let c = rng.gen_range(0..=extent - o);
        offset.push(o);
        count.push(c);
    }
    (NdSize::new(offset), NdSize::new(count))
}

/// Apply `values` to `model` at the region, the slow way
fn apply_to_model(model: &mut [i64], shape: &NdSize, offset: &NdSize, count: &NdSize, values: &[i64]) {
    for (local, value) in values.iter().enumerate() {
        let local_coord = unflatten(local, count.extents()).unwrap();
        let global: Vec<usize> = local_coord
            .iter()
            .zip(offset.iter())
            .map(|(l, o)| l + o)
            .collect();
        model[flatten(&global, shape.extents()).unwrap()] = *value;
    }
}

fn exercise_store(store: Arc<dyn PersistentStore>, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);

    for round in 0..25 {
        let shape = random_shape(&mut rng);
        let key = format!("buffer-{}", round);
        let handle = store.allocate(&key, DataType::Int64, &shape).unwrap();
        let mut model = vec![0i64; shape.element_count()];

        for _ in 0..8 {
            let (offset, count) = random_region(&mut rng, &shape);
            let slab = Hyperslab::resolve(&shape, Some(&offset), Some(&count)).unwrap();
            let values: Vec<i64> = (0..slab.element_count())
                .map(|_| rng.gen_range(-1000..1000))
                .collect();

            store
                .write_region(&handle, &slab, &encode_all(&values))
                .unwrap();
            apply_to_model(&mut model, &shape, &offset, &count, &values);

            let bytes = store.read_region(&handle, &slab).unwrap();
            let mut back = vec![0i64; slab.element_count()];
            decode_into(&bytes, &mut back);
            assert_eq!(back, values, "region {} {} of {}", offset, count, shape);
        }

        let whole = Hyperslab::whole(&shape);
        let mut all = vec![0i64; shape.element_count()];
        decode_into(&store.read_region(&handle, &whole).unwrap(), &mut all);
        assert_eq!(all, model, "payload diverged for {}", shape);

        store.release(&handle).unwrap();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_random_regions_memory_store() {
    exercise_store(Arc::new(MemoryStore::new()), 7);
}

#[test]
fn test_random_regions_local_store() {
    let temp_dir = TempDir::new().unwrap();
    exercise_store(Arc::new(LocalStore::open(temp_dir.path()).unwrap()), 11);
}

#[test]
fn test_flatten_unflatten_inverse() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..50 {
        let shape = random_shape(&mut rng);
        for index in 0..shape.element_count() {
            let coord = unflatten(index, shape.extents()).unwrap();
            assert_eq!(flatten(coord.extents(), shape.extents()).unwrap(), index);
        }
    }
}

#[test]
fn test_runs_cover_region_exactly() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..50 {
        let shape = random_shape(&mut rng);
        let (offset, count) = random_region(&mut rng, &shape);
        let slab = Hyperslab::resolve(&shape, Some(&offset), Some(&count)).unwrap();

        let covered: usize = slab.runs().iter().map(|r| r.len).sum();
        assert_eq!(covered, slab.element_count());

        for pair in slab.runs().windows(2) {
            assert!(pair[0].start + pair[0].len <= pair[1].start);
        }
    }
}
