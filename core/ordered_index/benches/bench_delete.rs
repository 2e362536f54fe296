//! Benchmarks for the delete operations of the ordered index.
//!
//! This benchmark tests the performance of emptying a Red-Black Tree (RBT) in random order, for keys of various
//! sizes. Only the deletes are timed; refilling the tree between iterations is not.
//!
//! ## Benchmark execution
//!
//! Running this exact benchmark can be done with the following command:
//!
//! `> cargo bench -p ordered_index --bench bench_delete`
//!
//! If you wish to run a subset of benchmarks in this file, you can filter them by name:
//!
//! `> cargo bench -p ordered_index --bench bench_delete -- <filter>`
//!
//! ## Examples
//!
//! ```bash
//! > cargo bench -p ordered_index --bench bench_delete -- 32bit
//! > cargo bench -p ordered_index --bench bench_delete -- handle
//! > cargo bench -p ordered_index --bench bench_delete
//! ```
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation. All rights reserved.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use ordered_index::Rbt;
use rand::{prelude::SliceRandom, Rng};
use std::{collections::HashSet, hash::Hash};
use uint::construct_uint;

const MAX_SIZE: usize = 4096;

construct_uint! {
    pub struct U384(6);
}

fn random_numbers<D>(min: D, max: D) -> Vec<D>
where
    D: Copy + Eq + std::cmp::PartialOrd + Hash + rand::distributions::uniform::SampleUniform,
{
    let mut rng = rand::thread_rng();
    let mut nums: HashSet<D> = HashSet::new();
    while nums.len() < MAX_SIZE {
        let num: D = rng.gen_range(min..=max);
        nums.insert(num);
    }
    nums.into_iter().collect()
}

fn shuffled<K: Copy>(keys: &[K]) -> Vec<K> {
    let mut keys = keys.to_vec();
    keys.shuffle(&mut rand::thread_rng());
    keys
}

fn benchmark_delete_function(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete");

    let nums = random_numbers::<u32>(0, 100_000);
    let order = shuffled(&nums);
    group.bench_function(BenchmarkId::new("rbt", "32bit"), |b| {
        b.iter_batched_ref(
            || nums.iter().map(|key| (*key, ())).collect::<Rbt<u32, ()>>(),
            |rbt| {
                for key in &order {
                    rbt.delete(key).unwrap();
                }
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function(BenchmarkId::new("rbt_handle", "32bit"), |b| {
        b.iter_batched_ref(
            || {
                let rbt = nums.iter().map(|key| (*key, ())).collect::<Rbt<u32, ()>>();
                let handles: Vec<_> = order.iter().map(|key| rbt.get_handle(key).unwrap()).collect();
                (rbt, handles)
            },
            |(rbt, handles)| {
                for handle in handles.iter() {
                    rbt.delete_with_handle(*handle).unwrap();
                }
            },
            BatchSize::LargeInput,
        )
    });

    let nums = random_numbers::<u128>(0, 100_000);
    let order = shuffled(&nums);
    group.bench_function(BenchmarkId::new("rbt", "128bit"), |b| {
        b.iter_batched_ref(
            || nums.iter().map(|key| (*key, ())).collect::<Rbt<u128, ()>>(),
            |rbt| {
                for key in &order {
                    rbt.delete(key).unwrap();
                }
            },
            BatchSize::LargeInput,
        )
    });

    let nums: Vec<U384> = random_numbers::<u32>(0, 100_000).into_iter().map(U384::from).collect();
    let order = shuffled(&nums);
    group.bench_function(BenchmarkId::new("rbt", "384bit"), |b| {
        b.iter_batched_ref(
            || nums.iter().map(|key| (*key, ())).collect::<Rbt<U384, ()>>(),
            |rbt| {
                for key in &order {
                    rbt.delete(key).unwrap();
                }
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, benchmark_delete_function);
criterion_main!(benches);
