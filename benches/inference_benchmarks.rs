//! Performance benchmarks for update rounds and checkpoint save/load

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;
use tempfile::TempDir;
use vmp_engine::node::{node_ref, shared};
use vmp_engine::testing::ScriptedNode;
use vmp_engine::{InferenceLoop, NodeRef, Selection};

/// Build a model of `num_nodes` scripted nodes with `script_len` steps each
fn create_model(num_nodes: usize, script_len: usize) -> InferenceLoop {
    let nodes: Vec<NodeRef> = (0..num_nodes)
        .map(|i| {
            let script = (0..script_len)
                .map(|step| -1.0 / (step as f64 + 1.0) - i as f64)
                .collect();
            node_ref(&shared(ScriptedNode::new(&format!("node_{i}"), script)))
        })
        .collect();
    InferenceLoop::new(nodes).expect("unique names")
}

fn bench_update_rounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_rounds");

    for num_nodes in [4, 64] {
        group.bench_function(format!("{num_nodes}_nodes_x100"), |b| {
            b.iter_batched(
                || create_model(num_nodes, 100),
                |mut vb| {
                    vb.update(Selection::All, 100).expect("update");
                    black_box(vb.iteration())
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_checkpoint(c: &mut Criterion) {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("bench.json");

    let mut vb = create_model(32, 500);
    vb.update_all(500).expect("update");

    c.bench_function("checkpoint_save_32x500", |b| {
        b.iter(|| vb.save(Some(&path)).expect("save"))
    });

    c.bench_function("checkpoint_load_32x500", |b| {
        b.iter_batched(
            || create_model(32, 500),
            |mut fresh| {
                fresh.load(Selection::All, Some(&path)).expect("load");
                black_box(fresh.iteration())
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_update_rounds, bench_checkpoint);
criterion_main!(benches);
