//! Benchmark suite for the kanban core.
//!
//! This module provides performance benchmarks for:
//! - Task creation (full-collection rewrite per write)
//! - Task moves across columns
//! - Repair over a board with stale back-references
//! - Column title status derivation
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Save baseline for comparison
//! cargo bench -- --save-baseline main
//!
//! # Compare against baseline
//! cargo bench -- --baseline main
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kanban::{BoardCoordinator, FileStore, KanbanConfig, MemoryStore, NewTask, TaskStatus};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

/// Coordinator over a memory store with one board holding `tasks` tasks,
/// spread round-robin across its columns.
fn seeded(tasks: usize) -> (BoardCoordinator<MemoryStore>, String, Vec<String>) {
    let mut c = BoardCoordinator::open(MemoryStore::new(), &KanbanConfig::default())
        .expect("Failed to open coordinator");
    let board = c.create_board("Bench", "").expect("Failed to create board");
    let cols: Vec<String> = board.columns.iter().map(|c| c.id.clone()).collect();
    for i in 0..tasks {
        c.create_task(&board.id, &cols[i % cols.len()], NewTask::new(format!("task {i}")))
            .expect("Failed to create task");
    }
    (c, board.id, cols)
}

// ============================================================================
// Task Creation Benchmarks
// ============================================================================

fn bench_create_task(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_task");

    for existing in [10, 50, 200] {
        group.throughput(Throughput::Elements(existing as u64));
        group.bench_with_input(
            BenchmarkId::new("memory", existing),
            &existing,
            |b, &existing| {
                b.iter_batched(
                    || seeded(existing),
                    |(mut coord, board_id, cols)| {
                        black_box(coord.create_task(&board_id, &cols[0], NewTask::new("new")))
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    let temp = TempDir::new().expect("Failed to create temp dir");
    let mut coord = BoardCoordinator::open(FileStore::new(temp.path()), &KanbanConfig::default())
        .expect("Failed to open coordinator");
    let board = coord.create_board("Disk", "").expect("Failed to create board");
    let col = board.columns[0].id.clone();
    group.bench_function("file", |b| {
        b.iter(|| {
            // keep the board under its task limit
            if coord.board(&board.id).map_or(0, |board| board.task_count()) >= 400 {
                for t in coord.board_tasks(&board.id).unwrap_or_default() {
                    let _ = coord.delete_task(&t.id);
                }
            }
            black_box(coord.create_task(&board.id, &col, NewTask::new("new")).is_ok())
        });
    });

    group.finish();
}

// ============================================================================
// Move Benchmarks
// ============================================================================

fn bench_move_task(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_task");

    for size in [10, 50, 200] {
        let (mut coord, board_id, cols) = seeded(size);
        let task_id = coord
            .column_tasks(&board_id, &cols[0])
            .expect("Failed to list column")
            .remove(0)
            .id;

        let mut flip = false;
        group.bench_function(BenchmarkId::new("memory", size), |b| {
            b.iter(|| {
                flip = !flip;
                let to = if flip { &cols[3] } else { &cols[0] };
                black_box(coord.move_task(&task_id, to, None).is_ok())
            });
        });
    }

    group.finish();
}

// ============================================================================
// Repair Benchmarks
// ============================================================================

fn bench_repair(c: &mut Criterion) {
    let mut group = c.benchmark_group("repair");

    for size in [10, 50, 200] {
        group.bench_with_input(BenchmarkId::new("stale", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let (mut coord, board_id, _) = seeded(size);
                    let mut tasks = coord.gateway().list_tasks();
                    for t in &mut tasks {
                        t.status = TaskStatus::Review;
                    }
                    coord
                        .gateway_mut()
                        .put_tasks(&tasks)
                        .expect("Failed to stale tasks");
                    (coord, board_id)
                },
                |(mut coord, board_id)| black_box(coord.repair(&board_id).is_ok()),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// ============================================================================
// Status Derivation Benchmarks
// ============================================================================

fn bench_status_from_title(c: &mut Criterion) {
    let titles = [
        "To Do",
        "In Progress",
        "Code Review",
        "Done ✅",
        "Backlog",
        "Waiting on QA testing before release",
    ];

    c.bench_function("status_from_column_title", |b| {
        b.iter(|| {
            for title in &titles {
                black_box(TaskStatus::from_column_title(black_box(title)));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_create_task,
    bench_move_task,
    bench_repair,
    bench_status_from_title
);
criterion_main!(benches);
