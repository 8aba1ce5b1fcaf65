use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use cara_store::clock::ManualClock;
use cara_store::models::NewComment;
use cara_store::storage::{FileStorage, MemoryStorage};
use cara_store::store::{CommentStore, SubscriberStore, ViewStore};
use tempfile::TempDir;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at(2024, 3, 5, 10, 0))
}

fn bench_increment_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("increment_views");

    let views = ViewStore::new(Arc::new(MemoryStorage::default()), clock());
    group.bench_function("memory", |b| {
        b.iter(|| black_box(views.increment_views(black_box("1"))))
    });

    let temp_dir = TempDir::new().unwrap();
    let storage = FileStorage::open(temp_dir.path()).unwrap();
    let views = ViewStore::new(Arc::new(storage), clock());
    group.sample_size(20);
    group.bench_function("file", |b| {
        b.iter(|| black_box(views.increment_views(black_box("1"))))
    });

    group.finish();
}

fn bench_add_comment(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_comment");

    // Every add rewrites the whole list, so cost grows with its size
    for existing in [10usize, 100, 1000] {
        let comments = CommentStore::new(Arc::new(MemoryStorage::default()), clock());
        for i in 0..existing {
            comments
                .add(NewComment::new("1", "Awa", format!("Commentaire {}", i)))
                .unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(existing), &comments, |b, comments| {
            b.iter(|| {
                comments
                    .add(NewComment::new("2", "Koffi", "Merci pour la recette"))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_export_csv(c: &mut Criterion) {
    let subscribers = SubscriberStore::new(Arc::new(MemoryStorage::default()), clock());
    for i in 0..500 {
        subscribers
            .add(&format!("lecteur{}@example.com", i), Some("modal"))
            .unwrap();
    }

    c.bench_function("export_csv_500", |b| b.iter(|| black_box(subscribers.export_csv())));
}

criterion_group!(benches, bench_increment_views, bench_add_comment, bench_export_csv);
criterion_main!(benches);
