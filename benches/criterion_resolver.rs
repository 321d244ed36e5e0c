#![cfg(all(feature = "criterion-bench", feature = "memory-store"))]

use authgate::{
    EngineBuilder, MemoryStore, Permission, RateLimiter, RoleDefinition, UserId, UserRecord,
};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use futures::executor::block_on;
use std::time::Duration;

fn setup_store(role_count: usize) -> (MemoryStore, UserRecord, Permission) {
    let store = MemoryStore::new();
    let id = UserId::try_from("user_bench").unwrap();
    let mut user = UserRecord::new(id.clone());

    for i in 0..role_count {
        let name = format!("role_{i}");
        store.insert_role(RoleDefinition::new(
            name.as_str(),
            [format!("module_{i}:read")],
        ));
        user.role_names.push(name);
    }

    store.insert_user(user.clone());
    store.insert_token("token_bench", id);

    let required = Permission::try_from(format!("module_{}:read", role_count - 1).as_str()).unwrap();
    (store, user, required)
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("has_permission");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    let (store, user, required) = setup_store(4);
    let engine = EngineBuilder::new(store.clone(), store.clone(), store)
        .registry_ttl(Duration::from_secs(600))
        .build();
    assert!(block_on(engine.has_permission(&user, &required)));

    group.bench_function("hot_registry", |b| {
        b.iter(|| {
            let result = block_on(engine.has_permission(&user, &required));
            black_box(result);
        });
    });

    group.bench_function("explicit_grant", |b| {
        let mut direct = user.clone();
        direct.explicit_permissions.insert(required.clone());
        b.iter(|| {
            let result = block_on(engine.has_permission(&direct, &required));
            black_box(result);
        });
    });

    group.finish();
}

fn bench_role_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("role_fanout");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    for role_count in [1usize, 8, 32, 128] {
        let (store, user, required) = setup_store(role_count);
        let engine = EngineBuilder::new(store.clone(), store.clone(), store)
            .registry_ttl(Duration::from_secs(600))
            .build();
        assert!(block_on(engine.has_permission(&user, &required)));

        let id = BenchmarkId::from_parameter(role_count);
        group.bench_with_input(id, &role_count, |b, _| {
            b.iter(|| {
                let result = block_on(engine.has_permission(&user, &required));
                black_box(result);
            });
        });
    }

    group.finish();
}

fn bench_capabilities(c: &mut Criterion) {
    let mut group = c.benchmark_group("capabilities");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    let (store, mut user, _) = setup_store(4);
    user.role_names.push("HR Admin".to_string());
    let engine = EngineBuilder::new(store.clone(), store.clone(), store)
        .registry_ttl(Duration::from_secs(600))
        .build();
    assert!(block_on(engine.is_admin(&user)));

    group.bench_function("is_admin", |b| {
        b.iter(|| {
            let result = block_on(engine.is_admin(&user));
            black_box(result);
        });
    });

    group.bench_function("is_project_manager", |b| {
        b.iter(|| {
            let result = block_on(engine.is_project_manager(&user));
            black_box(result);
        });
    });

    group.finish();
}

fn bench_rate_limiter(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_limiter");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    let limiter = RateLimiter::new();
    let window = Duration::from_secs(60);

    group.bench_function("allow_single_key", |b| {
        b.iter(|| {
            let result = limiter.allow("user_bench", 1_024, window);
            black_box(result);
        });
    });

    let mut next_key = 0usize;
    group.bench_function("allow_unique_keys", |b| {
        b.iter(|| {
            next_key += 1;
            let key = format!("key_{next_key}");
            let result = limiter.allow(&key, 1_024, window);
            black_box(result);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_resolution,
    bench_role_fanout,
    bench_capabilities,
    bench_rate_limiter
);
criterion_main!(benches);
