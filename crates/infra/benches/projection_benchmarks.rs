use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use barterhub_core::{ItemKey, ObjectId};
use barterhub_events::{EventEnvelope, EventId, RawEvent};
use barterhub_registry::{decide, project, CreditLedger, LedgerLookup, MembershipCard};
use serde_json::json;

fn raw(seq: u64, payload: serde_json::Value) -> RawEvent {
    EventEnvelope::new(EventId::new(format!("tx{seq}"), 0), "bench", None, None, payload)
}

/// `n` stored items, every third one withdrawn.
fn streams(n: u64) -> (Vec<RawEvent>, Vec<RawEvent>) {
    let stored = (0..n)
        .map(|k| raw(k, json!({ "clave": k.to_string(), "nombre_articulo": format!("item-{k}") })))
        .collect();
    let withdrawn = (0..n)
        .filter(|k| k % 3 == 0)
        .map(|k| raw(n + k, json!({ "clave": k.to_string() })))
        .collect();
    (stored, withdrawn)
}

fn bench_projection_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("inventory_projection_rebuild");

    for n in [100u64, 1_000, 10_000] {
        let (stored, withdrawn) = streams(n);
        group.throughput(Throughput::Elements(n + withdrawn.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| project(black_box(&stored), black_box(&withdrawn)))
        });
    }

    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("withdrawal_validation");
    let (stored, withdrawn) = streams(1_000);
    let inventory = project(&stored, &withdrawn).inventory;

    let credits: Vec<_> = (0..200u64)
        .map(|k| json!({ "fields": { "key": k.to_string(), "value": k % 2 == 0 } }))
        .collect();
    let card = MembershipCard::from_fields(
        ObjectId::zero(),
        &json!({ "creditos_activos": { "fields": { "contents": credits } } }),
    );
    let Ok(card) = card else {
        return;
    };
    let lookup = LedgerLookup::Registered(CreditLedger::from(card));

    group.bench_function("eligible", |b| b.iter(|| decide(black_box(ItemKey::new(2)), &inventory, &lookup)));
    group.bench_function("no_credit_for_item", |b| {
        b.iter(|| decide(black_box(ItemKey::new(5)), &inventory, &lookup))
    });

    group.finish();
}

criterion_group!(benches, bench_projection_rebuild, bench_validation);
criterion_main!(benches);
