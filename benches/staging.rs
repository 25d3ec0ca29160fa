//! Staging and wire benchmark suite.
//!
//! - Toggle churn at different page sizes (eviction and renumbering)
//! - Reconcile after a re-render
//! - Codec throughput for staged snapshots
//! - Host to client round trip over localhost
//!
//! Run with: cargo bench --bench staging
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tokio::runtime::Runtime;
use tokio::sync::Mutex;

use inspector_link::dom::{ElementInfo, MemoryDom};
use inspector_link::protocol::{ClientMessage, Decoded, decode, encode};
use inspector_link::transport::{HeartbeatConfig, HostTransport};
use inspector_link::{
    ClientTransport, ElementHandle, HostMessage, ReconnectPolicy, Rect, StagingManager,
    TransportEvent,
};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const PAGE_SIZES: &[usize] = &[10, 100, 1_000];
const CAPACITY: usize = 5;

// ============================================================================
// Fixtures
// ============================================================================

fn page(size: usize) -> (MemoryDom, Vec<ElementHandle>) {
    let dom = MemoryDom::new();
    let body = dom.insert(None, ElementInfo::new("body"));
    let list = dom.insert(Some(body), ElementInfo::new("ul").with_id("list"));
    let items = (0..size)
        .map(|i| {
            dom.insert_with_rect(
                Some(list),
                ElementInfo::new("li").with_class("item"),
                Rect::new(0.0, i as f64 * 20.0, 200.0, 20.0),
            )
        })
        .collect();
    (dom, items)
}

// ============================================================================
// Benchmark: Toggle Churn
// ============================================================================

fn bench_toggle_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("toggle_churn");

    for &size in PAGE_SIZES {
        let (dom, items) = page(size);
        group.bench_with_input(BenchmarkId::new("toggle", size), &items, |b, items| {
            let mut staging = StagingManager::new(CAPACITY).expect("capacity");
            let mut cursor = 0usize;
            b.iter(|| {
                let element = items[cursor % items.len()];
                cursor = cursor.wrapping_add(7);
                black_box(staging.toggle(&dom, element));
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Reconcile
// ============================================================================

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    for &size in PAGE_SIZES {
        group.bench_function(BenchmarkId::new("rerender", size), |b| {
            b.iter_batched(
                || {
                    let (dom, items) = page(size);
                    let mut staging = StagingManager::new(CAPACITY).expect("capacity");
                    for &element in items.iter().take(CAPACITY) {
                        staging.add(&dom, element);
                    }
                    for &element in items.iter().take(CAPACITY) {
                        dom.replace(element);
                    }
                    (dom, staging)
                },
                |(dom, mut staging)| black_box(staging.reconcile(&dom)),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Codec
// ============================================================================

fn bench_codec(c: &mut Criterion) {
    let (dom, items) = page(CAPACITY);
    let mut staging = StagingManager::new(CAPACITY).expect("capacity");
    for &element in &items {
        staging.add(&dom, element);
    }
    let messages: Vec<ClientMessage> = staging
        .wire_snapshot()
        .into_iter()
        .map(|payload| ClientMessage::ElementStaged { payload })
        .collect();
    let frames: Vec<String> = messages
        .iter()
        .map(|m| encode(m).expect("encode"))
        .collect();

    let mut group = c.benchmark_group("codec");
    group.bench_function("encode_snapshot", |b| {
        b.iter(|| {
            for message in &messages {
                black_box(encode(message).expect("encode"));
            }
        });
    });
    group.bench_function("decode_snapshot", |b| {
        b.iter(|| {
            for frame in &frames {
                let decoded: Decoded<ClientMessage> = decode(frame).expect("decode");
                black_box(decoded);
            }
        });
    });
    group.finish();
}

// ============================================================================
// Benchmark: Round Trip
// ============================================================================

fn bench_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");

    let (host, client, client_rx) = rt.block_on(async {
        let (host, mut host_rx) = HostTransport::bind(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            0,
            HeartbeatConfig::default(),
        )
        .await
        .expect("bind");
        let (client, client_rx) =
            ClientTransport::new(&host.ws_url(), ReconnectPolicy::default()).expect("client");
        client.connect().await.expect("connect");

        while let Some(event) = host_rx.recv().await {
            if matches!(event, TransportEvent::Message(ClientMessage::Ready)) {
                break;
            }
        }
        (host, client, Arc::new(Mutex::new(client_rx)))
    });

    let mut group = c.benchmark_group("round_trip");
    group.measurement_time(Duration::from_secs(10));
    group.bench_function("host_to_client", |b| {
        b.to_async(&rt).iter(|| {
            let client_rx = Arc::clone(&client_rx);
            let sent = host.send(&HostMessage::ClearHighlight);
            async move {
                let mut rx = client_rx.lock().await;
                while sent {
                    match rx.recv().await {
                        Some(TransportEvent::Message(HostMessage::ClearHighlight)) | None => break,
                        Some(_) => {}
                    }
                }
            }
        });
    });
    group.finish();

    client.disconnect();
    drop(host);
}

criterion_group!(
    benches,
    bench_toggle_churn,
    bench_reconcile,
    bench_codec,
    bench_round_trip
);
criterion_main!(benches);
