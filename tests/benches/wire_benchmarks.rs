//! Hot paths run for every message on the topic.
//!
//! Run with: `cargo bench -p tm-tests`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shared_types::{Envelope, GeoTrace, NodeAnnouncement, NodeRole, TunnelOrder};
use tm_01_message_router::{parse_trace, PeerDirectory};

fn order_payload() -> String {
    let order = TunnelOrder::new(
        "5b0c7c2e-3f7d-4d8b-9a4e-0f3c2b1a9d8e",
        "0x9f2a5c1b7e3d4a6f8b0c2e4d6a8f1b3c5e7d9a0b",
        "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi",
    );
    Envelope::order(&order).unwrap().to_json().unwrap()
}

fn announcement(i: usize, role: NodeRole) -> NodeAnnouncement {
    NodeAnnouncement {
        peer_id: format!("0xPEER{i:04}"),
        addr: "198.51.100.20".into(),
        port: 7000,
        price: 25,
        role,
        metadata: GeoTrace {
            ip: "198.51.100.20".into(),
            loc: "NL".into(),
            colo: "AMS".into(),
        },
    }
}

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");

    let order = order_payload();
    group.bench_function("parse_and_decode_order", |b| {
        b.iter(|| {
            let envelope = Envelope::parse(black_box(&order)).unwrap();
            envelope.decode_order().unwrap()
        })
    });

    let node = Envelope::node(&announcement(1, NodeRole::Provider))
        .unwrap()
        .to_json()
        .unwrap();
    group.bench_function("parse_and_decode_node", |b| {
        b.iter(|| {
            let envelope = Envelope::parse(black_box(&node)).unwrap();
            envelope.decode_node().unwrap()
        })
    });

    let fulfilled = TunnelOrder::new("u-1", "0xA", "cid").with_port(7001);
    group.bench_function("encode_fulfilled_order", |b| {
        b.iter(|| Envelope::order(black_box(&fulfilled)).unwrap().to_json().unwrap())
    });

    group.finish();
}

fn bench_trace(c: &mut Criterion) {
    let body = "fl=29f1\nh=www.cloudflare.com\nip=203.0.113.7\nts=1700000000.123\n\
                visit_scheme=https\nuag=tunnel-market\ncolo=FRA\nsliver=none\n\
                http=http/2\nloc=DE\ntls=TLSv1.3\nsni=plaintext\nwarp=off\n";

    c.bench_function("parse_trace", |b| b.iter(|| parse_trace(black_box(body))));
}

fn bench_peer_directory(c: &mut Criterion) {
    let mut group = c.benchmark_group("peer_directory");

    for size in [10usize, 100, 1000] {
        let directory = PeerDirectory::new();
        for i in 0..size {
            let role = if i % 2 == 0 {
                NodeRole::Provider
            } else {
                NodeRole::Client
            };
            directory.record(announcement(i, role));
        }

        group.bench_with_input(BenchmarkId::new("providers", size), &size, |b, _| {
            b.iter(|| directory.providers())
        });
        group.bench_with_input(BenchmarkId::new("record_existing", size), &size, |b, _| {
            b.iter(|| directory.record(announcement(0, NodeRole::Provider)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_envelope, bench_trace, bench_peer_directory);
criterion_main!(benches);
