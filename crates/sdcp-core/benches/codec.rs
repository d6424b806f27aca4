//! Codec benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sdcp_core::{codec, Status, StatusMessage, Topics};

fn status_frame() -> Vec<u8> {
    let msg = StatusMessage {
        topic: "sdcp/status/A1B2".to_string(),
        status: Status {
            temp_of_uvled: 38.2,
            temp_of_box: 26.0,
            ..Default::default()
        },
        mainboard_id: "A1B2".to_string(),
        timestamp: 1_700_000_000,
    };
    codec::encode(&msg).unwrap().to_vec()
}

fn classify_benchmark(c: &mut Criterion) {
    let topics = Topics::new("A1B2");
    let frame = status_frame();

    c.bench_function("decode_inbound_status", |b| {
        b.iter(|| black_box(codec::decode_inbound(&topics, &frame).unwrap()))
    });
}

fn response_benchmark(c: &mut Criterion) {
    let topics = Topics::new("A1B2");
    let frame = br#"{"Topic":"sdcp/response/A1B2","Id":"x","Data":{"Cmd":0,"Data":{"Ack":0},"RequestID":"9c1d","MainboardID":"A1B2","TimeStamp":1}}"#;

    c.bench_function("decode_inbound_response", |b| {
        b.iter(|| black_box(codec::decode_inbound(&topics, frame).unwrap()))
    });
}

criterion_group!(benches, classify_benchmark, response_benchmark);
criterion_main!(benches);
