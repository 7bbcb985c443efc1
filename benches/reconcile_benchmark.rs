//! Performance benchmarks for frame decoding and reconciliation
//!
//! Measures folding long streamed replies and many concurrent message ids.
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use parley::frames::{FrameDecoder, InboundFrame};
use parley::transcript::Transcript;

/// A streamed reply as the backend would send it, `chunks` deltas long.
fn generate_stream_body(messages: usize, chunks: usize) -> String {
    let mut body = String::new();
    for m in 0..messages {
        for c in 0..chunks {
            body.push_str(&format!(
                "data: {{\"type\":\"chunk\",\"id\":\"m{}\",\"content\":\"token {} \"}}\n\n",
                m, c
            ));
        }
        body.push_str(&format!("data: {{\"type\":\"complete\",\"id\":\"m{}\"}}\n\n", m));
    }
    body
}

fn bench_reconcile_chunks(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_chunks");

    for chunks in [100, 1_000, 10_000] {
        let frames: Vec<InboundFrame> = (0..chunks)
            .map(|i| InboundFrame::chunk("m1", format!("token {} ", i)))
            .chain(std::iter::once(InboundFrame::complete("m1")))
            .collect();

        group.throughput(Throughput::Elements(frames.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chunks), &frames, |b, frames| {
            b.iter(|| {
                let mut transcript = Transcript::new();
                for frame in frames.iter().cloned() {
                    transcript.apply_frame(frame);
                }
                black_box(transcript);
            });
        });
    }

    group.finish();
}

fn bench_reconcile_many_ids(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_many_ids");

    for ids in [10, 100, 1_000] {
        // Round-robin over every id so each lookup hits an existing message
        let frames: Vec<InboundFrame> = (0..ids * 10)
            .map(|i| InboundFrame::chunk(format!("m{}", i % ids), "x"))
            .collect();

        group.throughput(Throughput::Elements(frames.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(ids), &frames, |b, frames| {
            b.iter(|| {
                let mut transcript = Transcript::new();
                for frame in frames.iter().cloned() {
                    transcript.apply_frame(frame);
                }
                black_box(transcript);
            });
        });
    }

    group.finish();
}

fn bench_decode_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_stream");

    let body = generate_stream_body(10, 200);
    group.throughput(Throughput::Bytes(body.len() as u64));

    for read_size in [64, 1_024, 16_384] {
        group.bench_with_input(BenchmarkId::new("read_size", read_size), &body, |b, body| {
            b.iter(|| {
                let mut decoder = FrameDecoder::new();
                let mut transcript = Transcript::new();
                for read in body.as_bytes().chunks(read_size) {
                    for decoded in decoder.feed(black_box(read)) {
                        if let Some(Ok(frame)) = decoded.into_result() {
                            transcript.apply_frame(frame);
                        }
                    }
                }
                black_box(transcript);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_reconcile_chunks,
    bench_reconcile_many_ids,
    bench_decode_stream,
);

criterion_main!(benches);
