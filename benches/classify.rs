use criterion::{black_box, criterion_group, criterion_main, Criterion};
use probenet::base::classify::{classify_generic_error, classify_tls_handshake_error};
use probenet::base::scrubber::scrub;
use probenet::NetError;
use std::io;

fn benchmark_classify(c: &mut Criterion) {
    let refused = NetError::from(io::Error::from(io::ErrorKind::ConnectionRefused));
    let unknown = NetError::Other(
        "read tcp 10.0.2.15:56948->93.184.216.34:443: some error".to_string(),
    );

    c.bench_function("classify_errno", |b| {
        b.iter(|| black_box(classify_generic_error(black_box(&refused))))
    });
    c.bench_function("classify_unknown", |b| {
        b.iter(|| black_box(classify_tls_handshake_error(black_box(&unknown))))
    });
}

fn benchmark_scrub(c: &mut Criterion) {
    let message = "dial tcp [2001:db8::1]:443: connect: connection refused, \
                   then 192.0.2.7:853 timed out";

    c.bench_function("scrub", |b| b.iter(|| black_box(scrub(black_box(message)))));
}

criterion_group!(benches, benchmark_classify, benchmark_scrub);
criterion_main!(benches);
