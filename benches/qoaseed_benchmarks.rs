use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qoaseed::{choose_parameters, encode, FileParameters};
use rand::SeedableRng;
use rand_pcg::Pcg64;

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = Pcg64::seed_from_u64(0);

    let mono = FileParameters::new(1000, 1, 44100).unwrap();
    c.bench_function("encode_mono_single_frame", |b| {
        b.iter(|| {
            let encoded = encode(black_box(&mono), &mut rng).unwrap();
            black_box(encoded.len());
        })
    });

    // 31 channels is the widest layout that still fits a frame.
    let wide = FileParameters::new(3 * 5120, 31, 48000).unwrap();
    c.bench_function("encode_31_channels_three_frames", |b| {
        b.iter(|| {
            let encoded = encode(black_box(&wide), &mut rng).unwrap();
            black_box(encoded.len());
        })
    });

    c.bench_function("choose_and_encode", |b| {
        b.iter(|| {
            let params = choose_parameters(&mut rng);
            let encoded = encode(&params, &mut rng).unwrap();
            black_box(encoded.len());
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
