use criterion::{Criterion, black_box, criterion_group, criterion_main};
use voicegate_voiceprint::{Fbank, FbankConfig, StatsModel, VoiceprintModel, cosine_similarity};

fn make_sine_pcm(freq_hz: f64, n_samples: usize, sample_rate: usize) -> Vec<i16> {
    (0..n_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (16000.0 * (freq_hz * 2.0 * std::f64::consts::PI * t).sin()) as i16
        })
        .collect()
}

fn bench_fbank_1s(c: &mut Criterion) {
    let fbank = Fbank::new(FbankConfig::default()).unwrap();
    let pcm = make_sine_pcm(440.0, 16000, 16000);

    c.bench_function("voiceprint_fbank_1s", |b| {
        b.iter(|| {
            let _ = black_box(fbank.compute(black_box(&pcm)));
        });
    });
}

fn bench_stats_extract_3s(c: &mut Criterion) {
    let model = StatsModel::default();
    let pcm = make_sine_pcm(220.0, 48000, 16000);

    c.bench_function("voiceprint_stats_extract_3s", |b| {
        b.iter(|| {
            let _ = black_box(model.extract(black_box(&pcm)));
        });
    });
}

fn bench_cosine(c: &mut Criterion) {
    let a: Vec<f32> = (0..512).map(|i| i as f32 * 0.01).collect();
    let b: Vec<f32> = (0..512).map(|i| (512 - i) as f32 * 0.01).collect();

    c.bench_function("voiceprint_cosine_512d", |bench| {
        bench.iter(|| {
            let _ = black_box(cosine_similarity(black_box(&a), black_box(&b)));
        });
    });
}

criterion_group!(benches, bench_fbank_1s, bench_stats_extract_3s, bench_cosine);
criterion_main!(benches);
