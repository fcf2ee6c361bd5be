//! Criterion benchmarks for the prediction path and the artifact codec.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use spam_guard::models::{Classifier, LinearModel, Norm, TextVectorizer, VectorizerArtifact};
use spam_guard::{ArtifactCipher, ArtifactKey, Label, SpamModel};

const WORDS: &[&str] = &[
    "free", "money", "now", "winner", "claim", "prize", "urgent", "offer", "meeting", "agenda",
    "invoice", "project", "lunch", "review", "deadline", "report",
];

fn bench_model() -> SpamModel {
    let mut artifact = VectorizerArtifact::counts(WORDS.iter().copied());
    artifact.idf = Some(vec![1.5; WORDS.len()]);
    artifact.norm = Some(Some(Norm::L2));
    let vectorizer = TextVectorizer::new(artifact).unwrap();

    let coef = (0..WORDS.len())
        .map(|i| if i < 8 { 1.0 } else { -1.0 })
        .collect();
    let classifier = Classifier::Linear(LinearModel {
        classes: vec![Label::Int(0), Label::Int(1)],
        coef: vec![coef],
        intercept: vec![0.0],
    });
    SpamModel::new(vectorizer, classifier)
}

fn emails(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            (0..40)
                .map(|j| WORDS[(i * 7 + j * 3) % WORDS.len()])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn predict_batches(c: &mut Criterion) {
    let model = bench_model();
    let mut group = c.benchmark_group("predict");
    for size in [1usize, 32, 256] {
        let batch = emails(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| model.predict(black_box(batch)).unwrap())
        });
    }
    group.finish();
}

fn codec_roundtrip(c: &mut Criterion) {
    let cipher = ArtifactCipher::new(ArtifactKey::generate());
    let plaintext = vec![0x5a_u8; 1024 * 1024];
    let sealed = cipher.encrypt_bytes(&plaintext).unwrap();

    let mut group = c.benchmark_group("codec_1mib");
    group.throughput(Throughput::Bytes(plaintext.len() as u64));
    group.bench_function("encrypt", |b| b.iter(|| cipher.encrypt_bytes(black_box(&plaintext)).unwrap()));
    group.bench_function("decrypt", |b| b.iter(|| cipher.decrypt_bytes(black_box(&sealed)).unwrap()));
    group.finish();
}

criterion_group!(benches, predict_batches, codec_roundtrip);
criterion_main!(benches);
