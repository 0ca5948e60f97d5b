use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ed25519_dalek::SigningKey;
use icf_capsule::{AuthorityId, ParseOpts, PublicKey};
use icf_core::{BadgeType, CapsuleWriter, Cycle, Subject, Tag};

const AUTHORITY: AuthorityId = AuthorityId([1, 2, 3, 4, 5, 6, 7, 8]);

// ---------------------------------------------------------------------------
// Fixtures: minimal, typical, maximal capsules
// ---------------------------------------------------------------------------

fn make_minimal() -> CapsuleWriter {
    let mut w = CapsuleWriter::new();
    w.url("abc").unwrap();
    w
}

fn make_typical() -> CapsuleWriter {
    let mut w = CapsuleWriter::new();
    w.badge_type(BadgeType::Resource)
        .unwrap()
        .url("https://badges.example.org/resource/2024/fractions")
        .unwrap()
        .language("fr")
        .unwrap()
        .title("Fractions and decimals")
        .unwrap()
        .tag(Tag {
            cycle: Cycle::Cycle3,
            subject: Subject::Math,
            sub: 2,
        })
        .unwrap()
        .retention(30)
        .unwrap()
        .expires(1_900_000_000)
        .unwrap()
        .payload(br#"{"level":2,"skills":["compare","order"],"minutes":45}"#)
        .unwrap();
    w
}

fn make_maximal() -> CapsuleWriter {
    let url = format!("https://{}", "u".repeat(192));
    let mut w = CapsuleWriter::new();
    w.badge_type(BadgeType::Admin)
        .unwrap()
        .url(&url)
        .unwrap()
        .language("en")
        .unwrap()
        .title(&"t".repeat(64))
        .unwrap()
        .tag(Tag::from_bytes([4, 7, 255]))
        .unwrap()
        .retention(255)
        .unwrap()
        .expires(u32::MAX)
        .unwrap()
        .payload(&[b'x'; 255])
        .unwrap();
    w
}

fn fixtures() -> [(&'static str, CapsuleWriter); 3] {
    [
        ("minimal", make_minimal()),
        ("typical", make_typical()),
        ("maximal", make_maximal()),
    ]
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_permissive(c: &mut Criterion) {
    let mut group = c.benchmark_group("permissive");
    for (name, w) in fixtures() {
        let mut w = w;
        w.seal_hash();
        w.end();
        let bytes = w.finish();
        group.bench_with_input(BenchmarkId::new("parse", name), &bytes, |b, v| {
            b.iter(|| icf_core::parse(black_box(v)).unwrap())
        });
    }
    group.finish();
}

fn bench_strict(c: &mut Criterion) {
    let mut group = c.benchmark_group("strict");
    let sk = SigningKey::from_bytes(&[42u8; 32]);
    let pk = sk.verifying_key().to_bytes();
    let lookup = move |_: &AuthorityId| -> Option<PublicKey> { Some(pk) };
    let opts = ParseOpts::strict(&lookup);

    for (name, w) in fixtures() {
        let bytes = icf_capsule::sign(w, &sk, AUTHORITY);
        group.bench_with_input(BenchmarkId::new("ed25519", name), &bytes, |b, v| {
            b.iter(|| icf_capsule::parse(black_box(v), &opts).unwrap())
        });
    }
    group.finish();
}

fn bench_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash");
    for (name, w) in fixtures() {
        let bytes = w.finish();
        group.bench_with_input(BenchmarkId::new("sha256", name), &bytes, |b, v| {
            b.iter(|| icf_core::hash_bytes(black_box(v)))
        });
    }
    group.finish();
}

fn bench_size(c: &mut Criterion) {
    // Not a timing benchmark: prints sealed sizes.
    let sk = SigningKey::from_bytes(&[42u8; 32]);
    println!("\n=== Sealed capsule sizes (bytes) ===");
    for (name, w) in fixtures() {
        let unsigned = w.as_bytes().len();
        let sealed = icf_capsule::sign(w, &sk, AUTHORITY).len();
        println!("{name:<8} {unsigned:>6} {sealed:>6}");
    }
    c.bench_function("size_report", |b| b.iter(|| 1 + 1));
}

criterion_group!(benches, bench_permissive, bench_strict, bench_hash, bench_size);
criterion_main!(benches);
