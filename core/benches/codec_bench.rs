use criterion::{criterion_group, criterion_main, Criterion};
use wikisearch_core::codec::PostingList;

fn bench_codec(c: &mut Criterion) {
    let values: Vec<u64> = (1..10_000u64).map(|i| i * 7).collect();

    c.bench_function("encode_10k_postings", |b| {
        b.iter(|| {
            let mut list = PostingList::new();
            for &v in &values {
                list.append(v).unwrap();
            }
            list
        })
    });

    let mut list = PostingList::new();
    for &v in &values {
        list.append(v).unwrap();
    }
    c.bench_function("decode_10k_postings", |b| b.iter(|| list.decode().unwrap()));
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
