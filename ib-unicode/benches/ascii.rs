use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use ib_unicode::{
    ascii::{find_byte, find_byte2, find_byte3},
    utf8,
};

pub fn criterion_benchmark(c: &mut Criterion) {
    let hay = b"12345678901234567890a";

    assert!(find_byte(hay, b'a').is_some());
    c.bench_function("find_byte", |b| b.iter(|| find_byte(black_box(hay), b'a')));

    assert!(find_byte2(hay, b'a', b'A').is_some());
    c.bench_function("find_byte2", |b| {
        b.iter(|| find_byte2(black_box(hay), b'a', b'A'))
    });

    assert!(find_byte3(hay, b'a', b'A', b'z').is_some());
    c.bench_function("find_byte3", |b| {
        b.iter(|| find_byte3(black_box(hay), b'a', b'A', b'z'))
    });

    let s = "拼音搜索Everything".as_bytes();
    c.bench_function("utf8_decode_all", |b| {
        b.iter(|| {
            let mut at = 0;
            while at < s.len() {
                at = utf8::next_char_boundary(black_box(s), at);
            }
            at
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
