//! base62 编码与 UA 分类基准测试

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use linkpulse::analytics::classifier::classify;
use linkpulse::utils::base62;
use std::hint::black_box;

// ============== base62 ==============

fn bench_base62(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/base62");

    for n in [0u64, 61, 1_780_000_000_000, u64::MAX] {
        group.bench_with_input(BenchmarkId::new("encode", n), &n, |b, &n| {
            b.iter(|| base62::encode(black_box(n)));
        });

        let code = base62::encode(n);
        group.bench_with_input(BenchmarkId::new("decode", &code), &code, |b, code| {
            b.iter(|| {
                assert_eq!(base62::decode(black_box(code)).unwrap(), n);
            });
        });
    }

    group.finish();
}

// ============== classifier ==============

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("analytics/classify");

    let agents = [
        (
            "chrome_windows",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
        ),
        (
            "edge_windows",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36 Edg/120.0",
        ),
        (
            "safari_iphone",
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
        ),
        (
            "googlebot",
            "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
        ),
        ("empty", ""),
    ];

    for (name, ua) in agents {
        group.bench_function(name, |b| {
            b.iter(|| classify(black_box(Some(ua))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_base62, bench_classify);
criterion_main!(benches);
