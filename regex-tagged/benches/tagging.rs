use criterion::{criterion_group, criterion_main, Criterion};

/// Tagged index against the per-regex loop it replaces, on a small
/// synthetic pattern set. The gap widens with the pattern count: the
/// loop is linear in it, the scan is not.
fn bench_tagging(c: &mut Criterion) {
    let patterns = [
        "Googlebot",
        "AdsBot-Google(-Mobile)?",
        "[Ss]lurp",
        "bingbot",
        r"Google.*snippet",
        r"\d+bot",
    ];
    let index = regex_tagged::Builder::new()
        .push_all(patterns)
        .unwrap()
        .build()
        .unwrap();
    let regexes = patterns
        .iter()
        .map(|p| regex::Regex::new(p).unwrap())
        .collect::<Vec<_>>();

    let hit = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
    let miss = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/56.0.2924.87 Safari/537.36";

    c.bench_function("tagged is_match - hit", |b| b.iter(|| index.is_match(hit)));
    c.bench_function("tagged is_match - miss", |b| b.iter(|| index.is_match(miss)));
    c.bench_function("tagged matching - hit", |b| b.iter(|| index.matching(hit)));

    c.bench_function("regex loop - hit", |b| {
        b.iter(|| regexes.iter().any(|r| r.is_match(hit)))
    });
    c.bench_function("regex loop - miss", |b| {
        b.iter(|| regexes.iter().any(|r| r.is_match(miss)))
    });
}

criterion_group!(benches, bench_tagging);
criterion_main!(benches);
