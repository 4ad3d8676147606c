use criterion::{black_box, criterion_group, criterion_main, Criterion};
use link_preview::{detect_url, GenericExtractor, HtmlScraper, MetadataExtractor};
use std::collections::HashMap;
use std::time::Duration;

const MOCK_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Test Page</title>
    <meta property="og:title" content="Test Title">
    <meta property="og:description" content="Test Description">
    <meta property="og:image" content="https://example.com/image.jpg">
    <meta property="og:url" content="https://example.com/canonical">
    <link rel="icon" href="https://example.com/favicon.ico">
</head>
<body>
    <h1>Test Content</h1>
</body>
</html>"#;

const MESSAGE: &str = "hey, did you read this one? it's long but worth it \
    https://www.example.com/articles/2024/rust-async?ref=chat#comments \
    let me know what you think";

fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("url_detection");
    group
        .sample_size(100)
        .measurement_time(Duration::from_secs(5));

    group.bench_function("first_url_in_message", |b| {
        b.iter(|| black_box(detect_url(black_box(MESSAGE))))
    });

    group.bench_function("no_url_in_message", |b| {
        b.iter(|| black_box(detect_url(black_box("nothing to see here, just chatting"))))
    });

    group.finish();
}

fn bench_extraction(c: &mut Criterion) {
    let headers = HashMap::from([("content-type".to_string(), "text/html".to_string())]);
    let url = "https://example.com/page";

    let mut group = c.benchmark_group("metadata_extraction");
    group
        .sample_size(50)
        .measurement_time(Duration::from_secs(5));

    group.bench_function("html_scraper", |b| {
        b.iter(|| black_box(HtmlScraper.extract(MOCK_HTML.as_bytes(), &headers, url)))
    });

    group.bench_function("generic_extractor", |b| {
        b.iter(|| black_box(GenericExtractor.extract(MOCK_HTML.as_bytes(), &headers, url)))
    });

    group.finish();
}

criterion_group!(benches, bench_detection, bench_extraction);
criterion_main!(benches);
