use criterion::{black_box, criterion_group, criterion_main, Criterion};
use repolens::assistant::intent::IntentMatcher;
use repolens::docs;
use repolens::locator;
use repolens::repo::{FileEntry, Owner, RepoMetadata, RepositoryContext};
use std::collections::BTreeMap;

fn synthetic_context(file_count: usize) -> RepositoryContext {
    let files = (0..file_count)
        .map(|i| {
            let path = format!("src/feature_{:03}/file_{:05}.js", i % 120, i);
            let locator = format!("https://api.github.com/repos/bench/synthetic/git/blobs/{i:040x}");
            FileEntry::new(path, locator)
        })
        .collect();

    let mut languages = BTreeMap::new();
    languages.insert("JavaScript".to_string(), 812_000);
    languages.insert("TypeScript".to_string(), 120_500);
    languages.insert("CSS".to_string(), 9_800);

    let metadata = RepoMetadata {
        name: "synthetic".to_string(),
        description: Some("Synthetic repository for benchmarks".to_string()),
        owner: Owner {
            login: "bench".to_string(),
            profile_url: "https://github.com/bench".to_string(),
        },
        star_count: 12_345,
        fork_count: 678,
        license: Some("MIT License".to_string()),
        default_branch: "main".to_string(),
    };
    RepositoryContext::new(metadata, files, languages)
}

fn bench_classify(c: &mut Criterion) {
    let matcher = IntentMatcher::new();
    let messages = [
        "hello",
        "what is this repo about?",
        "find src/feature_040/file_04000.js",
        "which dependencies does it use",
        "what does `parseArgs` do",
        "who is the owner",
        "tell me something unrelated to anything",
    ];

    c.bench_function("classify_mixed_messages", |b| {
        b.iter(|| {
            for message in &messages {
                black_box(matcher.classify(black_box(message)));
            }
        });
    });
}

fn bench_locate(c: &mut Criterion) {
    let ctx = synthetic_context(10_000);

    c.bench_function("locate_exact_path", |b| {
        b.iter(|| black_box(locator::find(ctx.files(), black_box("src/feature_040/file_09040.js"))));
    });
    c.bench_function("locate_suffix", |b| {
        b.iter(|| black_box(locator::find(ctx.files(), black_box("file_09040.js"))));
    });
    c.bench_function("locate_miss", |b| {
        b.iter(|| black_box(locator::find(ctx.files(), black_box("does-not-exist.rs"))));
    });
}

fn bench_readme(c: &mut Criterion) {
    let ctx = synthetic_context(4_000);

    c.bench_function("generate_readme", |b| {
        b.iter(|| black_box(docs::generate_readme(&ctx)));
    });
}

criterion_group!(perf_assistant, bench_classify, bench_locate, bench_readme);
criterion_main!(perf_assistant);
