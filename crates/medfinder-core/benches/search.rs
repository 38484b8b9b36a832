//! Search performance benchmarks
//!
//! Measures performance of:
//! - Exact keyword lookup
//! - Fuzzy matching under different comparison ceilings
//! - Excerpt generation
//! - Raw Jaro-Winkler comparisons

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use medfinder_core::search::{jaro_winkler, QueryEngine, SearchOptions};
use medfinder_core::{Category, ContentExtractor, ModuleRecord, SearchIndex, ALL_CATEGORIES};

const SAMPLE_PAGES: &[(&str, &str)] = &[
    (
        "Phenylketonurie",
        "<h1>Phenylketonurie</h1><p>Die Phenylketonurie ist eine Störung des Phenylalaninabbaus.</p><ul><li>Phenylalanin</li><li>Tyrosin</li></ul>",
    ),
    (
        "Harnstoffzyklusdefekte",
        "<h1>Hyperammonämie</h1><p>Ammoniak steigt bei Defekten des Harnstoffzyklus rasch an.</p><table><tr><th>Enzym</th><th>Befund</th></tr><tr><td>OTC</td><td>Orotsäure erhöht</td></tr></table>",
    ),
    (
        "MCAD-Mangel",
        "<h2>Betaoxidation</h2><p>Beim MCAD-Mangel ist die mittelkettige Fettsäureoxidation gestört, Carnitin ist erniedrigt.</p>",
    ),
    (
        "Morbus Gaucher",
        "<h1>Lysosomale Speicherkrankheit</h1><p>Glucocerebrosidase ist vermindert, Enzymersatztherapie ist verfügbar.</p>",
    ),
    (
        "Biotinidasemangel",
        "<h1>Biotin</h1><p>Biotinidasemangel wird im Neugeborenenscreening erfasst und mit Biotin behandelt.</p>",
    ),
];

fn build_index(copies: usize) -> SearchIndex {
    let extractor = ContentExtractor::new();
    let mut records = Vec::new();
    for n in 0..copies {
        for (i, (title, html)) in SAMPLE_PAGES.iter().enumerate() {
            let category: Category = ALL_CATEGORIES[(n + i) % ALL_CATEGORIES.len()];
            let path = format!("{}/{}_{}.html", category.folder(), i, n);
            let module = ModuleRecord::new(&path, category, title);
            records.push(extractor.extract_html(html, &module).unwrap());
        }
    }
    SearchIndex::from_records(records)
}

fn bench_exact_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("exact_search");
    let index = build_index(40);
    let options = SearchOptions {
        fuzzy_enabled: false,
        include_excerpts: false,
        ..SearchOptions::default()
    };

    let queries = vec![
        ("single_word", "carnitin"),
        ("two_words", "biotin neugeborenenscreening"),
        ("missing", "zellweger"),
    ];

    for (name, query) in queries {
        group.bench_with_input(BenchmarkId::from_parameter(name), &query, |b, query| {
            let engine = QueryEngine::new(&index);
            b.iter(|| engine.search(black_box(query), black_box(&options)));
        });
    }

    group.finish();
}

fn bench_fuzzy_ceiling(c: &mut Criterion) {
    let mut group = c.benchmark_group("fuzzy_ceiling");
    let index = build_index(40);

    for checks in [100, 1000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(checks), &checks, |b, &checks| {
            let options = SearchOptions {
                max_fuzzy_checks: checks,
                include_excerpts: false,
                ..SearchOptions::default()
            };
            let engine = QueryEngine::new(&index);
            b.iter(|| engine.search(black_box("karnitin"), black_box(&options)));
        });
    }

    group.finish();
}

fn bench_excerpts(c: &mut Criterion) {
    let index = build_index(40);
    let engine = QueryEngine::new(&index);

    c.bench_function("search_with_excerpts", |b| {
        let options = SearchOptions::default();
        b.iter(|| engine.search(black_box("phenylalanin"), black_box(&options)));
    });

    c.bench_function("search_without_excerpts", |b| {
        let options = SearchOptions {
            include_excerpts: false,
            ..SearchOptions::default()
        };
        b.iter(|| engine.search(black_box("phenylalanin"), black_box(&options)));
    });
}

fn bench_jaro_winkler(c: &mut Criterion) {
    c.bench_function("jaro_winkler", |b| {
        b.iter(|| jaro_winkler(black_box("glucocerebrosidase"), black_box("glukozerebrosidase")))
    });
}

criterion_group!(
    benches,
    bench_exact_search,
    bench_fuzzy_ceiling,
    bench_excerpts,
    bench_jaro_winkler
);
criterion_main!(benches);
