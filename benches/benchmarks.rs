//! Benchmark suite for outline-engine
//!
//! Run with: `cargo bench --bench benchmarks`
//! View report: `open target/criterion/report/index.html`

use std::sync::{Arc, RwLock};

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use outline_engine::active::ActiveEntryTracker;
use outline_engine::documents::DocumentHandle;
use outline_engine::generators::latex::LatexGenerator;
use outline_engine::generators::markdown::MarkdownGenerator;
use outline_engine::generators::{GeneratorOptions, OutlineGenerator, SectionNumbering};
use outline_engine::heading::Heading;
use outline_engine::render::{OutlineModel, default_item_renderer};

// =============================================================================
// Test Data Generation
// =============================================================================

fn generate_markdown(section_count: usize) -> String {
    let mut content = String::from("# Benchmark Document\n\nIntroductory paragraph.\n\n");

    for i in 0..section_count {
        match i % 4 {
            0 => content.push_str(&format!("## Section {i}\n\nBody text for the section.\n\n")),
            1 => content.push_str(&format!(
                "### Subsection {i}\n\nMore prose, spanning a couple of\nlines of text.\n\n"
            )),
            2 => content.push_str(&format!(
                "#### Detail {i}\n\n```rust\n# not a heading inside a fence\nfn demo() {{}}\n```\n\n"
            )),
            _ => content.push_str(&format!("## Usage\n\nRepeated title number {i}.\n\n")),
        }
    }

    content
}

fn generate_latex(section_count: usize) -> String {
    let mut content = String::from(
        "\\documentclass{book}\n% preamble comment\n\\begin{document}\n\n\\part{Benchmarks}\n\n",
    );

    for i in 0..section_count {
        match i % 4 {
            0 => content.push_str(&format!(
                "\\chapter{{Chapter {i}}}\nSome body text. % trailing comment\n\n"
            )),
            1 => content.push_str(&format!(
                "\\section{{Results for $n = {i}$}}\nInline math in the title above.\n\n"
            )),
            2 => content.push_str(&format!(
                "\\subsection[Short {i}]{{The Long Form of Subsection {i}}}\nProse.\n\n"
            )),
            _ => content.push_str(&format!("\\section*{{Aside {i}}}\nUnnumbered text.\n\n")),
        }
    }

    content.push_str("\\end{document}\n");
    content
}

fn text_document(label: &str, content: String) -> DocumentHandle {
    DocumentHandle::with_payload(label, Arc::new(RwLock::new(content)))
}

// =============================================================================
// Extraction Benchmarks
// =============================================================================

fn bench_generators(c: &mut Criterion) {
    let mut group = c.benchmark_group("generators");

    for section_count in [10, 100, 500] {
        let markdown_doc = text_document("bench.md", generate_markdown(section_count));
        let markdown = MarkdownGenerator::new();
        let options = markdown.options();
        group.bench_with_input(
            BenchmarkId::new("markdown", section_count),
            &markdown_doc,
            |b, doc| {
                b.iter(|| markdown.generate(black_box(doc), &options));
            },
        );

        let numbered = MarkdownGenerator::with_options(GeneratorOptions {
            numbered: true,
            ..GeneratorOptions::default()
        });
        let numbered_options = numbered.options();
        group.bench_with_input(
            BenchmarkId::new("markdown_numbered", section_count),
            &markdown_doc,
            |b, doc| {
                b.iter(|| numbered.generate(black_box(doc), &numbered_options));
            },
        );

        let latex_doc = text_document("bench.tex", generate_latex(section_count));
        let latex = LatexGenerator::new();
        let latex_options = latex.options();
        group.bench_with_input(
            BenchmarkId::new("latex", section_count),
            &latex_doc,
            |b, doc| {
                b.iter(|| latex.generate(black_box(doc), &latex_options));
            },
        );
    }

    group.finish();
}

// =============================================================================
// Numbering Benchmarks
// =============================================================================

fn bench_section_numbering(c: &mut Criterion) {
    let mut group = c.benchmark_group("section_numbering");

    let levels: Vec<u8> = (0..1000).map(|i| (i % 5) as u8 + 1).collect();

    group.bench_function("advance_1000", |b| {
        b.iter(|| {
            let mut numbering = SectionNumbering::new();
            for &level in &levels {
                black_box(numbering.advance(level));
            }
        });
    });

    group.finish();
}

// =============================================================================
// Render Benchmarks
// =============================================================================

fn bench_rendered_lines(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendered_lines");

    for entry_count in [100, 1000] {
        let headings: Vec<Heading> = (0..entry_count)
            .map(|i| Heading::new(format!("Entry {i}"), (i % 6) as u8 + 1))
            .collect();
        let model = OutlineModel {
            title: String::from("bench.md"),
            headings: Arc::new(headings),
            active: Arc::new(ActiveEntryTracker::new()),
            renderer: default_item_renderer(),
            toolbar: None,
        };

        group.bench_with_input(
            BenchmarkId::new("default_renderer", entry_count),
            &model,
            |b, model| {
                b.iter(|| black_box(model.rendered_lines()));
            },
        );
    }

    group.finish();
}

// =============================================================================
// Criterion Configuration
// =============================================================================

criterion_group!(
    benches,
    bench_generators,
    bench_section_numbering,
    bench_rendered_lines,
);

criterion_main!(benches);
