use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use orgmode_syntax::{edit, parse};

fn generate_org_content(sections: usize) -> String {
    let base = "\
* TODO Section with *bold* and /italic/ text
:PROPERTIES:
:ID: abc
:END:
Paragraph with a [[https://example.com][link]] and ~code~.
- [ ] first item
  - nested item
- [X] second item
** Subsection
#+begin_src rust
fn example() {}
#+end_src
";
    base.repeat(sections)
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");
    group.sample_size(10);

    for sections in [10, 100] {
        let content = generate_org_content(sections);
        group.bench_with_input(BenchmarkId::new("full", sections), &content, |b, content| {
            b.iter(|| parse(std::hint::black_box(content)));
        });
    }

    group.finish();
}

fn bench_incremental(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental");
    group.sample_size(10);

    let content = generate_org_content(100);
    let tree = parse(&content);
    let at = content.len() / 2;
    let at = content[at..].find('\n').map_or(at, |i| at + i + 1);
    let edited = format!("{}inserted *line*\n{}", &content[..at], &content[at..]);
    let new_end = at + "inserted *line*\n".len();

    group.bench_function("insert_line", |b| {
        b.iter(|| {
            let result = edit(&tree, std::hint::black_box(at), at, new_end, &edited);
            std::hint::black_box(result)
        });
    });

    group.bench_function("full_reparse", |b| {
        b.iter(|| parse(std::hint::black_box(&edited)));
    });

    group.finish();
}

criterion_group!(benches, bench_parsing, bench_incremental);
criterion_main!(benches);
