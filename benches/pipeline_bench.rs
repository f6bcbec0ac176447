use criterion::{criterion_group, criterion_main, Criterion};
use jobsnap::{PageDocument, SiteProfile};

// A posting-sized page: lots of nested markup around one container.
fn synthetic_page() -> String {
    let mut body = String::new();
    for i in 0..200 {
        body.push_str(&format!(
            "<div class=\"row-{i}\"><div><span>item {i}</span></div><div><div></div></div><script>t({i})</script></div>"
        ));
    }
    format!(
        "<html><head><title>Bench</title><style>p{{}}</style></head><body>\
         <div class=\"jobsearch-ViewJobLayout--standalone\"><form action=\"/jobs\"></form>{body}</div></body></html>"
    )
}

fn bench_extract(c: &mut Criterion) {
    let markup = synthetic_page();
    let profile = SiteProfile::default();

    c.bench_function("extract_job_posting", |b| {
        b.iter(|| {
            let doc = PageDocument::parse(&markup);
            let _ = jobsnap::extract::extract_job_posting(doc, "https://example.com/job", &profile).unwrap();
        })
    });
}

fn bench_pretty_print(c: &mut Criterion) {
    let doc = PageDocument::parse(&synthetic_page());

    c.bench_function("to_pretty_html", |b| {
        b.iter(|| {
            let _ = jobsnap::writer::to_pretty_html(&doc);
        })
    });
}

criterion_group!(benches, bench_extract, bench_pretty_print);
criterion_main!(benches);
