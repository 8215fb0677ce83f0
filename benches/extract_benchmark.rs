use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use portal_attendance::extract::{extract_attendance, extract_cumulative, extract_history};
use portal_attendance::html::Document;
use portal_attendance::request::Request;

fn attendance_page(subjects: usize) -> String {
    let mut html = String::from(
        "<html><body><h1>Attendance</h1><table><tr><th>Subject</th><th>Code</th><th>Total</th><th>Attended</th><th>%</th></tr>",
    );
    for i in 0..subjects {
        html.push_str(&format!(
            "<tr><td>Subject {}</td><td>CS-{}</td><td>40</td><td>{}</td><td>{:.2}</td></tr>",
            i,
            400 + i,
            i % 40,
            (i % 40) as f64 * 2.5
        ));
    }
    html.push_str("</table></body></html>");
    html
}

fn history_page(lectures: usize) -> String {
    let mut html = format!(
        r#"<html><body><span id="ctl00_ContentPlaceHolder1_lbltotperiod">Total Period : {}</span>
        <span id="ctl00_ContentPlaceHolder1_lbltotaln">Not Applicable : 0</span><table>"#,
        lectures
    );
    for i in 0..24 {
        html.push_str(&format!("<tr><td>banner {}</td></tr>", i));
    }
    for i in 0..lectures {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{:02} Jan 2024</td><td>L</td><td>Subject {}</td><td>{}</td></tr>",
            i + 1,
            i / 6 % 28 + 1,
            i % 6,
            if i % 4 == 0 { "A" } else { "P" }
        ));
    }
    html.push_str("</table></body></html>");
    html
}

fn attendance_extract_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_attendance");

    for subjects in [10, 50, 200].iter() {
        let html = attendance_page(*subjects);
        group.bench_with_input(BenchmarkId::from_parameter(subjects), &html, |b, html| {
            b.iter(|| {
                let doc = Document::parse(black_box(html));
                black_box(extract_attendance(&doc));
            });
        });
    }

    group.finish();
}

fn history_extract_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_history");
    let today = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap_or_default();

    for lectures in [30, 300, 1000].iter() {
        let html = history_page(*lectures);
        let doc = Document::parse(&html);
        group.bench_with_input(BenchmarkId::new("forward", lectures), &doc, |b, doc| {
            b.iter(|| black_box(extract_history(black_box(doc), today)));
        });
        group.bench_with_input(BenchmarkId::new("cumulative", lectures), &doc, |b, doc| {
            b.iter(|| black_box(extract_cumulative(black_box(doc), today)));
        });
    }

    group.finish();
}

fn request_parse_benchmark(c: &mut Criterion) {
    let get = b"GET /dateWise?username=0101CS211001&password=p%40ss&institution_type=university HTTP/1.1\r\n\
                Host: localhost:8000\r\n\
                User-Agent: Mozilla/5.0 (Windows NT 10.0; Win64; x64)\r\n\
                Accept-Encoding: gzip, deflate, br\r\n\
                \r\n";
    let body = br#"{"college_id":"0101CS211001","password":"secret","institution_type":"college"}"#;
    let mut post = format!(
        "POST /login-and-fetch-attendance HTTP/1.1\r\nHost: localhost:8000\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    post.extend_from_slice(body);

    c.bench_function("request_parse_query", |b| {
        b.iter(|| Request::try_from(black_box(get), 0));
    });
    c.bench_function("request_parse_json_body", |b| {
        b.iter(|| Request::try_from(black_box(&post), 0));
    });
}

criterion_group!(
    benches,
    attendance_extract_benchmark,
    history_extract_benchmark,
    request_parse_benchmark
);
criterion_main!(benches);
