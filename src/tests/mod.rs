use std::io::Write;
use std::sync::Arc;

use serde_json::json;
use tempfile::{NamedTempFile, TempDir};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::image::{self, ImageAttempt, PageContext, PLACEHOLDER};
use crate::output::{self, OutputFormat};
use crate::pagination::{page_range, PageIndicator};
use crate::query::{self, QueryRequest, SortDir, SortField};
use crate::record::Record;
use crate::store::{RecordSource, RecordStore};

fn record(title: &str, price: f64) -> Record {
    Record {
        title: Some(title.to_string()),
        price: Some(price),
        ..Default::default()
    }
}

fn catalog() -> Vec<Record> {
    vec![
        record("Blue Shirt", 19.99),
        record("Red Hat", 5.0),
        Record {
            title: Some("Green shirt".to_string()),
            ..Default::default()
        },
        record("Socks", 2.5),
        record("SHIRT dress", 49.0),
        Record::default(),
        record("Jacket", 89.9),
    ]
}

fn records_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn file_source(file: &NamedTempFile) -> RecordSource {
    RecordSource::FilePath(file.path().display().to_string())
}

/// Serves a single HTTP response on a local port and returns its URL.
async fn serve_once(status_line: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });
    format!("http://{addr}/products")
}

#[test]
fn empty_search_counts_every_record() {
    let records = catalog();
    let out = query::query(&records, &QueryRequest::default());
    assert_eq!(out.total, records.len());
    assert_eq!(out.data.len(), records.len());
}

#[test]
fn search_matches_titles_case_insensitively() {
    let records = catalog();
    let req = QueryRequest {
        search: "ShIrT".to_string(),
        limit: 2,
        ..Default::default()
    };
    let out = query::query(&records, &req);
    assert_eq!(out.total, 3);
    assert_eq!(out.data.len(), 2);
    assert!(out
        .data
        .iter()
        .all(|r| r.title_or_empty().to_lowercase().contains("shirt")));
}

#[test]
fn price_sort_is_non_decreasing_with_missing_as_zero() {
    let records = catalog();
    let req = QueryRequest {
        limit: 100,
        sort_field: Some(SortField::Price),
        ..Default::default()
    };
    let prices: Vec<f64> = query::query(&records, &req)
        .data
        .iter()
        .map(Record::price_or_zero)
        .collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(prices[0], 0.0);

    let req = QueryRequest {
        sort_dir: SortDir::Desc,
        ..req
    };
    let first = &query::query(&records, &req).data[0];
    assert_eq!(first.title.as_deref(), Some("Jacket"));
}

#[test]
fn pages_concatenate_to_the_sorted_sequence() {
    let records = catalog();
    let full = query::query(
        &records,
        &QueryRequest {
            limit: 100,
            sort_field: Some(SortField::Title),
            ..Default::default()
        },
    );

    let limit = 3;
    let pages = query::total_pages(full.total, limit);
    let mut joined = Vec::new();
    for page in 1..=pages {
        let out = query::query(
            &records,
            &QueryRequest {
                page,
                limit,
                sort_field: Some(SortField::Title),
                ..Default::default()
            },
        );
        assert_eq!(out.total, full.total);
        joined.extend(out.data);
    }
    assert_eq!(joined, full.data);

    let past_end = query::query(
        &records,
        &QueryRequest {
            page: pages + 1,
            limit,
            ..Default::default()
        },
    );
    assert!(past_end.data.is_empty());
    assert_eq!(past_end.total, records.len());
}

#[test]
fn page_range_examples() {
    use PageIndicator::{Ellipsis, Page};

    assert_eq!(
        page_range(1, 20, 7),
        vec![Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(20)]
    );
    assert_eq!(
        page_range(10, 10, 7),
        vec![Page(1), Ellipsis, Page(6), Page(7), Page(8), Page(9), Page(10)]
    );
    assert_eq!(
        page_range(3, 5, 7),
        (1..=5).map(Page).collect::<Vec<_>>()
    );
}

#[test]
fn image_resolution_examples() {
    let ctx = PageContext::default();
    let bare = Record {
        image: Some("example.com/a.jpg".to_string()),
        ..Default::default()
    };
    assert_eq!(
        image::resolve_image_url(&bare, &ctx),
        "https://example.com/a.jpg"
    );
    assert_eq!(image::resolve_image_url(&Record::default(), &ctx), PLACEHOLDER);

    let ctx = PageContext::from_origin("http://shop.test").unwrap();
    let relative = Record {
        thumbnail: Some("//cdn.example.com/x.png".to_string()),
        ..Default::default()
    };
    assert_eq!(
        image::resolve_image_url(&relative, &ctx),
        "http://cdn.example.com/x.png"
    );
}

#[test]
fn image_attempt_walks_the_fallback_chain() {
    let mut attempt = ImageAttempt::new("http://x/y.jpg");
    assert_eq!(attempt.fail(), Some("https://x/y.jpg"));
    assert!(attempt
        .fail()
        .is_some_and(|url| url.contains("images.weserv.nl")));
    assert_eq!(attempt.fail(), Some(PLACEHOLDER));
    assert!(attempt.is_exhausted());
    assert_eq!(attempt.fail(), None);
    assert_eq!(attempt.attempts(), 3);
}

#[test]
fn rendered_page_lists_rows_and_pager() {
    let records = catalog();
    let req = QueryRequest {
        page: 2,
        limit: 3,
        ..Default::default()
    };
    let out = query::query(&records, &req);
    let page = output::build_page(&out, &req, &PageContext::default(), 7);

    assert_eq!(page.rows.len(), 3);
    assert_eq!(page.rows[0].index, 4);
    assert_eq!(page.info, "3 / 7 products (page 2)");
    assert_eq!(page.total_pages, 3);

    let json: serde_json::Value =
        serde_json::from_slice(&output::render(&page, OutputFormat::Json)).unwrap();
    assert_eq!(json["total"], json!(7));
    assert_eq!(json["pages"]["indicators"], json!([1, 2, 3]));

    let text = String::from_utf8(output::render(&page, OutputFormat::Text)).unwrap();
    assert!(text.contains("Socks"));
    assert!(text.contains("[2]"));
}

#[tokio::test]
async fn store_reads_records_file() {
    let payload = json!({ "products": [{ "title": "Lamp", "price": "12.5" }] });
    let file = records_file(&payload.to_string());
    let store = RecordStore::new(file_source(&file));

    let out = store.query(&QueryRequest::default()).await;
    assert_eq!(out.total, 1);
    assert_eq!(out.data[0].price, Some(12.5));
}

#[tokio::test]
async fn queries_share_one_snapshot_until_reload() {
    let file = records_file(&serde_json::to_string(&catalog()).unwrap());
    let store = Arc::new(RecordStore::new(file_source(&file)));

    let search = QueryRequest {
        search: "shirt".to_string(),
        ..Default::default()
    };
    let all = QueryRequest::default();
    let (a, b) = tokio::join!(store.query(&search), store.query(&all));
    assert_eq!(a.total, 3);
    assert_eq!(b.total, catalog().len());

    // Later edits to the file are not picked up until reload.
    std::fs::write(file.path(), "[]").unwrap();
    assert_eq!(store.query(&all).await.total, 7);
    assert_eq!(store.reload().await, 0);
    assert_eq!(store.query(&all).await.total, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_first_queries_fetch_once() {
    let body = json!([{ "title": "Kettle" }, { "title": "Cup" }]).to_string();
    // The stub answers a single connection; a second fetch would fail and
    // leave that query empty.
    let url = serve_once("200 OK", body).await;
    let store = Arc::new(RecordStore::new(RecordSource::Url(url)));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.query(&QueryRequest::default()).await.total })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 2);
    }
    assert_eq!(store.record_count().await, 2);
}

#[tokio::test]
async fn missing_file_yields_empty_store_until_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("products.json");
    let store = RecordStore::new(RecordSource::FilePath(path.display().to_string()));

    let out = store.query(&QueryRequest::default()).await;
    assert_eq!(out.total, 0);
    assert!(out.data.is_empty());
    assert!(store.is_loaded().await);

    std::fs::write(&path, r#"[{"title":"Mug"}]"#).unwrap();
    assert_eq!(store.reload().await, 1);
    assert_eq!(store.record_count().await, 1);
}

#[tokio::test]
async fn store_fetches_records_over_http() {
    let body = json!([{ "title": "Kettle", "price": 30 }, { "title": "Cup", "price": 4 }]).to_string();
    let url = serve_once("200 OK", body).await;
    let store = RecordStore::new(RecordSource::Url(url));

    let out = store
        .query(&QueryRequest {
            sort_field: Some(SortField::Price),
            ..Default::default()
        })
        .await;
    assert_eq!(out.total, 2);
    assert_eq!(out.data[0].title.as_deref(), Some("Cup"));
}

#[tokio::test]
async fn http_error_status_yields_empty_store() {
    let url = serve_once("500 Internal Server Error", "{}".to_string()).await;
    let store = RecordStore::new(RecordSource::Url(url));
    let out = store.query(&QueryRequest::default()).await;
    assert_eq!(out.total, 0);
}
