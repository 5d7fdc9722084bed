pub mod report;

use itertools::Itertools;
use serde::Serialize;

use crate::image::{self, PageContext};
use crate::pagination::{PageControls, PageIndicator};
use crate::query::{self, QueryRequest, QueryResult};
use crate::record::Record;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListingRow {
    /// 1-based position across all pages.
    pub index: usize,
    pub image_url: String,
    /// URLs to try, in order, when `image_url` fails to load.
    pub image_fallbacks: Vec<String>,
    pub alt: String,
    pub title: String,
    pub price: String,
    pub slug: String,
}

/// One rendered result page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListingPage {
    pub rows: Vec<ListingRow>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub info: String,
    pub pages: PageControls,
}

pub fn format_price(record: &Record) -> String {
    // Adding 0.0 turns -0.0 into 0.0.
    format!("${:.2}", record.price_or_zero() + 0.0)
}

pub fn rows_info(shown: usize, total: usize, page: usize) -> String {
    format!("{shown} / {total} products (page {page})")
}

pub fn build_rows(result: &QueryResult, req: &QueryRequest, ctx: &PageContext) -> Vec<ListingRow> {
    let offset = req.offset();
    result
        .data
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let image_url = image::resolve_image_url(record, ctx);
            ListingRow {
                index: offset.saturating_add(idx + 1),
                image_fallbacks: image::fallback_chain(&image_url),
                image_url,
                alt: image::alt_text(record).to_string(),
                title: record.title_or_empty().to_string(),
                price: format_price(record),
                slug: record.slug_or_empty().to_string(),
            }
        })
        .collect()
}

pub fn build_page(
    result: &QueryResult,
    req: &QueryRequest,
    ctx: &PageContext,
    max_shown: usize,
) -> ListingPage {
    let rows = build_rows(result, req, ctx);
    let total_pages = query::total_pages(result.total, req.limit());
    ListingPage {
        info: rows_info(rows.len(), result.total, req.page()),
        pages: PageControls::new(req.page(), total_pages, max_shown),
        rows,
        total: result.total,
        page: req.page(),
        limit: req.limit(),
        total_pages,
    }
}

/// Pager as one line of text; the current page is bracketed and prev/next
/// only appear when they lead somewhere.
pub fn render_pagination(controls: &PageControls) -> String {
    let mut parts: Vec<String> = Vec::new();
    if controls.prev.is_some() {
        parts.push("‹ Prev".to_string());
    }
    for indicator in controls.indicators.iter() {
        match indicator {
            PageIndicator::Page(_) if controls.is_current(*indicator) => {
                parts.push(format!("[{indicator}]"))
            }
            _ => parts.push(indicator.to_string()),
        }
    }
    if controls.next.is_some() {
        parts.push("Next ›".to_string());
    }
    parts.iter().join(" ")
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn pad(value: &str, width: usize) -> String {
    let mut out = value.to_string();
    for _ in display_width(value)..width {
        out.push(' ');
    }
    out
}

pub fn render_text(page: &ListingPage) -> Vec<u8> {
    let header = ["#", "Image", "Title", "Price", "Slug"];
    let cells: Vec<[String; 5]> = page
        .rows
        .iter()
        .map(|r| {
            [
                r.index.to_string(),
                r.image_url.clone(),
                r.title.clone(),
                r.price.clone(),
                r.slug.clone(),
            ]
        })
        .collect();

    let mut widths = header.map(display_width);
    for row in cells.iter() {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(display_width(cell));
        }
    }

    let mut out = String::new();
    let line = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(widths.iter())
            .map(|(v, w)| pad(v, *w))
            .join("  ")
            .trim_end()
            .to_string()
    };
    out.push_str(&line(header.to_vec()));
    out.push('\n');
    for row in cells.iter() {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&page.info);
    out.push('\n');
    out.push_str(&render_pagination(&page.pages));
    out.push('\n');
    out.into_bytes()
}

pub fn render_json(page: &ListingPage) -> Vec<u8> {
    serde_json::to_vec_pretty(page).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render_html(page: &ListingPage) -> Vec<u8> {
    report::render_html(page)
}

pub fn render(page: &ListingPage, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(page),
        OutputFormat::Json => render_json(page),
        OutputFormat::Html => render_html(page),
    }
}
