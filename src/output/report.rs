use super::{ListingPage, ListingRow};
use crate::pagination::PageIndicator;

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn render_row(row: &ListingRow) -> String {
    let fallbacks = serde_json::to_string(&row.image_fallbacks).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"      <tr>
        <td>{index}</td>
        <td><img src="{src}" alt="{alt}" loading="lazy" data-fallbacks="{fallbacks}" onerror="nextImage(this)"></td>
        <td>{title}</td>
        <td class="price">{price}</td>
        <td>{slug}</td>
      </tr>
"#,
        index = row.index,
        src = escape_html(&row.image_url),
        alt = escape_html(&row.alt),
        fallbacks = escape_html(&fallbacks),
        title = escape_html(&row.title),
        price = escape_html(&row.price),
        slug = escape_html(&row.slug),
    )
}

fn render_pager(page: &ListingPage) -> String {
    let controls = &page.pages;
    let mut out = String::new();
    let disabled = |off: bool| if off { " disabled" } else { "" };
    out.push_str(&format!(
        "<button class=\"page-btn\" data-page=\"{}\"{}>‹ Prev</button>",
        controls.prev.unwrap_or(1),
        disabled(controls.prev.is_none())
    ));
    for indicator in controls.indicators.iter() {
        match indicator {
            PageIndicator::Ellipsis => out.push_str("<span class=\"gap\">...</span>"),
            PageIndicator::Page(n) => {
                let current = if controls.is_current(*indicator) {
                    " current"
                } else {
                    ""
                };
                out.push_str(&format!(
                    "<button class=\"page-btn{current}\" data-page=\"{n}\">{n}</button>"
                ));
            }
        }
    }
    out.push_str(&format!(
        "<button class=\"page-btn\" data-page=\"{}\"{}>Next ›</button>",
        controls.next.unwrap_or(controls.total_pages),
        disabled(controls.next.is_none())
    ));
    out
}

pub fn render_html(page: &ListingPage) -> Vec<u8> {
    let rows: String = page.rows.iter().map(render_row).collect();
    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Products</title>
  <style>
    body {{ font-family: sans-serif; margin: 2rem; }}
    table {{ border-collapse: collapse; width: 100%; }}
    td, th {{ border-bottom: 1px solid #eee; padding: 6px 8px; text-align: left; }}
    img {{ width: 140px; height: 100px; object-fit: contain; background: #fff0f6; }}
    .price {{ font-variant-numeric: tabular-nums; }}
    .page-btn.current {{ font-weight: 700; }}
    .gap {{ padding: 6px 8px; }}
  </style>
  <script>
    function nextImage(img) {{
      var chain = JSON.parse(img.dataset.fallbacks || "[]");
      if (!chain.length) {{ img.onerror = null; return; }}
      img.src = chain.shift();
      img.dataset.fallbacks = JSON.stringify(chain);
    }}
  </script>
</head>
<body>
  <table>
    <thead>
      <tr><th>#</th><th>Image</th><th>Title</th><th>Price</th><th>Slug</th></tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>
  <p id="rowsInfo">{info}</p>
  <nav id="pageControls">{pager}</nav>
</body>
</html>
"####,
        rows = rows,
        info = escape_html(&page.info),
        pager = render_pager(page),
    );
    html.into_bytes()
}
