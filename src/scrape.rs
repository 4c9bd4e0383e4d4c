//! Fetch-and-scrape ingestion
//!
//! The one supported network path: fetch a page over HTTP, extract a single
//! HTML table by element id (headers from `<thead>`, body cells from
//! `<tbody>`), and serialize it to delimited text for the ingestion
//! pipeline. Anything fancier than one table on one page is out of scope.

use crate::error::{ChartError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

lazy_static! {
    static ref TH_RE: Regex = Regex::new(r"(?is)<th[^>]*>(.*?)</th>").expect("static regex");
    static ref TR_RE: Regex = Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").expect("static regex");
    static ref TD_RE: Regex = Regex::new(r"(?is)<td[^>]*>(.*?)</td>").expect("static regex");
    static ref THEAD_RE: Regex =
        Regex::new(r"(?is)<thead[^>]*>(.*?)</thead>").expect("static regex");
    static ref TBODY_RE: Regex =
        Regex::new(r"(?is)<tbody[^>]*>(.*?)</tbody>").expect("static regex");
    static ref TAG_RE: Regex = Regex::new(r"(?s)<[^>]+>").expect("static regex");
}

/// A table scraped out of an HTML page: header texts plus body cell texts.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn cell_text(inner: &str) -> String {
    TAG_RE.replace_all(inner, "").trim().to_string()
}

/// Slice the `<table id="...">...</table>` element with the given id out of
/// a page.
fn table_fragment<'a>(html: &'a str, table_id: &str) -> Result<&'a str> {
    let open_re = Regex::new(&format!(
        r#"(?is)<table[^>]*id\s*=\s*["']{}["'][^>]*>"#,
        regex::escape(table_id)
    ))
    .map_err(|e| ChartError::Parse(format!("bad table id pattern: {}", e)))?;

    let open = open_re
        .find(html)
        .ok_or_else(|| ChartError::Parse(format!("table '#{}' not found", table_id)))?;
    let rest = &html[open.end()..];
    let close = rest
        .find("</table>")
        .ok_or_else(|| ChartError::Parse(format!("table '#{}' is unterminated", table_id)))?;
    Ok(&rest[..close])
}

/// Extract the target table from raw HTML.
///
/// Rows shorter than the header are padded later by the parser's usual
/// missing-field rule; here cells are taken as-is.
pub fn extract_table(html: &str, table_id: &str) -> Result<ScrapedTable> {
    let fragment = table_fragment(html, table_id)?;

    let head = THEAD_RE
        .captures(fragment)
        .map(|c| c[1].to_string())
        .unwrap_or_default();
    let headers: Vec<String> = TH_RE
        .captures_iter(&head)
        .map(|c| cell_text(&c[1]))
        .collect();

    let body = TBODY_RE
        .captures(fragment)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| fragment.to_string());
    let rows: Vec<Vec<String>> = TR_RE
        .captures_iter(&body)
        .map(|tr| {
            TD_RE
                .captures_iter(&tr[1])
                .map(|td| cell_text(&td[1]))
                .collect::<Vec<String>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    Ok(ScrapedTable { headers, rows })
}

/// Serialize a scraped table to delimited text suitable for the ingestion
/// pipeline. `csv::Writer` quotes embedded separators, which the engine-side
/// reader understands.
pub fn to_delimited_text(table: &ScrapedTable) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ChartError::Parse(format!("csv serialization failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| ChartError::Parse(format!("non-utf8 output: {}", e)))
}

/// Fetch a page and extract one table by element id.
pub async fn fetch_table(url: &str, table_id: &str) -> Result<ScrapedTable> {
    info!("fetching '{}' for table '#{}'", url, table_id);
    let html = reqwest::get(url).await?.text().await?;
    let table = extract_table(&html, table_id)?;
    info!(
        "scraped {} columns, {} rows from '#{}'",
        table.headers.len(),
        table.rows.len(),
        table_id
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <html><body>
        <table id="other"><tbody><tr><td>x</td></tr></tbody></table>
        <table class="stats" id="per_game">
          <thead><tr><th>DATE</th><th><a href="#">PTS</a></th></tr></thead>
          <tbody>
            <tr><td>2024/01/01</td><td>10</td></tr>
            <tr><td>2024/01/02</td><td>20</td></tr>
          </tbody>
        </table>
        </body></html>"##;

    #[test]
    fn extracts_headers_and_body_cells_by_table_id() {
        let table = extract_table(PAGE, "per_game").unwrap();
        assert_eq!(table.headers, vec!["DATE", "PTS"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["2024/01/02", "20"]);
    }

    #[test]
    fn missing_table_id_is_a_parse_error() {
        let err = extract_table(PAGE, "absent");
        assert!(matches!(err, Err(ChartError::Parse(_))));
    }

    #[test]
    fn serializes_to_ingestable_text() {
        let table = extract_table(PAGE, "per_game").unwrap();
        let text = to_delimited_text(&table).unwrap();
        assert!(text.starts_with("DATE,PTS\n"));
        assert!(text.contains("2024/01/01,10\n"));
    }
}
