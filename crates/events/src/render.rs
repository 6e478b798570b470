//! HTML rendering of composed reports.
//!
//! Every section becomes one `<table>`; the header is the union of row keys
//! in first-seen order, so rows with family-specific columns still line up.

use std::fmt::Write;

use annostat_core::{ComposedReport, ReportRow};
use serde_json::Value;

/// Render a full report email body.
pub fn render_html(title: &str, report: &ComposedReport) -> String {
    let mut html = String::new();
    let _ = write!(html, "<html><body><h2>{}</h2>", escape(title));
    for (heading, rows) in report.sections() {
        if let Some(heading) = heading {
            let _ = write!(html, "<h3>{}</h3>", escape(&heading));
        }
        render_table(&mut html, rows);
    }
    html.push_str("</body></html>");
    html
}

fn render_table(html: &mut String, rows: &[ReportRow]) {
    if rows.is_empty() {
        html.push_str("<p>No data</p>");
        return;
    }
    let mut columns: Vec<&str> = Vec::new();
    for key in rows.iter().flat_map(|r| r.keys()) {
        if !columns.contains(&key.as_str()) {
            columns.push(key.as_str());
        }
    }

    html.push_str("<table border=\"1\" cellpadding=\"4\"><thead><tr>");
    for column in &columns {
        let _ = write!(html, "<th>{}</th>", escape(column));
    }
    html.push_str("</tr></thead><tbody>");
    for row in rows {
        html.push_str("<tr>");
        for column in &columns {
            let cell = row.get(*column).map(cell_text).unwrap_or_default();
            let _ = write!(html, "<td>{}</td>", escape(&cell));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
