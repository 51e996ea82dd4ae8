// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Result and error output in text, CSV and HTML form

use anyhow::{Result, anyhow};
use arrow::util::pretty::pretty_format_batches;
use arrow_csv::WriterBuilder;
use clap::ValueEnum;
use engine::{RowSet, Value};
use std::fmt::Write as _;
use std::io::Write;

/// Column whose cells hold long text and render as scrollable cells.
pub const TEXT_CONTENT_COLUMN: &str = "テキスト内容";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Bordered table
    #[default]
    Text,
    /// Comma separated with a header row
    Csv,
    /// HTML table fragment
    Html,
}

/// Write `rows` to `out`.
///
/// An empty result writes "No results." as text and nothing as HTML.
pub fn render_rows<W: Write>(rows: &RowSet, format: OutputFormat, out: &mut W) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if rows.is_empty() {
                writeln!(out, "No results.")?;
            } else {
                let table = pretty_format_batches(rows.batches())
                    .map_err(|e| anyhow!("Failed to format results as table: {}", e))?;
                writeln!(out, "{table}")?;
            }
        }
        OutputFormat::Csv => {
            let mut writer = WriterBuilder::new().with_header(true).build(&mut *out);
            for batch in rows.batches() {
                writer
                    .write(batch)
                    .map_err(|e| anyhow!("Failed to write CSV: {}", e))?;
            }
        }
        OutputFormat::Html => {
            if !rows.is_empty() {
                out.write_all(html_table(rows).as_bytes())?;
            }
        }
    }
    Ok(())
}

/// One-line description of a failure, as HTML or plain text.
pub fn render_error<W: Write>(
    err: &anyhow::Error,
    format: OutputFormat,
    out: &mut W,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Html => writeln!(
            out,
            "<div class=\"error\">{}</div>",
            escape_html(&format!("{err:#}"))
        ),
        OutputFormat::Text | OutputFormat::Csv => writeln!(out, "error: {err:#}"),
    }
}

/// Escape the five HTML-significant characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn html_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Text(s) => escape_html(s),
        other => other.to_string(),
    }
}

/// Render `rows` as a `<table>` with a header row.
#[must_use]
pub fn html_table(rows: &RowSet) -> String {
    let mut html = String::from("<table>\n<tr>");
    for column in rows.columns() {
        _ = write!(html, "<th>{}</th>", escape_html(column));
    }
    html.push_str("</tr>\n");

    for row in rows {
        html.push_str("<tr>");
        for (column, value) in row.iter() {
            let class = if column == TEXT_CONTENT_COLUMN {
                " class=\"text-content\""
            } else {
                ""
            };
            _ = write!(html, "<td{class}>{}</td>", html_cell(value));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
    html
}
