// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::app::App;
use crate::render::{OutputFormat, render_rows};
use anyhow::Result;
use std::io::Write;

/// A query the user can ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// User SQL, run verbatim
    Sql(String),
    Search(String),
    DefaultListing,
    AuthorStats,
    YearlyStats,
}

/// Run `request` against the loaded dataset and render the result.
///
/// An empty search writes nothing.
pub async fn query_command<W: Write>(
    app: &App,
    request: &Request,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let rows = match request {
        Request::Sql(sql) => app.query(sql).await?,
        Request::Search(term) => match app.search(term).await? {
            Some(rows) => rows,
            None => return Ok(()),
        },
        Request::DefaultListing => app.default_listing().await?,
        Request::AuthorStats => app.author_stats().await?,
        Request::YearlyStats => app.yearly_stats().await?,
    };
    render_rows(&rows, format, out)
}
