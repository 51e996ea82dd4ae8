// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Interactive SQL shell
//!
//! Lines accumulate into one statement until a line ends with `;`.
//! Lines starting with `.` at the start of a statement are meta-commands.

use super::cache::clear_cache_command;
use super::query::{Request, query_command};
use crate::app::App;
use crate::render::{OutputFormat, render_error};
use anyhow::{Result, anyhow};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const PROMPT: &str = "shardsql> ";
const CONTINUATION: &str = "     ...> ";

const HELP: &str = "\
.search <term>   search titles and author names
.list            first ten works
.authors         works per author
.yearly          works per publication year
.clear-cache     remove cached parts
.help            show this help
.quit            leave the shell
Anything else is SQL, run when a line ends with ';'";

enum Action {
    Run(Request),
    ClearCache,
    Help,
    Quit,
}

fn meta_command(line: &str) -> Result<Action> {
    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (line, ""),
    };
    match command {
        ".search" => Ok(Action::Run(Request::Search(argument.to_string()))),
        ".list" => Ok(Action::Run(Request::DefaultListing)),
        ".authors" => Ok(Action::Run(Request::AuthorStats)),
        ".yearly" => Ok(Action::Run(Request::YearlyStats)),
        ".clear-cache" => Ok(Action::ClearCache),
        ".help" => Ok(Action::Help),
        ".quit" | ".exit" => Ok(Action::Quit),
        other => Err(anyhow!("unknown command {other}, try .help")),
    }
}

/// The statement text without its terminating `;`, once complete.
fn complete_statement(buffer: &str) -> Option<&str> {
    let trimmed = buffer.trim_end();
    trimmed.strip_suffix(';').map(str::trim)
}

/// Read statements and meta-commands from `input` until `.quit` or end
/// of input. Failures are written to `out` and the shell carries on.
pub async fn shell_command<R, W>(
    app: &App,
    input: R,
    format: OutputFormat,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut buffer = String::new();

    loop {
        write!(out, "{}", if buffer.is_empty() { PROMPT } else { CONTINUATION })?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        let action = if buffer.is_empty() && line.trim_start().starts_with('.') {
            match meta_command(line.trim()) {
                Ok(action) => action,
                Err(err) => {
                    render_error(&err, format, out)?;
                    continue;
                }
            }
        } else {
            if !buffer.is_empty() {
                buffer.push('\n');
            }
            buffer.push_str(&line);
            match complete_statement(&buffer) {
                Some("") => {
                    buffer.clear();
                    continue;
                }
                Some(sql) => {
                    let sql = sql.to_string();
                    buffer.clear();
                    Action::Run(Request::Sql(sql))
                }
                None => {
                    if buffer.trim().is_empty() {
                        buffer.clear();
                    }
                    continue;
                }
            }
        };

        let result = match action {
            Action::Run(request) => query_command(app, &request, format, out).await,
            Action::ClearCache => clear_cache_command(app, out).await,
            Action::Help => writeln!(out, "{HELP}").map_err(Into::into),
            Action::Quit => break,
        };
        if let Err(err) = result {
            render_error(&err, format, out)?;
        }
    }
    Ok(())
}
