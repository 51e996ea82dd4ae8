// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Canned queries over the Aozora Bunko catalogue table

/// Maximum number of rows a search returns.
pub const SEARCH_LIMIT: usize = 100;

/// The first ten works by id, shown when no query is given.
#[must_use]
pub fn default_listing(table: &str) -> String {
    format!(
        "SELECT
  作品ID,
  作品名,
  姓 || ' ' || 名 AS 著者名,
  文字遣い種別,
  公開日,
  底本名1
FROM {table}
ORDER BY 作品ID ASC
LIMIT 10"
    )
}

/// The twenty most prolific authors with their first and latest
/// publication dates.
#[must_use]
pub fn author_stats(table: &str) -> String {
    format!(
        "SELECT
  姓 || ' ' || 名 AS 著者名,
  COUNT(*) AS 作品数,
  MIN(公開日) AS 最初の公開日,
  MAX(公開日) AS 最新の公開日
FROM {table}
GROUP BY 姓, 名
ORDER BY 作品数 DESC
LIMIT 20"
    )
}

/// Works published per year, newest year first.
#[must_use]
pub fn yearly_stats(table: &str) -> String {
    format!(
        "SELECT
  SUBSTR(公開日, 1, 4) AS 年,
  COUNT(*) AS 公開作品数
FROM {table}
GROUP BY SUBSTR(公開日, 1, 4)
ORDER BY 年 DESC"
    )
}

/// Title and author search. `$1` is the `LIKE` pattern from
/// [`like_pattern`].
#[must_use]
pub fn search(table: &str) -> String {
    format!(
        "SELECT 作品名, 姓 || ' ' || 名 AS 著者名, 公開日
FROM {table}
WHERE 作品名 LIKE $1
   OR 姓 LIKE $1
   OR 名 LIKE $1
LIMIT {SEARCH_LIMIT}"
    )
}

/// Escape `LIKE` metacharacters so the term matches literally.
#[must_use]
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// The substring pattern for a search term, or `None` when the trimmed
/// term is empty.
#[must_use]
pub fn like_pattern(term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() {
        None
    } else {
        Some(format!("%{}%", escape_like(term)))
    }
}
