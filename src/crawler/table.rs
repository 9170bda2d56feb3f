use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::util::text;

/// A normalized table: ordered header names plus rows of string cells.
///
/// Every row's length equals the header list's length. Values of this type
/// are passed directly between internal functions; they are only serialized
/// once, at the HTTP boundary.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResultSet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// How a canonical column is located among a source table's actual headers.
///
/// All matching is done on trimmed text, case-insensitively.
#[derive(Debug, Clone, Copy)]
pub enum HeaderRule {
    /// The header text equals the given name.
    Exact(&'static str),
    /// The header text contains the given name. Used for identifiers whose
    /// wording varies between sources ("STOCK CODE" vs "TRADING CODE").
    Contains(&'static str),
    /// The header text equals any of the given names. Used for semantically
    /// equivalent columns ("CP" and "LTP" are both the closing price).
    AnyOf(&'static [&'static str]),
}

/// One canonical output column: its name and the rule that finds it in a
/// source table. The order of a `Column` slice is the output column order;
/// the same slice drives both resolution and row mapping so the two can
/// never drift apart.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub rule: HeaderRule,
}

impl HeaderRule {
    fn matches(&self, header: &str) -> bool {
        let header = header.trim();
        match self {
            HeaderRule::Exact(name) => header.eq_ignore_ascii_case(name),
            HeaderRule::Contains(name) => header
                .to_uppercase()
                .contains(name.to_uppercase().as_str()),
            HeaderRule::AnyOf(names) => names.iter().any(|n| header.eq_ignore_ascii_case(n)),
        }
    }
}

/// Returns the first table matching the CSS selector, or `None` when the
/// page lacks it. Class selectors match one token among many, so markup like
/// `class="table shares-table bordered"` is located by `table.shares-table`.
pub fn find_table<'a>(document: &'a Html, css_selector: &str) -> Result<Option<ElementRef<'a>>> {
    let selector = Selector::parse(css_selector)
        .map_err(|why| anyhow!("Failed to Selector::parse because: {:?}", why))?;

    Ok(document.select(&selector).next())
}

/// Header cell texts of the table's first row, trimmed. Both `th` and `td`
/// cells count, since some sources style their header row with `td`.
pub fn first_row_cells(table: &ElementRef) -> Vec<String> {
    let row_selector = match Selector::parse("tr") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    match table.select(&row_selector).next() {
        Some(tr) => cell_texts(&tr, "th, td"),
        None => Vec::new(),
    }
}

/// Data rows of the table, skipping the first (header) row. Each row is the
/// trimmed texts of its `td` cells; rows with zero cells are spacer rows and
/// are dropped.
pub fn rows_after_first(table: &ElementRef) -> Vec<Vec<String>> {
    let row_selector = match Selector::parse("tr") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    table
        .select(&row_selector)
        .skip(1)
        .map(|tr| cell_texts(&tr, "td"))
        .filter(|cells| !cells.is_empty())
        .collect()
}

/// Header cell texts from an explicit `thead`, trimmed.
pub fn thead_cells(table: &ElementRef) -> Vec<String> {
    match Selector::parse("thead > tr > th") {
        Ok(s) => table
            .select(&s)
            .map(|th| th.text().collect::<String>().trim().to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Data rows from an explicit `tbody`, with zero-cell rows dropped.
pub fn tbody_rows(table: &ElementRef) -> Vec<Vec<String>> {
    let row_selector = match Selector::parse("tbody > tr") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    table
        .select(&row_selector)
        .map(|tr| cell_texts(&tr, "td"))
        .filter(|cells| !cells.is_empty())
        .collect()
}

fn cell_texts(row: &ElementRef, cell_selector: &str) -> Vec<String> {
    match Selector::parse(cell_selector) {
        Ok(s) => row
            .select(&s)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Resolves each canonical column to an index into the source's headers.
///
/// Resolution happens once per source document and is reused for all of its
/// rows. `None` means the column is absent from this source; that is
/// tolerated and yields empty cells, never an error.
pub fn resolve_columns(headers: &[String], columns: &[Column]) -> Vec<Option<usize>> {
    columns
        .iter()
        .map(|column| headers.iter().position(|h| column.rule.matches(h)))
        .collect()
}

/// Builds one output row in canonical column order: the synthetic serial
/// first, then each resolved column's value (empty string when unresolved or
/// out of the row's bounds), then the optional trailing date.
pub fn map_row(
    cells: &[String],
    indexes: &[Option<usize>],
    serial: u32,
    date: Option<&str>,
) -> Vec<String> {
    let mut row = Vec::with_capacity(indexes.len() + 2);
    row.push(serial.to_string());

    for index in indexes {
        match index {
            Some(i) if *i < cells.len() => row.push(cells[*i].clone()),
            _ => row.push(String::new()),
        }
    }

    if let Some(date) = date {
        row.push(date.to_string());
    }

    row
}

/// Re-projects a whole source onto a canonical column set, assigning serial
/// numbers from `serial` onward. The counter keeps running across calls so
/// merged sources are numbered continuously.
pub fn project(source: &ResultSet, columns: &[Column], serial: &mut u32) -> Vec<Vec<String>> {
    let indexes = resolve_columns(&source.headers, columns);
    let mut rows = Vec::with_capacity(source.rows.len());

    for cells in &source.rows {
        if cells.is_empty() {
            continue;
        }

        rows.push(map_row(cells, &indexes, *serial, None));
        *serial += 1;
    }

    rows
}

/// Text of the first node matching the CSS selector, inner tags stripped and
/// whitespace collapsed. An absent node yields an empty string, not an error.
pub fn heading_text(document: &Html, css_selector: &str) -> String {
    let selector = match Selector::parse(css_selector) {
        Ok(s) => s,
        Err(_) => return String::new(),
    };

    document
        .select(&selector)
        .next()
        .map(|node| text::collapse_whitespace(&node.text().collect::<String>()))
        .unwrap_or_default()
}

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"on\s+([A-Za-z]+ \d{1,2}, \d{4})").expect("date pattern must compile")
});

/// Pulls a `Month DD, YYYY` date out of a heading like
/// `"Latest Share Price on January 05, 2024 at 11:00 AM"`.
pub fn extract_date(heading: &str) -> Option<String> {
    DATE_RE
        .captures(heading)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
