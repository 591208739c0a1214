//! Plain-text tables for CLI listings.

use regex::Regex;
use std::sync::LazyLock;
use unicode_width::UnicodeWidthStr;

/// Column widths follow the widest cell; cells may carry ANSI colour codes,
/// which do not count towards the width.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

static ANSI: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\x1B\[[0-9;]*[mK]").ok());

/// Display width of a cell: ANSI codes stripped, wide (CJK) characters count twice.
fn visible_len(s: &str) -> usize {
    match ANSI.as_ref() {
        Some(re) => UnicodeWidthStr::width(re.replace_all(s, "").as_ref()),
        None => UnicodeWidthStr::width(s),
    }
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| visible_len(h)).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(visible_len(cell));
            }
        }

        let line = |cells: &[String]| -> String {
            let mut out = String::new();
            for (i, w) in widths.iter().enumerate() {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                out.push_str(cell);
                out.push_str(&" ".repeat(w.saturating_sub(visible_len(cell)) + 1));
            }
            out.trim_end().to_string()
        };

        let mut out = line(&self.headers);
        out.push('\n');
        out.push_str(&"-".repeat(widths.iter().sum::<usize>() + widths.len().saturating_sub(1)));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&line(row));
            out.push('\n');
        }
        out
    }
}
