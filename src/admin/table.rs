use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::document::{Document, ItemId};
use crate::error::{GuideError, Result};
use crate::util::truncate_chars;

pub const PAGE_SIZE: usize = 10;
const CELL_WIDTH: usize = 50;
pub const EMPTY_MESSAGE: &str = "No hay datos o el formato es incorrecto.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableRow {
    /// Position in the whole file, not on the page.
    pub index: usize,
    pub id: ItemId,
    pub cells: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePage {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
    pub page: usize,
    pub total_pages: usize,
    pub range_label: String,
}

/// Text shown for one value in the table.
pub fn format_cell(value: Option<&Value>) -> String {
    let text = match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Bool(true)) => "✅".to_string(),
        Some(Value::Bool(false)) => "❌".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    truncate_chars(&text, CELL_WIDTH)
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Page cursor over the editor's item table. The page is re-clamped against the
/// current item count before every use, since edits change the count between pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdminTable {
    page: usize,
}

impl Default for AdminTable {
    fn default() -> Self {
        Self { page: 1 }
    }
}

impl AdminTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total_pages(len: usize) -> usize {
        len.div_ceil(PAGE_SIZE).max(1)
    }

    pub fn clamp(&mut self, len: usize) {
        self.page = self.page.clamp(1, Self::total_pages(len));
    }

    pub fn go_to(&mut self, page: usize, len: usize) {
        self.page = page;
        self.clamp(len);
    }

    /// Moves to `page` without clamping. Pages outside the file are refused.
    pub fn select(&mut self, page: usize, len: usize) -> Result<()> {
        let total = Self::total_pages(len);
        if page == 0 || page > total {
            return Err(GuideError::Validation(format!(
                "page {page} does not exist (1-{total})"
            )));
        }
        self.page = page;
        Ok(())
    }

    pub fn change_page(&mut self, delta: isize, len: usize) {
        self.go_to(self.page.saturating_add_signed(delta), len);
    }

    /// Maps a row number on the current page to its position in the file.
    pub fn absolute_index(&mut self, local: usize, len: usize) -> Result<usize> {
        self.clamp(len);
        let index = (self.page - 1) * PAGE_SIZE + local;
        if local >= PAGE_SIZE || index >= len {
            return Err(GuideError::IndexOutOfRange { index, len });
        }
        Ok(index)
    }

    /// The current page, or `None` for an empty file.
    pub fn render(&mut self, doc: &Document) -> Option<TablePage> {
        if doc.is_empty() {
            return None;
        }
        self.clamp(doc.len());
        let headers = doc.field_names();
        let start = (self.page - 1) * PAGE_SIZE;
        let end = (start + PAGE_SIZE).min(doc.len());

        let rows = (start..end)
            .filter_map(|index| {
                let id = doc.id_at(index).ok()?;
                let record = doc.get(id)?;
                let cells = headers.iter().map(|h| format_cell(record.get(h))).collect();
                Some(TableRow { index, id, cells })
            })
            .collect();

        Some(TablePage {
            headers,
            rows,
            page: self.page,
            total_pages: Self::total_pages(doc.len()),
            range_label: format!("Mostrando {}-{} de {} items", start + 1, end, doc.len()),
        })
    }
}

impl fmt::Display for TablePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}  (Página {} de {})",
            self.range_label, self.page, self.total_pages
        )?;
        writeln!(f, "#\t{}", self.headers.join("\t"))?;
        for row in &self.rows {
            writeln!(f, "{}\t{}", row.index, row.cells.join("\t"))?;
        }
        Ok(())
    }
}
