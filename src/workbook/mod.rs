//! Spreadsheet input and output.
//!
//! Reading goes through `calamine`, writing through `rust_xlsxwriter`. Every
//! sheet is treated as a table whose first row holds the column names.

pub mod bank;
pub mod submissions;
pub mod summary;

pub use bank::read_questions;
pub use submissions::{read_submissions, write_template, TEMPLATE_SHEET};
pub use summary::{summary_rows, write_summary, SummaryRow, SUMMARY_COLUMNS};

use calamine::Data;
use std::collections::HashMap;

/// Column-name lookup built from a sheet's header row.
#[derive(Debug, Clone, Default)]
pub(crate) struct Header {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Header {
    pub(crate) fn new(row: &[Data]) -> Self {
        let names: Vec<String> = row.iter().map(cell_text).collect();
        let mut index = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self { names, index }
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Names and positions of every column, left to right.
    pub(crate) fn columns(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().enumerate().map(|(i, n)| (i, n.as_str()))
    }

    /// Required columns absent from the header.
    pub(crate) fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|name| self.position(name).is_none())
            .copied()
            .collect()
    }
}

/// Cell at `col`, or `Data::Empty` past the end of a short row.
pub(crate) fn cell(row: &[Data], col: usize) -> &Data {
    static EMPTY: Data = Data::Empty;
    row.get(col).unwrap_or(&EMPTY)
}

/// Trimmed text of a cell. Whole floats lose their `.0`.
pub(crate) fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", *f as i64)
        }
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Numeric value of a cell, parsing text when needed.
pub(crate) fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}
