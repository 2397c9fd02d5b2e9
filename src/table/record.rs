use std::fmt;
use std::vec::Vec;

use crate::result::{Error, Result};

pub const SUMMARY_COLUMN: &str = "ann_summary";
pub const QUESTION_COLUMN: &str = "question";
pub const ANSWER_COLUMN: &str = "answer";
pub const REQUIRED_COLUMNS: [&str; 3] = [SUMMARY_COLUMN, QUESTION_COLUMN, ANSWER_COLUMN];

/// A single cell as read from the uploaded workbook.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Text form used for display, empty cells become an empty string.
    pub fn as_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            v => v.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
            Self::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(String::from(s))
        }
    }
}

/// The uploaded sheet: a header plus rows of equal width.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordTable {
    file_name: String,
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RecordTable {
    /// Builds a table, padding short rows and checking that the columns every
    /// record needs are present.
    pub fn new(
        file_name: &str,
        columns: Vec<String>,
        mut rows: Vec<Vec<CellValue>>,
    ) -> Result<Self> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !columns.iter().any(|h| h.eq(*c)))
            .map(|c| String::from(*c))
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing));
        }
        let width = columns.len();
        for row in rows.iter_mut() {
            row.resize(width, CellValue::Empty);
        }
        Ok(Self {
            file_name: String::from(file_name),
            columns,
            rows,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq(name))
    }

    pub fn record(&self, position: usize) -> Option<Record<'_>> {
        self.rows.get(position).map(|cells| Record {
            columns: &self.columns,
            cells,
        })
    }
}

/// Borrowed view of one row keyed by column name.
pub struct Record<'a> {
    columns: &'a [String],
    cells: &'a [CellValue],
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        let idx = self.columns.iter().position(|c| c.eq(column))?;
        self.cells.get(idx)
    }

    pub fn text(&self, column: &str) -> String {
        self.get(column).map(|v| v.as_text()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| String::from(*s)).collect()
    }

    #[test]
    fn rejects_missing_required_columns() {
        let r = RecordTable::new("a.xlsx", header(&["ann_summary", "extra"]), vec![]);
        match r {
            Err(Error::MissingColumns(cols)) => assert_eq!(cols, vec!["question", "answer"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn pads_short_rows_and_reads_by_name() {
        let t = RecordTable::new(
            "a.xlsx",
            header(&["question", "answer", "ann_summary"]),
            vec![vec![CellValue::from("q1"), CellValue::Number(2.5)]],
        )
        .unwrap();
        let r = t.record(0).unwrap();
        assert_eq!(r.text("question"), "q1");
        assert_eq!(r.text("answer"), "2.5");
        assert_eq!(r.get("ann_summary"), Some(&CellValue::Empty));
        assert!(t.record(1).is_none());
    }
}
