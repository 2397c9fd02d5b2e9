use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::vec::Vec;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};

use super::record::{CellValue, RecordTable};
use crate::result::{Error, Result};

/// Parses the first worksheet of an `.xlsx` upload. The first row is the
/// header; every following row becomes a record.
pub fn read_xlsx(file_name: &str, buf: Vec<u8>) -> Result<RecordTable> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(buf))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(r) => r?,
        None => return Err(Error::EmptySpreadsheet),
    };
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(Error::EmptySpreadsheet);
    };
    let columns = column_names(header);
    let records: Vec<Vec<CellValue>> = rows.map(|r| r.iter().map(to_cell).collect()).collect();
    log::info!(
        "Read `{}`: {} columns, {} rows",
        file_name,
        columns.len(),
        records.len()
    );
    RecordTable::new(file_name, columns, records)
}

fn to_cell(d: &Data) -> CellValue {
    match d {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

/// Header names the way data frame readers produce them: blank headers get a
/// positional name, repeats get the first numeric suffix not already taken.
pub(crate) fn column_names(header: &[Data]) -> Vec<String> {
    let raws: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| match to_cell(cell) {
            CellValue::Empty => format!("Unnamed: {}", idx),
            v => v.to_string(),
        })
        .collect();
    let mut taken: HashSet<String> = raws.iter().cloned().collect();
    let mut counts: HashMap<&str, usize> = HashMap::with_capacity(raws.len());
    let mut names = Vec::with_capacity(raws.len());
    for raw in raws.iter() {
        let count = counts.entry(raw.as_str()).or_insert(0);
        if *count == 0 {
            *count = 1;
            names.push(raw.clone());
            continue;
        }
        let mut name = format!("{}.{}", raw, count);
        while taken.contains(&name) {
            *count += 1;
            name = format!("{}.{}", raw, count);
        }
        *count += 1;
        taken.insert(name.clone());
        names.push(name);
    }
    names
}
