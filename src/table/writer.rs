use std::vec::Vec;

use rust_xlsxwriter::{Format, Workbook};

use super::record::CellValue;
use crate::result::{Error, Result};

pub const SHEET_NAME: &str = "Sheet1";

/// Longest string a worksheet cell holds, counted in characters.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Serializes a header and its rows into an in-memory `.xlsx` workbook.
/// Empty cells are left unwritten so they read back as blanks.
pub fn write_xlsx(columns: &[String], rows: &[Vec<CellValue>]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, name) in columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col_num(col)?, name, &header_format)?;
    }
    for (r, row) in rows.iter().enumerate() {
        let r = row_num(r + 1)?;
        for (c, cell) in row.iter().enumerate() {
            let c = col_num(c)?;
            match cell {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(r, c, *n)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
            }
        }
    }
    Ok(workbook.save_to_buffer()?)
}

fn row_num(idx: usize) -> Result<u32> {
    u32::try_from(idx).map_err(|_| Error::ErrorWithMessage(format!("Row {} is too large", idx)))
}

fn col_num(idx: usize) -> Result<u16> {
    u16::try_from(idx)
        .map_err(|_| Error::ErrorWithMessage(format!("Column {} is too large", idx)))
}
