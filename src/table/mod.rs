mod filename;
mod reader;
mod record;
mod writer;

pub use filename::{export_file_name, REVIEW_STATUS_SUFFIX};
pub use reader::read_xlsx;
pub use record::{
    CellValue, Record, RecordTable, ANSWER_COLUMN, QUESTION_COLUMN, REQUIRED_COLUMNS,
    SUMMARY_COLUMN,
};
pub use writer::{write_xlsx, MAX_CELL_CHARS, SHEET_NAME};
