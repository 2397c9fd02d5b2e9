use serde::ser::{Serialize, SerializeStruct};
use std::convert::From;
use std::fmt;

pub type Result<D> = core::result::Result<D, Error>;

/// Coarse classification used by the page to decide how to surface an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InputFormat,
    SelectionRange,
    Validation,
    Session,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputFormat => "inputFormat",
            Self::SelectionRange => "selectionRange",
            Self::Validation => "validation",
            Self::Session => "session",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug)]
pub enum Error {
    InvalidSpreadsheet(calamine::XlsxError),
    EmptySpreadsheet,
    UnsupportedFileType(String),
    MissingUpload,
    MissingColumns(Vec<String>),
    RowOutOfRange { example: usize, row_count: usize },
    InvalidChoice { field: &'static str, value: String },
    UnknownAnnotator(String),
    TextTooLong { field: &'static str, len: usize },
    AnnotatorAlreadySelected(String),
    AnnotatorNotSelected,
    NoTableLoaded,
    SessionNotFound(String),
    WorkbookWriteError(rust_xlsxwriter::XlsxError),
    MultipartError(axum::extract::multipart::MultipartError),
    IoError(std::io::Error),
    SerdeError(serde_json::Error),
    TimeFormatError(time::error::Format),
    ErrorWithMessage(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSpreadsheet(_)
            | Self::EmptySpreadsheet
            | Self::UnsupportedFileType(_)
            | Self::MissingUpload
            | Self::MissingColumns(_) => ErrorKind::InputFormat,
            Self::RowOutOfRange { .. } => ErrorKind::SelectionRange,
            Self::InvalidChoice { .. }
            | Self::UnknownAnnotator(_)
            | Self::TextTooLong { .. } => ErrorKind::Validation,
            Self::AnnotatorAlreadySelected(_)
            | Self::AnnotatorNotSelected
            | Self::NoTableLoaded
            | Self::SessionNotFound(_) => ErrorKind::Session,
            Self::WorkbookWriteError(_)
            | Self::MultipartError(_)
            | Self::IoError(_)
            | Self::SerdeError(_)
            | Self::TimeFormatError(_)
            | Self::ErrorWithMessage(_) => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSpreadsheet(e) => write!(f, "Not a valid Excel file: {}", e),
            Self::EmptySpreadsheet => write!(f, "The first worksheet is empty"),
            Self::UnsupportedFileType(name) => {
                write!(f, "`{}` is not an Excel (.xlsx) file", name)
            }
            Self::MissingUpload => write!(f, "No file was uploaded"),
            Self::MissingColumns(cols) => {
                write!(f, "Missing required columns: {}", cols.join(", "))
            }
            Self::RowOutOfRange { example, row_count } => write!(
                f,
                "Example #{} is out of range, choose a number between 1 and {}",
                example, row_count
            ),
            Self::InvalidChoice { field, value } => {
                write!(f, "`{}` is not an allowed value for {}", value, field)
            }
            Self::UnknownAnnotator(id) => write!(f, "Unknown annotator ID: `{}`", id),
            Self::TextTooLong { field, len } => write!(
                f,
                "{} is {} characters long, a spreadsheet cell holds at most {}",
                field,
                len,
                crate::table::MAX_CELL_CHARS
            ),
            Self::AnnotatorAlreadySelected(id) => {
                write!(f, "Annotator is already set to `{}`", id)
            }
            Self::AnnotatorNotSelected => write!(f, "Please select your ID to start annotating"),
            Self::NoTableLoaded => write!(f, "Please upload an Excel file first"),
            Self::SessionNotFound(id) => write!(f, "Session {} does not exist or has expired", id),
            Self::WorkbookWriteError(e) => write!(f, "Writing workbook failed: {}", e),
            Self::MultipartError(e) => write!(f, "Reading upload failed: {}", e),
            Self::IoError(e) => write!(f, "{}", e),
            Self::SerdeError(e) => write!(f, "{}", e),
            Self::TimeFormatError(e) => write!(f, "{}", e),
            Self::ErrorWithMessage(s) => f.write_str(s),
        }
    }
}

impl std::error::Error for Error {}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut s = serializer.serialize_struct("Error", 2)?;
        s.serialize_field("kind", self.kind().as_str())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

impl From<calamine::XlsxError> for Error {
    fn from(err: calamine::XlsxError) -> Self {
        Error::InvalidSpreadsheet(err)
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Error::WorkbookWriteError(err)
    }
}

impl From<axum::extract::multipart::MultipartError> for Error {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Error::MultipartError(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerdeError(err)
    }
}

impl From<time::error::Format> for Error {
    fn from(err: time::error::Format) -> Self {
        Error::TimeFormatError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_kind_and_message() {
        let e = Error::MissingColumns(vec![String::from("question"), String::from("answer")]);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "inputFormat");
        assert_eq!(json["message"], "Missing required columns: question, answer");
    }

    #[test]
    fn range_errors_are_classified() {
        let e = Error::RowOutOfRange {
            example: 9,
            row_count: 3,
        };
        assert_eq!(e.kind(), ErrorKind::SelectionRange);
        assert!(e.to_string().contains("between 1 and 3"));
    }

    #[test]
    fn stamp_failures_are_internal() {
        // `InsufficientTypeInformation` is #[non_exhaustive]; obtain it via the public API.
        let desc = time::format_description::parse("[hour]").unwrap();
        let fmt_err = time::Date::MIN.format(&desc).unwrap_err();
        let e: Error = fmt_err.into();
        assert!(matches!(e, Error::TimeFormatError(_)));
        assert_eq!(e.kind(), ErrorKind::Internal);
    }

    #[test]
    fn long_text_names_the_field() {
        let e = Error::TextTooLong {
            field: "comment",
            len: 40_000,
        };
        assert_eq!(e.kind(), ErrorKind::Validation);
        assert!(e.to_string().starts_with("comment is 40000 characters long"));
    }
}
