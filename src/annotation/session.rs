use std::collections::BTreeMap;
use std::vec::Vec;

use super::dto::{
    Annotation, AnnotationForm, RowView, SaveReceipt, SessionStatus, Stage, TableSummary,
    ANNOTATION_COLUMNS,
};
use crate::render::render_summary;
use crate::result::{Error, Result};
use crate::table::{self, CellValue, RecordTable, ANSWER_COLUMN, QUESTION_COLUMN, SUMMARY_COLUMN};

/// One annotator's working pass over one uploaded table.
///
/// Annotations are keyed by zero-based row position. The page talks in
/// 1-based example numbers, see [`Session::position_of`].
#[derive(Debug)]
pub struct Session {
    id: String,
    annotator: Option<String>,
    table: Option<RecordTable>,
    annotations: BTreeMap<usize, Annotation>,
    cursor: Option<usize>,
    stage: Stage,
}

impl Session {
    pub fn new(id: &str) -> Self {
        Self {
            id: String::from(id),
            annotator: None,
            table: None,
            annotations: BTreeMap::new(),
            cursor: None,
            stage: Stage::Unauthenticated,
        }
    }

    pub fn annotator(&self) -> Option<&str> {
        self.annotator.as_deref()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn table(&self) -> Option<&RecordTable> {
        self.table.as_ref()
    }

    pub fn annotation(&self, position: usize) -> Option<&Annotation> {
        self.annotations.get(&position)
    }

    pub fn annotated_count(&self) -> usize {
        self.annotations.len()
    }

    /// Sets the annotator once. `roster` is the list of accepted IDs.
    pub fn select_annotator(&mut self, annotator_id: &str, roster: &[String]) -> Result<()> {
        if let Some(current) = &self.annotator {
            return Err(Error::AnnotatorAlreadySelected(current.clone()));
        }
        if annotator_id.is_empty() || !roster.iter().any(|a| a.eq(annotator_id)) {
            return Err(Error::UnknownAnnotator(String::from(annotator_id)));
        }
        self.annotator = Some(String::from(annotator_id));
        self.stage = Stage::Identified;
        log::info!("Session {} logged in as `{}`", self.id, annotator_id);
        Ok(())
    }

    /// Replaces the current table. Annotations of a previous table are
    /// dropped since their positions refer to other rows.
    pub fn load_table(&mut self, table: RecordTable) -> Result<TableSummary> {
        if self.annotator.is_none() {
            return Err(Error::AnnotatorNotSelected);
        }
        if !self.annotations.is_empty() {
            log::warn!(
                "Session {} discards {} annotations of `{}`",
                self.id,
                self.annotations.len(),
                self.table.as_ref().map_or("", |t| t.file_name())
            );
        }
        let summary = TableSummary {
            file_name: String::from(table.file_name()),
            columns: table.columns().to_vec(),
            row_count: table.row_count(),
        };
        self.table = Some(table);
        self.annotations.clear();
        self.cursor = None;
        self.stage = Stage::TableLoaded;
        Ok(summary)
    }

    /// Parses an upload and loads it. Nothing changes when parsing fails.
    pub fn load_xlsx(&mut self, file_name: &str, buf: Vec<u8>) -> Result<TableSummary> {
        if self.annotator.is_none() {
            return Err(Error::AnnotatorNotSelected);
        }
        let table = table::read_xlsx(file_name, buf)?;
        self.load_table(table)
    }

    /// Maps a 1-based example number to a row position.
    pub fn position_of(&self, example: usize) -> Result<usize> {
        let t = self.loaded_table()?;
        if example == 0 || example > t.row_count() {
            return Err(Error::RowOutOfRange {
                example,
                row_count: t.row_count(),
            });
        }
        Ok(example - 1)
    }

    pub fn view_row(&mut self, position: usize) -> Result<RowView> {
        let t = self.loaded_table()?;
        let Some(record) = t.record(position) else {
            return Err(Error::RowOutOfRange {
                example: position.saturating_add(1),
                row_count: t.row_count(),
            });
        };
        let view = RowView {
            position,
            example: position + 1,
            row_count: t.row_count(),
            annotated_count: self.annotations.len(),
            summary_html: render_summary(&record.text(SUMMARY_COLUMN)),
            question: record.text(QUESTION_COLUMN),
            answer: record.text(ANSWER_COLUMN),
            annotation: self.annotations.get(&position).map(AnnotationForm::from),
        };
        self.cursor = Some(position);
        self.stage = Stage::RowSelected;
        Ok(view)
    }

    /// Stores the form as the annotation of `position`, replacing whatever was
    /// saved there before. Fields are not merged.
    pub fn save_annotation(&mut self, position: usize, form: &AnnotationForm) -> Result<SaveReceipt> {
        let row_count = self.loaded_table()?.row_count();
        if position >= row_count {
            return Err(Error::RowOutOfRange {
                example: position.saturating_add(1),
                row_count,
            });
        }
        let annotation = Annotation::try_from(form)?;
        if self.annotations.insert(position, annotation).is_some() {
            log::info!("Session {} overwrote annotation #{}", self.id, position + 1);
        }
        self.cursor = Some(position);
        self.stage = Stage::AnnotationSaved;
        Ok(SaveReceipt {
            example: position + 1,
            annotated_count: self.annotations.len(),
            message: format!("Annotation for example #{} saved.", position + 1),
        })
    }

    /// Builds the download: every original row, the annotation columns filled
    /// for annotated rows only.
    pub fn export(&self) -> Result<Export> {
        let annotator = self.annotator.as_deref().ok_or(Error::AnnotatorNotSelected)?;
        let t = self.loaded_table()?;

        let mut columns = t.columns().to_vec();
        let mut targets = [0usize; ANNOTATION_COLUMNS.len()];
        for (i, name) in ANNOTATION_COLUMNS.iter().enumerate() {
            targets[i] = match t.column_index(name) {
                Some(idx) => idx,
                None => {
                    columns.push(String::from(*name));
                    columns.len() - 1
                }
            };
        }

        let rows = t
            .rows()
            .iter()
            .enumerate()
            .map(|(position, cells)| {
                let mut row = cells.clone();
                row.resize(columns.len(), CellValue::Empty);
                if let Some(a) = self.annotations.get(&position) {
                    for (target, value) in targets.iter().zip(a.cells()) {
                        row[*target] = value;
                    }
                }
                row
            })
            .collect();

        Ok(Export {
            file_name: table::export_file_name(annotator, t.file_name()),
            annotated_count: self.annotations.len(),
            columns,
            rows,
        })
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            stage: self.stage,
            annotator_id: self.annotator.clone(),
            file_name: self.table.as_ref().map(|t| String::from(t.file_name())),
            row_count: self.table.as_ref().map_or(0, |t| t.row_count()),
            annotated_count: self.annotations.len(),
            current_example: self.cursor.map(|p| p + 1),
        }
    }

    fn loaded_table(&self) -> Result<&RecordTable> {
        if self.annotator.is_none() {
            return Err(Error::AnnotatorNotSelected);
        }
        self.table.as_ref().ok_or(Error::NoTableLoaded)
    }
}

/// The annotated table ready to be written out.
#[derive(Debug)]
pub struct Export {
    pub file_name: String,
    pub annotated_count: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Export {
    pub fn to_xlsx(&self) -> Result<Vec<u8>> {
        table::write_xlsx(&self.columns, &self.rows)
    }
}
