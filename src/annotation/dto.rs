use std::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::result::{Error, Result};
use crate::table::{CellValue, MAX_CELL_CHARS};

/// A fixed set of labels offered in a select box. The empty choice is
/// represented by `None` wherever a choice is stored.
pub trait Choice: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;

    fn parse(field: &'static str, value: &str) -> Result<Option<Self>> {
        if value.is_empty() {
            return Ok(None);
        }
        Self::ALL
            .iter()
            .find(|c| c.label().eq(value))
            .copied()
            .map(Some)
            .ok_or_else(|| Error::InvalidChoice {
                field,
                value: String::from(value),
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionType {
    Issue,
    Reason,
    Conclusion,
    Factual,
}

impl Choice for QuestionType {
    const ALL: &'static [Self] = &[Self::Issue, Self::Reason, Self::Conclusion, Self::Factual];

    fn label(&self) -> &'static str {
        match self {
            Self::Issue => "Issue",
            Self::Reason => "Reason",
            Self::Conclusion => "Conclusion",
            Self::Factual => "Factual",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Persona {
    Layperson,
    Professional,
}

impl Choice for Persona {
    const ALL: &'static [Self] = &[Self::Layperson, Self::Professional];

    fn label(&self) -> &'static str {
        match self {
            Self::Layperson => "Layperson",
            Self::Professional => "Professional",
        }
    }
}

/// Verdict on one quality dimension of an answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Judgment {
    Correct,
    Incorrect,
    Unclear,
}

impl Choice for Judgment {
    const ALL: &'static [Self] = &[Self::Correct, Self::Incorrect, Self::Unclear];

    fn label(&self) -> &'static str {
        match self {
            Self::Correct => "Correct",
            Self::Incorrect => "Incorrect",
            Self::Unclear => "Unclear",
        }
    }
}

pub const QUESTION_TYPE: &str = "question_type";
pub const QUESTION_TYPE_REASON: &str = "question_type_reason";
pub const PERSONA: &str = "persona";
pub const PERSONA_REASON: &str = "persona_reason";
pub const ANSWER_FACTUAL_ACCURACY: &str = "answer_factual_accuracy";
pub const ANSWER_GROUNDING: &str = "answer_grounding";
pub const ANSWER_RESPONSIVENESS: &str = "answer_responsiveness";
pub const COMMENT: &str = "comment";

/// Export column names, in the order they are appended.
pub const ANNOTATION_COLUMNS: [&str; 8] = [
    QUESTION_TYPE,
    QUESTION_TYPE_REASON,
    PERSONA,
    PERSONA_REASON,
    ANSWER_FACTUAL_ACCURACY,
    ANSWER_GROUNDING,
    ANSWER_RESPONSIVENESS,
    COMMENT,
];

/// The judgment recorded for one row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Annotation {
    pub question_type: Option<QuestionType>,
    pub question_type_reason: String,
    pub persona: Option<Persona>,
    pub persona_reason: String,
    pub answer_factual_accuracy: Option<Judgment>,
    pub answer_grounding: Option<Judgment>,
    pub answer_responsiveness: Option<Judgment>,
    pub comment: String,
}

impl Annotation {
    /// Cell values in `ANNOTATION_COLUMNS` order.
    pub fn cells(&self) -> [CellValue; 8] {
        [
            choice_cell(self.question_type),
            CellValue::from(self.question_type_reason.as_str()),
            choice_cell(self.persona),
            CellValue::from(self.persona_reason.as_str()),
            choice_cell(self.answer_factual_accuracy),
            choice_cell(self.answer_grounding),
            choice_cell(self.answer_responsiveness),
            CellValue::from(self.comment.as_str()),
        ]
    }
}

fn choice_cell<C: Choice>(c: Option<C>) -> CellValue {
    c.map_or(CellValue::Empty, |c| CellValue::from(c.label()))
}

fn choice_label<C: Choice>(c: Option<C>) -> String {
    c.map_or_else(String::new, |c| String::from(c.label()))
}

/// Form values as the page submits and pre-fills them. Fields left out of a
/// submission are empty, a save always replaces the whole annotation.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AnnotationForm {
    #[serde(rename = "questionType")]
    pub question_type: String,
    #[serde(rename = "questionTypeReason")]
    pub question_type_reason: String,
    pub persona: String,
    #[serde(rename = "personaReason")]
    pub persona_reason: String,
    #[serde(rename = "answerFactualAccuracy")]
    pub answer_factual_accuracy: String,
    #[serde(rename = "answerGrounding")]
    pub answer_grounding: String,
    #[serde(rename = "answerResponsiveness")]
    pub answer_responsiveness: String,
    pub comment: String,
}

impl TryFrom<&AnnotationForm> for Annotation {
    type Error = Error;

    fn try_from(f: &AnnotationForm) -> Result<Self> {
        Ok(Annotation {
            question_type: QuestionType::parse(QUESTION_TYPE, &f.question_type)?,
            question_type_reason: free_text(QUESTION_TYPE_REASON, &f.question_type_reason)?,
            persona: Persona::parse(PERSONA, &f.persona)?,
            persona_reason: free_text(PERSONA_REASON, &f.persona_reason)?,
            answer_factual_accuracy: Judgment::parse(
                ANSWER_FACTUAL_ACCURACY,
                &f.answer_factual_accuracy,
            )?,
            answer_grounding: Judgment::parse(ANSWER_GROUNDING, &f.answer_grounding)?,
            answer_responsiveness: Judgment::parse(
                ANSWER_RESPONSIVENESS,
                &f.answer_responsiveness,
            )?,
            comment: free_text(COMMENT, &f.comment)?,
        })
    }
}

/// Free text must fit in one worksheet cell or the export could not be
/// written.
fn free_text(field: &'static str, value: &str) -> Result<String> {
    let len = value.chars().count();
    if len > MAX_CELL_CHARS {
        return Err(Error::TextTooLong { field, len });
    }
    Ok(String::from(value))
}

impl From<&Annotation> for AnnotationForm {
    fn from(a: &Annotation) -> Self {
        AnnotationForm {
            question_type: choice_label(a.question_type),
            question_type_reason: a.question_type_reason.clone(),
            persona: choice_label(a.persona),
            persona_reason: a.persona_reason.clone(),
            answer_factual_accuracy: choice_label(a.answer_factual_accuracy),
            answer_grounding: choice_label(a.answer_grounding),
            answer_responsiveness: choice_label(a.answer_responsiveness),
            comment: a.comment.clone(),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct SessionQuery {
    #[serde(rename = "sessionId")]
    pub(crate) session_id: String,
}

#[derive(Deserialize)]
pub(crate) struct RowQuery {
    #[serde(rename = "sessionId")]
    pub(crate) session_id: String,
    pub(crate) example: usize,
}

#[derive(Deserialize)]
pub(crate) struct AnnotatorRequest {
    #[serde(rename = "annotatorId")]
    pub(crate) annotator_id: String,
}

#[derive(Deserialize)]
pub(crate) struct SaveRequest {
    pub(crate) example: usize,
    #[serde(flatten)]
    pub(crate) fields: AnnotationForm,
}

#[derive(Serialize)]
pub(crate) struct NewSession {
    #[serde(rename = "sessionId")]
    pub(crate) session_id: String,
}

/// Where a session is in its interaction cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Unauthenticated,
    Identified,
    TableLoaded,
    RowSelected,
    AnnotationSaved,
}

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub stage: Stage,
    #[serde(rename = "annotatorId")]
    pub annotator_id: Option<String>,
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
    #[serde(rename = "rowCount")]
    pub row_count: usize,
    #[serde(rename = "annotatedCount")]
    pub annotated_count: usize,
    #[serde(rename = "currentExample")]
    pub current_example: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TableSummary {
    #[serde(rename = "fileName")]
    pub file_name: String,
    pub columns: Vec<String>,
    #[serde(rename = "rowCount")]
    pub row_count: usize,
}

/// Everything the page needs to show one record and pre-fill its form.
#[derive(Debug, Serialize)]
pub struct RowView {
    pub position: usize,
    pub example: usize,
    #[serde(rename = "rowCount")]
    pub row_count: usize,
    #[serde(rename = "annotatedCount")]
    pub annotated_count: usize,
    #[serde(rename = "summaryHtml")]
    pub summary_html: String,
    pub question: String,
    pub answer: String,
    pub annotation: Option<AnnotationForm>,
}

#[derive(Debug, Serialize)]
pub struct SaveReceipt {
    pub example: usize,
    #[serde(rename = "annotatedCount")]
    pub annotated_count: usize,
    pub message: String,
}

#[derive(Serialize)]
pub(crate) struct ChoiceLists {
    #[serde(rename = "questionType")]
    pub(crate) question_type: Vec<&'static str>,
    pub(crate) persona: Vec<&'static str>,
    pub(crate) judgment: Vec<&'static str>,
}

impl ChoiceLists {
    pub(crate) fn new() -> Self {
        Self {
            question_type: labels::<QuestionType>(),
            persona: labels::<Persona>(),
            judgment: labels::<Judgment>(),
        }
    }
}

fn labels<C: Choice>() -> Vec<&'static str> {
    C::ALL.iter().map(|c| c.label()).collect()
}

#[derive(Serialize)]
pub(crate) struct LegendEntry {
    pub(crate) tag: &'static str,
    pub(crate) color: &'static str,
    pub(crate) description: &'static str,
}
