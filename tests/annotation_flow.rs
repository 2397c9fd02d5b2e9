use legalqa_annotator::annotation::dto::{AnnotationForm, Stage, ANNOTATION_COLUMNS};
use legalqa_annotator::annotation::{Session, SessionStore};
use legalqa_annotator::result::{Error, ErrorKind};
use legalqa_annotator::table::{read_xlsx, CellValue};
use rust_xlsxwriter::Workbook;

fn roster() -> Vec<String> {
    vec![String::from("ka"), String::from("matt")]
}

/// Builds an upload with the given header and text rows.
fn workbook(header: &[&str], rows: &[Vec<&str>]) -> Vec<u8> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    for (c, h) in header.iter().enumerate() {
        ws.write_string(0, c as u16, *h).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, v) in row.iter().enumerate() {
            if !v.is_empty() {
                ws.write_string(r as u32 + 1, c as u16, *v).unwrap();
            }
        }
    }
    wb.save_to_buffer().unwrap()
}

fn qa_workbook() -> Vec<u8> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    for (c, h) in ["case_id", "ann_summary", "question", "answer", "reason"]
        .iter()
        .enumerate()
    {
        ws.write_string(0, c as u16, *h).unwrap();
    }
    for r in 1..=4u32 {
        ws.write_number(r, 0, r as f64 * 10.0).unwrap();
        ws.write_string(
            r,
            1,
            format!("<Issue>Issue {}</Issue>\nThe court held <Conclusion>costs of $500</Conclusion>.", r),
        )
        .unwrap();
        ws.write_string(r, 2, format!("Question {}?", r)).unwrap();
        ws.write_string(r, 3, format!("Answer {}.", r)).unwrap();
        if r % 2 == 0 {
            ws.write_boolean(r, 4, true).unwrap();
        }
    }
    wb.save_to_buffer().unwrap()
}

fn identified() -> Session {
    let mut s = Session::new("test");
    s.select_annotator("ka", &roster()).unwrap();
    s
}

fn form(pairs: &[(&str, &str)]) -> AnnotationForm {
    let mut value = serde_json::Map::new();
    for (k, v) in pairs {
        value.insert(String::from(*k), serde_json::Value::from(*v));
    }
    serde_json::from_value(serde_json::Value::Object(value)).unwrap()
}

#[test]
fn upload_view_save_export() {
    let mut s = identified();
    let summary = s
        .load_xlsx("qa_pairs_1996canlii6900_A_TODO.xlsx", qa_workbook())
        .unwrap();
    assert_eq!(summary.row_count, 4);
    assert_eq!(summary.columns[1], "ann_summary");
    assert_eq!(s.stage(), Stage::TableLoaded);

    let position = s.position_of(2).unwrap();
    let view = s.view_row(position).unwrap();
    assert_eq!(view.question, "Question 2?");
    assert!(view.summary_html.contains(r"costs of \$500"));
    assert!(view.summary_html.contains("#ffcccc"));
    assert!(!view.summary_html.contains('\n'));

    let f = form(&[
        ("questionType", "Issue"),
        ("questionTypeReason", "asks for the key issue"),
        ("persona", "Layperson"),
        ("answerFactualAccuracy", "Correct"),
        ("answerGrounding", "Unclear"),
        ("answerResponsiveness", "Incorrect"),
        ("comment", "answer is vague"),
    ]);
    s.save_annotation(position, &f).unwrap();
    assert_eq!(s.view_row(position).unwrap().annotation, Some(f));

    let export = s.export().unwrap();
    assert_eq!(export.file_name, "ka_qa_pairs_1996canlii6900_A.xlsx");
    let back = read_xlsx(&export.file_name, export.to_xlsx().unwrap()).unwrap();
    assert_eq!(back.row_count(), 4);
    assert_eq!(back.columns().len(), 5 + ANNOTATION_COLUMNS.len());

    let annotated = back.record(1).unwrap();
    assert_eq!(annotated.text("question"), "Question 2?");
    assert_eq!(annotated.text("question_type"), "Issue");
    assert_eq!(annotated.text("persona"), "Layperson");
    assert_eq!(annotated.text("persona_reason"), "");
    assert_eq!(annotated.text("answer_responsiveness"), "Incorrect");
    assert_eq!(annotated.text("comment"), "answer is vague");
    assert_eq!(annotated.get("case_id"), Some(&CellValue::Number(20.0)));
    assert_eq!(annotated.get("reason"), Some(&CellValue::Bool(true)));

    for position in [0, 2, 3] {
        let r = back.record(position).unwrap();
        assert!(ANNOTATION_COLUMNS.iter().all(|c| r.text(c).is_empty()));
    }
}

#[test]
fn export_before_any_save_keeps_original_values() {
    let mut s = identified();
    s.load_xlsx("batch.xlsx", qa_workbook()).unwrap();
    let original = read_xlsx("batch.xlsx", qa_workbook()).unwrap();
    let export = s.export().unwrap();
    let back = read_xlsx(&export.file_name, export.to_xlsx().unwrap()).unwrap();

    assert_eq!(&back.columns()[..5], original.columns());
    for (row, orig) in back.rows().iter().zip(original.rows()) {
        assert_eq!(&row[..5], &orig[..]);
        assert!(row[5..].iter().all(|c| c.is_empty()));
    }
}

#[test]
fn overwrite_is_not_a_merge() {
    let mut s = identified();
    s.load_xlsx("batch.xlsx", qa_workbook()).unwrap();
    s.save_annotation(0, &form(&[("questionType", "Issue")])).unwrap();
    s.save_annotation(0, &form(&[("comment", "x")])).unwrap();
    let view = s.view_row(0).unwrap();
    let a = view.annotation.unwrap();
    assert_eq!(a.question_type, "");
    assert_eq!(a.comment, "x");
}

#[test]
fn missing_columns_leave_previous_table() {
    let mut s = identified();
    s.load_xlsx("good.xlsx", qa_workbook()).unwrap();
    s.save_annotation(3, &form(&[("persona", "Professional")])).unwrap();

    let bad = workbook(&["ann_summary", "question"], &[vec!["s", "q"]]);
    let err = s.load_xlsx("bad.xlsx", bad).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputFormat);
    assert!(matches!(err, Error::MissingColumns(ref c) if c == &vec![String::from("answer")]));

    let err = s.load_xlsx("notes.xlsx", b"plain text".to_vec()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputFormat);

    assert_eq!(s.table().unwrap().file_name(), "good.xlsx");
    assert_eq!(s.annotated_count(), 1);
}

#[test]
fn blank_summary_renders_empty() {
    let mut s = identified();
    let buf = workbook(
        &["ann_summary", "question", "answer"],
        &[vec!["", "q", "a"], vec!["x", "", ""]],
    );
    s.load_xlsx("blank.xlsx", buf).unwrap();
    assert_eq!(s.view_row(0).unwrap().summary_html, "");
    let v = s.view_row(1).unwrap();
    assert_eq!(v.question, "");
    assert_eq!(v.summary_html, "x");
}

#[test]
fn session_order_is_enforced() {
    let mut s = Session::new("test");
    let err = s.load_xlsx("a.xlsx", qa_workbook()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Session);
    assert!(s.export().is_err());

    s.select_annotator("matt", &roster()).unwrap();
    assert!(matches!(s.view_row(0), Err(Error::NoTableLoaded)));
    assert!(matches!(s.position_of(1), Err(Error::NoTableLoaded)));
}

#[test]
fn store_routes_operations_to_the_right_session() {
    let store = SessionStore::new();
    let ka = store.create();
    let matt = store.create();
    store
        .with_session(&ka, |s| s.select_annotator("ka", &roster()))
        .unwrap();
    store
        .with_session(&matt, |s| s.select_annotator("matt", &roster()))
        .unwrap();
    store
        .with_session(&ka, |s| s.load_xlsx("batch_TODO.xlsx", qa_workbook()))
        .unwrap();

    let name = store
        .with_session(&ka, |s| Ok(s.export()?.file_name))
        .unwrap();
    assert_eq!(name, "ka_batch.xlsx");
    let err = store.with_session(&matt, |s| s.export()).unwrap_err();
    assert!(matches!(err, Error::NoTableLoaded));
}
