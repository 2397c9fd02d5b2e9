use std::path::Path;

/// Suffix reviewers put on files that still need annotating.
pub const REVIEW_STATUS_SUFFIX: &str = "_TODO";

/// `qa_pairs_123_A_TODO.xlsx` annotated by `ka` exports as `ka_qa_pairs_123_A.xlsx`.
pub fn export_file_name(annotator_id: &str, uploaded_name: &str) -> String {
    let base = Path::new(uploaded_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(uploaded_name);
    let base = base.strip_suffix(REVIEW_STATUS_SUFFIX).unwrap_or(base);
    format!("{}_{}.xlsx", annotator_id, base)
}
