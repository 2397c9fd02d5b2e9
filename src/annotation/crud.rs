use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::dto::{
    AnnotatorRequest, ChoiceLists, LegendEntry, NewSession, RowQuery, SaveRequest, SessionQuery,
    TableSummary,
};
use super::session::Export;
use crate::render::HighlightTag;
use crate::result::{Error, Result};
use crate::table;
use crate::web::server::{to_res, AppState};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub(crate) async fn annotators(State(state): State<AppState>) -> impl IntoResponse {
    to_res::<Vec<String>>(Ok(state.settings.annotators.clone()))
}

pub(crate) async fn choices() -> impl IntoResponse {
    to_res(Ok(ChoiceLists::new()))
}

pub(crate) async fn legend() -> impl IntoResponse {
    let entries: Vec<LegendEntry> = HighlightTag::ALL
        .iter()
        .map(|t| LegendEntry {
            tag: t.name(),
            color: t.color(),
            description: t.description(),
        })
        .collect();
    to_res(Ok(entries))
}

pub(crate) async fn new_session(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.sessions.create();
    to_res(Ok(NewSession { session_id }))
}

pub(crate) async fn status(
    State(state): State<AppState>,
    Query(q): Query<SessionQuery>,
) -> impl IntoResponse {
    to_res(state.sessions.with_session(&q.session_id, |s| Ok(s.status())))
}

pub(crate) async fn close(
    State(state): State<AppState>,
    Query(q): Query<SessionQuery>,
) -> impl IntoResponse {
    to_res(Ok(state.sessions.remove(&q.session_id)))
}

pub(crate) async fn select_annotator(
    State(state): State<AppState>,
    Query(q): Query<SessionQuery>,
    Json(req): Json<AnnotatorRequest>,
) -> impl IntoResponse {
    let roster = &state.settings.annotators;
    let r = state.sessions.with_session(&q.session_id, |s| {
        s.select_annotator(&req.annotator_id, roster)?;
        Ok(s.status())
    });
    if let Err(e) = &r {
        log::warn!("Annotator selection rejected: {}", e);
    }
    to_res(r)
}

pub(crate) async fn upload_table(
    State(state): State<AppState>,
    Query(q): Query<SessionQuery>,
    multipart: Multipart,
) -> impl IntoResponse {
    let r = upload_table_inner(&state, &q.session_id, multipart).await;
    match &r {
        Ok(t) => log::info!(
            "Session {} loaded `{}` with {} rows",
            &q.session_id,
            t.file_name,
            t.row_count
        ),
        Err(e) => log::warn!("Upload rejected for session {}: {}", &q.session_id, e),
    }
    to_res::<TableSummary>(r)
}

/// The workbook is parsed without holding the session lock, only the parsed
/// table is handed to the session.
async fn upload_table_inner(
    state: &AppState,
    session_id: &str,
    multipart: Multipart,
) -> Result<TableSummary> {
    state.sessions.with_session(session_id, |s| {
        s.annotator().map(|_| ()).ok_or(Error::AnnotatorNotSelected)
    })?;
    let (file_name, data) = read_upload(multipart).await?;
    let table = table::read_xlsx(&file_name, data)?;
    state
        .sessions
        .with_session(session_id, |s| s.load_table(table))
}

/// Takes the first file field of the form.
async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>)> {
    loop {
        let Some(field) = multipart.next_field().await? else {
            return Err(Error::MissingUpload);
        };
        let Some(file_name) = field.file_name() else {
            continue;
        };
        let file_name = file_name.to_string();
        if !file_name.to_lowercase().ends_with(".xlsx") {
            return Err(Error::UnsupportedFileType(file_name));
        }
        let data = field.bytes().await?;
        log::info!("Length of `{file_name}` is {} bytes", data.len());
        return Ok((file_name, data.to_vec()));
    }
}

pub(crate) async fn view_row(
    State(state): State<AppState>,
    Query(q): Query<RowQuery>,
) -> impl IntoResponse {
    let r = state.sessions.with_session(&q.session_id, |s| {
        let position = s.position_of(q.example)?;
        s.view_row(position)
    });
    to_res(r)
}

pub(crate) async fn save_annotation(
    State(state): State<AppState>,
    Query(q): Query<SessionQuery>,
    Json(req): Json<SaveRequest>,
) -> impl IntoResponse {
    let r = state.sessions.with_session(&q.session_id, |s| {
        let position = s.position_of(req.example)?;
        s.save_annotation(position, &req.fields)
    });
    match &r {
        Ok(receipt) => log::info!("Session {}: {}", &q.session_id, receipt.message),
        Err(e) => log::warn!("Save rejected for session {}: {}", &q.session_id, e),
    }
    to_res(r)
}

pub(crate) async fn export(
    State(state): State<AppState>,
    Query(q): Query<SessionQuery>,
) -> Response {
    let (export, buf) = match export_inner(&state, &q.session_id) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("Export failed for session {}: {}", &q.session_id, e);
            return to_res::<()>(Err(e)).into_response();
        }
    };
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(XLSX_CONTENT_TYPE),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(&export.file_name),
    );
    (StatusCode::OK, headers, buf).into_response()
}

/// Rows are copied out under the session lock, the workbook is written after
/// it is released.
fn export_inner(state: &AppState, session_id: &str) -> Result<(Export, Vec<u8>)> {
    let export = state.sessions.with_session(session_id, |s| s.export())?;
    let buf = export.to_xlsx()?;
    let stamp = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)?;
    log::info!(
        "Exported `{}` with {} annotations at {}",
        export.file_name,
        export.annotated_count,
        stamp
    );
    Ok((export, buf))
}

/// `attachment` with an ASCII `filename` for old clients and the exact name
/// as an RFC 5987 `filename*`.
fn content_disposition(file_name: &str) -> HeaderValue {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' => c,
            _ => '_',
        })
        .collect();
    let mut encoded = String::with_capacity(file_name.len() * 3);
    for b in file_name.bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => encoded.push(b as char),
            _ => encoded.push_str(&format!("%{:02X}", b)),
        }
    }
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    );
    HeaderValue::from_str(&value).unwrap_or_else(|e| {
        log::error!("Invalid Content-Disposition `{}`: {}", value, e);
        HeaderValue::from_static("attachment; filename=\"annotations.xlsx\"")
    })
}
