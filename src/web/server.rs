use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use colored::Colorize;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

use super::asset::{ASSETS, ASSETS_MAP};
use crate::annotation::crud as annotation;
use crate::annotation::{clean_expired_sessions, SessionStore};
use crate::man::settings::{self, Settings};
use crate::result::Error;

pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared by every handler: the open sessions and the startup settings.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub settings: Arc<Settings>,
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn new(settings: Settings, data_dir: &Path) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            settings: Arc::new(settings),
            data_dir: data_dir.to_path_buf(),
        }
    }
}

pub async fn start_app() -> anyhow::Result<()> {
    let data_dir = Path::new(".").join("data");
    let reset = std::env::args().any(|a| a.eq("-rs"));
    let settings = settings::init(&data_dir, reset)
        .map_err(|e| anyhow::anyhow!("Loading settings failed: {}", e))?;

    #[cfg(target_os = "windows")]
    let _ = colored::control::set_virtual_terminal(true);

    log::info!(
        "  -->  Please open a browser and visit {}{}:{}",
        "http://".bright_green(),
        settings.ip.bright_green(),
        settings.port.to_string().blue()
    );
    log::info!("Current version: {}", VERSION);
    log::info!(
        "Annotators: {}",
        settings.annotators.join(", ").bright_yellow()
    );
    log::info!(
        "  -->  Press {} to terminate this application",
        "Ctrl+C".bright_red()
    );

    let addr = settings.listen_addr();
    let max_idle = Duration::from_secs(settings.max_session_duration_min as u64 * 60);
    let state = AppState::new(settings, &data_dir);

    let (sender, recv) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(clean_expired_sessions(
        recv,
        state.sessions.clone(),
        max_idle,
        max_idle,
    ));

    let app = gen_router(state).fallback(fallback);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sender))
        .await?;
    Ok(())
}

pub fn gen_router(state: AppState) -> Router {
    let body_limit = state.settings.max_upload_bytes();
    Router::new()
        .route("/annotators", get(annotation::annotators))
        .route("/choices", get(annotation::choices))
        .route("/legend", get(annotation::legend))
        .route(
            "/session",
            get(annotation::status)
                .post(annotation::new_session)
                .delete(annotation::close),
        )
        .route("/session/annotator", post(annotation::select_annotator))
        .route("/table", post(annotation::upload_table))
        .route("/row", get(annotation::view_row))
        .route("/annotation", post(annotation::save_annotation))
        .route("/export", get(annotation::export))
        .route(
            "/management/settings",
            get(settings::get).post(settings::save),
        )
        .route("/version.json", get(version))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(HeaderValue::from_static("http://localhost:5173"))
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
                .allow_methods([Method::GET, Method::POST, Method::DELETE]),
        )
        .with_state(state)
}

async fn fallback(uri: Uri) -> Response {
    let Some(idx) = ASSETS_MAP.get(uri.path()) else {
        return (StatusCode::NOT_FOUND, format!("Not Found: {}", uri.path())).into_response();
    };
    let d = ASSETS[*idx];
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(d.1));
    headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    (StatusCode::OK, headers, d.0).into_response()
}

async fn version() -> impl IntoResponse {
    let mut v = String::with_capacity(15);
    v.push('"');
    v.push_str(VERSION);
    v.push('"');
    v
}

async fn shutdown_signal(sender: tokio::sync::oneshot::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {:?}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install signal handler: {:?}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    if sender.send(()).is_err() {
        log::info!("Session cleaner had already stopped");
    }
    log::info!("This program has been terminated");
}

#[derive(Serialize)]
struct ResponseData<D> {
    pub(crate) status: u16,
    pub(crate) data: Option<D>,
    pub(crate) err: Option<Error>,
}

pub(crate) fn to_res<D>(r: Result<D, Error>) -> impl IntoResponse
where
    D: serde::Serialize + 'static,
{
    let res = match r {
        Ok(d) => ResponseData {
            status: StatusCode::OK.as_u16(),
            data: Some(d),
            err: None,
        },
        Err(e) => ResponseData {
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            data: None,
            err: Some(e),
        },
    };
    let data = match serde_json::to_string(&res) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Serializing response failed: {:?}", e);
            String::from(r#"{"status":500,"data":null,"err":{"kind":"internal","message":"Serializing response failed"}}"#)
        }
    };
    let mut header_map = HeaderMap::new();
    header_map.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    (StatusCode::OK, header_map, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(r: impl IntoResponse) -> serde_json::Value {
        let body = r.into_response().into_body();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn envelope_carries_data() {
        let v = body_json(to_res(Ok(vec![1, 2]))).await;
        assert_eq!(v["status"], 200);
        assert_eq!(v["data"], serde_json::json!([1, 2]));
        assert!(v["err"].is_null());
    }

    #[tokio::test]
    async fn envelope_carries_error_kind() {
        let v = body_json(to_res::<()>(Err(Error::NoTableLoaded))).await;
        assert_eq!(v["status"], 500);
        assert_eq!(v["err"]["kind"], "session");
        assert_eq!(v["err"]["message"], "Please upload an Excel file first");
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let r = fallback("/missing.js".parse().unwrap()).await;
        assert_eq!(r.status(), StatusCode::NOT_FOUND);
        let r = fallback("/".parse().unwrap()).await;
        assert_eq!(r.headers()[header::CONTENT_ENCODING], "gzip");
    }
}
