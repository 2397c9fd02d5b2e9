use std::default::Default;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::result::{Error, Result};
use crate::web::server::{to_res, AppState};

pub(crate) const SETTINGS_FILE: &str = "settings.json";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    pub ip: String,
    pub port: u16,
    #[serde(rename = "maxSessionDurationMin")]
    pub max_session_duration_min: u16,
    pub annotators: Vec<String>,
    #[serde(rename = "maxUploadSizeMb")]
    pub max_upload_size_mb: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            ip: String::from("127.0.0.1"),
            port: 12716,
            max_session_duration_min: 30,
            annotators: vec![String::from("ka"), String::from("matt")],
            max_upload_size_mb: 20,
        }
    }
}

impl Settings {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb as usize * 1024 * 1024
    }

    pub fn validate(&self) -> Result<()> {
        let addr = self.listen_addr();
        let _: SocketAddr = addr.parse().map_err(|_| {
            log::error!("Saving invalid listen IP: {}", &addr);
            Error::ErrorWithMessage(String::from("Invalid listening address"))
        })?;
        if self.max_session_duration_min == 0 {
            return Err(Error::ErrorWithMessage(String::from(
                "Session duration must be at least one minute",
            )));
        }
        if self.max_upload_size_mb == 0 {
            return Err(Error::ErrorWithMessage(String::from(
                "Upload size limit must be at least 1 MB",
            )));
        }
        if self.annotators.is_empty() || self.annotators.iter().any(|a| a.trim().is_empty()) {
            return Err(Error::ErrorWithMessage(String::from(
                "Annotator IDs must not be empty",
            )));
        }
        Ok(())
    }
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

/// Loads settings from `data_dir`, writing the defaults when the file is
/// missing or `reset` is requested.
pub fn init(data_dir: &Path, reset: bool) -> Result<Settings> {
    let p = settings_path(data_dir);
    if reset || !p.exists() {
        let s = Settings::default();
        save_settings(data_dir, &s)?;
        log::info!("Wrote default settings to {}", p.display());
        return Ok(s);
    }
    let text = std::fs::read_to_string(&p)?;
    let s: Settings = serde_json::from_str(&text)?;
    s.validate()?;
    Ok(s)
}

pub fn save_settings(data_dir: &Path, data: &Settings) -> Result<()> {
    data.validate()?;
    if !data_dir.exists() {
        std::fs::create_dir_all(data_dir)?;
    }
    let text = serde_json::to_string_pretty(data)?;
    std::fs::write(settings_path(data_dir), text)?;
    Ok(())
}

pub(crate) async fn get(State(state): State<AppState>) -> impl IntoResponse {
    to_res::<Settings>(Ok(state.settings.as_ref().clone()))
}

/// Saved settings take effect on the next start.
pub(crate) async fn save(
    State(state): State<AppState>,
    Json(data): Json<Settings>,
) -> impl IntoResponse {
    to_res(save_settings(&state.data_dir, &data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_start_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let s = init(&data_dir, false).unwrap();
        assert_eq!(s, Settings::default());
        assert!(settings_path(&data_dir).exists());
    }

    #[test]
    fn saved_settings_are_loaded_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = Settings::default();
        s.annotators.push(String::from("lee"));
        s.port = 8080;
        save_settings(dir.path(), &s).unwrap();
        assert_eq!(init(dir.path(), false).unwrap(), s);
        assert_eq!(init(dir.path(), true).unwrap(), Settings::default());
    }

    #[test]
    fn rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = Settings::default();
        s.ip = String::from("not an ip");
        assert!(save_settings(dir.path(), &s).is_err());
        let mut s = Settings::default();
        s.annotators = vec![String::from(" ")];
        assert!(s.validate().is_err());
        let mut s = Settings::default();
        s.max_session_duration_min = 0;
        assert!(s.validate().is_err());
    }
}
