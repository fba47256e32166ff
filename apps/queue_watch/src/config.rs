use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use serde::Deserialize;
use shared::domain::{QueueId, SessionContext, UserId};

pub const DEFAULT_CONFIG_FILE: &str = "queue_watch.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub queue_id: i64,
    pub current_user_id: i64,
    pub current_user_is_instructor: bool,
    pub log_filter: String,
    pub templates_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:3000".into(),
            queue_id: 1,
            current_user_id: 0,
            current_user_is_instructor: false,
            log_filter: "info".into(),
            templates_path: None,
        }
    }
}

impl Settings {
    pub fn queue_id(&self) -> QueueId {
        QueueId(self.queue_id)
    }

    pub fn session(&self) -> SessionContext {
        SessionContext {
            current_user_id: UserId(self.current_user_id),
            current_user_is_instructor: self.current_user_is_instructor,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            bail!("server_url must start with http:// or https://");
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    queue_id: Option<i64>,
    user_id: Option<i64>,
    instructor: Option<bool>,
    log_filter: Option<String>,
    templates_path: Option<PathBuf>,
}

/// Defaults, then the TOML file, then environment variables. An explicit
/// `config_path` must exist; the default file is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let raw = match config_path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?,
        ),
        None => fs::read_to_string(DEFAULT_CONFIG_FILE).ok(),
    };
    if let Some(raw) = raw {
        apply_file(&mut settings, &raw)?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw).context("invalid config file")?;
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.queue_id {
        settings.queue_id = v;
    }
    if let Some(v) = file_cfg.user_id {
        settings.current_user_id = v;
    }
    if let Some(v) = file_cfg.instructor {
        settings.current_user_is_instructor = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    if let Some(v) = file_cfg.templates_path {
        settings.templates_path = Some(v);
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("QUEUE_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }

    for key in ["QUEUE_ID", "APP__QUEUE_ID"] {
        if let Some(parsed) = lookup(key).and_then(|v| v.parse().ok()) {
            settings.queue_id = parsed;
        }
    }

    for key in ["QUEUE_USER_ID", "APP__USER_ID"] {
        if let Some(parsed) = lookup(key).and_then(|v| v.parse().ok()) {
            settings.current_user_id = parsed;
        }
    }

    for key in ["QUEUE_INSTRUCTOR", "APP__INSTRUCTOR"] {
        if let Some(parsed) = lookup(key).and_then(|v| parse_flag(&v)) {
            settings.current_user_is_instructor = parsed;
        }
    }

    if let Some(v) = lookup("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
