//! Application configuration.
//!
//! Replaces the classic per-year properties file with a TOML profile:
//! one `[catalog]` target for the shared process/indicator/attribute
//! tables, and one `[years."<start>_<end>"]` target per academic-year
//! database. Every field can be overridden through environment
//! variables prefixed `INDICATOR_UPLOAD_`.

use std::collections::HashMap;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

use crate::domain::error::{AppError, Result};

const CONFIG_FILE_ENV: &str = "INDICATOR_UPLOAD_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "indicator-upload.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Shared database holding process, indicator and attribute catalogs.
    pub catalog: DbTarget,

    /// Year-partitioned databases, keyed by registry key ("2021_2022").
    #[serde(default)]
    pub years: HashMap<String, DbTarget>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// One PostgreSQL connection target.
#[derive(Debug, Clone, Deserialize)]
pub struct DbTarget {
    pub host: String,
    #[serde(default = "default_pg_port")]
    pub port: u16,
    pub database: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn default_pg_port() -> u16 {
    5432
}

impl DbTarget {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(&self.password)
    }
}

impl AppConfig {
    /// Load from the TOML profile (path from `INDICATOR_UPLOAD_CONFIG`,
    /// default `indicator-upload.toml`) merged with env overrides.
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_figment(Figment::from(Toml::file(&path)))
    }

    pub(crate) fn from_figment(figment: Figment) -> Result<Self> {
        figment
            .merge(Env::prefixed("INDICATOR_UPLOAD_").split("__"))
            .extract()
            .map_err(|e| AppError::Config(format!("Failed to load configuration: {}", e)))
    }
}
