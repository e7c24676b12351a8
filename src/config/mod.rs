use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub export: ExportConfig,
}

/// Input/output directory conventions, relative to the project root
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Raw monthly workbooks (`Consolidated_list_for_*.xls(x)`)
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,

    /// Pipeline JSON artifacts
    #[serde(default = "default_json_dir")]
    pub json_dir: PathBuf,

    /// Static data directory the site serves from
    #[serde(default = "default_public_data_dir")]
    pub public_data_dir: PathBuf,
}

/// Export behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    /// Leaderboard size
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Mirror site-facing artifacts into `public_data_dir`
    #[serde(default = "default_true")]
    pub mirror_to_public: bool,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_raw_dir() -> PathBuf {
    PathBuf::from("data/mpf/raw")
}
fn default_json_dir() -> PathBuf {
    PathBuf::from("data/mpf/json")
}
fn default_public_data_dir() -> PathBuf {
    PathBuf::from("public/data")
}
fn default_top_n() -> usize {
    10
}
fn default_true() -> bool {
    true
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("MPF").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|_| AppConfig::default());
        Ok(app_cfg)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                raw_dir: default_raw_dir(),
                json_dir: default_json_dir(),
                public_data_dir: default_public_data_dir(),
            },
            export: ExportConfig {
                top_n: default_top_n(),
                mirror_to_public: true,
            },
        }
    }
}
