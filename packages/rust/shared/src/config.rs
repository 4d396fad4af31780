//! Application configuration for pipelens.
//!
//! User config lives at `~/.pipelens/pipelens.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelensError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pipelens.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pipelens";

// ---------------------------------------------------------------------------
// Config structs (matching pipelens.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Names of the required source columns.
    #[serde(default)]
    pub columns: ColumnsConfig,

    /// Priority-ordered alias lists for optional columns.
    #[serde(default)]
    pub aliases: ColumnAliases,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Number of companies kept by the score ranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Default sort preset for metrics rows.
    #[serde(default = "default_sort")]
    pub sort: String,

    /// Output format: "json" or "text".
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            sort: default_sort(),
            format: default_format(),
        }
    }
}

fn default_top_n() -> usize {
    10
}
fn default_sort() -> String {
    "offers".into()
}
fn default_format() -> String {
    "json".into()
}

/// `[columns]` section: required source column names.
///
/// Defaults are the field names used by the recruiting CRM export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnsConfig {
    #[serde(default = "default_candidate_id")]
    pub candidate_id: String,
    #[serde(default = "default_company")]
    pub company: String,
    #[serde(default = "default_submitted_at")]
    pub submitted_at: String,
    #[serde(default = "default_interviewed_at")]
    pub interviewed_at: String,
    #[serde(default = "default_interview_round")]
    pub interview_round: String,
    #[serde(default = "default_final_interview")]
    pub final_interview: String,
    #[serde(default = "default_offered_at")]
    pub offered_at: String,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            candidate_id: default_candidate_id(),
            company: default_company(),
            submitted_at: default_submitted_at(),
            interviewed_at: default_interviewed_at(),
            interview_round: default_interview_round(),
            final_interview: default_final_interview(),
            offered_at: default_offered_at(),
            status: default_status(),
        }
    }
}

impl ColumnsConfig {
    /// All required column names, in schema order.
    pub fn required(&self) -> [&str; 8] {
        [
            &self.candidate_id,
            &self.company,
            &self.submitted_at,
            &self.interviewed_at,
            &self.interview_round,
            &self.final_interview,
            &self.offered_at,
            &self.status,
        ]
    }
}

fn default_candidate_id() -> String {
    "求職者：求職者ID".into()
}
fn default_company() -> String {
    "企業：企業名".into()
}
fn default_submitted_at() -> String {
    "進捗：書類提出日".into()
}
fn default_interviewed_at() -> String {
    "進捗：面接日".into()
}
fn default_interview_round() -> String {
    "進捗：面接回数".into()
}
fn default_final_interview() -> String {
    "進捗：最終面接フラグ".into()
}
fn default_offered_at() -> String {
    "進捗：内定日".into()
}
fn default_status() -> String {
    "進捗：ステータス".into()
}

/// `[aliases]` section: candidate names for each optional column.
///
/// Order is priority: the first name present in the input wins, so the
/// canonical export name always comes before speculative fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAliases {
    #[serde(default = "default_job_id_aliases")]
    pub job_id: Vec<String>,
    #[serde(default = "default_case_advisor_aliases")]
    pub case_advisor: Vec<String>,
    #[serde(default = "default_scout_aliases")]
    pub scout: Vec<String>,
    #[serde(default = "default_meeting_date_aliases")]
    pub meeting_date: Vec<String>,
    #[serde(default = "default_application_approved_aliases")]
    pub application_approved: Vec<String>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            job_id: default_job_id_aliases(),
            case_advisor: default_case_advisor_aliases(),
            scout: default_scout_aliases(),
            meeting_date: default_meeting_date_aliases(),
            application_approved: default_application_approved_aliases(),
        }
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

fn default_job_id_aliases() -> Vec<String> {
    owned(&["求人：求人ID", "求人ID", "進捗：求人ID", "job_id"])
}
fn default_case_advisor_aliases() -> Vec<String> {
    owned(&["求職者：担当者", "求職者：担当CA", "担当CA", "担当者", "case_advisor"])
}
fn default_scout_aliases() -> Vec<String> {
    owned(&["スカウト担当者", "求職者：スカウト担当者", "スカウター", "scout"])
}
fn default_meeting_date_aliases() -> Vec<String> {
    owned(&["求職者：面談日", "求職者：初回面談日", "面談日", "meeting_date"])
}
fn default_application_approved_aliases() -> Vec<String> {
    owned(&["進捗：応募承諾日", "応募承諾日", "進捗：紹介日", "application_approved_at"])
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pipelens/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PipelensError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pipelens/pipelens.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PipelensError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PipelensError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PipelensError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PipelensError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PipelensError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("top_n"));
        assert!(toml_str.contains("企業：企業名"));
        assert!(toml_str.contains("スカウト担当者"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.top_n, 10);
        assert_eq!(parsed.columns, ColumnsConfig::default());
        assert_eq!(parsed.aliases, ColumnAliases::default());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[columns]
company = "company_name"

[aliases]
scout = ["sourcer", "scout"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.columns.company, "company_name");
        assert_eq!(config.columns.candidate_id, "求職者：求職者ID");
        assert_eq!(config.aliases.scout, vec!["sourcer", "scout"]);
        assert_eq!(config.aliases.meeting_date[0], "求職者：面談日");
        assert_eq!(config.defaults.sort, "offers");
    }

    #[test]
    fn required_columns_in_schema_order() {
        let cols = ColumnsConfig::default();
        let required = cols.required();
        assert_eq!(required.len(), 8);
        assert_eq!(required[0], "求職者：求職者ID");
        assert_eq!(required[7], "進捗：ステータス");
    }

    #[test]
    fn load_config_from_missing_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/pipelens.toml")).unwrap_err();
        assert!(matches!(err, PipelensError::Io { .. }));
    }
}
