use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    telegram_bot_token: String,
    /// Directory for state files (logs, records database). Defaults to
    /// current directory.
    data_dir: Option<String>,
    /// Keep a local SQLite copy of every record.
    #[serde(default = "default_true")]
    sqlite: bool,
    /// Spreadsheet to append records to (enables the Sheets collector
    /// together with `sheets_api_token`).
    spreadsheet_id: Option<String>,
    /// OAuth bearer token for the Sheets API.
    sheets_api_token: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Google Sheets collector settings.
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub api_token: String,
}

pub struct Config {
    pub telegram_bot_token: String,
    /// Directory for state files (logs, records database).
    pub data_dir: PathBuf,
    pub sqlite: bool,
    pub sheets: Option<SheetsConfig>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        if file.telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }

        let sheets = match (file.spreadsheet_id, file.sheets_api_token) {
            (Some(spreadsheet_id), Some(api_token)) => {
                Some(SheetsConfig { spreadsheet_id, api_token })
            }
            (None, None) => None,
            _ => {
                return Err(ConfigError::Validation(
                    "spreadsheet_id and sheets_api_token must be set together".into(),
                ));
            }
        };

        if !file.sqlite && sheets.is_none() {
            return Err(ConfigError::Validation(
                "no collector enabled: set sqlite=true or configure spreadsheet_id + sheets_api_token".into(),
            ));
        }

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            telegram_bot_token: file.telegram_bot_token,
            data_dir,
            sqlite: file.sqlite,
            sheets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn assert_err<T>(result: Result<T, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_valid_config() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdefGHIjklMNOpqrsTUVwxyz"
        }"#);
        let config = Config::load(file.path()).expect("should load valid config");
        assert!(config.sqlite);
        assert!(config.sheets.is_none());
        assert_eq!(config.data_dir, PathBuf::from("."));
    }

    #[test]
    fn test_sheets_config() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "spreadsheet_id": "sheet-id",
            "sheets_api_token": "token"
        }"#);
        let config = Config::load(file.path()).unwrap();
        let sheets = config.sheets.expect("sheets collector should be enabled");
        assert_eq!(sheets.spreadsheet_id, "sheet-id");
    }

    #[test]
    fn test_sheets_settings_must_come_together() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "spreadsheet_id": "sheet-id"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("together"));
    }

    #[test]
    fn test_at_least_one_collector() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "sqlite": false
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("no collector"));
    }

    #[test]
    fn test_empty_token() {
        let file = write_config(r#"{
            "telegram_bot_token": ""
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("telegram_bot_token"));
    }

    #[test]
    fn test_invalid_token_format_no_colon() {
        let file = write_config(r#"{
            "telegram_bot_token": "invalid_token_no_colon"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_invalid_token_format_non_numeric_id() {
        let file = write_config(r#"{
            "telegram_bot_token": "notanumber:ABCdef"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_invalid_token_format_empty_secret() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_file_not_found() {
        let err = assert_err(Config::load("/nonexistent/path/config.json"));
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_config("{ invalid json }");
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }
}
