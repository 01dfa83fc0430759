// Configuration loading and parsing (rosterscope.toml, credentials.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the config was loaded from. Relative data paths resolve
    /// against it.
    pub base_dir: PathBuf,
    pub data_paths: DataPaths,
    pub leaderboard: LeaderboardConfig,
    pub filters: FilterDefaults,
    pub assistant: AssistantConfig,
    pub credentials: CredentialsConfig,
}

impl Config {
    /// Absolute path of the pitcher CSV.
    pub fn pitchers_path(&self) -> PathBuf {
        self.resolve(&self.data_paths.pitchers)
    }

    /// Absolute path of the hitter CSV.
    pub fn hitters_path(&self) -> PathBuf {
        self.resolve(&self.data_paths.hitters)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }
}

// ---------------------------------------------------------------------------
// rosterscope.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire rosterscope.toml file.
#[derive(Debug, Clone, Deserialize)]
struct SettingsFile {
    data: DataPaths,
    leaderboard: LeaderboardConfig,
    #[serde(default)]
    filters: FilterDefaults,
    assistant: AssistantConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub pitchers: String,
    pub hitters: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardConfig {
    pub top_n: usize,
    /// Minimum plate appearances for hitter leaderboards.
    pub min_pa: f64,
    /// Minimum innings pitched for pitcher leaderboards.
    pub min_ip: f64,
    /// Inner groups kept per outer group before collapsing into "Other".
    pub legend_top_k: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterDefaults {
    pub draft_round_max: u32,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self { draft_round_max: 70 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Number of question/answer exchanges retained in the session history.
    pub history_limit: usize,
    /// Number of sample player names included in the data summary.
    pub sample_rows: usize,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub xai_api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/rosterscope.toml` and
/// (optionally) `config/credentials.toml`, relative to `base_dir`.
///
/// Does not copy defaults; `load_config` does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- rosterscope.toml (required) ---
    let settings_path = config_dir.join("rosterscope.toml");
    let settings_text = read_file(&settings_path)?;
    let settings: SettingsFile =
        toml::from_str(&settings_text).map_err(|e| ConfigError::ParseError {
            path: settings_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        debug!("no credentials.toml at {}", credentials_path.display());
        CredentialsConfig::default()
    };

    let config = Config {
        base_dir: base_dir.to_path_buf(),
        data_paths: settings.data,
        leaderboard: settings.leaderboard,
        filters: settings.filters,
        assistant: settings.assistant,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or pass --base-dir",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                info!("copied default config to {}", target.display());
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Pick the directory configuration is read from when none is given.
///
/// The current directory wins when it holds `config/` or `defaults/`;
/// otherwise the per-user config directory is used.
pub fn default_base_dir() -> Result<PathBuf, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    if cwd.join("config").exists() || cwd.join("defaults").exists() {
        return Ok(cwd);
    }
    match directories::ProjectDirs::from("", "", "rosterscope") {
        Some(dirs) => Ok(dirs.config_dir().to_path_buf()),
        None => Ok(cwd),
    }
}

/// Ensure defaults are copied, then load config relative to `base_dir`.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let lb = &config.leaderboard;
    let count_fields: &[(&str, usize)] = &[
        ("leaderboard.top_n", lb.top_n),
        ("leaderboard.legend_top_k", lb.legend_top_k),
    ];
    for (name, val) in count_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    let threshold_fields: &[(&str, f64)] = &[
        ("leaderboard.min_pa", lb.min_pa),
        ("leaderboard.min_ip", lb.min_ip),
    ];
    for (name, val) in threshold_fields {
        if !val.is_finite() || *val < 0.0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be a non-negative number, got {val}"),
            });
        }
    }

    let asst = &config.assistant;
    if !(0.0..=2.0).contains(&asst.temperature) {
        return Err(ConfigError::ValidationError {
            field: "assistant.temperature".into(),
            message: format!("must be between 0.0 and 2.0 inclusive, got {}", asst.temperature),
        });
    }
    if asst.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "assistant.timeout_secs".into(),
            message: "must be > 0".into(),
        });
    }
    if asst.endpoint.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "assistant.endpoint".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SETTINGS: &str = r#"
[data]
pitchers = "data/pitchers.csv"
hitters = "data/hitters.csv"

[leaderboard]
top_n = 10
min_pa = 50
min_ip = 20
legend_top_k = 8

[filters]
draft_round_max = 70

[assistant]
endpoint = "https://api.x.ai/v1/chat/completions"
model = "grok-beta"
temperature = 0.5
max_tokens = 800
timeout_secs = 30
history_limit = 10
sample_rows = 3
"#;

    /// Workspace root, two levels above this crate's manifest.
    fn workspace_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        tmp
    }

    #[test]
    fn shipped_defaults_parse_and_validate() {
        let tmp = scratch_dir("rosterscope_config_defaults");
        fs::copy(
            workspace_root().join("defaults/rosterscope.toml"),
            tmp.join("config/rosterscope.toml"),
        )
        .unwrap();

        let config = load_config_from(&tmp).expect("defaults should load");
        assert_eq!(config.data_paths.pitchers, "data/pitchers.csv");
        assert_eq!(config.data_paths.hitters, "data/hitters.csv");
        assert_eq!(config.filters.draft_round_max, 70);
        assert_eq!(config.assistant.model, "grok-beta");
        assert!((config.assistant.temperature - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.assistant.timeout_secs, 30);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_credentials_toml_is_ok() {
        let tmp = scratch_dir("rosterscope_config_no_creds");
        fs::write(tmp.join("config/rosterscope.toml"), SETTINGS).unwrap();

        let config = load_config_from(&tmp).expect("should load without credentials.toml");
        assert!(config.credentials.xai_api_key.is_none());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn credentials_toml_with_api_key() {
        let tmp = scratch_dir("rosterscope_config_with_creds");
        fs::write(tmp.join("config/rosterscope.toml"), SETTINGS).unwrap();
        fs::write(
            tmp.join("config/credentials.toml"),
            "xai_api_key = \"xai-test-key\"\n",
        )
        .unwrap();

        let config = load_config_from(&tmp).expect("should load with credentials.toml");
        assert_eq!(config.credentials.xai_api_key.as_deref(), Some("xai-test-key"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn filters_section_is_optional() {
        let tmp = scratch_dir("rosterscope_config_no_filters");
        let without_filters = SETTINGS.replace("[filters]\ndraft_round_max = 70\n", "");
        fs::write(tmp.join("config/rosterscope.toml"), without_filters).unwrap();

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.filters.draft_round_max, 70);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn relative_data_paths_resolve_against_base_dir() {
        let tmp = scratch_dir("rosterscope_config_paths");
        fs::write(tmp.join("config/rosterscope.toml"), SETTINGS).unwrap();

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.pitchers_path(), tmp.join("data/pitchers.csv"));
        assert_eq!(config.hitters_path(), tmp.join("data/hitters.csv"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_top_n() {
        let tmp = scratch_dir("rosterscope_config_zero_top_n");
        fs::write(
            tmp.join("config/rosterscope.toml"),
            SETTINGS.replace("top_n = 10", "top_n = 0"),
        )
        .unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "leaderboard.top_n"),
            other => panic!("expected ValidationError, got: {other:?}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let tmp = scratch_dir("rosterscope_config_temperature");
        fs::write(
            tmp.join("config/rosterscope.toml"),
            SETTINGS.replace("temperature = 0.5", "temperature = 3.5"),
        )
        .unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "assistant.temperature")
            }
            other => panic!("expected ValidationError, got: {other:?}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_settings_file_reports_path() {
        let tmp = scratch_dir("rosterscope_config_missing");
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => {
                assert!(path.ends_with("config/rosterscope.toml"))
            }
            other => panic!("expected FileNotFound, got: {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let tmp = scratch_dir("rosterscope_config_malformed");
        fs::write(tmp.join("config/rosterscope.toml"), "[data\npitchers = ").unwrap();
        assert!(matches!(
            load_config_from(&tmp).unwrap_err(),
            ConfigError::ParseError { .. }
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_and_skips_examples() {
        let tmp = std::env::temp_dir().join("rosterscope_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults/rosterscope.toml"), SETTINGS).unwrap();
        fs::write(
            tmp.join("defaults/credentials.toml.example"),
            "xai_api_key = \"\"\n",
        )
        .unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config/rosterscope.toml")]);
        assert!(!tmp.join("config/credentials.toml.example").exists());

        // Second run leaves existing files alone.
        let copied_again = ensure_config_files(&tmp).unwrap();
        assert!(copied_again.is_empty());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_without_any_directory_fails() {
        let tmp = std::env::temp_dir().join("rosterscope_config_empty");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        assert!(matches!(
            ensure_config_files(&tmp).unwrap_err(),
            ConfigError::DefaultsCopyError { .. }
        ));
        let _ = fs::remove_dir_all(&tmp);
    }
}
