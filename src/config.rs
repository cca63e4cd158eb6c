//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MOBIMETA_CONFIG` (environment variable)
//! 2. `~/.config/mobimeta/config.toml` (Linux/macOS)
//!    `%APPDATA%\mobimeta\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Defaults for writing edited books.
    pub save: SaveConfig,
    /// Text preview settings.
    pub text: TextConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
}

/// Defaults for writing edited books.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    /// Shrink record 0 to its minimal size when saving.
    pub pack: bool,
    /// Appended to the file stem when no output path is given.
    pub suffix: String,
    /// Allow replacing an existing output file.
    pub overwrite: bool,
}

/// Text preview settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Characters printed by `mobimeta text` without `--chars` or `-o`.
    pub preview_chars: usize,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
        }
    }
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            pack: true,
            suffix: "_new".to_string(),
            overwrite: false,
        }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            preview_chars: 2000,
        }
    }
}

impl SaveConfig {
    /// Output path derived from `input`: `<stem><suffix>.<ext>` next to it.
    pub fn derived_output(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "book".to_string());
        let ext = input
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mobi".to_string());
        input.with_file_name(format!("{stem}{}.{ext}", self.suffix))
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    match config_file_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Config::default(),
    }
}

/// Load configuration from an explicit file, falling back to defaults.
pub fn load_config_from(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(cfg) => {
                tracing::info!(path = %path.display(), "Loaded config");
                cfg
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to parse config, using defaults"
                );
                Config::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to read config file, using defaults"
            );
            Config::default()
        }
    }
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;
    save_config_to(config, &path)
}

/// Save configuration to an explicit file.
pub fn save_config_to(config: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MOBIMETA_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mobimeta").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mobimeta")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("mobimeta.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert!(cfg.save.pack);
        assert_eq!(cfg.save.suffix, "_new");
        assert!(!cfg.save.overwrite);
        assert_eq!(cfg.text.preview_chars, 2000);
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.general.log_level, cfg.general.log_level);
        assert_eq!(parsed.save.suffix, cfg.save.suffix);
        assert_eq!(parsed.text.preview_chars, cfg.text.preview_chars);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[save]
pack = false

[text]
preview_chars = 80
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert!(!cfg.save.pack);
        assert_eq!(cfg.text.preview_chars, 80);
        // Other fields use defaults
        assert_eq!(cfg.save.suffix, "_new");
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_load_and_save_explicit_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.save.suffix = "_edited".to_string();
        save_config_to(&cfg, &path).expect("save");
        let loaded = load_config_from(&path);
        assert_eq!(loaded.save.suffix, "_edited");
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[save\npack = ").expect("write");
        let cfg = load_config_from(&path);
        assert!(cfg.save.pack);
    }

    #[test]
    fn test_derived_output() {
        let save = SaveConfig::default();
        assert_eq!(
            save.derived_output(Path::new("/books/novel.mobi")),
            PathBuf::from("/books/novel_new.mobi")
        );
        assert_eq!(
            save.derived_output(Path::new("plain")),
            PathBuf::from("plain_new.mobi")
        );
    }

    #[test]
    fn test_log_file_in_cache_dir() {
        let mut cfg = Config::default();
        cfg.general.cache_dir = Some(PathBuf::from("/tmp/mm"));
        assert_eq!(log_file_path(&cfg), PathBuf::from("/tmp/mm/mobimeta.log"));
    }
}
