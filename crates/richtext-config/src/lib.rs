use richtext_engine::{EditorSettings, FormatRegistry, FormatType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Relative document paths resolve against this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_path: Option<PathBuf>,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub format_types: Vec<FormatType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiline_tag: Option<String>,
    /// Defaults to `ul`/`ol` when the multiline tag is `li`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub multiline_wrapper_tags: Vec<String>,
    pub preserve_white_space: bool,
    pub undo_debounce_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            multiline_tag: None,
            multiline_wrapper_tags: Vec::new(),
            preserve_white_space: false,
            undo_debounce_ms: 1000,
        }
    }
}

impl EditorConfig {
    pub fn settings(&self) -> EditorSettings {
        let mut settings = match &self.multiline_tag {
            Some(tag) => EditorSettings::multiline(tag),
            None => EditorSettings::default(),
        };
        if !self.multiline_wrapper_tags.is_empty() {
            settings.multiline_wrapper_tags = self.multiline_wrapper_tags.clone();
        }
        settings.preserve_white_space = self.preserve_white_space;
        settings.undo_debounce = Duration::from_millis(self.undo_debounce_ms);
        settings
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the documents path
        config.documents_path = config
            .documents_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/richtext");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// A registry holding every valid `[[format_types]]` entry. Rejected
    /// entries are logged and skipped.
    pub fn format_registry(&self) -> FormatRegistry {
        let mut registry = FormatRegistry::new();
        for format_type in &self.format_types {
            if let Err(err) = registry.try_register(format_type.clone()) {
                log::warn!("Skipping format type {:?} from config: {err}", format_type.name);
            }
        }
        registry
    }

    /// `path` as given when absolute, otherwise under `documents_path`.
    pub fn resolve_document(&self, path: &Path) -> PathBuf {
        match &self.documents_path {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    fn bold() -> FormatType {
        FormatType {
            name: "core/bold".to_string(),
            title: "Bold".to_string(),
            tag_name: "strong".to_string(),
            class_name: None,
            attributes: Default::default(),
            editable: true,
            namespace: None,
        }
    }

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/richtext/config.toml"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.editor.undo_debounce_ms, 1000);
    }

    #[test]
    fn test_full_config_parses() {
        let config_content = r#"
documents_path = "/srv/docs"

[editor]
multiline_tag = "li"
preserve_white_space = true
undo_debounce_ms = 250

[[format_types]]
name = "core/bold"
title = "Bold"
tag_name = "strong"

[[format_types]]
name = "my-plugin/note"
title = "Note"
tag_name = "span"
class_name = "note"
attributes = { id = "data-id" }
"#;

        let config: Config = toml::from_str(config_content).unwrap();

        assert_eq!(config.documents_path, Some(PathBuf::from("/srv/docs")));
        assert_eq!(config.editor.multiline_tag.as_deref(), Some("li"));
        assert_eq!(config.format_types.len(), 2);
        assert_eq!(config.format_types[0], bold());
        assert_eq!(
            config.format_types[1].attributes.get("id").map(String::as_str),
            Some("data-id")
        );
        assert!(config.format_types[1].editable);
    }

    #[test]
    fn test_editor_settings() {
        let editor = EditorConfig {
            multiline_tag: Some("li".to_string()),
            undo_debounce_ms: 250,
            ..EditorConfig::default()
        };
        let settings = editor.settings();

        assert_eq!(settings.multiline_tag.as_deref(), Some("li"));
        assert_eq!(settings.multiline_wrapper_tags, vec!["ul", "ol"]);
        assert_eq!(settings.undo_debounce, Duration::from_millis(250));
    }

    #[test]
    fn test_format_registry_skips_invalid_entries() {
        let mut unnamespaced = bold();
        unnamespaced.name = "bold".to_string();
        let config = Config {
            format_types: vec![bold(), unnamespaced, bold()],
            ..Config::default()
        };

        let registry = config.format_registry();

        assert_eq!(registry.format_types().len(), 1);
        assert!(registry.get_format_type("core/bold").is_some());
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("RICHTEXT_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$RICHTEXT_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("RICHTEXT_TEST_VAR");
        }
    }

    #[test]
    fn test_resolve_document() {
        let config = Config {
            documents_path: Some(PathBuf::from("/srv/docs")),
            ..Config::default()
        };

        assert_eq!(
            config.resolve_document(Path::new("a/b.html")),
            PathBuf::from("/srv/docs/a/b.html")
        );
        assert_eq!(
            config.resolve_document(Path::new("/tmp/c.html")),
            PathBuf::from("/tmp/c.html")
        );
        assert_eq!(
            Config::default().resolve_document(Path::new("d.html")),
            PathBuf::from("d.html")
        );
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_invalid_config_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "editor = 3").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            documents_path: Some(PathBuf::from("/tmp/test-docs")),
            editor: EditorConfig {
                multiline_tag: Some("p".to_string()),
                ..EditorConfig::default()
            },
            format_types: vec![bold()],
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }
}
