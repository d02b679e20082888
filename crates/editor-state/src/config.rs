use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-document editing settings. Every field has a default, so an empty
/// JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Tab stop distance used for visual columns.
    pub tab_width: u32,
    /// Joins the selections of a multi-cursor copy.
    pub copy_separator: String,
    /// Maximum undo depth; `None` keeps everything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undo_limit: Option<usize>,
    pub search: SearchDefaults,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_width: editor_core::columns::DEFAULT_TAB_WIDTH,
            copy_separator: "\r\n".to_string(),
            undo_limit: None,
            search: SearchDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    pub match_case: bool,
    pub whole_word: bool,
    pub regex: bool,
}

impl SearchDefaults {
    /// A query for `pattern` carrying these flags.
    #[must_use]
    pub fn query(&self, pattern: impl Into<String>) -> editor_core::search::SearchQuery {
        editor_core::search::SearchQuery {
            pattern: pattern.into(),
            match_case: self.match_case,
            whole_word: self.whole_word,
            regex: self.regex,
        }
    }
}

impl EditorConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if `text` is not a valid config object.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;

        tracing::debug!(path = %path.display(), "loaded editor config");

        Ok(config)
    }

    /// Column metrics matching `tab_width`.
    #[must_use]
    pub fn columns(&self) -> editor_core::columns::MonospaceColumns {
        editor_core::columns::MonospaceColumns::new(self.tab_width)
    }
}

#[cfg(test)]
mod config_tests {
    use super::{ConfigError, EditorConfig};
    use std::io::Write;

    #[test]
    fn empty_object_is_all_defaults() {
        let config = EditorConfig::from_json_str("{}").unwrap();

        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.tab_width, 4);
        assert_eq!(config.copy_separator, "\r\n");
        assert!(!config.search.regex);
    }

    #[test]
    fn partial_override() {
        let config =
            EditorConfig::from_json_str(r#"{"tab_width": 8, "search": {"regex": true}}"#).unwrap();

        assert_eq!(config.tab_width, 8);
        assert!(config.search.regex);
        assert!(!config.search.match_case);
        assert_eq!(config.undo_limit, None);

        let query = config.search.query("a+");

        assert!(query.regex);
        assert_eq!(query.pattern, "a+");
    }

    #[test]
    fn load_from_file_and_report_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();

        file.write_all(br#"{"undo_limit": 10, "copy_separator": "\n"}"#).unwrap();

        let config = EditorConfig::load(file.path()).unwrap();

        assert_eq!(config.undo_limit, Some(10));
        assert_eq!(config.copy_separator, "\n");

        assert!(matches!(
            EditorConfig::from_json_str("{ not json"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            EditorConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
