//! Editor configuration, read from `course-editor.config.json`

use crate::content::LessonType;
use crate::errors::EditorError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "course-editor.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Seed for generated local ids (defaults to the session start time)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_seed: Option<String>,

    /// Passing score given to quizzes synthesized by the store
    #[serde(default = "default_passing_score")]
    pub default_passing_score: u32,

    /// Kind a lesson falls back to when its quiz is deleted
    #[serde(default = "default_kind_after_quiz_delete")]
    pub kind_after_quiz_delete: LessonType,
}

fn default_passing_score() -> u32 {
    70
}

fn default_kind_after_quiz_delete() -> LessonType {
    LessonType::Markdown
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults if absent
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, EditorError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Fixed id seed, mainly for deterministic tests
    pub fn with_id_seed(mut self, seed: impl Into<String>) -> Self {
        self.id_seed = Some(seed.into());
        self
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            id_seed: None,
            default_passing_score: default_passing_score(),
            kind_after_quiz_delete: default_kind_after_quiz_delete(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "idSeed": "fixed",
            "defaultPassingScore": 80,
            "kindAfterQuizDelete": "video"
        }"#;

        let config = EditorConfig::from_json(json).unwrap();
        assert_eq!(config.id_seed.as_deref(), Some("fixed"));
        assert_eq!(config.default_passing_score, 80);
        assert_eq!(config.kind_after_quiz_delete, LessonType::Video);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EditorConfig::from_json("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.default_passing_score, 70);
        assert_eq!(config.kind_after_quiz_delete, LessonType::Markdown);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let dir = std::env::temp_dir().join("course-editor-config-missing");
        let config = EditorConfig::load(&dir).unwrap();
        assert_eq!(config, EditorConfig::default());
    }
}
