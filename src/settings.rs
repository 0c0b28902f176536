//! User preferences persisted alongside boards and tasks.
//!
//! Unknown keys found in storage are preserved in [`Settings::extra`] so a
//! round trip through this crate never drops another client's preferences.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Keys owned by the typed fields of [`Settings`].
pub const KNOWN_KEYS: [&str; 5] = [
    "darkMode",
    "language",
    "openaiApiKey",
    "notifications",
    "autoSave",
];

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

/// Persisted preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_true")]
    pub dark_mode: bool,

    #[serde(default = "default_language")]
    pub language: String,

    /// Stored for clients that call an external assistant. Never read here.
    #[serde(default)]
    pub openai_api_key: String,

    #[serde(default = "default_true")]
    pub notifications: bool,

    #[serde(default = "default_true")]
    pub auto_save: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: true,
            language: default_language(),
            openai_api_key: String::new(),
            notifications: true,
            auto_save: true,
            extra: Map::new(),
        }
    }
}

impl Settings {
    /// Set a preference by its stored key.
    ///
    /// Known keys go to their typed field; a value of the wrong type for a
    /// known key is dropped. Anything else lands in [`Settings::extra`].
    pub fn set(&mut self, key: &str, value: Value) {
        let applied = match key {
            "darkMode" => value.as_bool().map(|on| self.dark_mode = on),
            "language" => value.as_str().map(|v| self.language = v.to_string()),
            "openaiApiKey" => value.as_str().map(|v| self.openai_api_key = v.to_string()),
            "notifications" => value.as_bool().map(|on| self.notifications = on),
            "autoSave" => value.as_bool().map(|on| self.auto_save = on),
            _ => {
                self.extra.insert(key.to_string(), value);
                return;
            }
        };
        if applied.is_none() {
            warn!(key, %value, "ignoring setting with wrong type");
        }
    }

    /// Move any known keys out of [`Settings::extra`] into their typed
    /// fields, so serialization never emits a key twice.
    pub fn normalize(&mut self) {
        for key in KNOWN_KEYS {
            if let Some(value) = self.extra.remove(key) {
                self.set(key, value);
            }
        }
    }
}

/// Partial settings update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub dark_mode: Option<bool>,
    pub language: Option<String>,
    pub openai_api_key: Option<String>,
    pub notifications: Option<bool>,
    pub auto_save: Option<bool>,
    /// Free-form keys merged into [`Settings::extra`].
    pub extra: Map<String, Value>,
}

impl SettingsPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_dark_mode(mut self, on: bool) -> Self {
        self.dark_mode = Some(on);
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn with_notifications(mut self, on: bool) -> Self {
        self.notifications = Some(on);
        self
    }

    #[must_use]
    pub fn with_auto_save(mut self, on: bool) -> Self {
        self.auto_save = Some(on);
        self
    }

    /// Add a free-form key. Known keys such as `darkMode` update the typed
    /// field instead.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Merge this patch into `settings`.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(on) = self.dark_mode {
            settings.dark_mode = on;
        }
        if let Some(language) = &self.language {
            settings.language = language.clone();
        }
        if let Some(key) = &self.openai_api_key {
            settings.openai_api_key = key.clone();
        }
        if let Some(on) = self.notifications {
            settings.notifications = on;
        }
        if let Some(on) = self.auto_save {
            settings.auto_save = on;
        }
        for (key, value) in &self.extra {
            settings.set(key, value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(s.dark_mode);
        assert_eq!(s.language, "en");
        assert!(s.openai_api_key.is_empty());
        assert!(s.notifications && s.auto_save);
    }

    #[test]
    fn test_serde_uses_camel_case_and_keeps_unknown_keys() {
        let s: Settings =
            serde_json::from_value(json!({"darkMode": false, "fontSize": 14})).unwrap();
        assert!(!s.dark_mode);
        assert_eq!(s.language, "en");
        assert_eq!(s.extra.get("fontSize"), Some(&json!(14)));

        let back = serde_json::to_value(&s).unwrap();
        assert_eq!(back["fontSize"], json!(14));
        assert_eq!(back["autoSave"], json!(true));
    }

    #[test]
    fn test_patch_merges() {
        let mut s = Settings::default();
        SettingsPatch::new()
            .with_language("de")
            .with_extra("theme", json!("solar"))
            .apply_to(&mut s);
        assert_eq!(s.language, "de");
        assert!(s.dark_mode);
        assert_eq!(s.extra["theme"], json!("solar"));
    }

    #[test]
    fn test_extra_with_known_key_updates_typed_field() {
        let mut s = Settings::default();
        SettingsPatch::new()
            .with_extra("darkMode", json!(false))
            .with_extra("language", json!(7))
            .apply_to(&mut s);

        assert!(!s.dark_mode);
        assert_eq!(s.language, "en");
        assert!(s.extra.is_empty());

        let raw = serde_json::to_string(&s).unwrap();
        assert_eq!(raw.matches("\"darkMode\"").count(), 1);
        let back: Settings = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_normalize_drains_known_keys() {
        let mut s = Settings::default();
        s.extra.insert("autoSave".to_string(), json!(false));
        s.extra.insert("fontSize".to_string(), json!(14));
        s.normalize();

        assert!(!s.auto_save);
        assert_eq!(s.extra.len(), 1);
        assert_eq!(s.extra["fontSize"], json!(14));
    }
}
