use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Language the generated meanings and translations are written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeaningLanguage {
    English,
    Chinese,
}

impl MeaningLanguage {
    pub fn as_str(self) -> &'static str {
        match self {
            MeaningLanguage::English => "english",
            MeaningLanguage::Chinese => "chinese",
        }
    }

    pub fn prompt_name(self) -> &'static str {
        match self {
            MeaningLanguage::English => "English",
            MeaningLanguage::Chinese => "Traditional Chinese",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "english" | "en" => Some(MeaningLanguage::English),
            "chinese" | "zh" => Some(MeaningLanguage::Chinese),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_meaning_language")]
    pub meaning_language: MeaningLanguage,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    #[serde(default = "default_ai_voice")]
    pub ai_voice: String,
    #[serde(default = "default_native_speech_command")]
    pub native_speech_command: String,
    #[serde(default = "default_native_voice")]
    pub native_voice: String,
    #[serde(default = "default_audio_player")]
    pub audio_player: String,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub remote_token: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub account_email: Option<String>,
    #[serde(default = "default_share_base_url")]
    pub share_base_url: String,
    #[serde(default = "default_daily_generation_limit")]
    pub daily_generation_limit: u32,
    #[serde(default = "default_quota_fail_open")]
    pub quota_fail_open: bool,
    #[serde(default)]
    pub quota_allowlist: Vec<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_meaning_language() -> MeaningLanguage {
    MeaningLanguage::English
}
fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_tts_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}
fn default_ai_voice() -> String {
    "Kore".to_string()
}
fn default_native_speech_command() -> String {
    if cfg!(target_os = "macos") {
        "say".to_string()
    } else {
        "espeak".to_string()
    }
}
fn default_native_voice() -> String {
    if cfg!(target_os = "macos") {
        "Kyoko".to_string()
    } else {
        "ja".to_string()
    }
}
fn default_audio_player() -> String {
    if cfg!(target_os = "macos") {
        "afplay".to_string()
    } else {
        "aplay".to_string()
    }
}
fn default_share_base_url() -> String {
    "https://kaiwa.app/".to_string()
}
fn default_daily_generation_limit() -> u32 {
    5
}
fn default_quota_fail_open() -> bool {
    true
}
fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            meaning_language: default_meaning_language(),
            api_key: None,
            api_base: default_api_base(),
            text_model: default_text_model(),
            tts_model: default_tts_model(),
            ai_voice: default_ai_voice(),
            native_speech_command: default_native_speech_command(),
            native_voice: default_native_voice(),
            audio_player: default_audio_player(),
            remote_url: None,
            remote_token: None,
            account_id: None,
            account_email: None,
            share_base_url: default_share_base_url(),
            daily_generation_limit: default_daily_generation_limit(),
            quota_fail_open: default_quota_fail_open(),
            quota_allowlist: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kaiwa")
            .join("config.toml")
    }

    /// Configured key, falling back to the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    /// Clamp numeric settings and restore defaults for blank strings left by
    /// hand-edited files.
    pub fn validate(&mut self) {
        self.daily_generation_limit = self.daily_generation_limit.clamp(1, 100);
        self.request_timeout_secs = self.request_timeout_secs.clamp(5, 600);
        if self.api_base.trim().is_empty() {
            self.api_base = default_api_base();
        }
        if self.text_model.trim().is_empty() {
            self.text_model = default_text_model();
        }
        if self.tts_model.trim().is_empty() {
            self.tts_model = default_tts_model();
        }
        if self.share_base_url.trim().is_empty() {
            self.share_base_url = default_share_base_url();
        }
        self.remote_url = self
            .remote_url
            .take()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.daily_generation_limit, 5);
        assert!(config.quota_fail_open);
        assert!(config.quota_allowlist.is_empty());
        assert_eq!(config.meaning_language, MeaningLanguage::English);
        assert!(config.remote_url.is_none());
    }

    #[test]
    fn test_config_serde_partial_file() {
        let toml_str = r#"
meaning_language = "chinese"
daily_generation_limit = 10
quota_allowlist = ["staff@example.com"]
remote_url = "https://docs.example.com/api/"
"#;
        let mut config: Config = toml::from_str(toml_str).unwrap();
        config.validate();
        assert_eq!(config.meaning_language, MeaningLanguage::Chinese);
        assert_eq!(config.daily_generation_limit, 10);
        assert_eq!(config.quota_allowlist, vec!["staff@example.com"]);
        assert_eq!(
            config.remote_url.as_deref(),
            Some("https://docs.example.com/api")
        );
        assert_eq!(config.text_model, "gemini-2.5-flash");
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let mut config = Config::default();
        config.quota_fail_open = false;
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.quota_fail_open, deserialized.quota_fail_open);
        assert_eq!(config.share_base_url, deserialized.share_base_url);
        assert_eq!(config.meaning_language, deserialized.meaning_language);
    }

    #[test]
    fn test_validate_clamps_values() {
        let mut config = Config::default();
        config.daily_generation_limit = 0;
        config.request_timeout_secs = 100_000;
        config.text_model = "  ".to_string();
        config.remote_url = Some("   ".to_string());
        config.validate();

        assert_eq!(config.daily_generation_limit, 1);
        assert_eq!(config.request_timeout_secs, 600);
        assert_eq!(config.text_model, "gemini-2.5-flash");
        assert!(config.remote_url.is_none());
    }

    #[test]
    fn test_meaning_language_from_name() {
        assert_eq!(
            MeaningLanguage::from_name("ZH"),
            Some(MeaningLanguage::Chinese)
        );
        assert_eq!(
            MeaningLanguage::from_name("english"),
            Some(MeaningLanguage::English)
        );
        assert_eq!(MeaningLanguage::from_name("klingon"), None);
    }
}
