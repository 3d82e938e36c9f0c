use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// AiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Transcription and text refinement.
    #[serde(default = "default_fast_model")]
    pub fast_model: String,
    /// Plans, risk analysis and reports.
    #[serde(default = "default_pro_model")]
    pub pro_model: String,
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: u32,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_fast_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_pro_model() -> String {
    "gemini-3-pro-preview".to_string()
}

fn default_thinking_budget() -> u32 {
    32768
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            fast_model: default_fast_model(),
            pro_model: default_pro_model(),
            thinking_budget: default_thinking_budget(),
        }
    }
}

// ---------------------------------------------------------------------------
// ReminderConfig / TaskConfig / PlanConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    30
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    #[serde(default = "default_estimated_hours")]
    pub default_estimated_hours: f64,
}

fn default_estimated_hours() -> f64 {
    crate::task::DEFAULT_ESTIMATED_HOURS
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            default_estimated_hours: default_estimated_hours(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Project length used when a plan or form omits the end date.
    #[serde(default = "default_duration_days")]
    pub default_duration_days: u32,
}

fn default_duration_days() -> u32 {
    30
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            default_duration_days: default_duration_days(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub tasks: TaskConfig,
    #[serde(default)]
    pub plan: PlanConfig,
}

impl Config {
    /// Load `.nexus/config.yaml`; a missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        match crate::io::read_optional(&path)? {
            Some(data) if !data.trim().is_empty() => Ok(serde_yaml::from_str(&data)?),
            _ => Ok(Config::default()),
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut warn = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message,
            })
        };

        for (field, value) in [
            ("ai.fast_model", &self.ai.fast_model),
            ("ai.pro_model", &self.ai.pro_model),
            ("ai.api_key_env", &self.ai.api_key_env),
        ] {
            if value.trim().is_empty() {
                warn(format!("{field} is empty"));
            }
        }

        if self.reminders.interval_secs == 0 {
            warn("reminders.interval_secs is 0; the reminder scan would spin".to_string());
        } else if self.reminders.interval_secs > 60 {
            warn(format!(
                "reminders.interval_secs={} exceeds the 60s reminder window; reminders may be missed",
                self.reminders.interval_secs
            ));
        }

        let hours = self.tasks.default_estimated_hours;
        if !hours.is_finite() || hours <= 0.0 {
            warn(format!("tasks.default_estimated_hours={hours} must be positive"));
        }

        if self.plan.default_duration_days == 0 {
            warn("plan.default_duration_days is 0".to_string());
        }

        if !self.ai.base_url.starts_with("http://") && !self.ai.base_url.starts_with("https://") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("ai.base_url '{}' is not an http(s) URL", self.ai.base_url),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.reminders.interval_secs, 30);
        assert_eq!(cfg.ai.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "reminders:\n  interval_secs: 10\nai:\n  pro_model: custom-pro\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.reminders.interval_secs, 10);
        assert_eq!(cfg.ai.pro_model, "custom-pro");
        assert_eq!(cfg.ai.fast_model, "gemini-2.5-flash");
        assert_eq!(cfg.plan.default_duration_days, 30);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.tasks.default_estimated_hours = 6.0;
        cfg.save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), cfg);
    }

    #[test]
    fn default_config_has_no_warnings() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_flags_bad_values() {
        let mut cfg = Config::default();
        cfg.ai.fast_model = " ".into();
        cfg.reminders.interval_secs = 0;
        cfg.tasks.default_estimated_hours = -1.0;
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().all(|w| w.level == WarnLevel::Warning));
        assert!(warnings[0].message.contains("ai.fast_model"));
    }

    #[test]
    fn non_http_base_url_is_an_error() {
        let mut cfg = Config::default();
        cfg.ai.base_url = "ftp://example.com".into();
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Error);
    }
}
