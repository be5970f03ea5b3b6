//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::interview::PromptScript;

/// Interview configuration.
#[derive(Debug, Clone)]
pub struct InterviewConfig {
    /// Delay between an accepted response and the next prompt.
    pub thinking_delay: Duration,
    /// Delay between completion and the offer reveal.
    pub offer_reveal_delay: Duration,
    /// Name used to address the respondent in the offer.
    pub respondent_name: String,
    /// JSON script to load instead of the built-in one.
    pub script_path: Option<PathBuf>,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            thinking_delay: Duration::from_millis(1500),
            offer_reveal_delay: Duration::from_millis(2000),
            respondent_name: "Sarah".to_string(),
            script_path: None,
        }
    }
}

impl InterviewConfig {
    /// Read overrides from the environment, falling back to defaults.
    ///
    /// - `INTAKE_THINKING_DELAY_MS`
    /// - `INTAKE_OFFER_DELAY_MS`
    /// - `INTAKE_RESPONDENT_NAME`
    /// - `INTAKE_SCRIPT_PATH`
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::result::Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(ms) = lookup("INTAKE_THINKING_DELAY_MS") {
            config.thinking_delay = parse_millis("INTAKE_THINKING_DELAY_MS", &ms)?;
        }
        if let Some(ms) = lookup("INTAKE_OFFER_DELAY_MS") {
            config.offer_reveal_delay = parse_millis("INTAKE_OFFER_DELAY_MS", &ms)?;
        }
        if let Some(name) = lookup("INTAKE_RESPONDENT_NAME") {
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "INTAKE_RESPONDENT_NAME".to_string(),
                    message: "must not be blank".to_string(),
                });
            }
            config.respondent_name = name.to_string();
        }
        if let Some(path) = lookup("INTAKE_SCRIPT_PATH") {
            if !path.trim().is_empty() {
                config.script_path = Some(PathBuf::from(path));
            }
        }

        Ok(config)
    }

    /// Read the environment and load the script it names.
    pub fn load() -> Result<(Self, PromptScript)> {
        Self::load_from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an injectable variable source.
    pub fn load_from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(Self, PromptScript)> {
        let config = Self::from_lookup(lookup)?;
        let script = config.script()?;
        Ok((config, script))
    }

    /// The configured script file, or the built-in career intake.
    pub fn script(&self) -> Result<PromptScript> {
        let script = match &self.script_path {
            Some(path) => {
                let script = PromptScript::load(path)?;
                tracing::info!(path = %path.display(), prompts = script.len(), "Loaded interview script");
                script
            }
            None => PromptScript::career_intake(),
        };
        Ok(script)
    }
}

fn parse_millis(key: &str, value: &str) -> std::result::Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected milliseconds, got {value:?} ({e})"),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::{Error, ScriptError};

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_product_timings() {
        let config = InterviewConfig::default();
        assert_eq!(config.thinking_delay, Duration::from_millis(1500));
        assert_eq!(config.offer_reveal_delay, Duration::from_millis(2000));
        assert_eq!(config.respondent_name, "Sarah");
        assert!(config.script_path.is_none());
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = InterviewConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.thinking_delay, Duration::from_millis(1500));
    }

    #[test]
    fn overrides_are_applied() {
        let config = InterviewConfig::from_lookup(lookup(&[
            ("INTAKE_THINKING_DELAY_MS", "10"),
            ("INTAKE_OFFER_DELAY_MS", " 25 "),
            ("INTAKE_RESPONDENT_NAME", "Dana"),
            ("INTAKE_SCRIPT_PATH", "/tmp/script.json"),
        ]))
        .unwrap();
        assert_eq!(config.thinking_delay, Duration::from_millis(10));
        assert_eq!(config.offer_reveal_delay, Duration::from_millis(25));
        assert_eq!(config.respondent_name, "Dana");
        assert_eq!(config.script_path, Some(PathBuf::from("/tmp/script.json")));
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = InterviewConfig::from_lookup(lookup(&[("INTAKE_THINKING_DELAY_MS", "soon")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "INTAKE_THINKING_DELAY_MS"),
            other => panic!("unexpected error: {other}"),
        }

        let err =
            InterviewConfig::from_lookup(lookup(&[("INTAKE_RESPONDENT_NAME", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn load_without_path_uses_built_in_script() {
        let (config, script) = InterviewConfig::load_from_lookup(lookup(&[])).unwrap();
        assert!(config.script_path.is_none());
        assert_eq!(script.len(), PromptScript::career_intake().len());
    }

    #[test]
    fn load_reads_configured_script_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.json");
        std::fs::write(
            &path,
            r#"{"prompts":["Where are you now?","Where next?"],
                "sections":[{"section_id":"only","title":"Only","starts_at":0}],
                "closing":"Thanks."}"#,
        )
        .unwrap();

        let path_str = path.display().to_string();
        let (_, script) =
            InterviewConfig::load_from_lookup(lookup(&[("INTAKE_SCRIPT_PATH", path_str.as_str())]))
                .unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script.closing(), "Thanks.");
    }

    #[test]
    fn load_wraps_config_errors() {
        let err = InterviewConfig::load_from_lookup(lookup(&[("INTAKE_OFFER_DELAY_MS", "-1")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })), "{err}");
        assert!(err.to_string().starts_with("Configuration error:"));
    }

    #[test]
    fn load_wraps_script_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json").display().to_string();
        let err = InterviewConfig::load_from_lookup(lookup(&[("INTAKE_SCRIPT_PATH", missing.as_str())]))
            .unwrap_err();
        assert!(matches!(err, Error::Script(ScriptError::Read { .. })), "{err}");

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"prompts":[],"sections":[],"closing":"Bye."}"#).unwrap();
        let bad = bad.display().to_string();
        let err = InterviewConfig::load_from_lookup(lookup(&[("INTAKE_SCRIPT_PATH", bad.as_str())]))
            .unwrap_err();
        assert!(matches!(err, Error::Script(ScriptError::Empty)), "{err}");
    }
}
