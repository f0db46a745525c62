use std::path::PathBuf;

use anyhow::Context;

pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const MODEL_PATH_VAR: &str = "SOCIAL_INSIGHTS_MODEL";
pub const DEFAULT_MODEL_PATH: &str = "models/sentiment.json";

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: Option<String>,
    pub model_path: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            database_url: non_empty(DATABASE_URL_VAR),
            model_path: non_empty(MODEL_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
        }
    }

    pub fn with_model_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.model_path = path;
        }
        self
    }

    pub fn database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to read records from Postgres")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        let settings = settings(&[]);
        assert!(settings.database_url.is_none());
        assert_eq!(settings.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert!(settings.database_url().is_err());
    }

    #[test]
    fn environment_values_are_used() {
        let settings = settings(&[
            (DATABASE_URL_VAR, "postgres://localhost/insights"),
            (MODEL_PATH_VAR, "/opt/models/sentiment.json"),
        ]);
        assert_eq!(
            settings.database_url().unwrap(),
            "postgres://localhost/insights"
        );
        assert_eq!(settings.model_path, PathBuf::from("/opt/models/sentiment.json"));
    }

    #[test]
    fn blank_values_are_ignored_and_flags_override() {
        let settings = settings(&[(DATABASE_URL_VAR, "  "), (MODEL_PATH_VAR, "")])
            .with_model_path(Some(PathBuf::from("custom.json")));
        assert!(settings.database_url.is_none());
        assert_eq!(settings.model_path, PathBuf::from("custom.json"));
    }
}
