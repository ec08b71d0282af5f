use std::collections::HashMap;
use std::env;
use std::path::Path;

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Settings for the generation call.
///
/// Sources, highest priority first: CLI overrides, process environment,
/// a `.env` file in the working directory, built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    pub provider: String,
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub size: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            size: DEFAULT_IMAGE_SIZE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub size: Option<String>,
    pub api_base: Option<String>,
}

impl GenerationConfig {
    pub fn from_env() -> Self {
        let dotenv = parse_dotenv(Path::new(".env"));
        Self::from_lookup(|key| {
            non_empty_env(key).or_else(|| {
                dotenv
                    .get(key)
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
            })
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            provider: lookup("STICKER_PROVIDER")
                .map(|value| value.to_ascii_lowercase())
                .unwrap_or(defaults.provider),
            api_key: lookup(API_KEY_VAR),
            api_base: lookup("OPENAI_API_BASE")
                .map(|value| normalize_api_base(&value))
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.api_base),
            model: lookup("STICKER_IMAGE_MODEL").unwrap_or(defaults.model),
            size: lookup("STICKER_IMAGE_SIZE").unwrap_or(defaults.size),
        }
    }

    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(provider) = non_empty(overrides.provider.as_deref()) {
            self.provider = provider.to_ascii_lowercase();
        }
        if let Some(model) = non_empty(overrides.model.as_deref()) {
            self.model = model.to_string();
        }
        if let Some(size) = non_empty(overrides.size.as_deref()) {
            self.size = size.to_string();
        }
        if let Some(api_base) = non_empty(overrides.api_base.as_deref()) {
            self.api_base = normalize_api_base(api_base);
        }
        self
    }
}

fn normalize_api_base(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Reads `KEY=value` lines; `export` prefixes and matching quotes are
/// stripped. A missing file yields an empty map. Later keys win.
pub fn parse_dotenv(path: &Path) -> HashMap<String, String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .filter_map(dotenv_entry)
        .collect()
}

fn dotenv_entry(raw_line: &str) -> Option<(String, String)> {
    let line = raw_line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").map_or(line, str::trim);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), unquote(value.trim()).to_string()))
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|quote| value.strip_prefix(quote)?.strip_suffix(quote))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_target_openai_gpt_image() {
        let config = GenerationConfig::from_lookup(|_| None);
        assert_eq!(config, GenerationConfig::default());
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-image-1");
        assert_eq!(config.size, "1024x1024");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn lookup_values_replace_defaults() {
        let config = GenerationConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_API_BASE", "http://127.0.0.1:9000/v1/"),
            ("STICKER_PROVIDER", "DryRun"),
            ("STICKER_IMAGE_SIZE", "512x512"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.api_base, "http://127.0.0.1:9000/v1");
        assert_eq!(config.provider, "dryrun");
        assert_eq!(config.size, "512x512");
        assert_eq!(config.model, DEFAULT_IMAGE_MODEL);
    }

    #[test]
    fn overrides_win_and_blank_overrides_are_ignored() {
        let config = GenerationConfig::default().with_overrides(&ConfigOverrides {
            provider: Some("dryrun".to_string()),
            model: Some("  ".to_string()),
            size: None,
            api_base: Some("http://localhost:1/".to_string()),
        });
        assert_eq!(config.provider, "dryrun");
        assert_eq!(config.model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.api_base, "http://localhost:1");
    }

    #[test]
    fn dotenv_parses_exports_quotes_and_comments() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join(".env");
        fs::write(
            &path,
            "# comment\nexport OPENAI_API_KEY=\"sk-quoted\"\nSTICKER_IMAGE_SIZE='1536x1024'\nnot a pair\n=orphan\n",
        )?;
        let vars = parse_dotenv(&path);
        assert_eq!(vars.get("OPENAI_API_KEY").map(String::as_str), Some("sk-quoted"));
        assert_eq!(
            vars.get("STICKER_IMAGE_SIZE").map(String::as_str),
            Some("1536x1024")
        );
        assert_eq!(vars.len(), 2);
        Ok(())
    }

    #[test]
    fn unquote_only_strips_matching_pairs() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("\"abc'"), "\"abc'");
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn dotenv_missing_file_is_empty() {
        assert!(parse_dotenv(Path::new("/nonexistent/.env")).is_empty());
    }
}
