//! Engine configuration.
//!
//! All thresholds and budgets are explicit values passed into the engine at
//! construction, never ambient state. Loaded from pagewright.yml when
//! present, with serde defaults for every field.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PagewrightError, Result};

/// Default model for content generation.
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Engine configuration for one repair loop invocation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum content-repair rounds per business record.
    #[serde(rename = "max-rounds")]
    pub max_rounds: u32,

    /// Transport-fault retries before the invocation fails.
    #[serde(rename = "fault-budget")]
    pub fault_budget: u32,

    /// Timeout per generation call in milliseconds.
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// LLM settings.
    pub llm: LlmSettings,

    /// SEO rule thresholds.
    pub seo: SeoThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            fault_budget: 2,
            timeout_ms: 120_000,
            llm: LlmSettings::default(),
            seo: SeoThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. pagewright.yml in current directory
    /// 3. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let project_config = PathBuf::from("pagewright.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from pagewright.yml");
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load pagewright.yml: {}", e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration. Fails fast, before any generation call.
    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(PagewrightError::Config("max-rounds must be > 0".into()));
        }
        if self.timeout_ms == 0 {
            return Err(PagewrightError::Config("timeout-ms must be > 0".into()));
        }
        if self.llm.max_tokens == 0 {
            return Err(PagewrightError::Config("llm.max-tokens must be > 0".into()));
        }
        self.seo.validate()
    }
}

/// LLM settings consumed by the generation client adapter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model identifier.
    pub model: String,

    /// Maximum tokens per generation response.
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
        }
    }
}

/// SEO rule thresholds.
///
/// Defaults follow standard local-SEO practice: titles and headings sized for
/// search result display, meta descriptions sized for snippets, body long
/// enough to rank without padding.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SeoThresholds {
    #[serde(rename = "title-min")]
    pub title_min: usize,

    #[serde(rename = "title-max")]
    pub title_max: usize,

    #[serde(rename = "meta-min")]
    pub meta_min: usize,

    #[serde(rename = "meta-max")]
    pub meta_max: usize,

    #[serde(rename = "heading-max")]
    pub heading_max: usize,

    #[serde(rename = "slug-max")]
    pub slug_max: usize,

    /// Body word count interval, inclusive on both ends.
    #[serde(rename = "body-min-words")]
    pub body_min_words: usize,

    #[serde(rename = "body-max-words")]
    pub body_max_words: usize,

    #[serde(rename = "keywords-min")]
    pub keywords_min: usize,

    #[serde(rename = "links-min")]
    pub links_min: usize,

    #[serde(rename = "links-max")]
    pub links_max: usize,
}

impl Default for SeoThresholds {
    fn default() -> Self {
        Self {
            title_min: 10,
            title_max: 70,
            meta_min: 50,
            meta_max: 160,
            heading_max: 70,
            slug_max: 60,
            body_min_words: 800,
            body_max_words: 1200,
            keywords_min: 3,
            links_min: 3,
            links_max: 5,
        }
    }
}

impl SeoThresholds {
    /// Validate threshold intervals.
    pub fn validate(&self) -> Result<()> {
        if self.title_min > self.title_max {
            return Err(PagewrightError::Config(
                "seo.title-min must be <= seo.title-max".into(),
            ));
        }
        if self.meta_min > self.meta_max {
            return Err(PagewrightError::Config(
                "seo.meta-min must be <= seo.meta-max".into(),
            ));
        }
        if self.body_min_words > self.body_max_words {
            return Err(PagewrightError::Config(
                "seo.body-min-words must be <= seo.body-max-words".into(),
            ));
        }
        if self.links_min > self.links_max {
            return Err(PagewrightError::Config(
                "seo.links-min must be <= seo.links-max".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.fault_budget, 2);
        assert_eq!(config.timeout_ms, 120_000);
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.seo.body_min_words, 800);
        assert_eq!(config.seo.body_max_words, 1200);
    }

    #[test]
    fn test_config_validation() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let config = EngineConfig {
            max_rounds: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max-rounds"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = EngineConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_word_interval_rejected() {
        let config = EngineConfig {
            seo: SeoThresholds {
                body_min_words: 1200,
                body_max_words: 800,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("body-min-words"));
    }

    #[test]
    fn test_inverted_link_interval_rejected() {
        let config = EngineConfig {
            seo: SeoThresholds {
                links_min: 6,
                links_max: 5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
max-rounds: 5
timeout-ms: 60000
seo:
  meta-max: 155
  links-max: 4
"#;
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_rounds, 5);
        assert_eq!(config.timeout_ms, 60000);
        assert_eq!(config.seo.meta_max, 155);
        assert_eq!(config.seo.links_max, 4);
        // Other fields should have defaults
        assert_eq!(config.fault_budget, 2);
        assert_eq!(config.seo.meta_min, 50);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = EngineConfig::load(None).unwrap();
        assert_eq!(config.max_rounds, 3);
    }
}
