use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// All ambient configuration in one object. Nothing in the pipeline reads the
/// process environment directly; the orchestrator receives this at
/// construction.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_output")]
    pub output_folder: String,

    pub api: ApiConfig,

    #[serde(default)]
    pub store: Option<StoreConfig>,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub defaults: PromptDefaults,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    /// "hal9" for the real backend, "demo" for canned responses.
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub token: String,
}

/// PostgREST table endpoint for project persistence. Absent means projects
/// are kept in memory for the session only.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    pub table_url: String,
    pub api_key: String,
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Pause between sequential chapter calls, rate-limit mitigation.
    #[serde(default = "default_chapter_delay")]
    pub chapter_delay_ms: u64,

    /// Issue all chapter requests concurrently instead of one at a time.
    #[serde(default)]
    pub parallel: bool,

    /// Artificial latency for the demo client.
    #[serde(default = "default_demo_delay")]
    pub demo_delay_ms: u64,

    #[serde(default = "default_content_depth")]
    pub content_depth: String,

    #[serde(default = "default_generation_mode")]
    pub generation_mode: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            chapter_delay_ms: default_chapter_delay(),
            parallel: false,
            demo_delay_ms: default_demo_delay(),
            content_depth: default_content_depth(),
            generation_mode: default_generation_mode(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PromptDefaults {
    #[serde(default = "default_writing_style")]
    pub writing_style: String,

    #[serde(default = "default_target_audience")]
    pub target_audience: String,

    #[serde(default = "default_estimated_pages")]
    pub estimated_pages: u32,

    #[serde(default = "default_target_words")]
    pub target_words: u32,
}

impl Default for PromptDefaults {
    fn default() -> Self {
        Self {
            writing_style: default_writing_style(),
            target_audience: default_target_audience(),
            estimated_pages: default_estimated_pages(),
            target_words: default_target_words(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_folder: default_output(),
            api: ApiConfig {
                provider: default_provider(),
                base_url: default_base_url(),
                token: String::new(),
            },
            store: None,
            generation: GenerationConfig::default(),
            defaults: PromptDefaults::default(),
        }
    }
}

fn default_output() -> String {
    "output".to_string()
}
fn default_provider() -> String {
    "demo".to_string()
}
fn default_base_url() -> String {
    "https://api.hal9.com/books/bookgeneratorapi/proxy/".to_string()
}
fn default_chapter_delay() -> u64 {
    1000
}
fn default_demo_delay() -> u64 {
    1500
}
fn default_content_depth() -> String {
    "polished".to_string()
}
fn default_generation_mode() -> String {
    "selective".to_string()
}
fn default_writing_style() -> String {
    "clear and engaging".to_string()
}
fn default_target_audience() -> String {
    "general readers".to_string()
}
fn default_estimated_pages() -> u32 {
    15
}
fn default_target_words() -> u32 {
    4000
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.yml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("{} not found. Please create one.", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(Path::new("config.yml"))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_applies_defaults() {
        let config: Config = serde_yaml_ng::from_str("api: {}\n").unwrap();
        assert_eq!(config.api.provider, "demo");
        assert_eq!(config.output_folder, "output");
        assert_eq!(config.generation.chapter_delay_ms, 1000);
        assert!(!config.generation.parallel);
        assert_eq!(config.defaults.writing_style, "clear and engaging");
        assert!(config.store.is_none());
    }

    #[test]
    fn test_full_config_parses() {
        let yaml = r#"
output_folder: books
api:
  provider: hal9
  base_url: https://example.com/functions/v1/
  token: secret
store:
  table_url: https://example.com/rest/v1/book_projects
  api_key: anon
  user_id: user-1
generation:
  chapter_delay_ms: 250
  parallel: true
"#;
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.api.provider, "hal9");
        assert_eq!(config.generation.chapter_delay_ms, 250);
        assert!(config.generation.parallel);
        assert_eq!(config.store.unwrap().user_id, "user-1");
        // Unspecified sections still default.
        assert_eq!(config.generation.content_depth, "polished");
        assert_eq!(config.defaults.target_words, 4000);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");

        assert!(Config::load_from(&path).is_err());

        let mut config = Config::default();
        config.api.token = "secret".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api.token, "secret");
        assert_eq!(loaded.api.provider, "demo");
    }

    #[test]
    fn test_default_matches_serde_defaults() {
        let from_yaml: Config = serde_yaml_ng::from_str("api: {}\n").unwrap();
        let built = Config::default();
        assert_eq!(built.api.provider, from_yaml.api.provider);
        assert_eq!(built.output_folder, from_yaml.output_folder);
        assert_eq!(
            built.generation.chapter_delay_ms,
            from_yaml.generation.chapter_delay_ms
        );
        assert_eq!(built.defaults.target_words, from_yaml.defaults.target_words);
    }
}
