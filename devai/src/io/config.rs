//! devai-cli configuration stored as TOML.
//!
//! Lookup order: `--config`, then `DEVAI_CONFIG`, then
//! `<config dir>/devai-cli/config.toml`. A missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::prompt::DEFAULT_SYSTEM_PROMPT;
use crate::core::types::{ModelDefinition, ModelParameters};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "DEVAI_CONFIG";
/// Standard Ollama variable; overrides `ollama.host` when set.
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

/// devai-cli configuration (TOML).
///
/// Missing fields default to the values the built-in commit model was tuned
/// with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DevaiConfig {
    pub ollama: OllamaConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL of the Ollama daemon.
    pub host: String,
    /// Deadline for non-streaming requests (generation, listing, deletion).
    pub request_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Custom model used for generation.
    pub name: String,
    /// Published model the custom model derives from.
    pub base_model: String,
    pub temperature: f32,
    pub num_ctx: u32,
    /// Seconds the model stays loaded after a request.
    pub keep_alive: u64,
    /// Replaces the built-in system prompt when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "devai-cli-commit:latest".to_string(),
            base_model: "qwen2.5-coder:1.5b".to_string(),
            temperature: 0.2,
            num_ctx: 131_072,
            keep_alive: 0,
            system_prompt: None,
        }
    }
}

impl ModelConfig {
    pub fn system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    /// Recipe for the custom model.
    pub fn definition(&self) -> ModelDefinition {
        ModelDefinition {
            name: self.name.clone(),
            from: self.base_model.clone(),
            system: self.system_prompt().to_string(),
            parameters: ModelParameters {
                temperature: self.temperature,
                num_ctx: self.num_ctx,
            },
        }
    }
}

impl DevaiConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ollama.host.trim().is_empty() {
            return Err(anyhow!("ollama.host must be non-empty"));
        }
        if self.ollama.request_timeout_secs == 0 {
            return Err(anyhow!("ollama.request_timeout_secs must be > 0"));
        }
        if self.model.name.trim().is_empty() {
            return Err(anyhow!("model.name must be non-empty"));
        }
        if self.model.base_model.trim().is_empty() {
            return Err(anyhow!("model.base_model must be non-empty"));
        }
        if !(0.0..=1.0).contains(&self.model.temperature) {
            return Err(anyhow!("model.temperature must be within [0, 1]"));
        }
        if self.model.num_ctx == 0 {
            return Err(anyhow!("model.num_ctx must be > 0"));
        }
        Ok(())
    }

    /// Apply `OLLAMA_HOST` when it is set to something non-blank.
    pub fn with_host_override(mut self, host: Option<String>) -> Self {
        if let Some(host) = host.filter(|value| !value.trim().is_empty()) {
            self.ollama.host = normalize_host(&host);
        }
        self
    }
}

/// `OLLAMA_HOST` is commonly written without a scheme (`127.0.0.1:11434`).
fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

/// Resolve which config file to read.
pub fn config_path(explicit: Option<&Path>, env_value: Option<String>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(value) = env_value.filter(|value| !value.trim().is_empty()) {
        return Some(PathBuf::from(value));
    }
    dirs::config_dir().map(|dir| dir.join("devai-cli").join("config.toml"))
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `DevaiConfig::default()`.
pub fn load_config(path: &Path) -> Result<DevaiConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        let cfg = DevaiConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DevaiConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, DevaiConfig::default());
        assert_eq!(cfg.model.name, "devai-cli-commit:latest");
        assert_eq!(cfg.model.base_model, "qwen2.5-coder:1.5b");
    }

    #[test]
    fn full_file_overrides_every_field() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "[ollama]\nhost = \"http://10.0.0.2:11434\"\nrequest_timeout_secs = 30\n\n\
             [model]\nname = \"commits:v2\"\nbase_model = \"llama3.2:3b\"\n\
             temperature = 0.4\nnum_ctx = 8192\nkeep_alive = 300\n\
             system_prompt = \"Only output the subject line.\"\n",
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(
            cfg.ollama,
            OllamaConfig {
                host: "http://10.0.0.2:11434".to_string(),
                request_timeout_secs: 30,
            }
        );
        assert_eq!(cfg.model.name, "commits:v2");
        assert_eq!(cfg.model.base_model, "llama3.2:3b");
        assert_eq!(cfg.model.num_ctx, 8192);
        assert_eq!(cfg.model.keep_alive, 300);
        assert_eq!(cfg.model.system_prompt(), "Only output the subject line.");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[model]\nbase_model = \"llama3.2:3b\"\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.model.base_model, "llama3.2:3b");
        assert_eq!(cfg.model.name, "devai-cli-commit:latest");
        assert_eq!(cfg.ollama, OllamaConfig::default());
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[model]\ntemperature = 1.5\n").expect("write");
        let err = load_config(&path).expect_err("should reject");
        assert!(format!("{err:#}").contains("model.temperature"));
    }

    #[test]
    fn host_override_adds_scheme() {
        let cfg = DevaiConfig::default().with_host_override(Some("127.0.0.1:9999".to_string()));
        assert_eq!(cfg.ollama.host, "http://127.0.0.1:9999");
        let cfg = DevaiConfig::default().with_host_override(Some("  ".to_string()));
        assert_eq!(cfg.ollama.host, "http://localhost:11434");
    }

    #[test]
    fn explicit_path_wins_over_env() {
        let explicit = PathBuf::from("/tmp/explicit.toml");
        assert_eq!(
            config_path(Some(&explicit), Some("/tmp/env.toml".to_string())),
            Some(explicit)
        );
        assert_eq!(
            config_path(None, Some("/tmp/env.toml".to_string())),
            Some(PathBuf::from("/tmp/env.toml"))
        );
    }

    #[test]
    fn definition_uses_default_system_prompt() {
        let definition = ModelConfig::default().definition();
        assert_eq!(definition.from, "qwen2.5-coder:1.5b");
        assert!(definition.system.contains("Conventional Commits expert"));
        assert_eq!(definition.parameters.num_ctx, 131_072);
    }
}
