//! AI backend configuration
//!
//! Config is resolved in three layers:
//! 1. Embedded defaults (`config/ai.toml`, compiled into the binary)
//! 2. An override file (explicit path, else ~/.local/share/tally/config/ai.toml)
//! 3. Environment variables
//!
//! The resolved [`AiConfig`] is passed explicitly into the insight pipeline;
//! nothing below the binary edge reads the environment.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/ai.toml");

/// Default per-call timeout when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default Gemini model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Default OpenAI-compatible model
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Which text-generation backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Google Generative Language API
    Gemini,
    /// Any server implementing `/v1/chat/completions`
    OpenAICompatible,
    /// Scripted responses, no network
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Gemini => "gemini",
            BackendKind::OpenAICompatible => "openai_compatible",
            BackendKind::Mock => "mock",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(BackendKind::Gemini),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                Ok(BackendKind::OpenAICompatible)
            }
            "mock" => Ok(BackendKind::Mock),
            other => Err(Error::Config(format!("Unknown AI backend: {}", other))),
        }
    }
}

/// Resolved configuration for the selected backend
#[derive(Clone)]
pub struct AiConfig {
    pub backend: BackendKind,
    pub model: String,
    /// Server URL; Gemini falls back to the public endpoint when unset
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Per-call timeout
    pub timeout: Duration,
}

impl fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiConfig")
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Gemini,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: None,
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AiConfig {
    /// Configuration for the mock backend (tests and offline development)
    pub fn mock() -> Self {
        Self {
            backend: BackendKind::Mock,
            model: "mock".to_string(),
            ..Default::default()
        }
    }

    /// Load configuration from files and the process environment
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let content = read_config(override_path)?;
        Self::from_toml_with_env(&content, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from TOML content and an environment lookup
    pub fn from_toml_with_env<F>(content: &str, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;
        resolve(raw, env)
    }

    /// Whether an API key is present
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Default override location in the platform data directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("config").join("ai.toml"))
}

/// Read the override file if it exists, otherwise the embedded defaults
fn read_config(override_path: Option<&Path>) -> Result<String> {
    let path = match override_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    match path {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "Loading AI config override");
            fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))
        }
        _ => Ok(DEFAULT_CONFIG.to_string()),
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    backend: Option<String>,
    timeout_secs: Option<u64>,
    gemini: Option<RawBackend>,
    openai_compatible: Option<RawBackend>,
}

#[derive(Debug, Default, Deserialize)]
struct RawBackend {
    model: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
}

fn resolve<F>(raw: RawConfig, env: F) -> Result<AiConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let backend: BackendKind = match env("TALLY_AI_BACKEND").or(raw.backend) {
        Some(name) => name.parse()?,
        None => BackendKind::Gemini,
    };

    let timeout_secs = match env("TALLY_AI_TIMEOUT_SECS") {
        Some(secs) => secs
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::Config(format!("Invalid TALLY_AI_TIMEOUT_SECS: {}", secs)))?,
        None => raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
    };
    let timeout = Duration::from_secs(timeout_secs.max(1));

    let config = match backend {
        BackendKind::Gemini => {
            let section = raw.gemini.unwrap_or_default();
            AiConfig {
                backend,
                model: env("GEMINI_MODEL")
                    .or(section.model)
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: env("GEMINI_BASE_URL").or(section.base_url),
                api_key: env("GEMINI_API_KEY").or(section.api_key),
                timeout,
            }
        }
        BackendKind::OpenAICompatible => {
            let section = raw.openai_compatible.unwrap_or_default();
            AiConfig {
                backend,
                model: env("OPENAI_COMPATIBLE_MODEL")
                    .or(section.model)
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                base_url: env("OPENAI_COMPATIBLE_HOST").or(section.base_url),
                api_key: env("OPENAI_COMPATIBLE_API_KEY").or(section.api_key),
                timeout,
            }
        }
        BackendKind::Mock => AiConfig {
            timeout,
            ..AiConfig::mock()
        },
    };

    Ok(config)
}
