use crate::config::{FetchConfig, DEFAULT_MAX_BYTES, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::core::url_guard::{UrlPolicy, DEFAULT_ALLOWED_DOMAINS, DEFAULT_ALLOWED_SCHEMES};
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub fetch: FetchSection,
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSection {
    pub timeout_ms: Option<u64>,
    pub max_bytes: Option<u64>,
    pub user_agent: Option<String>,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_ms: Some(DEFAULT_TIMEOUT.as_millis() as u64),
            max_bytes: Some(DEFAULT_MAX_BYTES),
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSection {
    pub allowed_schemes: Option<Vec<String>>,
    pub allowed_domains: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: Option<String>,
    /// 遇到無法解析的文件時略過而不是整批失敗
    pub lenient: Option<bool>,
}

impl ImportConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ImportError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ImportError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEDS_OUTPUT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| ImportError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_millis(
                self.fetch
                    .timeout_ms
                    .unwrap_or(DEFAULT_TIMEOUT.as_millis() as u64),
            ),
            max_bytes: self.fetch.max_bytes.unwrap_or(DEFAULT_MAX_BYTES),
            policy: UrlPolicy {
                allowed_schemes: self.source.allowed_schemes.clone().unwrap_or_else(|| {
                    DEFAULT_ALLOWED_SCHEMES.iter().map(|s| s.to_string()).collect()
                }),
                allowed_domains: self.source.allowed_domains.clone().unwrap_or_else(|| {
                    DEFAULT_ALLOWED_DOMAINS.iter().map(|s| s.to_string()).collect()
                }),
            },
            user_agent: self
                .fetch
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }

    pub fn output_path(&self) -> Option<&str> {
        self.output.path.as_deref()
    }

    pub fn is_lenient(&self) -> bool {
        self.output.lenient.unwrap_or(false)
    }
}

impl Validate for ImportConfig {
    fn validate(&self) -> Result<()> {
        self.fetch_config().validate()?;

        if let Some(path) = self.output_path() {
            validation::validate_path("output.path", path)?;
        }

        Ok(())
    }
}
