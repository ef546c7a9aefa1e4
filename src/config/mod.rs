pub mod toml_config;

use crate::core::url_guard::UrlPolicy;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
/// 50 MiB
pub const DEFAULT_MAX_BYTES: u64 = 50 * 1024 * 1024;
pub const DEFAULT_USER_AGENT: &str = concat!("directory-import/", env!("CARGO_PKG_VERSION"));

/// Limits injected into the fetcher at startup.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_bytes: u64,
    pub policy: UrlPolicy,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_bytes: DEFAULT_MAX_BYTES,
            policy: UrlPolicy::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Validate for FetchConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_positive_number("fetch.timeout_ms", self.timeout.as_millis() as u64, 1)?;
        validation::validate_positive_number("fetch.max_bytes", self.max_bytes, 1)?;
        validation::validate_non_empty_list("source.allowed_schemes", &self.policy.allowed_schemes)?;
        validation::validate_non_empty_list("source.allowed_domains", &self.policy.allowed_domains)?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};

#[cfg(feature = "cli")]
mod cli {
    use clap::{Parser, Subcommand};
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "directory-import")]
    #[command(about = "Fetch and merge government personnel-directory XML exports")]
    pub struct CliConfig {
        /// Path to TOML configuration file
        #[arg(short, long)]
        pub config: Option<PathBuf>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON")]
        pub json_logs: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Download one directory export to a file
        Fetch {
            url: String,
            #[arg(short, long)]
            output: PathBuf,
        },
        /// Merge local XML exports into department and person records
        Parse {
            #[arg(required = true)]
            files: Vec<PathBuf>,
            #[arg(short, long)]
            output: Option<PathBuf>,
            /// Skip unreadable documents instead of failing the batch
            #[arg(long)]
            lenient: bool,
        },
        /// Fetch, merge and write the records of one or more exports
        Import {
            #[arg(required = true)]
            urls: Vec<String>,
            #[arg(short, long)]
            output: Option<PathBuf>,
            #[arg(long)]
            lenient: bool,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let config = FetchConfig::default();

        assert_eq!(config.timeout.as_millis(), 30_000);
        assert_eq!(config.max_bytes, 52_428_800);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let config = FetchConfig {
            max_bytes: 0,
            ..FetchConfig::default()
        };
        assert!(config.validate().is_err());

        let config = FetchConfig {
            timeout: Duration::ZERO,
            ..FetchConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
