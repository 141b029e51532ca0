//! Application configuration.
//!
//! Configuration is loaded once at startup from a YAML file merged with
//! `REVIEWD_`-prefixed environment variables (nested keys separated by `__`,
//! e.g. `REVIEWD_UPSTREAM__API_KEY`). The loaded [`Config`] is validated
//! before the server starts and is immutable afterwards.

use anyhow::{Context, bail};
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "reviewd", about = "AI code-review gateway")]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short = 'f', long, env = "REVIEWD_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate the configuration and exit
    #[arg(long)]
    pub validate: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub host: String,
    /// Port to bind the HTTP server to
    pub port: u16,
    /// Secret used to sign session tokens (HS256). Required.
    pub secret_key: String,
    pub database: DatabaseConfig,
    pub upstream: UpstreamConfig,
    pub session: SessionConfig,
    pub limits: LimitsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            secret_key: String::new(),
            database: DatabaseConfig::default(),
            upstream: UpstreamConfig::default(),
            session: SessionConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Postgres connection string. `DATABASE_URL` takes precedence when set.
    pub url: Option<String>,
}

/// Connection details for the hosted completion endpoint.
///
/// All four fields are required; startup fails fast when any is missing so a
/// misconfigured deployment never half-works at request time.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the completion service, e.g. `https://myorg.openai.azure.com`
    pub endpoint: String,
    /// API key sent in the `api-key` header
    pub api_key: String,
    /// Deployment name in the URL path
    pub deployment: String,
    /// `api-version` query parameter
    pub api_version: String,
}

impl UpstreamConfig {
    /// Full chat-completions URL for the configured deployment.
    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lifetime of issued session tokens, in seconds
    pub token_expiry_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { token_expiry_secs: 86400 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum requests per client IP per window
    pub max_requests: u32,
    /// Rate limit window length, in seconds
    pub window_secs: u64,
    /// Maximum accepted request body size, in bytes
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 900,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from the YAML file and environment, then validate it.
    pub fn load(args: &Args) -> anyhow::Result<Self> {
        let mut config: Config = Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("REVIEWD_").split("__"))
            .extract()
            .context("failed to load configuration")?;

        // Conventional override used by deployment tooling
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = Some(url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the startup-fatal invariants: the upstream connection details and
    /// the signing secret must all be present and well formed.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.upstream.endpoint.is_empty() {
            bail!("missing required configuration: upstream.endpoint");
        }
        Url::parse(&self.upstream.endpoint).context("upstream.endpoint is not a valid URL")?;
        if self.upstream.api_key.is_empty() {
            bail!("missing required configuration: upstream.api_key");
        }
        if self.upstream.deployment.is_empty() {
            bail!("missing required configuration: upstream.deployment");
        }
        if self.upstream.api_version.is_empty() {
            bail!("missing required configuration: upstream.api_version");
        }
        if self.secret_key.is_empty() {
            bail!("missing required configuration: secret_key");
        }
        Ok(())
    }

    /// Address the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_yaml() -> &'static str {
        r#"
secret_key: "test-secret"
upstream:
  endpoint: "https://example.openai.azure.com"
  api_key: "upstream-key"
  deployment: "gpt-4o"
  api_version: "2024-02-01"
"#
    }

    #[test]
    fn test_load_valid_config() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.yaml", valid_yaml())?;
            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
            };
            let config = Config::load(&args).expect("config should load");
            assert_eq!(config.host, "0.0.0.0");
            assert_eq!(config.port, 3000);
            assert_eq!(config.limits.max_requests, 100);
            assert_eq!(config.limits.window_secs, 900);
            assert_eq!(config.limits.max_body_bytes, 1024 * 1024);
            assert_eq!(config.session.token_expiry_secs, 86400);
            Ok(())
        });
    }

    #[test]
    fn test_missing_upstream_key_is_fatal() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
secret_key: "test-secret"
upstream:
  endpoint: "https://example.openai.azure.com"
  deployment: "gpt-4o"
  api_version: "2024-02-01"
"#,
            )?;
            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
            };
            let err = Config::load(&args).unwrap_err();
            assert!(err.to_string().contains("upstream.api_key"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_secret_key_is_fatal() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
upstream:
  endpoint: "https://example.openai.azure.com"
  api_key: "upstream-key"
  deployment: "gpt-4o"
  api_version: "2024-02-01"
"#,
            )?;
            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
            };
            let err = Config::load(&args).unwrap_err();
            assert!(err.to_string().contains("secret_key"));
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.yaml", valid_yaml())?;
            jail.set_env("REVIEWD_PORT", "8080");
            jail.set_env("REVIEWD_UPSTREAM__DEPLOYMENT", "gpt-4o-mini");
            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
            };
            let config = Config::load(&args).expect("config should load");
            assert_eq!(config.port, 8080);
            assert_eq!(config.upstream.deployment, "gpt-4o-mini");
            Ok(())
        });
    }

    #[test]
    fn test_database_url_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.yaml", valid_yaml())?;
            jail.set_env("DATABASE_URL", "postgres://db.internal/reviewd");
            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
            };
            let config = Config::load(&args).expect("config should load");
            assert_eq!(config.database.url.as_deref(), Some("postgres://db.internal/reviewd"));
            Ok(())
        });
    }

    #[test]
    fn test_completions_url() {
        let upstream = UpstreamConfig {
            endpoint: "https://example.openai.azure.com/".to_string(),
            api_key: "k".to_string(),
            deployment: "gpt-4o".to_string(),
            api_version: "2024-02-01".to_string(),
        };
        assert_eq!(
            upstream.completions_url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-01"
        );
    }
}
