//! Environment-driven configuration with CLI overrides.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

/// Bind address settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Deployment toolchain settings.
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

/// Remote verification registrar settings. Absent means verification is
/// disabled and deploy requests asking for it are rejected.
#[derive(Debug, Clone)]
pub struct RegistrarConfig {
    pub api_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub artifacts_dir: PathBuf,
    pub toolchain: ToolchainConfig,
    pub default_network: String,
    pub registrar: Option<RegistrarConfig>,
}

impl Config {
    /// Reads configuration from the environment. `.env` loading happens in
    /// `main` before this is called.
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env_or("MINTFORGE_HOST", "127.0.0.1");
        let port: u16 = env_or("MINTFORGE_PORT", "8780")
            .parse()
            .context("MINTFORGE_PORT must be a port number")?;

        let artifacts_dir = PathBuf::from(
            std::env::var("MINTFORGE_ARTIFACTS_DIR")
                .context("MINTFORGE_ARTIFACTS_DIR is required")?,
        );

        let program = env_or("MINTFORGE_TOOLCHAIN", "mintforge-deploy");
        let args = std::env::var("MINTFORGE_TOOLCHAIN_ARGS")
            .map(|raw| {
                raw.split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        let timeout_secs: u64 = env_or("MINTFORGE_DEPLOY_TIMEOUT_SECS", "300")
            .parse()
            .context("MINTFORGE_DEPLOY_TIMEOUT_SECS must be an integer")?;

        let default_network = env_or("MINTFORGE_NETWORK", "sepolia");

        let registrar = match (
            std::env::var("MINTFORGE_REGISTRAR_URL"),
            std::env::var("MINTFORGE_REGISTRAR_API_KEY"),
        ) {
            (Ok(api_url), Ok(api_key)) => Some(RegistrarConfig { api_url, api_key }),
            (Ok(_), Err(_)) => {
                anyhow::bail!("MINTFORGE_REGISTRAR_URL set without MINTFORGE_REGISTRAR_API_KEY")
            }
            _ => None,
        };

        Ok(Config {
            server: ServerConfig { host, port },
            artifacts_dir,
            toolchain: ToolchainConfig {
                program,
                args,
                timeout: Duration::from_secs(timeout_secs),
            },
            default_network,
            registrar,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
