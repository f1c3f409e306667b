// Runtime configuration - read from BANK_API_* environment variables

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
    Test,
}

impl Environment {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            other => Err(anyhow!("Unknown environment '{}'", other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
            Environment::Test => "test",
        }
    }

    /// Whether error responses may carry diagnostic details
    pub fn exposes_details(&self) -> bool {
        *self != Environment::Production
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub environment: Environment,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: 3000,
            db_path: PathBuf::from("bank.db"),
            environment: Environment::Development,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup (env in production, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(host) = lookup("BANK_API_HOST") {
            config.host = host;
        }

        if let Some(port) = lookup("BANK_API_PORT") {
            config.port = port
                .parse::<u16>()
                .with_context(|| format!("BANK_API_PORT must be a port number, got '{}'", port))?;
        }

        if let Some(db) = lookup("BANK_API_DB") {
            config.db_path = PathBuf::from(db);
        }

        if let Some(env) = lookup("BANK_API_ENV") {
            config.environment = Environment::parse(&env).context("Invalid BANK_API_ENV")?;
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
