use anyhow::{Context, Result};

const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Where the client talks to and who it is.
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Bearer token issued by the identity provider
    pub token: String,
}

impl ClientConfig {
    /// `ADMISSIONS_API_URL` (default `http://localhost:3000`) and `ADMISSIONS_API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = var("ADMISSIONS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let token = var("ADMISSIONS_API_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .context("Missing token. Set ADMISSIONS_API_TOKEN")?;

        Ok(Self { base_url, token })
    }
}
