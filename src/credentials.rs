//! API key resolution.
//!
//! The key is looked up in a fixed priority order and the first non-empty
//! value wins. A missing key is an error, never an empty string.

use crate::error::{ChefError, Result};
use std::fmt;
use std::sync::Arc;

/// Key baked into the binary at compile time, if `VITE_API_KEY` was set then.
pub const BUILD_TIME_KEY: Option<&str> = option_env!("VITE_API_KEY");

/// Runtime environment variables consulted, in priority order.
pub const ENV_KEY_VARS: [&str; 3] = ["VITE_API_KEY", "GEMINI_API_KEY", "API_KEY"];

/// One place an API key may come from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// A key handed directly to the client builder.
    Explicit(String),
    /// A key captured at compile time.
    BuildTime(Option<&'static str>),
    /// A runtime environment variable.
    Env(&'static str),
}

impl CredentialSource {
    /// Human-readable label, safe to log.
    pub fn label(&self) -> String {
        match self {
            Self::Explicit(_) => "explicit key".to_string(),
            Self::BuildTime(_) => "build-time VITE_API_KEY".to_string(),
            Self::Env(var) => format!("environment variable {var}"),
        }
    }
}

// Keys must never end up in logs or panic messages.
impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(_) => f.write_str("Explicit(<redacted>)"),
            Self::BuildTime(key) => write!(f, "BuildTime(present: {})", key.is_some()),
            Self::Env(var) => f.debug_tuple("Env").field(var).finish(),
        }
    }
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves the API key from an ordered list of [`CredentialSource`]s.
#[derive(Clone)]
pub struct CredentialResolver {
    sources: Vec<CredentialSource>,
    lookup: EnvLookup,
}

impl Default for CredentialResolver {
    /// Build-time key first, then `VITE_API_KEY`, `GEMINI_API_KEY`, `API_KEY`.
    fn default() -> Self {
        let mut sources = vec![CredentialSource::BuildTime(BUILD_TIME_KEY)];
        sources.extend(ENV_KEY_VARS.into_iter().map(CredentialSource::Env));
        Self::new(sources)
    }
}

impl CredentialResolver {
    /// Creates a resolver over `sources`, reading the process environment.
    pub fn new(sources: Vec<CredentialSource>) -> Self {
        Self {
            sources,
            lookup: Arc::new(|var: &str| std::env::var(var).ok()),
        }
    }

    /// Replaces the environment lookup used for [`CredentialSource::Env`].
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.lookup = Arc::new(lookup);
        self
    }

    /// Puts an explicit key ahead of every other source.
    pub fn with_explicit_key(mut self, key: impl Into<String>) -> Self {
        self.sources.insert(0, CredentialSource::Explicit(key.into()));
        self
    }

    /// The sources, in the order they are tried.
    pub fn sources(&self) -> &[CredentialSource] {
        &self.sources
    }

    /// Returns the first non-blank key, or [`ChefError::MissingCredential`].
    pub fn resolve(&self) -> Result<String> {
        for source in &self.sources {
            let value = match source {
                CredentialSource::Explicit(key) => Some(key.clone()),
                CredentialSource::BuildTime(key) => key.map(str::to_string),
                CredentialSource::Env(var) => (self.lookup)(var),
            };

            if let Some(key) = value.filter(|k| !k.trim().is_empty()) {
                tracing::debug!(source = %source.label(), "resolved API key");
                return Ok(key);
            }
        }

        tracing::error!("no API key found in any credential source");
        Err(ChefError::MissingCredential)
    }
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}
