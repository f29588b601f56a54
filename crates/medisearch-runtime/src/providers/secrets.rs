//! API keys for the generation and embedding services.
//!
//! A key is wrapped in [`SecretString`] as soon as it is read and is only
//! readable through [`ApiCredential::expose`] at the point where a request
//! header is built.
//!
//! ```ignore
//! let key = ApiCredential::resolve(None, "GROQ_API_KEY", "Groq API key")?;
//! request.bearer_auth(key.expose());
//! ```

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use super::ProviderError;

/// Where a key came from, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Config,
    Environment,
    /// Passed in by the embedding application
    Programmatic,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::Config => "config",
            CredentialSource::Environment => "environment",
            CredentialSource::Programmatic => "programmatic",
        }
    }
}

/// A service API key that never appears in `Debug` or `Display` output.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    label: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, label: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            label,
        }
    }

    /// Look up a key, preferring a non-blank configured value over `env_var`.
    ///
    /// Returns `None` when neither is set. Blank values count as unset.
    pub fn lookup(configured: Option<&str>, env_var: &str, label: &'static str) -> Option<Self> {
        if let Some(value) = non_blank(configured) {
            return Some(Self::new(value, CredentialSource::Config, label));
        }

        std::env::var(env_var)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|value| Self::new(value, CredentialSource::Environment, label))
    }

    /// Like [`lookup`](Self::lookup), for services that cannot run without a key.
    pub fn resolve(
        configured: Option<&str>,
        env_var: &str,
        label: &'static str,
    ) -> Result<Self, ProviderError> {
        Self::lookup(configured, env_var, label).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "{} missing: set it in the config file or export {}",
                label, env_var
            ))
        })
    }

    /// The raw key. Use it to build a header and drop it.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiCredential({}, {}, ***)", self.label, self.source.as_str())
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.source.as_str())
    }
}
