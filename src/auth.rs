//! Authentication service interface and the static bearer-token backend.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_USER: &str = "USER";

/// The verified caller, stored in request extensions by
/// [`middleware::authenticate`](crate::middleware::authenticate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub roles: Vec<String>,
}

impl Identity {
    pub fn new(subject: impl Into<String>, roles: &[&str]) -> Self {
        Self {
            subject: subject.into(),
            roles: roles.iter().map(|r| (*r).to_string()).collect(),
        }
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("invalid or unknown token")]
    InvalidToken,

    #[error("invalid auth token spec {0:?}: expected TOKEN=SUBJECT[:ROLE+ROLE]")]
    MalformedSpec(String),
}

// async_trait keeps the trait object-safe: registrars hold Arc<dyn Authenticator>.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Fixed token → identity table, loaded once from configuration.
#[derive(Debug, Default)]
pub struct StaticTokens {
    tokens: HashMap<String, Identity>,
}

impl StaticTokens {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }

    /// Parses `TOKEN=SUBJECT[:ROLE+ROLE]` entries. Without roles the subject
    /// gets [`ROLE_USER`].
    pub fn from_specs(specs: &[String]) -> Result<Self, AuthError> {
        specs.iter().try_fold(Self::new(), |acc, spec| {
            let (token, identity) = parse_spec(spec)?;
            Ok(acc.with_token(token, identity))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn parse_spec(spec: &str) -> Result<(String, Identity), AuthError> {
    let malformed = || AuthError::MalformedSpec(spec.to_string());

    let (token, rest) = spec.split_once('=').ok_or_else(malformed)?;
    let (subject, roles) = match rest.split_once(':') {
        Some((subject, roles)) => (
            subject,
            roles
                .split('+')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_uppercase)
                .collect::<Vec<_>>(),
        ),
        None => (rest, vec![ROLE_USER.to_string()]),
    };

    let token = token.trim();
    let subject = subject.trim();
    if token.is_empty() || subject.is_empty() || roles.is_empty() {
        return Err(malformed());
    }

    Ok((
        token.to_string(),
        Identity {
            subject: subject.to_string(),
            roles,
        },
    ))
}

#[async_trait]
impl Authenticator for StaticTokens {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.tokens.get(token).cloned().ok_or(AuthError::InvalidToken)
    }
}
