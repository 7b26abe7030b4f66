//! Authorization token sources
//!
//! The backend never hardcodes a token. It asks the configured
//! [`TokenSource`] for one on every call, passing the call's context.

use std::fmt;

use crate::context::CallContext;
use crate::error::{ClientError, Result};

/// Supplies the authorization token for a call
pub trait TokenSource: Send + Sync {
    fn token(&self, ctx: &CallContext) -> Result<String>;
}

impl<F> TokenSource for F
where
    F: Fn(&CallContext) -> Result<String> + Send + Sync,
{
    fn token(&self, ctx: &CallContext) -> Result<String> {
        self(ctx)
    }
}

/// Always returns the same token
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenSource for StaticToken {
    fn token(&self, _ctx: &CallContext) -> Result<String> {
        Ok(self.0.clone())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

/// Reads the token from the call context, falling back to a fixed token
#[derive(Clone, Default)]
pub struct ContextToken {
    fallback: Option<String>,
}

impl ContextToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(token: impl Into<String>) -> Self {
        Self {
            fallback: Some(token.into()),
        }
    }
}

impl TokenSource for ContextToken {
    fn token(&self, ctx: &CallContext) -> Result<String> {
        ctx.auth_token()
            .filter(|t| !t.trim().is_empty())
            .or(self.fallback.as_deref())
            .map(str::to_string)
            .ok_or_else(|| ClientError::Auth("no authorization token in call context".into()))
    }
}

impl fmt::Debug for ContextToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextToken")
            .field("fallback", &self.fallback.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Normalizes a raw token into an `Authorization` header value
pub(crate) fn bearer_value(token: &str) -> Result<String> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ClientError::Auth("authorization token is empty".into()));
    }

    let has_prefix = token
        .get(..7)
        .is_some_and(|p| p.eq_ignore_ascii_case("bearer "));
    if has_prefix {
        if token[7..].trim().is_empty() {
            return Err(ClientError::Auth("authorization token is empty".into()));
        }
        Ok(token.to_string())
    } else {
        Ok(format!("Bearer {}", token))
    }
}
