use cropwatch_core::ports::CredentialProvider;

/// Environment variable holding the bearer token
pub const TOKEN_ENV_VAR: &str = "CROPWATCH_TOKEN";

/// No active session
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// A fixed token handed over by the authentication provider
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

/// Reads the token from `CROPWATCH_TOKEN` on every request, so a refreshed
/// token is picked up without rebuilding the client
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn bearer_token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV_VAR).ok().map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
    }
}
