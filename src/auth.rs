use crate::config::AuthConfig;

/// Source of the bearer credential used for uploads.
/// Login and token storage live outside this crate.
pub trait CredentialProvider: Send + Sync {
    fn credential(&self) -> Option<String>;

    fn current_user(&self) -> Option<String> {
        None
    }
}

/// Credential fixed at construction, typically read from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
    user: Option<String>,
}

impl StaticCredentials {
    pub fn new(token: Option<String>, user: Option<String>) -> Self {
        // Blank tokens count as signed out
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self { token, user }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.token.clone(), config.user_email.clone())
    }
}

impl CredentialProvider for StaticCredentials {
    fn credential(&self) -> Option<String> {
        self.token.clone()
    }

    fn current_user(&self) -> Option<String> {
        self.user.clone()
    }
}
