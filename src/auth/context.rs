use uuid::Uuid;

use super::{AuthError, Claims};

/// Identity taken from a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub preferred_username: Option<String>,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, AuthError> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidToken("subject is not a UUID".to_string()))?;

        Ok(Self {
            user_id,
            email: claims.email.clone(),
            preferred_username: claims.preferred_username.clone(),
        })
    }

    /// Username for a new profile: the token's suggestion, else the local
    /// part of the email, else the user id.
    pub fn default_username(&self) -> String {
        self.preferred_username
            .as_deref()
            .or_else(|| self.email.as_deref().and_then(|e| e.split('@').next()))
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.user_id.to_string())
    }
}
