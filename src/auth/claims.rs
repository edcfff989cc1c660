use serde::{Deserialize, Serialize};

/// Claims of an access token issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject; the user's UUID
    pub sub: String,

    pub aud: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,

    #[serde(default)]
    pub nbf: Option<i64>,

    #[serde(default)]
    pub email: Option<String>,

    /// Suggested username, used when a profile is first created
    #[serde(default)]
    pub preferred_username: Option<String>,
}
