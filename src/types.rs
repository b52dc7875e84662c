//! Type definitions for authentication

use serde::{Deserialize, Serialize};

/// Access + refresh token pair held by the credential store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Body of `POST <refresh_path>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Successful response of the refresh endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// How the backend authenticates this client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// JWT bearer tokens; a session exists only while an access token is stored.
    #[default]
    Bearer,
    /// Cookie session with CSRF protection; a locatable CSRF token also counts
    /// as an authenticated session.
    Session,
}

impl std::str::FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bearer" | "jwt" => Ok(AuthMode::Bearer),
            "session" | "csrf" => Ok(AuthMode::Session),
            other => Err(format!("unknown auth mode `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tokens_do_not_count() {
        let creds = Credentials {
            access_token: Some(String::new()),
            refresh_token: None,
        };
        assert!(!creds.has_access_token());
        assert!(!creds.has_refresh_token());

        let creds = Credentials::new("a", "r");
        assert!(creds.has_access_token());
        assert!(creds.has_refresh_token());
    }

    #[test]
    fn test_refresh_wire_format() {
        let body = serde_json::to_value(RefreshRequest { refresh: "r1".into() }).unwrap();
        assert_eq!(body, serde_json::json!({ "refresh": "r1" }));

        let resp: RefreshResponse = serde_json::from_str(r#"{"access":"a2"}"#).unwrap();
        assert_eq!(resp.access, "a2");
    }

    #[test]
    fn test_auth_mode_parse() {
        assert_eq!("Bearer".parse::<AuthMode>().unwrap(), AuthMode::Bearer);
        assert_eq!("session".parse::<AuthMode>().unwrap(), AuthMode::Session);
        assert!("basic".parse::<AuthMode>().is_err());
    }
}
