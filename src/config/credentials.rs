//! FHEMWEB credentials

use super::SkillSettings;
use base64::Engine;
use std::fmt;

/// Basic auth credentials for FHEMWEB
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FhemCredentials {
    pub username: String,
    pub password: String,
}

impl FhemCredentials {
    /// Credentials from settings; `None` when no username is configured
    pub fn from_settings(settings: &SkillSettings) -> Option<Self> {
        let username = settings.username.as_deref().map(str::trim).unwrap_or("");
        if username.is_empty() {
            return None;
        }

        Some(Self {
            username: username.to_string(),
            password: settings.password.clone().unwrap_or_default(),
        })
    }

    /// Value for the `Authorization` header
    pub fn basic_auth_header(&self) -> String {
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(format!(
                "{username}:{password}",
                username = self.username,
                password = self.password
            ))
        )
    }
}

impl fmt::Debug for FhemCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FhemCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
