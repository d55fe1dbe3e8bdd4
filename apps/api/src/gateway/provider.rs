use std::fmt::{Debug, Formatter};
use std::time::Duration;

use serde_json::Value;

use crate::gateway::error::{ClassifiedError, ErrorKind};

/// How the API key is attached to outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    HeaderBearer,
    /// `?<name>=<key>` on the resolved URL.
    QueryParam(&'static str),
    /// `<name>: <key>` header.
    HeaderCustomKey(&'static str),
}

/// Static description of one upstream provider.
#[derive(Clone, Copy)]
pub struct ProviderConfig {
    pub name: &'static str,
    pub base_url: &'static str,
    pub api_key_env_var: &'static str,
    pub auth_style: AuthStyle,
    /// `None` disables caching for the provider.
    pub cache_window: Option<Duration>,
    /// Checked before the shared status table.
    pub status_overrides: &'static [(u16, ErrorKind)],
    /// Detects an error embedded in a 2xx body.
    pub embedded_error: fn(&Value) -> Option<ClassifiedError>,
}

impl Debug for ProviderConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key_env_var", &self.api_key_env_var)
            .field("auth_style", &self.auth_style)
            .field("cache_window", &self.cache_window)
            .field("status_overrides", &self.status_overrides)
            .finish_non_exhaustive()
    }
}
