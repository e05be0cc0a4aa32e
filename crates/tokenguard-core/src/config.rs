//! Token authentication configuration.
//!
//! # Environment Variables
//!
//! ```text
//! TOKENGUARD_SIGN_IN_TOKEN=true
//! TOKENGUARD_INSTALL_HOOKS=false
//! ```

use std::collections::HashMap;
use std::env::VarError;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AuthError, AuthResult};

/// Environment variable overriding [`TokenAuthConfig::sign_in_token`].
pub const ENV_SIGN_IN_TOKEN: &str = "TOKENGUARD_SIGN_IN_TOKEN";

/// Environment variable overriding [`TokenAuthConfig::install_hooks`].
pub const ENV_INSTALL_HOOKS: &str = "TOKENGUARD_INSTALL_HOOKS";

/// Header name overrides for one principal type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HeaderNames {
    /// Header carrying the authentication token.
    pub token: Option<String>,
    /// Header carrying the identifier.
    pub identifier: Option<String>,
}

/// Process-wide token authentication settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenAuthConfig {
    /// Header name overrides, keyed by principal type name.
    pub header_names: HashMap<String, HeaderNames>,

    /// Identifier field per principal type name (e.g. `"User" => "email"`).
    /// Types without an entry are resolved by token alone.
    pub identifiers: HashMap<String, String>,

    /// Persist token sign-ins in the session instead of per request only.
    pub sign_in_token: bool,

    /// Install the pre-dispatch hook on registration. When false the guards
    /// are still defined and can be invoked explicitly.
    pub install_hooks: bool,
}

impl Default for TokenAuthConfig {
    fn default() -> Self {
        Self {
            header_names: HashMap::new(),
            identifiers: HashMap::new(),
            sign_in_token: false,
            install_hooks: true,
        }
    }
}

impl TokenAuthConfig {
    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> AuthResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> AuthResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Apply `TOKENGUARD_*` environment overrides.
    pub fn with_env_overrides(self) -> AuthResult<Self> {
        self.with_env_vars(ENV_SIGN_IN_TOKEN, ENV_INSTALL_HOOKS)
    }

    fn with_env_vars(
        mut self,
        sign_in_token_var: &str,
        install_hooks_var: &str,
    ) -> AuthResult<Self> {
        if let Some(value) = env_bool(sign_in_token_var)? {
            self.sign_in_token = value;
        }
        if let Some(value) = env_bool(install_hooks_var)? {
            self.install_hooks = value;
        }
        Ok(self)
    }

    /// Set the identifier field for a principal type.
    pub fn with_identifier(
        mut self,
        principal: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        self.identifiers.insert(principal.into(), field.into());
        self
    }

    /// Override the header names for a principal type.
    pub fn with_header_names(
        mut self,
        principal: impl Into<String>,
        headers: HeaderNames,
    ) -> Self {
        self.header_names.insert(principal.into(), headers);
        self
    }

    /// Set whether token sign-ins are stored in the session.
    pub fn with_sign_in_token(mut self, store: bool) -> Self {
        self.sign_in_token = store;
        self
    }

    /// Set whether registration installs the pre-dispatch hook.
    pub fn with_install_hooks(mut self, install: bool) -> Self {
        self.install_hooks = install;
        self
    }
}

fn env_bool(var: &str) -> AuthResult<Option<bool>> {
    match std::env::var(var) {
        Ok(value) => parse_bool(&value).map(Some).ok_or_else(|| {
            AuthError::Config(format!("{} must be a boolean, got '{}'", var, value))
        }),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(AuthError::Config(format!(
            "{} is not valid unicode",
            var
        ))),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
