//! Registration options.

use serde_json::{Map, Value};

use crate::error::{AuthError, AuthResult};

/// Options forwarded to the pre-dispatch hook mechanism, uninterpreted.
pub type HookOptions = Map<String, Value>;

/// Key enabling the session-strategy fallback.
pub const FALLBACK_TO_DEVISE: &str = "fallback_to_devise";

/// Key aliasing the derived principal name.
pub const ALIAS: &str = "as";

/// Options accepted by a token authentication registration.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationOptions {
    /// Let the strict guard fall back to the session strategy.
    pub fallback_to_devise: bool,
    /// Replaces the snake-case name derived from the principal type.
    pub alias: Option<String>,
    /// Remaining options, passed through to the hook mechanism.
    pub hook_options: HookOptions,
}

impl Default for RegistrationOptions {
    fn default() -> Self {
        Self {
            fallback_to_devise: true,
            alias: None,
            hook_options: HookOptions::new(),
        }
    }
}

impl RegistrationOptions {
    /// Default options: fallback enabled, no alias, no hook options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Split an opaque option map into recognized keys and hook options.
    pub fn parse(mut options: HookOptions) -> AuthResult<Self> {
        let fallback_to_devise = match options.remove(FALLBACK_TO_DEVISE) {
            None | Some(Value::Null) => true,
            Some(Value::Bool(value)) => value,
            Some(other) => {
                return Err(AuthError::Config(format!(
                    "'{}' must be a boolean, got {}",
                    FALLBACK_TO_DEVISE, other
                )))
            }
        };

        let alias = match options.remove(ALIAS) {
            None | Some(Value::Null) => None,
            Some(Value::String(alias)) => Some(alias),
            Some(other) => {
                return Err(AuthError::Config(format!(
                    "'{}' must be a string, got {}",
                    ALIAS, other
                )))
            }
        };

        Ok(Self {
            fallback_to_devise,
            alias,
            hook_options: options,
        })
    }

    /// Parse options from a JSON object string.
    pub fn from_json_str(json: &str) -> AuthResult<Self> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => Self::parse(map),
            other => Err(AuthError::Config(format!(
                "registration options must be an object, got {}",
                other
            ))),
        }
    }

    /// Set whether the strict guard falls back to the session strategy.
    pub fn with_fallback_to_devise(mut self, fallback: bool) -> Self {
        self.fallback_to_devise = fallback;
        self
    }

    /// Alias the derived principal name.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Add an option for the hook mechanism.
    pub fn with_hook_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.hook_options.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = RegistrationOptions::parse(HookOptions::new()).unwrap();
        assert!(options.fallback_to_devise);
        assert!(options.alias.is_none());
        assert!(options.hook_options.is_empty());
    }

    #[test]
    fn test_recognized_keys_are_stripped() {
        let options = RegistrationOptions::from_json_str(
            r#"{"fallback_to_devise": false, "as": "member", "role": "admin"}"#,
        )
        .unwrap();

        assert!(!options.fallback_to_devise);
        assert_eq!(options.alias.as_deref(), Some("member"));
        assert_eq!(options.hook_options.len(), 1);
        assert_eq!(options.hook_options.get("role"), Some(&json!("admin")));
    }

    #[test]
    fn test_invalid_values() {
        let err =
            RegistrationOptions::from_json_str(r#"{"fallback_to_devise": "no"}"#).unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));

        let err = RegistrationOptions::from_json_str(r#"{"as": 3}"#).unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));

        let err = RegistrationOptions::from_json_str("[]").unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }
}
